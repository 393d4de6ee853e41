//! Enumeration-typed classification labels.
//!
//! A [`LabelSet`] is a closed enum whose variants are the permitted
//! categories. [`label_set!`](crate::label_set) declares one:
//!
//! ```
//! semantic::label_set! {
//!     /// What kind of thing an item is.
//!     pub enum Kind {
//!         Vehicle => "vehicle",
//!         Animal => "animal",
//!     }
//! }
//!
//! use semantic::LabelSet;
//! assert_eq!(Kind::from_label("ANIMAL"), Some(Kind::Animal));
//! ```

use crate::errors::SemanticError;
use crate::types::{same_label, Categories};

/// A closed set of labels backed by an enum.
pub trait LabelSet: Sized + Copy + Send + Sync + 'static {
    /// Every variant, in declaration order.
    const VARIANTS: &'static [Self];

    /// The label text sent to, and expected back from, the model.
    fn label(self) -> &'static str;

    /// The variants as a [`Categories`] set.
    ///
    /// Fails with [`SemanticError::Configuration`] for an enum with no variants.
    fn categories() -> Result<Categories, SemanticError> {
        Categories::new(Self::VARIANTS.iter().map(|v| v.label()))
    }

    /// Looks a variant up by label, ignoring case and surrounding whitespace.
    fn from_label(label: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .copied()
            .find(|v| same_label(v.label(), label))
    }
}

/// Declares an enum and implements [`LabelSet`] for it.
///
/// Each variant is written `Variant => "label"`.
#[macro_export]
macro_rules! label_set {
    (
        $(#[$attr:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vattr:meta])*
                $variant:ident => $label:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vattr])*
                $variant
            ),+
        }

        impl $crate::LabelSet for $name {
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::LabelSet::label(*self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::label_set! {
        enum Kind {
            Vehicle => "vehicle",
            Animal => "animal",
            Tool => "tool",
            Food => "food",
        }
    }

    #[derive(Debug, Clone, Copy)]
    enum Nothing {}

    impl LabelSet for Nothing {
        const VARIANTS: &'static [Self] = &[];

        fn label(self) -> &'static str {
            match self {}
        }
    }

    #[test]
    fn categories_follow_declaration_order() {
        let cats = Kind::categories().unwrap();
        assert_eq!(cats.as_slice(), ["vehicle", "animal", "tool", "food"]);
    }

    #[test]
    fn from_label_is_case_insensitive() {
        assert_eq!(Kind::from_label(" Food "), Some(Kind::Food));
        assert_eq!(Kind::from_label("mineral"), None);
    }

    crate::label_set! {
        enum Mood {
            Happy => "fröhlich",
            Angry => "wütend",
        }
    }

    #[test]
    fn from_label_folds_non_ascii_case() {
        assert_eq!(Mood::from_label("FRÖHLICH"), Some(Mood::Happy));
        assert_eq!(Mood::from_label("Wütend"), Some(Mood::Angry));
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(Kind::Tool.to_string(), "tool");
    }

    #[test]
    fn empty_label_set_is_a_configuration_error() {
        assert!(matches!(
            Nothing::categories(),
            Err(SemanticError::Configuration { .. })
        ));
    }
}
