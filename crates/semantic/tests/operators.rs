//! End-to-end operator behaviour against a rule-based collaborator.

mod support;

use std::sync::Arc;
use std::time::Duration;

use semantic::{
    label_set, Categories, EvaluationError, LabelSet, OperatorOptions, Semantic, SemanticError,
};
use serde::Serialize;
use support::{RuleModel, ITEMS};
use tokio_util::sync::CancellationToken;

label_set! {
    /// Kinds of thing the rule model knows about.
    enum Kind {
        Vehicle => "vehicle",
        Animal => "animal",
        Tool => "tool",
        Food => "food",
    }
}

fn items() -> Vec<&'static str> {
    ITEMS.to_vec()
}

fn options() -> OperatorOptions {
    OperatorOptions::new().with_max_parallel(ITEMS.len())
}

#[tokio::test]
async fn filter_keeps_rideable_items_in_original_order() {
    let model = Arc::new(RuleModel::in_reverse());
    let semantic = Semantic::new(Arc::clone(&model));

    let kept = semantic
        .filter(items(), "you can ride on or in it", &options())
        .await
        .unwrap();

    assert_eq!(kept, vec!["horse", "airplane"]);
    // Later items answer first, yet the output follows input order.
    assert_eq!(
        model.completion_order(),
        vec!["sandwich", "airplane", "caterpillar", "tack", "horse"]
    );
}

#[tokio::test]
async fn filter_on_first_or_last_uses_position() {
    let semantic = Semantic::new(RuleModel::new());
    let kept = semantic
        .filter(items(), "The item is the first or last", &options())
        .await
        .unwrap();
    assert_eq!(kept, vec!["horse", "sandwich"]);
}

#[tokio::test]
async fn filter_on_even_index_uses_position() {
    let semantic = Semantic::new(RuleModel::new());
    let kept = semantic
        .filter(items(), "The item index is an even number", &options())
        .await
        .unwrap();
    assert_eq!(kept, vec!["horse", "caterpillar", "sandwich"]);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Named {
    name: &'static str,
}

#[tokio::test]
async fn filter_works_on_structured_items() {
    let semantic = Semantic::new(RuleModel::new());
    let named: Vec<Named> = ITEMS.iter().map(|&name| Named { name }).collect();
    let kept = semantic
        .filter(named, "you can ride on or in it", &options())
        .await
        .unwrap();
    assert_eq!(
        kept,
        vec![Named { name: "horse" }, Named { name: "airplane" }]
    );
}

#[tokio::test]
async fn classify_only_returns_supplied_categories() {
    let semantic = Semantic::new(RuleModel::new());
    let categories = Categories::new(["vehicle", "animal", "tool", "food"]).unwrap();

    let classified = semantic
        .classify(items(), &categories, None, &options())
        .await
        .unwrap();

    assert_eq!(classified.len(), ITEMS.len());
    for (pair, original) in classified.iter().zip(ITEMS) {
        assert_eq!(pair.item, original);
        assert!(categories.contains(&pair.category), "{pair:?}");
    }
    let labels: Vec<_> = classified.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(labels, vec!["animal", "tool", "animal", "vehicle", "food"]);
}

#[tokio::test]
async fn classify_rejects_labels_outside_the_set() {
    let semantic = Semantic::new(RuleModel::new());
    let categories = Categories::new(["vehicle", "animal"]).unwrap();

    let err = semantic
        .classify(vec!["horse", "sandwich"], &categories, None, &options())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SemanticError::Evaluation {
            position: 1,
            source: EvaluationError::UnknownLabel { .. }
        }
    ));
}

#[tokio::test]
async fn classify_as_maps_labels_to_enum_variants() {
    let semantic = Semantic::new(RuleModel::new());
    let classified = semantic
        .classify_as::<_, Kind>(items(), Some("what kind of thing is it"), &options())
        .await
        .unwrap();
    let kinds: Vec<Kind> = classified.iter().map(|c| c.category).collect();
    assert_eq!(
        kinds,
        vec![Kind::Animal, Kind::Tool, Kind::Animal, Kind::Vehicle, Kind::Food]
    );
    assert!(kinds.iter().all(|k| Kind::VARIANTS.contains(k)));
}

#[tokio::test]
async fn select_transforms_each_item() {
    let semantic = Semantic::new(RuleModel::new());
    let upper: Vec<String> = semantic
        .select(items(), "shout the item", &options())
        .await
        .unwrap();
    assert_eq!(upper, vec!["HORSE", "TACK", "CATERPILLAR", "AIRPLANE", "SANDWICH"]);
}

#[tokio::test]
async fn single_item_helpers_send_no_position() {
    let semantic = Semantic::new(RuleModel::new());
    let opts = OperatorOptions::new();

    assert!(semantic.matches("a duck", "item is a bird", &opts).await.unwrap());
    assert!(!semantic.matches("a truck", "item is a bird", &opts).await.unwrap());

    // "first or last" cannot hold without a position.
    assert!(!semantic
        .matches("horse", "the item is the first or last", &opts)
        .await
        .unwrap());

    let categories = Categories::new(["vehicle", "animal", "tool", "food"]).unwrap();
    let label = semantic
        .classify_item("airplane", &categories, None, &opts)
        .await
        .unwrap();
    assert_eq!(label, "vehicle");

    let kind: Kind = semantic
        .classify_item_as("tack", None, &opts)
        .await
        .unwrap();
    assert_eq!(kind, Kind::Tool);

    let shouted: String = semantic
        .transform_item("horse", "shout the item", &opts)
        .await
        .unwrap();
    assert_eq!(shouted, "HORSE");
}

#[tokio::test]
async fn max_parallel_one_serialises_model_calls() {
    let model = Arc::new(RuleModel::new());
    let semantic = Semantic::new(Arc::clone(&model));
    semantic
        .filter(
            items(),
            "you can ride on or in it",
            &OperatorOptions::new().with_max_parallel(1),
        )
        .await
        .unwrap();
    assert_eq!(model.peak_in_flight(), 1);
    assert_eq!(model.calls(), ITEMS.len());
}

#[tokio::test]
async fn one_unreachable_item_fails_the_call() {
    let semantic = Semantic::new(RuleModel::new().failing_on("caterpillar"));
    let err = semantic
        .filter(items(), "you can ride on or in it", &options())
        .await
        .unwrap_err();
    assert!(matches!(err, SemanticError::Transform { position: 2, .. }));
    assert!(err.retry_policy().is_retryable());
}

#[tokio::test]
async fn cancellation_before_any_answer_yields_cancelled() {
    let model = Arc::new(RuleModel::with_step(Duration::from_millis(200)));
    let semantic = Semantic::new(Arc::clone(&model));
    let token = CancellationToken::new();
    let opts = options().with_cancellation(token.clone());

    let (result, ()) = tokio::join!(
        semantic.filter(items(), "you can ride on or in it", &opts),
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        },
    );

    assert!(matches!(result, Err(SemanticError::Cancelled)));
    assert!(model.completion_order().is_empty());
}

#[tokio::test]
async fn invalid_arguments_are_configuration_errors() {
    let semantic = Semantic::new(RuleModel::new());

    let empty: [&str; 0] = [];
    assert!(matches!(
        Categories::new(empty),
        Err(SemanticError::Configuration { .. })
    ));

    let err = semantic
        .filter(items(), "rideable", &OperatorOptions::new().with_max_parallel(0))
        .await
        .unwrap_err();
    assert!(matches!(err, SemanticError::Configuration { .. }));

    let err = semantic
        .filter(items(), "   ", &options())
        .await
        .unwrap_err();
    assert!(matches!(err, SemanticError::Configuration { .. }));
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Unlabelled {}

impl LabelSet for Unlabelled {
    const VARIANTS: &'static [Self] = &[];

    fn label(self) -> &'static str {
        match self {}
    }
}

#[tokio::test]
async fn empty_label_set_is_a_configuration_error() {
    let semantic = Semantic::new(RuleModel::new());
    let err = semantic
        .classify_as::<_, Unlabelled>(items(), None, &options())
        .await
        .unwrap_err();
    assert!(matches!(err, SemanticError::Configuration { .. }));
}

#[tokio::test]
async fn empty_input_makes_no_model_calls() {
    let model = Arc::new(RuleModel::new());
    let semantic = Semantic::new(Arc::clone(&model));
    let kept = semantic
        .filter(Vec::<&str>::new(), "you can ride on or in it", &options())
        .await
        .unwrap();
    assert!(kept.is_empty());
    assert_eq!(model.calls(), 0);
}
