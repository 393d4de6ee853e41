//! Prompt rendering for [`ModelRequest`]s.
//!
//! The system message fixes the answer contract: a JSON object whose `result`
//! field has the requested shape. The user message carries the instruction,
//! the item and, for items in a sequence, their position.

use semantic::{IndexContext, ModelRequest, ResultShape};

use crate::wire::ChatMessage;

const PREAMBLE: &str = "You evaluate a single item against an instruction. \
Reply with a JSON object and nothing else.";

fn answer_contract(shape: &ResultShape) -> String {
    match shape {
        ResultShape::Boolean => "The object must be {\"result\": true} if the instruction holds \
for the item and {\"result\": false} otherwise."
            .to_string(),
        ResultShape::Label { categories } => format!(
            "The object must be {{\"result\": \"<category>\"}} where <category> is exactly one of: \
{categories}. Never answer with a category outside that list."
        ),
        ResultShape::Value => "The object must be {\"result\": <value>} where <value> is the item \
transformed as instructed, expressed as JSON."
            .to_string(),
    }
}

fn position_sentence(position: IndexContext) -> String {
    format!(
        "Position: the item is at index {} (0-based) of {} items; the first item has index 0 and \
the last item has index {}.",
        position.index(),
        position.count(),
        position.count().saturating_sub(1)
    )
}

/// Renders the chat messages for one request.
pub(crate) fn render(request: &ModelRequest) -> Vec<ChatMessage> {
    let system = format!("{PREAMBLE} {}", answer_contract(&request.shape));

    let mut user = format!(
        "Instruction: {}\nItem: {}",
        request.instruction, request.item
    );
    if let Some(position) = request.position {
        user.push('\n');
        user.push_str(&position_sentence(position));
    }

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
