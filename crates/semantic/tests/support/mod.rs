//! Shared test collaborator.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use semantic::{ModelCollaborator, ModelRequest, ModelResponse, ResultShape, TransformError};
use serde_json::Value;
use tokio::sync::watch;

pub const ITEMS: [&str; 5] = ["horse", "tack", "caterpillar", "airplane", "sandwich"];

const RIDEABLE: [&str; 2] = ["horse", "airplane"];

fn kind_of(item: &str) -> &'static str {
    match item {
        "horse" | "caterpillar" => "animal",
        "tack" => "tool",
        "airplane" => "vehicle",
        _ => "food",
    }
}

/// The thing an item names: the `name` field of a JSON object, or the text itself.
fn subject(item: &str) -> String {
    match serde_json::from_str::<Value>(item) {
        Ok(Value::Object(fields)) => fields
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(item)
            .to_string(),
        _ => item.to_string(),
    }
}

/// Answers requests with fixed rules instead of a real model.
///
/// Positional requests are delayed by `(count - index) * step`. A model built
/// with [`RuleModel::in_reverse`] instead holds each positional request until
/// every later position has finished, so completion order is exactly the
/// reverse of input order.
pub struct RuleModel {
    step: Duration,
    finished: Option<watch::Sender<usize>>,
    fail_on: Option<&'static str>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl RuleModel {
    pub fn new() -> Self {
        Self::with_step(Duration::from_millis(5))
    }

    pub fn with_step(step: Duration) -> Self {
        Self {
            step,
            finished: None,
            fail_on: None,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Releases positional requests last-to-first instead of by delay.
    ///
    /// Every item of the call must be in flight at once, or the call stalls.
    pub fn in_reverse() -> Self {
        let (finished, _) = watch::channel(0);
        Self {
            finished: Some(finished),
            ..Self::with_step(Duration::ZERO)
        }
    }

    /// Makes every request for `item` fail as unreachable.
    pub fn failing_on(mut self, item: &'static str) -> Self {
        self.fail_on = Some(item);
        self
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Items in the order their requests finished.
    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    fn answer(&self, request: &ModelRequest) -> Result<Value, TransformError> {
        if self.fail_on == Some(request.item.as_str()) {
            return Err(TransformError::Unreachable {
                message: format!("no route for {}", request.item),
            });
        }
        let instruction = request.instruction.as_str().to_lowercase();
        let subject = subject(&request.item);
        let answer = match &request.shape {
            ResultShape::Boolean => {
                let decision = if instruction.contains("ride") {
                    RIDEABLE.contains(&subject.as_str())
                } else if instruction.contains("first or last") {
                    request.position.is_some_and(|p| p.is_first() || p.is_last())
                } else if instruction.contains("even") {
                    request.position.is_some_and(|p| p.index() % 2 == 0)
                } else if instruction.contains("bird") {
                    subject.contains("duck")
                } else {
                    false
                };
                Value::Bool(decision)
            }
            ResultShape::Label { .. } => Value::String(kind_of(&subject).to_string()),
            ResultShape::Value => Value::String(subject.to_uppercase()),
        };
        Ok(answer)
    }
}

#[async_trait]
impl ModelCollaborator for RuleModel {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        match (&self.finished, request.position) {
            (Some(finished), Some(p)) => {
                let later = p.count() - p.index() - 1;
                let mut finished = finished.subscribe();
                finished.wait_for(|&done| done >= later).await.unwrap();
            }
            _ => {
                let delay = request.position.map_or(Duration::ZERO, |p| {
                    self.step * u32::try_from(p.count() - p.index()).unwrap_or(u32::MAX)
                });
                tokio::time::sleep(delay).await;
            }
        }

        let answer = self.answer(&request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().push(request.item);
        if let Some(finished) = &self.finished {
            finished.send_modify(|done| *done += 1);
        }
        answer.map(ModelResponse::new)
    }
}
