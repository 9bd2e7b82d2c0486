//! Item bank records and the flattened response view the estimators consume.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Item parameters on the IRT scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IrtParams {
    /// Discrimination, expected to be positive.
    pub a: f64,
    /// Difficulty.
    pub b: f64,
}

impl IrtParams {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }
}

/// A question from the bank. Only `irt` and the answer key matter for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option_index: usize,
    pub irt: IrtParams,
}

impl Item {
    /// Item with placeholder display fields, mostly for tests and simulation.
    pub fn new(id: impl Into<String>, a: f64, b: f64) -> Self {
        Self {
            id: id.into(),
            prompt: String::new(),
            options: vec![String::new(); 4],
            correct_option_index: 0,
            irt: IrtParams::new(a, b),
        }
    }

    /// Resolve a selected option against the answer key.
    pub fn score(&self, selected_option: usize) -> Result<Response> {
        if selected_option >= self.options.len() {
            return Err(EngineError::OptionOutOfRange {
                item_id: self.id.clone(),
                selected: selected_option,
                options: self.options.len(),
            });
        }
        Ok(Response::new(
            self.irt,
            selected_option == self.correct_option_index,
        ))
    }
}

/// One answered item: its parameters and whether the answer was right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub a: f64,
    pub b: f64,
    pub correct: bool,
}

impl Response {
    pub fn new(params: IrtParams, correct: bool) -> Self {
        Self {
            a: params.a,
            b: params.b,
            correct,
        }
    }

    #[inline]
    pub fn score(&self) -> f64 {
        if self.correct { 1.0 } else { 0.0 }
    }
}

/// Raw answer as submitted by the respondent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub item_id: String,
    pub selected_option: usize,
}

impl AnswerEvent {
    pub fn new(item_id: impl Into<String>, selected_option: usize) -> Self {
        Self {
            item_id: item_id.into(),
            selected_option,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_against_answer_key() {
        let mut item = Item::new("q1", 1.2, -0.4);
        item.correct_option_index = 2;

        let right = item.score(2).unwrap();
        assert!(right.correct);
        assert_eq!(right.a, 1.2);
        assert_eq!(right.b, -0.4);

        assert!(!item.score(0).unwrap().correct);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let item = Item::new("q1", 1.0, 0.0);
        let err = item.score(4).unwrap_err();
        assert!(matches!(err, EngineError::OptionOutOfRange { selected: 4, options: 4, .. }));
    }

    #[test]
    fn item_deserializes_without_prompt() {
        let item: Item = serde_json::from_str(
            r#"{"id": "q9", "options": ["2", "4", "8", "16"], "correct_option_index": 1, "irt": {"a": 0.8, "b": 1.5}}"#,
        )
        .unwrap();
        assert_eq!(item.irt, IrtParams::new(0.8, 1.5));
        assert!(item.prompt.is_empty());
        assert!(item.score(1).unwrap().correct);
    }
}
