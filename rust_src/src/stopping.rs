//! Termination rule for the adaptive sequence.

use serde::{Deserialize, Serialize};

use crate::estimation::standard_error_with;
use crate::icc::IrtModel;
use crate::item::Response;

pub const DEFAULT_MAX_ITEMS: usize = 20;
pub const DEFAULT_SE_THRESHOLD: f64 = 0.35;

/// Stop after `max_items` answers, or earlier once the standard error of
/// theta drops below `se_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingRule {
    pub max_items: usize,
    pub se_threshold: f64,
    /// Answers required before the precision criterion may end the test.
    pub min_items: usize,
}

impl Default for StoppingRule {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            se_threshold: DEFAULT_SE_THRESHOLD,
            min_items: 0,
        }
    }
}

/// Why an adaptive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxItems,
    Precision,
    PoolExhausted,
}

impl StoppingRule {
    pub fn should_stop(&self, theta: f64, answers: &[Response]) -> bool {
        self.evaluate(IrtModel::TwoPl, theta, answers).is_some()
    }

    /// The reason to stop now, if any. The item ceiling wins over precision.
    pub fn evaluate(&self, model: IrtModel, theta: f64, answers: &[Response]) -> Option<StopReason> {
        if answers.len() >= self.max_items {
            return Some(StopReason::MaxItems);
        }
        if answers.len() < self.min_items {
            return None;
        }
        match standard_error_with(model, theta, answers) {
            Some(se) if se < self.se_threshold => Some(StopReason::Precision),
            _ => None,
        }
    }
}

/// Default rule: 20 answers or a standard error below 0.35.
pub fn should_stop(theta: f64, answers: &[Response]) -> bool {
    StoppingRule::default().should_stop(theta, answers)
}

#[cfg(feature = "python")]
pub use bindings::register;

#[cfg(feature = "python")]
mod bindings {
    use numpy::PyReadonlyArray1;
    use pyo3::prelude::*;

    use super::{DEFAULT_MAX_ITEMS, DEFAULT_SE_THRESHOLD, StoppingRule};
    use crate::python::build_responses;

    /// Stopping rule over the answered items
    #[pyfunction]
    #[pyo3(signature = (theta, discrimination, difficulty, correct, max_items=DEFAULT_MAX_ITEMS, se_threshold=DEFAULT_SE_THRESHOLD))]
    pub fn should_stop(
        theta: f64,
        discrimination: PyReadonlyArray1<f64>,
        difficulty: PyReadonlyArray1<f64>,
        correct: PyReadonlyArray1<bool>,
        max_items: usize,
        se_threshold: f64,
    ) -> PyResult<bool> {
        let responses = build_responses(
            &discrimination.as_array().to_vec(),
            &difficulty.as_array().to_vec(),
            &correct.as_array().to_vec(),
        )?;
        let rule = StoppingRule {
            max_items,
            se_threshold,
            ..StoppingRule::default()
        };
        Ok(rule.should_stop(theta, &responses))
    }

    /// Register stopping functions with the Python module
    pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(should_stop, m)?)?;
        Ok(())
    }
}
