//! Ability (theta) estimation from scored responses.
//!
//! Two entry points cover the two ways a session uses the estimator:
//! - `estimate_theta`: fixed-iteration Newton-Raphson maximum likelihood over
//!   the full answer history, used for final scoring
//! - `update_theta_online`: a single gradient step after one new answer, used
//!   between items so the history is not re-scanned every turn

use rayon::prelude::*;

use crate::icc::{IrtModel, prob_correct};
use crate::item::Response;
use crate::utils::clip;

/// Newton-Raphson iteration cap.
pub const DEFAULT_MAX_ITER: usize = 10;

/// Step size of the online update.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Bound applied to 3PL iterates, whose information vanishes at low theta.
pub const THETA_BOUND_3PL: f64 = 6.0;

/// Maximum-likelihood theta under the 2PL model, starting from 0.
///
/// Returns the prior 0.0 for an empty history.
pub fn estimate_theta(responses: &[Response]) -> f64 {
    estimate_theta_with(IrtModel::TwoPl, responses, DEFAULT_MAX_ITER)
}

/// Maximum-likelihood theta under `model` with at most `max_iter` steps.
pub fn estimate_theta_with(model: IrtModel, responses: &[Response], max_iter: usize) -> f64 {
    newton_raphson_path(model, responses, max_iter)
        .last()
        .copied()
        .unwrap_or(0.0)
}

/// Every iterate of the Newton-Raphson fit, starting with the initial 0.0.
///
/// Iteration stops early when the total information is exactly zero.
pub fn newton_raphson_path(model: IrtModel, responses: &[Response], max_iter: usize) -> Vec<f64> {
    let mut theta = 0.0;
    let mut path = Vec::with_capacity(max_iter + 1);
    path.push(theta);

    for _ in 0..max_iter {
        let mut numerator = 0.0;
        let mut denominator = 0.0;

        for r in responses {
            let (p, weight) = model.residual_weight(theta, r.a, r.b);
            numerator += weight * (r.score() - p);
            denominator += model.information(theta, r.a, r.b);
        }

        if denominator == 0.0 {
            break;
        }

        theta += numerator / (model.slope_scale() * denominator);
        if let IrtModel::ThreePl { .. } = model {
            theta = clip(theta, -THETA_BOUND_3PL, THETA_BOUND_3PL);
        }
        path.push(theta);
    }

    path
}

/// One online step after a single answer:
/// `theta + lr * a * (correct - P(theta))`.
#[inline]
pub fn update_theta_online(theta: f64, a: f64, b: f64, correct: bool, lr: f64) -> f64 {
    let u = if correct { 1.0 } else { 0.0 };
    theta + lr * a * (u - prob_correct(theta, a, b))
}

/// Online step under an arbitrary model, following the log-likelihood slope.
#[inline]
pub fn update_theta_online_with(model: IrtModel, theta: f64, response: &Response, lr: f64) -> f64 {
    let (p, weight) = model.residual_weight(theta, response.a, response.b);
    theta + lr * model.slope_scale() * weight * (response.score() - p)
}

/// Sum of item information over the answered items.
pub fn test_information(model: IrtModel, theta: f64, responses: &[Response]) -> f64 {
    let scale = model.slope_scale();
    responses
        .iter()
        .map(|r| model.information(theta, r.a, r.b))
        .sum::<f64>()
        * scale
        * scale
}

/// Standard error of a 2PL theta estimate, `1 / sqrt(total information)`.
///
/// `None` when the total information is exactly zero.
pub fn standard_error(theta: f64, responses: &[Response]) -> Option<f64> {
    standard_error_with(IrtModel::TwoPl, theta, responses)
}

pub fn standard_error_with(model: IrtModel, theta: f64, responses: &[Response]) -> Option<f64> {
    let info = test_information(model, theta, responses);
    if info == 0.0 {
        None
    } else {
        Some(1.0 / info.sqrt())
    }
}

/// Final-score estimates for many independent sessions in parallel.
pub fn estimate_theta_batch(
    model: IrtModel,
    sessions: &[Vec<Response>],
    max_iter: usize,
) -> Vec<f64> {
    sessions
        .par_iter()
        .map(|responses| estimate_theta_with(model, responses, max_iter))
        .collect()
}

#[cfg(feature = "python")]
pub use bindings::register;

#[cfg(feature = "python")]
mod bindings {
    use numpy::PyReadonlyArray1;
    use pyo3::prelude::*;

    use super::{DEFAULT_LEARNING_RATE, DEFAULT_MAX_ITER};
    use crate::python::{build_responses, parse_model};
    use crate::utils::DEFAULT_GUESSING;

    /// Maximum-likelihood theta from scored responses
    #[pyfunction]
    #[pyo3(signature = (discrimination, difficulty, correct, model="2pl", guessing=DEFAULT_GUESSING, max_iter=DEFAULT_MAX_ITER))]
    pub fn estimate_theta(
        discrimination: PyReadonlyArray1<f64>,
        difficulty: PyReadonlyArray1<f64>,
        correct: PyReadonlyArray1<bool>,
        model: &str,
        guessing: f64,
        max_iter: usize,
    ) -> PyResult<f64> {
        let model = parse_model(model, guessing)?;
        let responses = build_responses(
            &discrimination.as_array().to_vec(),
            &difficulty.as_array().to_vec(),
            &correct.as_array().to_vec(),
        )?;
        Ok(super::estimate_theta_with(model, &responses, max_iter))
    }

    /// Single online theta step after one answer
    #[pyfunction]
    #[pyo3(signature = (theta, a, b, correct, lr=DEFAULT_LEARNING_RATE))]
    pub fn update_theta_online(theta: f64, a: f64, b: f64, correct: bool, lr: f64) -> f64 {
        super::update_theta_online(theta, a, b, correct, lr)
    }

    /// Standard error of theta, or None without information
    #[pyfunction]
    pub fn standard_error(
        theta: f64,
        discrimination: PyReadonlyArray1<f64>,
        difficulty: PyReadonlyArray1<f64>,
    ) -> PyResult<Option<f64>> {
        let disc = discrimination.as_array().to_vec();
        let diff = difficulty.as_array().to_vec();
        let correct = vec![false; disc.len()];
        let responses = build_responses(&disc, &diff, &correct)?;
        Ok(super::standard_error(theta, &responses))
    }

    /// Register estimation functions with the Python module
    pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(estimate_theta, m)?)?;
        m.add_function(wrap_pyfunction!(update_theta_online, m)?)?;
        m.add_function(wrap_pyfunction!(standard_error, m)?)?;
        Ok(())
    }
}
