//! Item characteristic curves and item information.
//!
//! The baseline adaptive flow uses the 2PL curve
//! `P = 1 / (1 + exp(-a (theta - b)))`. The 3PL variant adds a guessing floor
//! `c` and the 1.7 scaling constant: `P = c + (1 - c) / (1 + exp(-1.7 a (theta - b)))`.

use serde::{Deserialize, Serialize};

use crate::utils::{D_SCALING, DEFAULT_GUESSING, sigmoid};

/// Probability of a correct response under the 2PL model.
#[inline]
pub fn prob_correct(theta: f64, a: f64, b: f64) -> f64 {
    sigmoid(a * (theta - b))
}

/// Probability of a correct response under the 3PL model.
#[inline]
pub fn icc_3pl(theta: f64, a: f64, b: f64, c: f64) -> f64 {
    c + (1.0 - c) * sigmoid(D_SCALING * a * (theta - b))
}

/// Fisher information of a 2PL item: `a^2 P (1 - P)`.
#[inline]
pub fn fisher_information(theta: f64, a: f64, b: f64) -> f64 {
    let p = prob_correct(theta, a, b);
    a * a * p * (1.0 - p)
}

/// Fisher information of a 3PL item: `a^2 (P - c)^2 / (1 - c)^2 * (1 - P) / P`.
///
/// Zero when `P` saturates at exactly 0 or 1.
#[inline]
pub fn fisher_information_3pl(theta: f64, a: f64, b: f64, c: f64) -> f64 {
    let p = icc_3pl(theta, a, b, c);
    if p <= 0.0 || p >= 1.0 {
        return 0.0;
    }
    let lift = (p - c) / (1.0 - c);
    a * a * lift * lift * (1.0 - p) / p
}

/// Response model used for estimation and item ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IrtModel {
    #[default]
    #[serde(rename = "2pl")]
    TwoPl,
    #[serde(rename = "3pl")]
    ThreePl {
        #[serde(default = "default_guessing")]
        guessing: f64,
    },
}

fn default_guessing() -> f64 {
    DEFAULT_GUESSING
}

impl IrtModel {
    pub fn three_pl() -> Self {
        IrtModel::ThreePl {
            guessing: DEFAULT_GUESSING,
        }
    }

    #[inline]
    pub fn probability(&self, theta: f64, a: f64, b: f64) -> f64 {
        match *self {
            IrtModel::TwoPl => prob_correct(theta, a, b),
            IrtModel::ThreePl { guessing } => icc_3pl(theta, a, b, guessing),
        }
    }

    #[inline]
    pub fn information(&self, theta: f64, a: f64, b: f64) -> f64 {
        match *self {
            IrtModel::TwoPl => fisher_information(theta, a, b),
            IrtModel::ThreePl { guessing } => fisher_information_3pl(theta, a, b, guessing),
        }
    }

    /// Per-item weight on the residual `u - P` in the likelihood gradient,
    /// expressed on the same scale as [`IrtModel::information`].
    ///
    /// Returns `(P, weight)`.
    #[inline]
    pub(crate) fn residual_weight(&self, theta: f64, a: f64, b: f64) -> (f64, f64) {
        match *self {
            IrtModel::TwoPl => (prob_correct(theta, a, b), a),
            IrtModel::ThreePl { guessing } => {
                let p = icc_3pl(theta, a, b, guessing);
                if p <= 0.0 {
                    return (p, 0.0);
                }
                (p, a * (p - guessing) / (p * (1.0 - guessing)))
            }
        }
    }

    /// Ratio between the true score-function scale and the
    /// `residual_weight`/`information` scale.
    #[inline]
    pub(crate) fn slope_scale(&self) -> f64 {
        match self {
            IrtModel::TwoPl => 1.0,
            IrtModel::ThreePl { .. } => D_SCALING,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IrtModel::TwoPl => "2pl",
            IrtModel::ThreePl { .. } => "3pl",
        }
    }
}

#[cfg(feature = "python")]
pub use bindings::register;

#[cfg(feature = "python")]
mod bindings {
    use ndarray::Array1;
    use numpy::{PyArray1, PyReadonlyArray1, ToPyArray};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::python::parse_model;
    use crate::utils::DEFAULT_GUESSING;

    /// 2PL probability of a correct response
    #[pyfunction]
    pub fn prob_correct(theta: f64, a: f64, b: f64) -> f64 {
        super::prob_correct(theta, a, b)
    }

    /// 3PL probability with guessing floor `c`
    #[pyfunction]
    #[pyo3(signature = (theta, a, b, c=DEFAULT_GUESSING))]
    pub fn icc_3pl(theta: f64, a: f64, b: f64, c: f64) -> f64 {
        super::icc_3pl(theta, a, b, c)
    }

    /// Fisher information for all items at a given theta
    #[pyfunction]
    #[pyo3(signature = (theta, discrimination, difficulty, model="2pl", guessing=DEFAULT_GUESSING))]
    pub fn item_information<'py>(
        py: Python<'py>,
        theta: f64,
        discrimination: PyReadonlyArray1<f64>,
        difficulty: PyReadonlyArray1<f64>,
        model: &str,
        guessing: f64,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let model = parse_model(model, guessing)?;
        let disc = discrimination.as_array();
        let diff = difficulty.as_array();
        if disc.len() != diff.len() {
            return Err(PyValueError::new_err(
                "discrimination and difficulty must have equal length",
            ));
        }

        let info: Array1<f64> = disc
            .iter()
            .zip(diff.iter())
            .map(|(&a, &b)| model.information(theta, a, b))
            .collect();
        Ok(info.to_pyarray(py))
    }

    /// Register item curve functions with the Python module
    pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(prob_correct, m)?)?;
        m.add_function(wrap_pyfunction!(icc_3pl, m)?)?;
        m.add_function(wrap_pyfunction!(item_information, m)?)?;
        Ok(())
    }
}
