//! Conversions shared by the per-module Python bindings.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::EngineError;
use crate::icc::IrtModel;
use crate::item::{IrtParams, Item, Response};

impl From<EngineError> for PyErr {
    fn from(err: EngineError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

pub(crate) fn parse_model(model: &str, guessing: f64) -> PyResult<IrtModel> {
    match model {
        "2pl" => Ok(IrtModel::TwoPl),
        "3pl" => Ok(IrtModel::ThreePl { guessing }),
        other => Err(PyValueError::new_err(format!(
            "unknown model '{other}', expected '2pl' or '3pl'"
        ))),
    }
}

pub(crate) fn build_responses(
    discrimination: &[f64],
    difficulty: &[f64],
    correct: &[bool],
) -> PyResult<Vec<Response>> {
    if discrimination.len() != difficulty.len() || difficulty.len() != correct.len() {
        return Err(PyValueError::new_err(
            "discrimination, difficulty and correct must have equal length",
        ));
    }
    Ok(discrimination
        .iter()
        .zip(difficulty)
        .zip(correct)
        .map(|((&a, &b), &u)| Response::new(IrtParams::new(a, b), u))
        .collect())
}

pub(crate) fn build_pool(
    item_ids: Vec<String>,
    discrimination: &[f64],
    difficulty: &[f64],
) -> PyResult<Vec<Item>> {
    if item_ids.len() != discrimination.len() || discrimination.len() != difficulty.len() {
        return Err(PyValueError::new_err(
            "item_ids, discrimination and difficulty must have equal length",
        ));
    }
    Ok(item_ids
        .into_iter()
        .zip(discrimination.iter().zip(difficulty))
        .map(|(id, (&a, &b))| Item::new(id, a, b))
        .collect())
}
