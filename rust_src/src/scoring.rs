//! Conversion of theta into reportable scores.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const IQ_MEAN: f64 = 100.0;
pub const IQ_SD: f64 = 15.0;

/// Standardized score `15 * theta + 100`. Not clamped.
#[inline]
pub fn iq_score(theta: f64) -> f64 {
    IQ_SD * theta + IQ_MEAN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityBand {
    #[serde(rename = "below average")]
    BelowAverage,
    #[serde(rename = "around average")]
    AroundAverage,
    #[serde(rename = "above average")]
    AboveAverage,
}

impl AbilityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityBand::BelowAverage => "below average",
            AbilityBand::AroundAverage => "around average",
            AbilityBand::AboveAverage => "above average",
        }
    }
}

impl fmt::Display for AbilityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative band: below -1, then below 1, then above.
pub fn ability_summary(theta: f64) -> AbilityBand {
    if theta < -1.0 {
        AbilityBand::BelowAverage
    } else if theta < 1.0 {
        AbilityBand::AroundAverage
    } else {
        AbilityBand::AboveAverage
    }
}

/// Share of `distribution` at or below `score`, in percent.
pub fn percentile(score: f64, distribution: &[f64]) -> Result<f64> {
    if distribution.is_empty() {
        return Err(EngineError::EmptyDistribution);
    }
    let at_or_below = distribution.iter().filter(|&&x| x <= score).count();
    Ok(100.0 * at_or_below as f64 / distribution.len() as f64)
}

/// Reference IQ scores used for percentile lookup. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormativeDistribution {
    scores: Vec<f64>,
}

impl NormativeDistribution {
    pub fn new(scores: Vec<f64>) -> Result<Self> {
        if scores.is_empty() {
            return Err(EngineError::EmptyDistribution);
        }
        Ok(Self { scores })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn percentile(&self, score: f64) -> f64 {
        let at_or_below = self.scores.iter().filter(|&&x| x <= score).count();
        100.0 * at_or_below as f64 / self.scores.len() as f64
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl<'de> Deserialize<'de> for NormativeDistribution {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let scores = Vec::<f64>::deserialize(deserializer)?;
        NormativeDistribution::new(scores).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "python")]
pub use bindings::register;

#[cfg(feature = "python")]
mod bindings {
    use numpy::PyReadonlyArray1;
    use pyo3::prelude::*;

    #[pyfunction]
    pub fn iq_score(theta: f64) -> f64 {
        super::iq_score(theta)
    }

    #[pyfunction]
    pub fn ability_summary(theta: f64) -> &'static str {
        super::ability_summary(theta).as_str()
    }

    /// Percentile of `score`; raises ValueError on an empty distribution
    #[pyfunction]
    pub fn percentile(score: f64, distribution: PyReadonlyArray1<f64>) -> PyResult<f64> {
        let dist = distribution.as_array().to_vec();
        Ok(super::percentile(score, &dist)?)
    }

    /// Register scoring functions with the Python module
    pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(iq_score, m)?)?;
        m.add_function(wrap_pyfunction!(ability_summary, m)?)?;
        m.add_function(wrap_pyfunction!(percentile, m)?)?;
        Ok(())
    }
}
