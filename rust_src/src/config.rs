//! Engine configuration.
//!
//! Every section is optional; omitted values fall back to the documented
//! defaults. Example:
//!
//! ```toml
//! [model]
//! kind = "3pl"
//! guessing = 0.2
//!
//! [selection]
//! strategy = "maximum_information"
//! top_k = 4
//!
//! [stopping]
//! max_items = 25
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::estimation::{DEFAULT_LEARNING_RATE, DEFAULT_MAX_ITER};
use crate::icc::IrtModel;
use crate::selection::{ExposureControl, SelectionStrategy};
use crate::stopping::StoppingRule;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub model: IrtModel,
    pub estimator: EstimatorConfig,
    pub selection: SelectionConfig,
    pub stopping: StoppingRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Newton-Raphson iterations for the final fit.
    pub iterations: usize,
    /// Step size of the per-answer online update.
    pub learning_rate: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_MAX_ITER,
            learning_rate: DEFAULT_LEARNING_RATE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub strategy: SelectionStrategy,
    #[serde(flatten)]
    pub exposure: ExposureControl,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if let IrtModel::ThreePl { guessing } = self.model {
            if !(0.0..1.0).contains(&guessing) {
                return Err(invalid(format!("guessing must be in [0, 1), got {guessing}")));
            }
        }
        if !self.estimator.learning_rate.is_finite() || self.estimator.learning_rate <= 0.0 {
            return Err(invalid(format!(
                "learning_rate must be positive, got {}",
                self.estimator.learning_rate
            )));
        }
        if self.selection.exposure.top_k == 0 {
            return Err(invalid("top_k must be at least 1".to_string()));
        }
        let p_expose = self.selection.exposure.p_expose;
        if !(0.0..=1.0).contains(&p_expose) {
            return Err(invalid(format!("p_expose must be in [0, 1], got {p_expose}")));
        }
        if self.stopping.max_items == 0 {
            return Err(invalid("max_items must be at least 1".to_string()));
        }
        if self.stopping.se_threshold.is_nan() || self.stopping.se_threshold <= 0.0 {
            return Err(invalid(format!(
                "se_threshold must be positive, got {}",
                self.stopping.se_threshold
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> EngineError {
    EngineError::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.model, IrtModel::TwoPl);
        assert_eq!(config.estimator.iterations, 10);
        assert_eq!(config.estimator.learning_rate, 0.1);
        assert_eq!(config.selection.strategy, SelectionStrategy::ClosestDifficulty);
        assert_eq!(config.selection.exposure.top_k, 5);
        assert_eq!(config.selection.exposure.p_expose, 0.6);
        assert_eq!(config.stopping.max_items, 20);
        assert_eq!(config.stopping.se_threshold, 0.35);
    }

    #[test]
    fn full_document() {
        let raw = r#"
            [model]
            kind = "3pl"
            guessing = 0.2

            [estimator]
            iterations = 25

            [selection]
            strategy = "maximum_information"
            top_k = 4
            p_expose = 0.5

            [stopping]
            max_items = 30
            se_threshold = 0.3
            min_items = 5
        "#;
        let config = EngineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.model, IrtModel::ThreePl { guessing: 0.2 });
        assert_eq!(config.estimator.iterations, 25);
        assert_eq!(config.estimator.learning_rate, 0.1);
        assert_eq!(config.selection.strategy, SelectionStrategy::MaximumInformation);
        assert_eq!(config.selection.exposure.top_k, 4);
        assert_eq!(config.selection.exposure.p_expose, 0.5);
        assert_eq!(config.stopping.min_items, 5);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            "[model]\nkind = \"3pl\"\nguessing = 1.0",
            "[estimator]\nlearning_rate = -0.1",
            "[selection]\ntop_k = 0",
            "[selection]\np_expose = 1.5",
            "[stopping]\nmax_items = 0",
            "[stopping]\nse_threshold = 0.0",
        ];
        for raw in cases {
            let err = EngineConfig::from_toml_str(raw).unwrap_err();
            assert!(matches!(err, EngineError::InvalidConfig(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = EngineConfig::from_toml_str("[stopping\nmax_items = 3").unwrap_err();
        assert!(matches!(err, EngineError::Toml(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stopping]\nmax_items = 12").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.stopping.max_items, 12);
    }
}
