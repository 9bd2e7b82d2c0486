//! Adaptive testing engine for online ability quizzes.
//!
//! This crate provides:
//! - 2PL/3PL item characteristic curves and Fisher information
//! - Newton-Raphson maximum-likelihood theta estimation and online updates
//! - Closest-difficulty and maximum-information item selection with
//!   seeded exposure control
//! - Item-count and standard-error stopping rules
//! - IQ score, percentile and ability band conversion
//! - A session driver with a pluggable session store
//! - Parallel CAT simulation for tuning configurations
//!
//! With the `python` feature the crate builds as the `iqcat` Python module.

pub mod utils;

pub mod config;
pub mod error;
pub mod estimation;
pub mod icc;
pub mod item;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod simulation;
pub mod stopping;

#[cfg(feature = "python")]
pub mod python;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use estimation::{estimate_theta, standard_error, update_theta_online};
pub use icc::{IrtModel, fisher_information, prob_correct};
pub use item::{AnswerEvent, IrtParams, Item, Response};
pub use scoring::{AbilityBand, NormativeDistribution, ability_summary, iq_score, percentile};
pub use selection::{ExposureControl, SelectionStrategy, select_next, select_next_by_information};
pub use session::{AdaptiveTest, FinalReport, InMemorySessionStore, SessionState, SessionStore, Step};
pub use stopping::{StopReason, StoppingRule, should_stop};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module for iqcat
#[cfg(feature = "python")]
#[pymodule]
fn iqcat(m: &Bound<'_, PyModule>) -> PyResult<()> {
    icc::register(m)?;
    estimation::register(m)?;
    selection::register(m)?;
    stopping::register(m)?;
    scoring::register(m)?;
    simulation::register(m)?;
    Ok(())
}
