//! Monte-Carlo adaptive sessions against simulated respondents.
//!
//! Used to check how a configuration (stopping thresholds, exposure control)
//! trades test length against estimation accuracy before it goes live.

use rand::prelude::*;
use rand_distr::StandardNormal;
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::item::{AnswerEvent, Item};
use crate::session::{AdaptiveTest, FinalReport, Step};

/// Outcome of one simulated respondent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSession {
    pub true_theta: f64,
    pub report: FinalReport,
    /// Item ids in administration order.
    pub administered: Vec<String>,
}

/// Aggregate accuracy over a batch of simulated respondents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub sessions: Vec<SimulatedSession>,
    pub bias: f64,
    pub rmse: f64,
    pub mean_items: f64,
}

/// Run one session, drawing each answer from the model probability at
/// `true_theta`.
pub fn simulate_session<R: Rng + ?Sized>(
    true_theta: f64,
    pool: &[Item],
    test: &AdaptiveTest,
    rng: &mut R,
) -> SimulatedSession {
    let model = test.config().model;
    let (mut state, mut current) = test.start(pool, rng);
    let mut administered = Vec::new();

    while let Some(item) = current {
        let p = model.probability(true_theta, item.irt.a, item.irt.b);
        let selected = if rng.random::<f64>() < p {
            item.correct_option_index
        } else {
            wrong_option(item)
        };
        administered.push(item.id.clone());

        let event = AnswerEvent::new(item.id.clone(), selected);
        current = match test.submit(&mut state, pool, &event, rng) {
            Ok(Step::Next(next)) => Some(next),
            Ok(Step::Finished(_)) => None,
            Err(e) => {
                tracing::warn!("simulated answer rejected for {}: {e}", item.id);
                None
            }
        };
    }

    SimulatedSession {
        true_theta,
        report: test.finish(&state),
        administered,
    }
}

fn wrong_option(item: &Item) -> usize {
    if item.correct_option_index == 0 { 1 } else { 0 }
}

/// Simulate one session per true ability in parallel.
///
/// Respondent `i` uses its own `Pcg64` seeded with `seed + i`, so results do
/// not depend on thread scheduling.
pub fn simulate_batch(
    true_thetas: &[f64],
    pool: &[Item],
    test: &AdaptiveTest,
    seed: u64,
) -> SimulationSummary {
    let sessions: Vec<SimulatedSession> = true_thetas
        .par_iter()
        .enumerate()
        .map(|(i, &true_theta)| {
            let mut rng = Pcg64::seed_from_u64(seed.wrapping_add(i as u64));
            simulate_session(true_theta, pool, test, &mut rng)
        })
        .collect();

    let n = sessions.len().max(1) as f64;
    let bias = sessions
        .iter()
        .map(|s| s.report.theta - s.true_theta)
        .sum::<f64>()
        / n;
    let mse = sessions
        .iter()
        .map(|s| (s.report.theta - s.true_theta).powi(2))
        .sum::<f64>()
        / n;
    let mean_items = sessions
        .iter()
        .map(|s| s.report.items_answered as f64)
        .sum::<f64>()
        / n;

    SimulationSummary {
        sessions,
        bias,
        rmse: mse.sqrt(),
        mean_items,
    }
}

/// Draw `n` abilities from the standard normal.
pub fn draw_abilities(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = Pcg64::seed_from_u64(seed);
    (0..n).map(|_| rng.sample::<f64, _>(StandardNormal)).collect()
}

/// Evenly spread item bank with difficulties in `[-3, 3]` and discriminations
/// cycling through `[0.8, 1.8]`.
pub fn synthetic_pool(n_items: usize) -> Vec<Item> {
    (0..n_items)
        .map(|j| {
            let b = if n_items > 1 {
                -3.0 + 6.0 * j as f64 / (n_items - 1) as f64
            } else {
                0.0
            };
            let a = 0.8 + 0.25 * (j % 5) as f64;
            Item::new(format!("item-{j:03}"), a, b)
        })
        .collect()
}

#[cfg(feature = "python")]
pub use bindings::register;

#[cfg(feature = "python")]
mod bindings {
    use ndarray::Array1;
    use numpy::{PyArray1, PyReadonlyArray1, ToPyArray};
    use pyo3::prelude::*;

    use crate::config::EngineConfig;
    use crate::python::build_pool;
    use crate::session::AdaptiveTest;

    /// Run batch CAT simulations in parallel
    #[pyfunction]
    #[pyo3(signature = (true_thetas, discrimination, difficulty, seed, config_toml=None))]
    #[allow(clippy::type_complexity)]
    pub fn cat_simulate_batch<'py>(
        py: Python<'py>,
        true_thetas: PyReadonlyArray1<f64>,
        discrimination: PyReadonlyArray1<f64>,
        difficulty: PyReadonlyArray1<f64>,
        seed: u64,
        config_toml: Option<&str>,
    ) -> PyResult<(
        Bound<'py, PyArray1<f64>>,
        Bound<'py, PyArray1<f64>>,
        Bound<'py, PyArray1<i32>>,
    )> {
        let config = match config_toml {
            Some(raw) => EngineConfig::from_toml_str(raw)?,
            None => EngineConfig::default(),
        };
        let thetas = true_thetas.as_array().to_vec();
        let disc = discrimination.as_array().to_vec();
        let diff = difficulty.as_array().to_vec();
        let ids = (0..disc.len()).map(|j| j.to_string()).collect();
        let pool = build_pool(ids, &disc, &diff)?;
        let test = AdaptiveTest::new(config);

        let summary = py.detach(|| super::simulate_batch(&thetas, &pool, &test, seed));

        let theta_est: Array1<f64> = summary.sessions.iter().map(|s| s.report.theta).collect();
        let se_est: Array1<f64> = summary
            .sessions
            .iter()
            .map(|s| s.report.standard_error.unwrap_or(f64::INFINITY))
            .collect();
        let n_items: Array1<i32> = summary
            .sessions
            .iter()
            .map(|s| s.report.items_answered as i32)
            .collect();

        Ok((
            theta_est.to_pyarray(py),
            se_est.to_pyarray(py),
            n_items.to_pyarray(py),
        ))
    }

    /// Register simulation functions with the Python module
    pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(cat_simulate_batch, m)?)?;
        Ok(())
    }
}
