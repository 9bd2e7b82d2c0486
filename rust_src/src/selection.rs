//! Next-item selection.
//!
//! Two policies are available:
//! - closest difficulty: deterministic, picks the unused item whose `b` is
//!   nearest the current theta
//! - maximum information with exposure control: ranks unused items by
//!   information at theta and draws from the top K with a seeded source

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::icc::IrtModel;
use crate::item::Item;
use crate::utils::clip;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_P_EXPOSE: f64 = 0.6;

/// Randomized exposure control for maximum-information selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureControl {
    /// Size of the candidate set drawn from.
    pub top_k: usize,
    /// Probability of administering the single most informative item.
    pub p_expose: f64,
}

impl Default for ExposureControl {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            p_expose: DEFAULT_P_EXPOSE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    ClosestDifficulty,
    MaximumInformation,
}

/// Unused item whose difficulty is closest to `theta`.
///
/// Ties go to the item that comes first in `pool`. `None` once every pool
/// item has been asked.
pub fn select_next<'a>(theta: f64, asked: &HashSet<String>, pool: &'a [Item]) -> Option<&'a Item> {
    let mut best: Option<&Item> = None;
    let mut best_dist = f64::INFINITY;

    for item in pool {
        if asked.contains(&item.id) {
            continue;
        }
        let dist = (item.irt.b - theta).abs();
        if best.is_none() || dist < best_dist {
            best = Some(item);
            best_dist = dist;
        }
    }

    best
}

/// Maximum-information selection under the 2PL model.
pub fn select_next_by_information<'a, R: Rng + ?Sized>(
    theta: f64,
    pool: &'a [Item],
    asked: &HashSet<String>,
    exposure: &ExposureControl,
    rng: &mut R,
) -> Option<&'a Item> {
    select_next_by_information_with(IrtModel::TwoPl, theta, pool, asked, exposure, rng)
}

/// Rank unused items by information at `theta` and draw one from the top K.
///
/// With probability `p_expose` the most informative item is returned,
/// otherwise one of the top K uniformly. Equal information keeps pool order.
pub fn select_next_by_information_with<'a, R: Rng + ?Sized>(
    model: IrtModel,
    theta: f64,
    pool: &'a [Item],
    asked: &HashSet<String>,
    exposure: &ExposureControl,
    rng: &mut R,
) -> Option<&'a Item> {
    let mut ranked: Vec<(f64, &Item)> = pool
        .iter()
        .filter(|item| !asked.contains(&item.id))
        .map(|item| (model.information(theta, item.irt.a, item.irt.b), item))
        .collect();

    if ranked.is_empty() {
        return None;
    }

    ranked.sort_by(|x, y| y.0.total_cmp(&x.0));
    ranked.truncate(exposure.top_k.max(1));

    let p_expose = clip(exposure.p_expose, 0.0, 1.0);
    if rng.random::<f64>() < p_expose {
        Some(ranked[0].1)
    } else {
        Some(ranked[rng.random_range(0..ranked.len())].1)
    }
}

/// Generator for one selection turn of a seeded session.
///
/// Mixing the answer count into the seed gives each turn its own draw while
/// keeping a replayed session identical.
pub fn turn_rng(seed: u64, answered: usize) -> Pcg64 {
    Pcg64::seed_from_u64(seed.wrapping_add(answered as u64))
}

/// Dispatch on a configured strategy.
pub fn select_item<'a, R: Rng + ?Sized>(
    strategy: SelectionStrategy,
    model: IrtModel,
    exposure: &ExposureControl,
    theta: f64,
    asked: &HashSet<String>,
    pool: &'a [Item],
    rng: &mut R,
) -> Option<&'a Item> {
    match strategy {
        SelectionStrategy::ClosestDifficulty => select_next(theta, asked, pool),
        SelectionStrategy::MaximumInformation => {
            select_next_by_information_with(model, theta, pool, asked, exposure, rng)
        }
    }
}

#[cfg(feature = "python")]
pub use bindings::register;

#[cfg(feature = "python")]
mod bindings {
    use std::collections::HashSet;

    use numpy::PyReadonlyArray1;
    use pyo3::prelude::*;

    use super::{DEFAULT_P_EXPOSE, DEFAULT_TOP_K, ExposureControl, turn_rng};
    use crate::python::build_pool;

    /// Closest-difficulty selection; returns the item id or None
    #[pyfunction]
    pub fn select_next(
        theta: f64,
        item_ids: Vec<String>,
        discrimination: PyReadonlyArray1<f64>,
        difficulty: PyReadonlyArray1<f64>,
        asked: HashSet<String>,
    ) -> PyResult<Option<String>> {
        let pool = build_pool(
            item_ids,
            &discrimination.as_array().to_vec(),
            &difficulty.as_array().to_vec(),
        )?;
        Ok(super::select_next(theta, &asked, &pool).map(|item| item.id.clone()))
    }

    /// Maximum-information selection with seeded exposure control.
    ///
    /// `seed` is a per-session seed; the draw is mixed with `len(asked)` so
    /// successive turns of one session get fresh draws. Reusing a seed across
    /// sessions replays the same exposure decisions.
    #[pyfunction]
    #[pyo3(signature = (theta, item_ids, discrimination, difficulty, asked, seed, top_k=DEFAULT_TOP_K, p_expose=DEFAULT_P_EXPOSE))]
    #[allow(clippy::too_many_arguments)]
    pub fn select_next_by_information(
        theta: f64,
        item_ids: Vec<String>,
        discrimination: PyReadonlyArray1<f64>,
        difficulty: PyReadonlyArray1<f64>,
        asked: HashSet<String>,
        seed: u64,
        top_k: usize,
        p_expose: f64,
    ) -> PyResult<Option<String>> {
        let pool = build_pool(
            item_ids,
            &discrimination.as_array().to_vec(),
            &difficulty.as_array().to_vec(),
        )?;
        let exposure = ExposureControl { top_k, p_expose };
        let mut rng = turn_rng(seed, asked.len());
        Ok(
            super::select_next_by_information(theta, &pool, &asked, &exposure, &mut rng)
                .map(|item| item.id.clone()),
        )
    }

    /// Register selection functions with the Python module
    pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(select_next, m)?)?;
        m.add_function(wrap_pyfunction!(select_next_by_information, m)?)?;
        Ok(())
    }
}
