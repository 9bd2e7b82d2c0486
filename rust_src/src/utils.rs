//! Shared numeric helpers for the IRT kernels.

/// Logistic scaling constant used by the 3PL curve.
pub const D_SCALING: f64 = 1.7;

/// Guessing floor for four-option items.
pub const DEFAULT_GUESSING: f64 = 0.25;

/// Logistic function that never evaluates `exp` of a positive argument.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let exp_x = x.exp();
        exp_x / (1.0 + exp_x)
    }
}

#[inline]
pub fn clip(x: f64, min: f64, max: f64) -> f64 {
    x.max(min).min(max)
}
