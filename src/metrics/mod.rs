//! Binary classification metrics.
//!
//! Provides log-loss and thresholded accuracy over predicted probabilities,
//! the two quality numbers reported per fold and overall.

/// Clipping bound keeping probabilities away from 0 and 1 inside the logs.
/// Must be representable in f32 on both sides: `1.0 - EPS` has to be
/// strictly below 1.0.
const EPS: f32 = 1e-7;

/// Computes binary cross-entropy (log loss) over predicted probabilities.
///
/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logs, so
/// confident wrong answers stay finite.
///
/// # Arguments
///
/// * `y_prob` - Predicted probabilities in [0, 1]
/// * `y_true` - True binary targets (0.0 or 1.0)
///
/// # Panics
///
/// Panics if the slices have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use icefold::metrics::log_loss;
///
/// let y_true = [1.0, 0.0, 1.0];
/// let y_prob = [0.9, 0.1, 0.8];
/// let loss = log_loss(&y_prob, &y_true);
/// assert!(loss > 0.0 && loss < 0.2);
/// ```
#[must_use]
pub fn log_loss(y_prob: &[f32], y_true: &[f32]) -> f32 {
    assert_eq!(y_prob.len(), y_true.len(), "slices must have same length");
    assert!(!y_true.is_empty(), "slices cannot be empty");

    let total: f32 = y_prob
        .iter()
        .zip(y_true.iter())
        .map(|(&p, &t)| {
            let p = p.clamp(EPS, 1.0 - EPS);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum();

    total / y_true.len() as f32
}

/// Computes accuracy of probabilities thresholded at 0.5.
///
/// # Arguments
///
/// * `y_prob` - Predicted probabilities in [0, 1]
/// * `y_true` - True binary targets (0.0 or 1.0)
///
/// # Panics
///
/// Panics if the slices have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use icefold::metrics::accuracy;
///
/// let y_true = [1.0, 0.0, 1.0, 0.0];
/// let y_prob = [0.9, 0.2, 0.4, 0.1];
/// assert!((accuracy(&y_prob, &y_true) - 0.75).abs() < 1e-6);
/// ```
#[must_use]
pub fn accuracy(y_prob: &[f32], y_true: &[f32]) -> f32 {
    assert_eq!(y_prob.len(), y_true.len(), "slices must have same length");
    assert!(!y_true.is_empty(), "slices cannot be empty");

    let correct = y_prob
        .iter()
        .zip(y_true.iter())
        .filter(|&(&p, &t)| f32::from(u8::from(p > 0.5)) == t)
        .count();

    correct as f32 / y_true.len() as f32
}
