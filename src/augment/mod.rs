//! Augmentation seam and test-time augmentation (TTA).
//!
//! The geometric transforms themselves live outside this crate: an
//! [`Augmenter`] turns a batch into a randomly transformed view of the same
//! samples, in the same order, within the ranges of an [`AugmentConfig`].
//! Icefold uses it twice, with different configs — the training config
//! perturbs each epoch's batches, while [`predict_with_tta`] averages
//! predictions over views drawn with the test-time config (which disables
//! zoom).

use rand::rngs::StdRng;

use crate::error::{IcefoldError, Result};
use crate::model::Model;
use crate::primitives::{ImageBatch, Matrix};

/// Ranges for the geometric transforms an augmenter may apply.
///
/// How each transform is implemented is the augmenter's business; this
/// struct only carries the knobs. Training and test-time prediction use
/// separate configs: zoom is conventionally disabled for TTA.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AugmentConfig {
    /// Randomly mirror left-right.
    pub horizontal_flip: bool,
    /// Randomly mirror top-bottom.
    pub vertical_flip: bool,
    /// Maximum rotation in degrees, either direction.
    pub rotation_range: f32,
    /// Maximum relative zoom, e.g. 0.2 for ±20%.
    pub zoom_range: f32,
}

impl AugmentConfig {
    /// Training-time configuration: flips, ±10° rotation, ±20% zoom.
    #[must_use]
    pub fn train() -> Self {
        Self {
            horizontal_flip: true,
            vertical_flip: true,
            rotation_range: 10.0,
            zoom_range: 0.2,
        }
    }

    /// Test-time configuration: flips and rotation only, no zoom.
    #[must_use]
    pub fn test() -> Self {
        Self {
            zoom_range: 0.0,
            ..Self::train()
        }
    }
}

/// Produces randomly augmented views of an image batch.
///
/// Implementations must preserve batch length, sample order, and sample
/// shape; only pixel content may change, and only within the ranges the
/// given config allows.
pub trait Augmenter {
    /// Returns an augmented view of `images` drawn within `config`'s ranges.
    fn augment(&self, images: &ImageBatch, config: &AugmentConfig, rng: &mut StdRng)
        -> ImageBatch;
}

/// Pass-through augmenter. Useful for tests and for disabling augmentation
/// without touching the training loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAugmenter;

impl Augmenter for IdentityAugmenter {
    fn augment(
        &self,
        images: &ImageBatch,
        _config: &AugmentConfig,
        _rng: &mut StdRng,
    ) -> ImageBatch {
        images.clone()
    }
}

/// Predicts probabilities with test-time augmentation.
///
/// Pass 0 predicts the clean batch; each further pass predicts a view
/// freshly drawn within `config`'s ranges. The result is the per-sample
/// mean over all passes.
///
/// # Errors
///
/// Returns an error if `tta_steps` is zero, if a prediction fails, or if
/// the augmenter changes the batch length.
#[allow(clippy::too_many_arguments)]
pub fn predict_with_tta(
    model: &dyn Model,
    images: &ImageBatch,
    meta: &Matrix,
    augmenter: &dyn Augmenter,
    config: &AugmentConfig,
    tta_steps: usize,
    rng: &mut StdRng,
) -> Result<Vec<f32>> {
    if tta_steps == 0 {
        return Err(IcefoldError::InvalidHyperparameter {
            param: "tta_steps".to_string(),
            value: "0".to_string(),
            constraint: ">= 1".to_string(),
        });
    }

    let n = images.len();
    let mut sums = model.predict(images, meta)?;
    if sums.len() != n {
        return Err(IcefoldError::DimensionMismatch {
            expected: format!("{n} predictions"),
            actual: format!("{} predictions", sums.len()),
        });
    }

    for _ in 1..tta_steps {
        let view = augmenter.augment(images, config, rng);
        if view.len() != n {
            return Err(IcefoldError::DimensionMismatch {
                expected: format!("augmented batch of {n}"),
                actual: format!("augmented batch of {}", view.len()),
            });
        }
        let probs = model.predict(&view, meta)?;
        for (sum, p) in sums.iter_mut().zip(probs) {
            *sum += p;
        }
    }

    for sum in &mut sums {
        *sum /= tta_steps as f32;
    }
    Ok(sums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EpochStats;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::path::Path;

    /// Predicts a constant, plus a per-call increment so TTA passes differ.
    struct CountingModel {
        calls: std::cell::Cell<u32>,
    }

    impl Model for CountingModel {
        fn train_epoch(
            &mut self,
            _: &ImageBatch,
            _: &Matrix,
            _: &[f32],
        ) -> crate::Result<EpochStats> {
            unreachable!("not trained in these tests")
        }

        fn evaluate(&self, _: &ImageBatch, _: &Matrix, _: &[f32]) -> crate::Result<EpochStats> {
            unreachable!("not evaluated in these tests")
        }

        fn predict(&self, images: &ImageBatch, _: &Matrix) -> crate::Result<Vec<f32>> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            Ok(vec![0.1 * call as f32; images.len()])
        }

        fn save_weights(&self, _: &Path) -> crate::Result<()> {
            Ok(())
        }

        fn load_weights(&mut self, _: &Path) -> crate::Result<()> {
            Ok(())
        }

        fn architecture_json(&self) -> crate::Result<String> {
            Ok("{}".to_string())
        }

        fn scale_learning_rate(&mut self, _: f32) {}
    }

    /// Records every config it is asked to augment with.
    struct RecordingAugmenter {
        seen: RefCell<Vec<AugmentConfig>>,
    }

    impl RecordingAugmenter {
        fn new() -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Augmenter for RecordingAugmenter {
        fn augment(
            &self,
            images: &ImageBatch,
            config: &AugmentConfig,
            _rng: &mut StdRng,
        ) -> ImageBatch {
            self.seen.borrow_mut().push(*config);
            images.clone()
        }
    }

    #[test]
    fn test_tta_averages_over_passes() {
        let model = CountingModel {
            calls: std::cell::Cell::new(0),
        };
        let images = ImageBatch::zeros(3, 2, 2, 2);
        let meta = Matrix::zeros(3, 7);
        let mut rng = StdRng::seed_from_u64(1);

        // Passes predict 0.0, 0.1, 0.2, 0.3 -> mean 0.15.
        let probs = predict_with_tta(
            &model,
            &images,
            &meta,
            &IdentityAugmenter,
            &AugmentConfig::test(),
            4,
            &mut rng,
        )
        .unwrap();
        assert_eq!(probs.len(), 3);
        for p in probs {
            assert!((p - 0.15).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tta_single_step_is_clean_prediction() {
        let model = CountingModel {
            calls: std::cell::Cell::new(0),
        };
        let images = ImageBatch::zeros(2, 2, 2, 2);
        let meta = Matrix::zeros(2, 7);
        let mut rng = StdRng::seed_from_u64(1);

        let probs = predict_with_tta(
            &model,
            &images,
            &meta,
            &IdentityAugmenter,
            &AugmentConfig::test(),
            1,
            &mut rng,
        )
        .unwrap();
        assert_eq!(probs, vec![0.0, 0.0]);
    }

    #[test]
    fn test_tta_rejects_zero_steps() {
        let model = CountingModel {
            calls: std::cell::Cell::new(0),
        };
        let images = ImageBatch::zeros(1, 2, 2, 2);
        let meta = Matrix::zeros(1, 7);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(predict_with_tta(
            &model,
            &images,
            &meta,
            &IdentityAugmenter,
            &AugmentConfig::test(),
            0,
            &mut rng,
        )
        .is_err());
    }

    #[test]
    fn test_tta_passes_its_config_to_the_augmenter() {
        let model = CountingModel {
            calls: std::cell::Cell::new(0),
        };
        let augmenter = RecordingAugmenter::new();
        let images = ImageBatch::zeros(2, 2, 2, 2);
        let meta = Matrix::zeros(2, 7);
        let mut rng = StdRng::seed_from_u64(1);

        let config = AugmentConfig::test();
        predict_with_tta(&model, &images, &meta, &augmenter, &config, 4, &mut rng).unwrap();

        // Pass 0 is clean; the other three use the given config.
        let seen = augmenter.seen.borrow();
        assert_eq!(seen.len(), 3);
        for c in seen.iter() {
            assert_eq!(*c, config);
        }
    }

    #[test]
    fn test_identity_augmenter_is_noop() {
        let images = ImageBatch::from_vec(1, 1, 2, 1, vec![3.0, 4.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(
            IdentityAugmenter.augment(&images, &AugmentConfig::train(), &mut rng),
            images
        );
    }

    #[test]
    fn test_config_presets() {
        let train = AugmentConfig::train();
        let test = AugmentConfig::test();
        assert!(train.zoom_range > 0.0);
        assert_eq!(test.zoom_range, 0.0);
        assert_eq!(test.rotation_range, train.rotation_range);
        assert!(test.horizontal_flip && test.vertical_flip);
    }
}
