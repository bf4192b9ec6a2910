//! Trait seams for the trainable model and its factory.
//!
//! The convolutional network itself is an external collaborator. Icefold
//! drives it through [`Model`]: one training epoch at a time, evaluation and
//! probability prediction on demand, weight persistence for checkpointing,
//! and a learning-rate hook for the plateau callback. A [`ModelFactory`]
//! builds one fresh model per fold.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::primitives::{ImageBatch, Matrix};

/// Loss and accuracy from one pass over a split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Mean binary cross-entropy over the split.
    pub loss: f32,
    /// Thresholded accuracy over the split.
    pub accuracy: f32,
}

/// A trainable image+metadata binary classifier.
///
/// Implementations own their architecture, batching, optimizer state, and
/// weight format. Icefold only sequences the calls: per epoch it hands the
/// model an (augmented) training split, evaluates the validation split, and
/// may checkpoint weights or scale the learning rate.
pub trait Model {
    /// Runs one training epoch over the given split and returns its stats.
    ///
    /// # Errors
    ///
    /// Returns an error if batch and label dimensions disagree or training
    /// fails internally.
    fn train_epoch(
        &mut self,
        images: &ImageBatch,
        meta: &Matrix,
        labels: &[f32],
    ) -> Result<EpochStats>;

    /// Evaluates loss and accuracy on a split without updating weights.
    ///
    /// # Errors
    ///
    /// Returns an error if batch and label dimensions disagree.
    fn evaluate(&self, images: &ImageBatch, meta: &Matrix, labels: &[f32]) -> Result<EpochStats>;

    /// Predicts per-sample probabilities in [0, 1].
    ///
    /// # Errors
    ///
    /// Returns an error if batch dimensions disagree.
    fn predict(&self, images: &ImageBatch, meta: &Matrix) -> Result<Vec<f32>>;

    /// Persists the current weights to a file.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or serialization failure.
    fn save_weights(&self, path: &Path) -> Result<()>;

    /// Restores weights previously written by [`Model::save_weights`].
    ///
    /// # Errors
    ///
    /// Returns an error on I/O or deserialization failure.
    fn load_weights(&mut self, path: &Path) -> Result<()>;

    /// Returns a JSON description of the architecture. Persisted once per
    /// run, since all folds share one architecture.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization failure.
    fn architecture_json(&self) -> Result<String>;

    /// Multiplies the learning rate by `factor` (used by the
    /// reduce-on-plateau callback; factor is in (0, 1)).
    fn scale_learning_rate(&mut self, factor: f32);
}

/// Builds one fresh [`Model`] per fold.
pub trait ModelFactory {
    /// Creates a model for the given per-sample input shape
    /// (height, width, channels) and metadata feature count.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is unsupported.
    fn build(&self, input_shape: (usize, usize, usize), meta_features: usize)
        -> Result<Box<dyn Model>>;
}
