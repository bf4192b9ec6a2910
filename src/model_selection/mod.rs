//! Stratified k-fold splitting for cross-validated training.
//!
//! Each fold holds out one label-stratified subset for validation while the
//! remaining subsets form the training side. Across the k folds, every
//! sample index appears exactly once on the validation side.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// One train/validation index partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Indices trained on in this fold.
    pub train: Vec<usize>,
    /// Indices held out for validation in this fold.
    pub validation: Vec<usize>,
}

/// Stratified K-Fold cross-validator.
///
/// Maintains the per-class sample ratio in every fold, which matters for the
/// imbalanced binary labels this crate trains on.
///
/// # Examples
///
/// ```
/// use icefold::model_selection::StratifiedKFold;
///
/// let y = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
/// let skf = StratifiedKFold::new(4).with_random_state(42);
///
/// let folds = skf.split(&y);
/// assert_eq!(folds.len(), 4);
/// for fold in &folds {
///     assert_eq!(fold.validation.len(), 2);
///     assert_eq!(fold.train.len(), 6);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    /// Creates a new stratified k-fold cross-validator.
    ///
    /// # Panics
    ///
    /// Panics if `n_splits` is less than 2.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        assert!(n_splits >= 2, "n_splits must be at least 2");
        Self {
            n_splits,
            shuffle: false,
            random_state: None,
        }
    }

    /// Enables shuffling within each class before distribution.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Sets the random state for reproducible shuffling (implies shuffle).
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true;
        self
    }

    /// Generates the stratified train/validation partition for each fold.
    ///
    /// Labels are grouped by integer value (binary targets are 0.0/1.0),
    /// each class is split across folds with the remainder spread over the
    /// first folds, and the class chunks are combined per fold.
    #[must_use]
    pub fn split(&self, y: &[f32]) -> Vec<Fold> {
        // BTreeMap keeps class iteration deterministic across runs.
        let mut class_indices: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label as i32).or_default().push(i);
        }

        if self.shuffle {
            let mut rng = match self.random_state {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        let mut fold_validation: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for indices in class_indices.values() {
            let class_size = indices.len();
            let fold_size = class_size / self.n_splits;
            let remainder = class_size % self.n_splits;

            let mut start = 0;
            for (i, fold) in fold_validation.iter_mut().enumerate() {
                let size = if i < remainder {
                    fold_size + 1
                } else {
                    fold_size
                };
                fold.extend_from_slice(&indices[start..start + size]);
                start += size;
            }
        }

        let n_samples = y.len();
        (0..self.n_splits)
            .map(|i| {
                let validation = fold_validation[i].clone();
                let mut train = Vec::with_capacity(n_samples - validation.len());
                for (j, fold) in fold_validation.iter().enumerate() {
                    if i != j {
                        train.extend_from_slice(fold);
                    }
                }
                Fold { train, validation }
            })
            .collect()
    }
}
