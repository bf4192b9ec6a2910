//! Per-epoch training history and best-epoch selection.

use serde::{Deserialize, Serialize};

use crate::model::EpochStats;

/// One epoch's training and validation stats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Zero-based epoch number.
    pub epoch: usize,
    /// Stats over the training split.
    pub train: EpochStats,
    /// Stats over the validation split.
    pub validation: EpochStats,
}

/// The epoch-by-epoch record of one fold's training run.
///
/// # Examples
///
/// ```
/// use icefold::model::EpochStats;
/// use icefold::train::history::TrainingHistory;
///
/// let mut history = TrainingHistory::new();
/// history.push(
///     EpochStats { loss: 0.7, accuracy: 0.5 },
///     EpochStats { loss: 0.6, accuracy: 0.6 },
/// );
/// history.push(
///     EpochStats { loss: 0.5, accuracy: 0.7 },
///     EpochStats { loss: 0.4, accuracy: 0.8 },
/// );
/// assert_eq!(history.best_epoch().unwrap().epoch, 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    records: Vec<EpochRecord>,
}

impl TrainingHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one epoch's stats.
    pub fn push(&mut self, train: EpochStats, validation: EpochStats) {
        self.records.push(EpochRecord {
            epoch: self.records.len(),
            train,
            validation,
        });
    }

    /// Returns the number of recorded epochs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no epochs were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the recorded epochs in order.
    #[must_use]
    pub fn records(&self) -> &[EpochRecord] {
        &self.records
    }

    /// Returns the epoch with the lowest validation loss, or `None` for an
    /// empty history. Ties keep the earliest epoch, matching checkpoint
    /// behavior (a tie is not an improvement).
    #[must_use]
    pub fn best_epoch(&self) -> Option<&EpochRecord> {
        self.records.iter().reduce(|best, r| {
            if r.validation.loss < best.validation.loss {
                r
            } else {
                best
            }
        })
    }
}
