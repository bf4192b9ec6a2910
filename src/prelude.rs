//! Convenience re-exports for the common workflow.
//!
//! ```
//! use icefold::prelude::*;
//! ```

pub use crate::augment::{AugmentConfig, Augmenter, IdentityAugmenter};
pub use crate::dataset::{Dataset, Record};
pub use crate::error::{IcefoldError, Result};
pub use crate::metrics::{accuracy, log_loss};
pub use crate::model::{EpochStats, Model, ModelFactory};
pub use crate::model_selection::{Fold, StratifiedKFold};
pub use crate::primitives::{ImageBatch, Matrix};
pub use crate::submission::write_submission;
pub use crate::train::{CrossValidator, CvOutcome, TrainConfig};
