//! Icefold: stratified k-fold training with test-time augmentation.
//!
//! Icefold orchestrates cross-validated training of an image+metadata binary
//! classifier: it splits a labeled dataset into stratified folds, trains one
//! model per fold with early stopping and best-checkpoint tracking, averages
//! predictions over augmented passes (TTA) and over folds, and writes the
//! blended probabilities as a submission file.
//!
//! The network itself and the geometric augmentation transforms are external
//! collaborators: callers supply a [`model::ModelFactory`] and an
//! [`augment::Augmenter`], and icefold owns everything in between.
//!
//! # Quick Start
//!
//! ```no_run
//! use icefold::prelude::*;
//! # use icefold::model::{Model, ModelFactory};
//! # struct MyFactory;
//! # impl ModelFactory for MyFactory {
//! #     fn build(&self, _: (usize, usize, usize), _: usize) -> icefold::Result<Box<dyn Model>> {
//! #         unimplemented!()
//! #     }
//! # }
//!
//! let train = Dataset::from_json_file("data/train.json")?;
//! let test = Dataset::from_json_file("data/test.json")?;
//!
//! let cv = CrossValidator::new(TrainConfig::default())?;
//! let outcome = cv.run(&MyFactory, &IdentityAugmenter, &train, &test)?;
//!
//! write_submission("submission.csv", test.ids(), &outcome.blended)?;
//! # Ok::<(), icefold::IcefoldError>(())
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: `ImageBatch` and `Matrix` containers
//! - [`dataset`]: record schema, JSON loading, derived statistics
//! - [`model_selection`]: stratified k-fold splitting
//! - [`metrics`]: binary log-loss and thresholded accuracy
//! - [`model`]: the trainable-model and model-factory trait seams
//! - [`augment`]: the augmenter seam and TTA prediction
//! - [`train`]: training callbacks, per-fold fit loop, cross-validation driver
//! - [`submission`]: two-column submission output

pub mod augment;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod model;
pub mod model_selection;
pub mod prelude;
pub mod primitives;
pub mod submission;
pub mod train;

pub use error::{IcefoldError, Result};
pub use primitives::{ImageBatch, Matrix};
