//! Cross-validated training: config, per-fold fit loop, and the driver.
//!
//! [`fit`] trains one model on one fold — augmenting each epoch's batches,
//! checkpointing on validation improvement, reducing the learning rate on
//! plateaus, and stopping early. [`CrossValidator::run`] wraps it in the
//! full k-fold loop: stratified splitting, best-checkpoint reload, TTA
//! prediction of the train/validation/test sets, overall metrics, and the
//! fold-mean blend.

pub mod callbacks;
pub mod history;

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{debug, info};

use crate::augment::{predict_with_tta, AugmentConfig, Augmenter};
use crate::dataset::Dataset;
use crate::error::{IcefoldError, Result};
use crate::metrics::{accuracy, log_loss};
use crate::model::{Model, ModelFactory};
use crate::model_selection::StratifiedKFold;
use crate::primitives::{ImageBatch, Matrix};

use callbacks::{CallbackAction, EarlyStopping, ReduceLrOnPlateau};
use history::TrainingHistory;

/// Hyperparameters for the cross-validation run.
///
/// Any subset of fields can be overridden from a JSON file via
/// [`TrainConfig::from_json_file`]; the rest keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Number of stratified folds.
    pub num_folds: usize,
    /// Upper bound on training epochs per fold.
    pub max_epochs: usize,
    /// Augmented passes per TTA prediction (pass 0 is the clean batch).
    pub tta_steps: usize,
    /// Seed for fold shuffling and augmentation RNG.
    pub seed: u64,
    /// Early-stopping patience in epochs.
    pub early_stopping_patience: usize,
    /// Learning-rate plateau patience in epochs.
    pub reduce_lr_patience: usize,
    /// Learning-rate scale factor applied on plateau, in (0, 1).
    pub lr_factor: f32,
    /// Minimum validation-loss drop that counts as improvement.
    pub min_delta: f32,
    /// Spatial size images are resized to during assembly; `None` keeps the
    /// dataset's native size.
    pub input_size: Option<(usize, usize)>,
    /// Transform ranges for training-epoch augmentation.
    pub train_augment: AugmentConfig,
    /// Transform ranges for TTA passes. Defaults to the no-zoom test preset.
    pub tta_augment: AugmentConfig,
    /// Directory receiving the architecture JSON and per-fold weights.
    pub checkpoint_dir: PathBuf,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            num_folds: 5,
            max_epochs: 100,
            tta_steps: 10,
            seed: 42,
            early_stopping_patience: 80,
            reduce_lr_patience: 40,
            lr_factor: 0.1,
            min_delta: 1e-4,
            input_size: None,
            train_augment: AugmentConfig::train(),
            tta_augment: AugmentConfig::test(),
            checkpoint_dir: PathBuf::from("checkpoints"),
        }
    }
}

impl TrainConfig {
    /// Loads a config from a JSON file; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or parsed, or if a value
    /// is out of range.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range parameter.
    pub fn validate(&self) -> Result<()> {
        if self.num_folds < 2 {
            return Err(invalid("num_folds", self.num_folds.to_string(), ">= 2"));
        }
        if self.max_epochs == 0 {
            return Err(invalid("max_epochs", "0".to_string(), ">= 1"));
        }
        if self.tta_steps == 0 {
            return Err(invalid("tta_steps", "0".to_string(), ">= 1"));
        }
        if !(self.lr_factor > 0.0 && self.lr_factor < 1.0) {
            return Err(invalid(
                "lr_factor",
                self.lr_factor.to_string(),
                "0 < factor < 1",
            ));
        }
        if self.min_delta < 0.0 {
            return Err(invalid(
                "min_delta",
                self.min_delta.to_string(),
                ">= 0",
            ));
        }
        if let Some((h, w)) = self.input_size {
            if h == 0 || w == 0 {
                return Err(invalid(
                    "input_size",
                    format!("{h}x{w}"),
                    "non-zero dimensions",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(param: &str, value: String, constraint: &str) -> IcefoldError {
    IcefoldError::InvalidHyperparameter {
        param: param.to_string(),
        value,
        constraint: constraint.to_string(),
    }
}

/// Trains one model on one fold's train/validation split.
///
/// Each epoch the training and validation batches are re-augmented within
/// the config's training transform ranges, the
/// model runs one training pass and one evaluation pass, and the three
/// monitors react to the validation loss: weights are checkpointed to
/// `weights_path` on improvement, the learning rate is scaled on plateau,
/// and training stops early after the configured patience.
///
/// The checkpoint file always exists on return, since the first epoch
/// always counts as an improvement.
///
/// # Errors
///
/// Returns an error if a training or evaluation pass fails, or if the
/// checkpoint can't be written.
#[allow(clippy::too_many_arguments)]
pub fn fit(
    model: &mut dyn Model,
    train: (&ImageBatch, &Matrix, &[f32]),
    validation: (&ImageBatch, &Matrix, &[f32]),
    augmenter: &dyn Augmenter,
    config: &TrainConfig,
    weights_path: &Path,
    rng: &mut StdRng,
) -> Result<TrainingHistory> {
    let (train_images, train_meta, train_labels) = train;
    let (val_images, val_meta, val_labels) = validation;

    let mut history = TrainingHistory::new();
    let mut early_stopping = EarlyStopping::new(config.early_stopping_patience, config.min_delta);
    let mut reduce_lr =
        ReduceLrOnPlateau::new(config.reduce_lr_patience, config.lr_factor, config.min_delta);
    let mut best_val_loss: Option<f32> = None;

    for epoch in 0..config.max_epochs {
        let augmented_train = augmenter.augment(train_images, &config.train_augment, rng);
        let train_stats = model.train_epoch(&augmented_train, train_meta, train_labels)?;

        let augmented_val = augmenter.augment(val_images, &config.train_augment, rng);
        let val_stats = model.evaluate(&augmented_val, val_meta, val_labels)?;

        debug!(
            epoch,
            loss = train_stats.loss,
            acc = train_stats.accuracy,
            val_loss = val_stats.loss,
            val_acc = val_stats.accuracy,
            "epoch done"
        );
        history.push(train_stats, val_stats);

        let improved = match best_val_loss {
            None => true,
            Some(best) => val_stats.loss < best - config.min_delta,
        };
        if improved {
            best_val_loss = Some(val_stats.loss);
            model.save_weights(weights_path)?;
        }

        if let Some(factor) = reduce_lr.observe(val_stats.loss) {
            debug!(epoch, factor, "reducing learning rate");
            model.scale_learning_rate(factor);
        }

        if early_stopping.observe(val_stats.loss) == CallbackAction::Stop {
            debug!(epoch, "early stopping");
            break;
        }
    }

    Ok(history)
}

/// Everything the cross-validation run produces.
#[derive(Debug, Clone)]
pub struct CvOutcome {
    /// One training history per fold.
    pub fold_histories: Vec<TrainingHistory>,
    /// Fold × test-sample probability matrix.
    pub predictions: Matrix,
    /// Column-wise fold mean of `predictions`: the blended test probabilities.
    pub blended: Vec<f32>,
    /// Overall log loss of TTA predictions on the folds' training splits.
    pub train_loss: f32,
    /// Overall accuracy of TTA predictions on the folds' training splits.
    pub train_accuracy: f32,
    /// Overall log loss of TTA predictions on the held-out validation splits.
    pub val_loss: f32,
    /// Overall accuracy of TTA predictions on the held-out validation splits.
    pub val_accuracy: f32,
}

/// The k-fold cross-validation driver.
///
/// # Examples
///
/// See the crate-level example; [`CrossValidator::run`] needs a caller-
/// supplied model factory and augmenter.
#[derive(Debug, Clone)]
pub struct CrossValidator {
    config: TrainConfig,
}

impl CrossValidator {
    /// Creates a driver with the given config.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails validation.
    pub fn new(config: TrainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the config.
    #[must_use]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Path of the shared architecture description.
    #[must_use]
    pub fn architecture_path(&self) -> PathBuf {
        self.config.checkpoint_dir.join("architecture.json")
    }

    /// Path of one fold's best-weights checkpoint.
    #[must_use]
    pub fn weights_path(&self, fold: usize) -> PathBuf {
        self.config
            .checkpoint_dir
            .join(format!("weights_fold_{fold}.bin"))
    }

    /// Runs the full cross-validated experiment.
    ///
    /// Imputes missing incidence angles, assembles inputs, persists the
    /// architecture JSON once, then per fold: trains a fresh model with
    /// [`fit`], reloads its best checkpoint, and TTA-predicts the fold's
    /// training and validation splits (for the overall metrics) and the
    /// test set (for the blend). The blend is the per-sample fold mean.
    ///
    /// Training epochs augment within `train_augment`'s ranges; all TTA
    /// passes use `tta_augment` instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the training data is unlabeled, inputs can't be
    /// assembled, the checkpoint directory can't be created, or any model
    /// call fails.
    pub fn run(
        &self,
        factory: &dyn ModelFactory,
        augmenter: &dyn Augmenter,
        train_data: &Dataset,
        test_data: &Dataset,
    ) -> Result<CvOutcome> {
        let config = &self.config;

        let mut train_data = train_data.clone();
        train_data.impute_inc_angle()?;
        let labels = train_data.labels()?;
        let train_inputs = train_data.assemble(config.input_size)?;

        let mut test_data = test_data.clone();
        test_data.impute_inc_angle()?;
        let test_inputs = test_data.assemble(config.input_size)?;

        fs::create_dir_all(&config.checkpoint_dir)?;

        let input_shape = train_inputs.images.sample_shape();
        let meta_features = train_inputs.meta.n_cols();

        // All folds share one architecture; persist it once up front.
        let architecture = factory.build(input_shape, meta_features)?.architecture_json()?;
        fs::write(self.architecture_path(), architecture)?;

        let folds = StratifiedKFold::new(config.num_folds)
            .with_random_state(config.seed)
            .split(&labels);

        let n_test = test_inputs.images.len();
        let mut predictions = Matrix::zeros(config.num_folds, n_test);
        let mut fold_histories = Vec::with_capacity(config.num_folds);

        let mut train_labels_all = Vec::new();
        let mut train_preds_all = Vec::new();
        let mut val_labels_all = Vec::new();
        let mut val_preds_all = Vec::new();

        let mut rng = StdRng::seed_from_u64(config.seed);

        for (fold_idx, fold) in folds.iter().enumerate() {
            info!(
                fold = fold_idx + 1,
                total = config.num_folds,
                train = fold.train.len(),
                validation = fold.validation.len(),
                "training fold"
            );

            let xtr = train_inputs.images.select(&fold.train);
            let mtr = train_inputs.meta.select_rows(&fold.train);
            let ytr = select(&labels, &fold.train);

            let xcv = train_inputs.images.select(&fold.validation);
            let mcv = train_inputs.meta.select_rows(&fold.validation);
            let ycv = select(&labels, &fold.validation);

            let weights_path = self.weights_path(fold_idx);
            let mut model = factory.build(input_shape, meta_features)?;
            let history = fit(
                model.as_mut(),
                (&xtr, &mtr, &ytr),
                (&xcv, &mcv, &ycv),
                augmenter,
                config,
                &weights_path,
                &mut rng,
            )?;

            if let Some(best) = history.best_epoch() {
                info!(
                    fold = fold_idx + 1,
                    best_epoch = best.epoch + 1,
                    loss = best.train.loss,
                    acc = best.train.accuracy,
                    val_loss = best.validation.loss,
                    val_acc = best.validation.accuracy,
                    "fold trained"
                );
            }

            // Predict from the best-validation-loss weights, not the last.
            model.load_weights(&weights_path)?;

            let tta = config.tta_steps;
            train_preds_all.extend(predict_with_tta(
                model.as_ref(),
                &xtr,
                &mtr,
                augmenter,
                &config.tta_augment,
                tta,
                &mut rng,
            )?);
            train_labels_all.extend_from_slice(&ytr);

            val_preds_all.extend(predict_with_tta(
                model.as_ref(),
                &xcv,
                &mcv,
                augmenter,
                &config.tta_augment,
                tta,
                &mut rng,
            )?);
            val_labels_all.extend_from_slice(&ycv);

            let fold_predictions = predict_with_tta(
                model.as_ref(),
                &test_inputs.images,
                &test_inputs.meta,
                augmenter,
                &config.tta_augment,
                tta,
                &mut rng,
            )?;
            predictions.set_row(fold_idx, &fold_predictions);

            fold_histories.push(history);
        }

        let train_loss = log_loss(&train_preds_all, &train_labels_all);
        let train_accuracy = accuracy(&train_preds_all, &train_labels_all);
        let val_loss = log_loss(&val_preds_all, &val_labels_all);
        let val_accuracy = accuracy(&val_preds_all, &val_labels_all);
        info!(
            train_loss,
            train_accuracy, val_loss, val_accuracy, "overall score"
        );

        let blended = predictions.column_mean();

        Ok(CvOutcome {
            fold_histories,
            predictions,
            blended,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
        })
    }
}

fn select(values: &[f32], indices: &[usize]) -> Vec<f32> {
    indices.iter().map(|&i| values[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut c = TrainConfig::default();
        c.num_folds = 1;
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.max_epochs = 0;
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.tta_steps = 0;
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.lr_factor = 1.5;
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.min_delta = -0.1;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_input_size_dimensions() {
        let mut c = TrainConfig::default();
        c.input_size = Some((0, 75));
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.input_size = Some((75, 0));
        assert!(c.validate().is_err());

        let mut c = TrainConfig::default();
        c.input_size = Some((75, 75));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_default_augment_presets_differ_on_zoom() {
        let config = TrainConfig::default();
        assert!(config.train_augment.zoom_range > 0.0);
        assert_eq!(config.tta_augment.zoom_range, 0.0);
    }

    #[test]
    fn test_config_from_json_partial_override() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"num_folds": 3, "tta_steps": 4}}"#).unwrap();

        let config = TrainConfig::from_json_file(&path).unwrap();
        assert_eq!(config.num_folds, 3);
        assert_eq!(config.tta_steps, 4);
        // Untouched fields keep their defaults.
        assert_eq!(config.max_epochs, TrainConfig::default().max_epochs);
        assert_eq!(config.seed, TrainConfig::default().seed);
    }

    #[test]
    fn test_config_from_json_rejects_invalid() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{"num_folds": 1}}"#).unwrap();

        assert!(TrainConfig::from_json_file(&path).is_err());
    }

    #[test]
    fn test_checkpoint_paths() {
        let mut config = TrainConfig::default();
        config.checkpoint_dir = PathBuf::from("/tmp/ckpt");
        let cv = CrossValidator::new(config).unwrap();
        assert_eq!(
            cv.architecture_path(),
            PathBuf::from("/tmp/ckpt/architecture.json")
        );
        assert_eq!(
            cv.weights_path(2),
            PathBuf::from("/tmp/ckpt/weights_fold_2.bin")
        );
    }
}
