//! Training callbacks: early stopping and learning-rate reduction.
//!
//! Both monitor validation loss in min mode. An improvement is a drop of
//! more than `min_delta` below the best value seen so far.

/// Action requested by a callback after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Keep training.
    Continue,
    /// Stop training now.
    Stop,
}

/// Stops training after `patience` epochs without validation improvement.
///
/// # Examples
///
/// ```
/// use icefold::train::callbacks::{CallbackAction, EarlyStopping};
///
/// let mut es = EarlyStopping::new(2, 1e-4);
/// assert_eq!(es.observe(0.5), CallbackAction::Continue);
/// assert_eq!(es.observe(0.5), CallbackAction::Continue);
/// assert_eq!(es.observe(0.5), CallbackAction::Stop);
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f32,
    counter: usize,
    best: Option<f32>,
}

impl EarlyStopping {
    /// Creates an early-stopping monitor.
    #[must_use]
    pub fn new(patience: usize, min_delta: f32) -> Self {
        Self {
            patience,
            min_delta,
            counter: 0,
            best: None,
        }
    }

    /// Records an epoch's validation loss.
    pub fn observe(&mut self, val_loss: f32) -> CallbackAction {
        match self.best {
            None => {
                self.best = Some(val_loss);
                CallbackAction::Continue
            }
            Some(best) if val_loss < best - self.min_delta => {
                self.best = Some(val_loss);
                self.counter = 0;
                CallbackAction::Continue
            }
            Some(_) => {
                self.counter += 1;
                if self.counter >= self.patience {
                    CallbackAction::Stop
                } else {
                    CallbackAction::Continue
                }
            }
        }
    }
}

/// Requests a learning-rate reduction after `patience` epochs without
/// validation improvement, then waits a full patience window again.
///
/// # Examples
///
/// ```
/// use icefold::train::callbacks::ReduceLrOnPlateau;
///
/// let mut rl = ReduceLrOnPlateau::new(2, 0.1, 1e-4);
/// assert_eq!(rl.observe(0.5), None); // sets best
/// assert_eq!(rl.observe(0.5), None); // one stagnant epoch
/// assert_eq!(rl.observe(0.5), Some(0.1)); // patience reached
/// assert_eq!(rl.observe(0.5), None); // counter was reset
/// ```
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    patience: usize,
    factor: f32,
    min_delta: f32,
    counter: usize,
    best: Option<f32>,
}

impl ReduceLrOnPlateau {
    /// Creates a plateau monitor that scales the learning rate by `factor`.
    #[must_use]
    pub fn new(patience: usize, factor: f32, min_delta: f32) -> Self {
        Self {
            patience,
            factor,
            min_delta,
            counter: 0,
            best: None,
        }
    }

    /// Records an epoch's validation loss; returns the scale factor when a
    /// reduction should be applied.
    pub fn observe(&mut self, val_loss: f32) -> Option<f32> {
        match self.best {
            None => {
                self.best = Some(val_loss);
                None
            }
            Some(best) if val_loss < best - self.min_delta => {
                self.best = Some(val_loss);
                self.counter = 0;
                None
            }
            Some(_) => {
                self.counter += 1;
                if self.counter >= self.patience {
                    self.counter = 0;
                    Some(self.factor)
                } else {
                    None
                }
            }
        }
    }
}
