//! Core data containers (`Matrix`, `ImageBatch`).
//!
//! These types carry metadata features, prediction matrices, and image
//! batches through the cross-validation loop.

mod image;
mod matrix;

pub use image::ImageBatch;
pub use matrix::Matrix;
