//! Image batch container (N×H×W×C, row-major f32).

use serde::{Deserialize, Serialize};

use crate::error::{IcefoldError, Result};

/// A batch of multi-channel images stored contiguously in N×H×W×C order.
///
/// Band values are plain f32 (radar backscatter in dB for the iceberg data);
/// normalization, if any, belongs to the model or the augmenter.
///
/// # Examples
///
/// ```
/// use icefold::primitives::ImageBatch;
///
/// let batch = ImageBatch::zeros(4, 75, 75, 2);
/// assert_eq!(batch.shape(), (4, 75, 75, 2));
/// assert_eq!(batch.sample(0).len(), 75 * 75 * 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBatch {
    data: Vec<f32>,
    n: usize,
    height: usize,
    width: usize,
    channels: usize,
}

impl ImageBatch {
    /// Creates a batch from a flat vector of data.
    ///
    /// # Errors
    ///
    /// Returns an error if data length doesn't match n * height * width *
    /// channels.
    pub fn from_vec(
        n: usize,
        height: usize,
        width: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self> {
        let expected = n * height * width * channels;
        if data.len() != expected {
            return Err(IcefoldError::DimensionMismatch {
                expected: format!("{expected} values ({n}x{height}x{width}x{channels})"),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self {
            data,
            n,
            height,
            width,
            channels,
        })
    }

    /// Creates a zero-filled batch.
    #[must_use]
    pub fn zeros(n: usize, height: usize, width: usize, channels: usize) -> Self {
        Self {
            data: vec![0.0; n * height * width * channels],
            n,
            height,
            width,
            channels,
        }
    }

    /// Returns the shape as (n, height, width, channels).
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.n, self.height, self.width, self.channels)
    }

    /// Returns the number of samples in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Returns true if the batch holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the per-sample (height, width, channels) shape.
    #[must_use]
    pub fn sample_shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    /// Gets the pixel value at (sample, row, col, channel).
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn get(&self, sample: usize, row: usize, col: usize, channel: usize) -> f32 {
        assert!(
            sample < self.n && row < self.height && col < self.width && channel < self.channels,
            "index out of bounds"
        );
        self.data[self.offset(sample, row, col, channel)]
    }

    /// Sets the pixel value at (sample, row, col, channel).
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn set(&mut self, sample: usize, row: usize, col: usize, channel: usize, value: f32) {
        assert!(
            sample < self.n && row < self.height && col < self.width && channel < self.channels,
            "index out of bounds"
        );
        let offset = self.offset(sample, row, col, channel);
        self.data[offset] = value;
    }

    /// Returns one sample's pixels as a contiguous H×W×C slice.
    ///
    /// # Panics
    ///
    /// Panics if the sample index is out of bounds.
    #[must_use]
    pub fn sample(&self, sample: usize) -> &[f32] {
        assert!(sample < self.n, "sample index out of bounds");
        let stride = self.height * self.width * self.channels;
        &self.data[sample * stride..(sample + 1) * stride]
    }

    /// Gathers samples by index into a new batch, preserving index order.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let stride = self.height * self.width * self.channels;
        let mut data = Vec::with_capacity(indices.len() * stride);
        for &idx in indices {
            data.extend_from_slice(self.sample(idx));
        }
        Self {
            data,
            n: indices.len(),
            height: self.height,
            width: self.width,
            channels: self.channels,
        }
    }

    /// Resizes every sample to (height, width) with nearest-neighbor lookup.
    ///
    /// Used during input assembly when the dataset's spatial shape differs
    /// from the model's input size. Channels are preserved.
    #[must_use]
    pub fn resized(&self, height: usize, width: usize) -> Self {
        if height == self.height && width == self.width {
            return self.clone();
        }
        let mut out = Self::zeros(self.n, height, width, self.channels);
        for s in 0..self.n {
            for r in 0..height {
                let src_r = r * self.height / height;
                for c in 0..width {
                    let src_c = c * self.width / width;
                    for ch in 0..self.channels {
                        out.set(s, r, c, ch, self.get(s, src_r, src_c, ch));
                    }
                }
            }
        }
        out
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn offset(&self, sample: usize, row: usize, col: usize, channel: usize) -> usize {
        ((sample * self.height + row) * self.width + col) * self.channels + channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_checks_length() {
        assert!(ImageBatch::from_vec(1, 2, 2, 1, vec![1.0, 2.0, 3.0]).is_err());
        assert!(ImageBatch::from_vec(1, 2, 2, 1, vec![1.0, 2.0, 3.0, 4.0]).is_ok());
    }

    #[test]
    fn test_get_set_layout() {
        let mut b = ImageBatch::zeros(2, 2, 2, 2);
        b.set(1, 0, 1, 1, 9.0);
        assert_eq!(b.get(1, 0, 1, 1), 9.0);
        // N×H×W×C layout: sample 1 starts at 8, row 0 col 1 channel 1 is +3.
        assert_eq!(b.as_slice()[11], 9.0);
    }

    #[test]
    fn test_sample_slice() {
        let data: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let b = ImageBatch::from_vec(2, 2, 1, 2, data).unwrap();
        assert_eq!(b.sample(1), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_select_preserves_order() {
        let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
        let b = ImageBatch::from_vec(3, 1, 2, 1, data).unwrap();
        let sub = b.select(&[2, 0]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.sample(0), &[4.0, 5.0]);
        assert_eq!(sub.sample(1), &[0.0, 1.0]);
    }

    #[test]
    fn test_resized_identity() {
        let b = ImageBatch::zeros(1, 4, 4, 2);
        assert_eq!(b.resized(4, 4), b);
    }

    #[test]
    fn test_resized_upscale_nearest() {
        let b = ImageBatch::from_vec(1, 1, 2, 1, vec![1.0, 2.0]).unwrap();
        let up = b.resized(1, 4);
        assert_eq!(up.shape(), (1, 1, 4, 1));
        assert_eq!(up.sample(0), &[1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_resized_downscale() {
        let data: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let b = ImageBatch::from_vec(1, 4, 4, 1, data).unwrap();
        let down = b.resized(2, 2);
        assert_eq!(down.shape(), (1, 2, 2, 1));
        assert_eq!(down.sample(0), &[0.0, 2.0, 8.0, 10.0]);
    }
}
