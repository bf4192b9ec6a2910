//! Matrix type for 2-D numeric data (row-major storage).

use serde::{Deserialize, Serialize};

use crate::error::{IcefoldError, Result};

/// A 2-D matrix of f32 values (row-major storage).
///
/// Used for per-sample metadata features (N×7) and for fold×sample
/// prediction matrices, which are averaged column-wise when blending.
///
/// # Examples
///
/// ```
/// use icefold::primitives::Matrix;
///
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(m.shape(), (2, 3));
/// assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Creates a new matrix from a flat vector of data.
    ///
    /// # Errors
    ///
    /// Returns an error if data length doesn't match rows * cols.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(IcefoldError::DimensionMismatch {
                expected: format!("{} values ({rows}x{cols})", rows * cols),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Creates a matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// Gets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Sets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col] = value;
    }

    /// Returns a row as a slice.
    ///
    /// # Panics
    ///
    /// Panics if the row index is out of bounds.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> &[f32] {
        assert!(row_idx < self.rows, "row index out of bounds");
        let start = row_idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Overwrites a row from a slice.
    ///
    /// # Panics
    ///
    /// Panics if the row index is out of bounds or the slice length differs
    /// from the column count.
    pub fn set_row(&mut self, row_idx: usize, values: &[f32]) {
        assert!(row_idx < self.rows, "row index out of bounds");
        assert_eq!(values.len(), self.cols, "row length must equal cols");
        let start = row_idx * self.cols;
        self.data[start..start + self.cols].copy_from_slice(values);
    }

    /// Gathers rows by index into a new matrix, preserving index order.
    ///
    /// This is how fold train/validation subsets are materialized from the
    /// full feature matrix.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Returns the per-column mean, i.e. the fold-average of a fold×sample
    /// prediction matrix.
    ///
    /// Returns an empty vector if the matrix has no rows.
    #[must_use]
    pub fn column_mean(&self) -> Vec<f32> {
        if self.rows == 0 {
            return Vec::new();
        }
        let mut means = vec![0.0f32; self.cols];
        for row in 0..self.rows {
            for (col, mean) in means.iter_mut().enumerate() {
                *mean += self.data[row * self.cols + col];
            }
        }
        for mean in &mut means {
            *mean /= self.rows as f32;
        }
        means
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
