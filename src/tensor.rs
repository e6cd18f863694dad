//! Tensor Storage for the Recurrent Model
//!
//! This module provides the minimal tensor type the model is built on: a flat
//! `Vec<f32>` paired with a shape. The recurrent network only ever needs 1-D
//! vectors (biases, hidden state gradients) and 2-D row-major matrices (the
//! weight matrices), so there is no stride machinery, no views, and no
//! broadcasting — just contiguous storage with shape checking.
//!
//! ## Memory Layout
//!
//! For shape `[2, 3]`, data is stored row-major:
//! `[row0_col0, row0_col1, row0_col2, row1_col0, row1_col1, row1_col2]`
//!
//! The forward and backward passes index `data` directly with
//! `row * cols + col`; keeping that arithmetic visible is deliberate — every
//! multiply-accumulate in the model is written out by hand.
//!
//! ## Performance
//!
//! Whole-tensor reductions and rescaling use Rayon. Those are the only
//! operations here large enough to benefit: they run across all parameters
//! at once during gradient clipping, while the per-step model math stays
//! sequential (hidden sizes of 16-128 are far below parallel overhead).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A 1-D or 2-D array of `f32` values in row-major order.
///
/// The shape travels with the data so that persistence can validate
/// dimensions before accepting loaded weights.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tensor {
    /// Flat storage of all elements
    pub data: Vec<f32>,
    /// Dimensions: `[len]` for vectors, `[rows, cols]` for matrices
    pub shape: Vec<usize>,
}

impl Tensor {
    /// Create a tensor from data and shape.
    ///
    /// # Panics
    ///
    /// Panics if the product of shape dimensions doesn't equal data length.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        let expected: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected,
            "Data length ({}) doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected
        );
        Self { data, shape }
    }

    /// Create a zero-filled tensor.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        Self::new(vec![0.0; size], shape)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sum of squared elements, computed in parallel.
    ///
    /// This is the per-tensor contribution to the global gradient norm.
    pub fn sum_squares(&self) -> f32 {
        self.data.par_iter().map(|&v| v * v).sum()
    }

    /// Multiply every element by `factor` in place, in parallel.
    pub fn scale_in_place(&mut self, factor: f32) {
        self.data.par_iter_mut().for_each(|v| *v *= factor);
    }

    /// Element-wise `self += other`.
    ///
    /// Used to fold per-step gradients into the batch accumulator.
    ///
    /// # Panics
    ///
    /// Panics if shapes differ.
    pub fn add_assign(&mut self, other: &Tensor) {
        assert_eq!(
            self.shape, other.shape,
            "Shapes must match for accumulation: {:?} += {:?}",
            self.shape, other.shape
        );
        self.data
            .par_iter_mut()
            .zip(&other.data)
            .for_each(|(a, &b)| *a += b);
    }
}
