//! Gradient Norm and Clipping
//!
//! During training, an occasional batch produces gradients large enough to
//! destabilize the parameters. Clipping rescales the whole gradient bundle
//! when its combined magnitude exceeds a bound, preserving direction while
//! limiting update size:
//!
//! ```text
//! norm = √(Σ g²)            over every element of every tensor
//! if norm > max_norm:
//!     g *= max_norm / norm  for every element of every tensor
//! ```
//!
//! The norm is global: all five tensors are treated as one flattened vector,
//! not clipped independently. That keeps the relative magnitudes between
//! tensors intact.
//!
//! ## Example
//!
//! ```rust
//! use puck::gradients::{clip_gradients, grad_norm};
//! use puck::model::RnnGradients;
//!
//! let mut grads = RnnGradients::zeros(8, 16);
//! grads.bh.data[0] = 12.0;
//! clip_gradients(&mut grads, 5.0);
//! assert!(grad_norm(&grads) <= 5.0 + 1e-4);
//! ```

use crate::model::RnnGradients;

/// Global L2 norm across all five gradient tensors.
///
/// Per-tensor sums of squares run in parallel; the five partial sums are
/// combined and rooted once.
pub fn grad_norm(grads: &RnnGradients) -> f32 {
    let sum_sq = grads.wxh.sum_squares()
        + grads.whh.sum_squares()
        + grads.why.sum_squares()
        + grads.bh.sum_squares()
        + grads.by.sum_squares();
    sum_sq.sqrt()
}

/// Rescale the gradient bundle so its global L2 norm is at most `max_norm`.
///
/// Leaves the bundle untouched when the norm is already within the bound —
/// in particular the all-zero bundle passes through without a division by
/// zero, and a second call after clipping is a no-op.
pub fn clip_gradients(grads: &mut RnnGradients, max_norm: f32) {
    let norm = grad_norm(grads);
    if norm > max_norm {
        let scale = max_norm / norm;
        grads.wxh.scale_in_place(scale);
        grads.whh.scale_in_place(scale);
        grads.why.scale_in_place(scale);
        grads.bh.scale_in_place(scale);
        grads.by.scale_in_place(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle_with(bh: Vec<f32>, by: Vec<f32>) -> RnnGradients {
        let mut g = RnnGradients::zeros(bh.len(), by.len());
        g.bh.data = bh;
        g.by.data = by;
        g
    }

    #[test]
    fn test_norm_is_global() {
        // 3-4-12 right triangle spread across two tensors: the global norm
        // must combine them, not take them per tensor.
        let g = bundle_with(vec![3.0, 4.0], vec![12.0, 0.0]);
        assert!((grad_norm(&g) - 13.0).abs() < 1e-5);
    }

    #[test]
    fn test_clip_bounds_norm() {
        for scale in [1.0f32, 10.0, 1e4] {
            let mut g = bundle_with(vec![3.0 * scale, 4.0 * scale], vec![0.0, 0.0]);
            clip_gradients(&mut g, 5.0);
            assert!(grad_norm(&g) <= 5.0 + 1e-3);
        }
    }

    #[test]
    fn test_clip_preserves_direction() {
        let mut g = bundle_with(vec![30.0, 40.0], vec![0.0, 0.0]);
        clip_gradients(&mut g, 5.0);
        // 50 -> 5, so every element shrinks by 10x.
        assert!((g.bh.data[0] - 3.0).abs() < 1e-5);
        assert!((g.bh.data[1] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_clip_leaves_small_gradients_alone() {
        let mut g = bundle_with(vec![0.3, 0.4], vec![0.0, 0.0]);
        clip_gradients(&mut g, 5.0);
        assert_eq!(g.bh.data, vec![0.3, 0.4]);
    }

    #[test]
    fn test_clip_zero_bundle_no_divide_by_zero() {
        let mut g = RnnGradients::zeros(4, 6);
        clip_gradients(&mut g, 5.0);
        assert_eq!(grad_norm(&g), 0.0);
        assert!(g.wxh.data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_clip_is_idempotent() {
        let mut g = bundle_with(vec![300.0, 400.0], vec![120.0, -7.0]);
        clip_gradients(&mut g, 5.0);
        let after_first: Vec<f32> = g.bh.data.clone();
        clip_gradients(&mut g, 5.0);
        // A second pass may rescale by a factor within rounding of 1.0,
        // never by anything material.
        for (a, b) in g.bh.data.iter().zip(&after_first) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
