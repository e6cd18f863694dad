//! The Recurrent Parameter Model
//!
//! This module implements the character-level recurrent network itself: the
//! five trainable tensors, the running hidden state, and the hand-written
//! forward and backward passes. There is no autograd anywhere — every
//! gradient is the chain rule written out explicitly.
//!
//! ## Architecture
//!
//! A single recurrent layer with a softmax head:
//!
//! ```text
//! x        one-hot input            [vocab]
//! h        = tanh(wxh @ x + whh @ h_prev + bh)   [hidden]
//! logits   = why @ h + by                        [vocab]
//! probs    = softmax(logits)                     [vocab]
//! ```
//!
//! ## Backward Pass
//!
//! The softmax + cross-entropy head has the famously clean gradient
//! `d(loss)/d(logits) = probs - onehot(target)`, which then flows back
//! through the output projection and the tanh:
//!
//! ```text
//! dy       = probs; dy[target] -= 1
//! dwhy     = dy ⊗ h            dby = dy
//! dh       = whyᵀ @ dy
//! dh_raw   = dh ⊙ (1 - h²)                       (tanh derivative)
//! dwxh     = dh_raw ⊗ onehot   dwhh = dh_raw ⊗ h_prev   dbh = dh_raw
//! ```
//!
//! ## Truncated Backpropagation
//!
//! Gradient flow stops at `h_prev`: the previous hidden state is treated as
//! a constant, so backpropagation-through-time has a depth of exactly one
//! step. This is a deliberate, documented limitation of the model — deeper
//! unrolling would change what it learns, not just how fast.
//!
//! ## Hidden State
//!
//! `h` and `h_prev` are owned by the model and mutated by every `forward`
//! call. The call is therefore not idempotent: it advances recurrent state.
//! Callers reset the state at the start of each training sequence and each
//! generation run via [`CharRnn::reset_hidden`].

use crate::error::{Result, RnnError};
use crate::tensor::Tensor;
use rand::Rng;

/// Additive epsilon used when taking logarithms of probabilities.
pub const LOG_EPSILON: f32 = 1e-8;

/// A character-level recurrent network with explicit parameters.
///
/// Owns the five trainable tensors and the recurrent hidden state. Not safe
/// for concurrent use: `forward` mutates the hidden state in place.
pub struct CharRnn {
    /// Input-to-hidden weights, `[hidden, vocab]`
    pub(crate) wxh: Tensor,
    /// Hidden-to-hidden (recurrent) weights, `[hidden, hidden]`
    pub(crate) whh: Tensor,
    /// Hidden-to-output weights, `[vocab, hidden]`
    pub(crate) why: Tensor,
    /// Hidden bias, `[hidden]`
    pub(crate) bh: Tensor,
    /// Output bias, `[vocab]`
    pub(crate) by: Tensor,

    /// Current hidden state
    h: Vec<f32>,
    /// Hidden state before the most recent forward step
    h_prev: Vec<f32>,
    /// Input index of the most recent forward step (the implicit one-hot)
    last_input: usize,

    hidden_size: usize,
    vocab_size: usize,
}

impl CharRnn {
    /// Create a model sized for a vocabulary, with Glorot-uniform weights.
    ///
    /// Weight matrices are drawn uniformly from `[-limit, limit]` with
    /// `limit = sqrt(6 / (hidden_size + vocab_size))`; biases and hidden
    /// state start at zero. All randomness comes from the injected `rng`, so
    /// a seeded generator reproduces the same initialization.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `hidden_size` is zero or the
    /// vocabulary has fewer than two symbols.
    pub fn new(vocab_size: usize, hidden_size: usize, rng: &mut impl Rng) -> Result<Self> {
        if hidden_size == 0 {
            return Err(RnnError::Config("hidden_size must be positive".into()));
        }
        if vocab_size < 2 {
            return Err(RnnError::Config(format!(
                "vocabulary needs at least 2 symbols, got {}",
                vocab_size
            )));
        }

        let limit = (6.0 / (hidden_size + vocab_size) as f32).sqrt();
        let mut uniform =
            |len: usize| -> Vec<f32> { (0..len).map(|_| rng.random_range(-limit..limit)).collect() };

        Ok(Self {
            wxh: Tensor::new(uniform(hidden_size * vocab_size), vec![hidden_size, vocab_size]),
            whh: Tensor::new(uniform(hidden_size * hidden_size), vec![hidden_size, hidden_size]),
            why: Tensor::new(uniform(vocab_size * hidden_size), vec![vocab_size, hidden_size]),
            bh: Tensor::zeros(vec![hidden_size]),
            by: Tensor::zeros(vec![vocab_size]),
            h: vec![0.0; hidden_size],
            h_prev: vec![0.0; hidden_size],
            last_input: 0,
            hidden_size,
            vocab_size,
        })
    }

    /// Hidden layer width.
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Vocabulary size the model was built for.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Total number of trainable parameters.
    pub fn num_parameters(&self) -> usize {
        self.wxh.len() + self.whh.len() + self.why.len() + self.bh.len() + self.by.len()
    }

    /// Zero the recurrent state.
    ///
    /// Called at the start of every training sequence and generation run.
    pub fn reset_hidden(&mut self) {
        self.h.iter_mut().for_each(|v| *v = 0.0);
        self.h_prev.iter_mut().for_each(|v| *v = 0.0);
    }

    /// One forward step: consume a symbol, produce the next-symbol
    /// distribution.
    ///
    /// Advances the recurrent state as a side effect (`h_prev` takes the old
    /// `h`, `h` becomes the new activation), so consecutive calls within a
    /// sequence carry context forward.
    ///
    /// # Errors
    ///
    /// Returns [`RnnError::IndexOutOfRange`] when `symbol_index` is not a
    /// valid vocabulary index.
    pub fn forward(&mut self, symbol_index: usize) -> Result<Vec<f32>> {
        if symbol_index >= self.vocab_size {
            return Err(RnnError::IndexOutOfRange {
                index: symbol_index,
                vocab_size: self.vocab_size,
            });
        }

        self.h_prev.copy_from_slice(&self.h);
        self.last_input = symbol_index;

        // Hidden layer: h = tanh(wxh @ onehot + whh @ h_prev + bh).
        // The one-hot product collapses to a single column of wxh.
        for i in 0..self.hidden_size {
            let mut a = self.bh.data[i] + self.wxh.data[i * self.vocab_size + symbol_index];
            let row = &self.whh.data[i * self.hidden_size..(i + 1) * self.hidden_size];
            for (j, &w) in row.iter().enumerate() {
                a += w * self.h_prev[j];
            }
            self.h[i] = a.tanh();
        }

        // Output layer: logits = why @ h + by
        let mut probs = vec![0.0; self.vocab_size];
        for (k, p) in probs.iter_mut().enumerate() {
            let mut z = self.by.data[k];
            let row = &self.why.data[k * self.hidden_size..(k + 1) * self.hidden_size];
            for (j, &w) in row.iter().enumerate() {
                z += w * self.h[j];
            }
            *p = z;
        }

        // Stable softmax: subtract the max logit before exponentiating so
        // large logits can't overflow exp().
        let max = probs.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        let mut sum = 0.0;
        for p in probs.iter_mut() {
            *p = (*p - max).exp();
            sum += *p;
        }
        for p in probs.iter_mut() {
            *p /= sum;
        }

        Ok(probs)
    }

    /// One backward step: gradients for the immediately preceding `forward`.
    ///
    /// `probs` must be the distribution that `forward` just returned — the
    /// two calls share the hidden state and one-hot input cached on the
    /// model, so they must refer to the same time step.
    ///
    /// Gradient flow stops at `h_prev` (see the module docs on truncated
    /// backpropagation).
    ///
    /// # Errors
    ///
    /// Returns [`RnnError::IndexOutOfRange`] when `target_index` is not a
    /// valid vocabulary index.
    pub fn backward(&self, target_index: usize, probs: &[f32]) -> Result<RnnGradients> {
        if target_index >= self.vocab_size {
            return Err(RnnError::IndexOutOfRange {
                index: target_index,
                vocab_size: self.vocab_size,
            });
        }
        debug_assert_eq!(probs.len(), self.vocab_size);

        let mut grads = RnnGradients::zeros(self.hidden_size, self.vocab_size);

        // Softmax + cross-entropy head: dy = probs - onehot(target)
        let mut dy = probs.to_vec();
        dy[target_index] -= 1.0;

        // dwhy = dy ⊗ h, dby = dy
        for k in 0..self.vocab_size {
            grads.by.data[k] = dy[k];
            let row = &mut grads.why.data[k * self.hidden_size..(k + 1) * self.hidden_size];
            for (j, g) in row.iter_mut().enumerate() {
                *g = dy[k] * self.h[j];
            }
        }

        // Back into the hidden layer: dh = whyᵀ @ dy
        let mut dh = vec![0.0; self.hidden_size];
        for k in 0..self.vocab_size {
            let d = dy[k];
            let row = &self.why.data[k * self.hidden_size..(k + 1) * self.hidden_size];
            for (j, &w) in row.iter().enumerate() {
                dh[j] += w * d;
            }
        }

        // Through the tanh, then out to the input-side tensors. The one-hot
        // input means dwxh has a single non-zero column.
        for i in 0..self.hidden_size {
            let dh_raw = dh[i] * (1.0 - self.h[i] * self.h[i]);
            grads.bh.data[i] = dh_raw;
            grads.wxh.data[i * self.vocab_size + self.last_input] = dh_raw;
            let row = &mut grads.whh.data[i * self.hidden_size..(i + 1) * self.hidden_size];
            for (j, g) in row.iter_mut().enumerate() {
                *g = dh_raw * self.h_prev[j];
            }
        }

        Ok(grads)
    }

    /// Subtract `learning_rate * gradient` from every parameter.
    pub fn apply_update(&mut self, grads: &RnnGradients, learning_rate: f32) {
        let step = |param: &mut Tensor, grad: &Tensor| {
            for (p, &g) in param.data.iter_mut().zip(&grad.data) {
                *p -= learning_rate * g;
            }
        };
        step(&mut self.wxh, &grads.wxh);
        step(&mut self.whh, &grads.whh);
        step(&mut self.why, &grads.why);
        step(&mut self.bh, &grads.bh);
        step(&mut self.by, &grads.by);
    }
}

/// Gradients for all five parameter tensors.
///
/// A typed, fixed-shape bundle mirroring [`CharRnn`]'s parameters. Produced
/// fresh by each `backward` call and by the trainer's batch accumulator;
/// never persisted.
pub struct RnnGradients {
    pub wxh: Tensor,
    pub whh: Tensor,
    pub why: Tensor,
    pub bh: Tensor,
    pub by: Tensor,
}

impl RnnGradients {
    /// Zero gradients shaped for a model of the given dimensions.
    pub fn zeros(hidden_size: usize, vocab_size: usize) -> Self {
        Self {
            wxh: Tensor::zeros(vec![hidden_size, vocab_size]),
            whh: Tensor::zeros(vec![hidden_size, hidden_size]),
            why: Tensor::zeros(vec![vocab_size, hidden_size]),
            bh: Tensor::zeros(vec![hidden_size]),
            by: Tensor::zeros(vec![vocab_size]),
        }
    }

    /// Zero gradients shaped like a model's parameters.
    pub fn zeros_like(model: &CharRnn) -> Self {
        Self::zeros(model.hidden_size(), model.vocab_size())
    }

    /// Element-wise `self += other`, for batch accumulation.
    pub fn accumulate(&mut self, other: &RnnGradients) {
        self.wxh.add_assign(&other.wxh);
        self.whh.add_assign(&other.whh);
        self.why.add_assign(&other.why);
        self.bh.add_assign(&other.bh);
        self.by.add_assign(&other.by);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_model(vocab: usize, hidden: usize, seed: u64) -> CharRnn {
        let mut rng = StdRng::seed_from_u64(seed);
        CharRnn::new(vocab, hidden, &mut rng).unwrap()
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            CharRnn::new(4, 0, &mut rng),
            Err(RnnError::Config(_))
        ));
        assert!(matches!(
            CharRnn::new(1, 8, &mut rng),
            Err(RnnError::Config(_))
        ));
    }

    #[test]
    fn test_initialization_bounds() {
        let model = test_model(10, 6, 7);
        let limit = (6.0f32 / 16.0).sqrt();
        for t in [&model.wxh, &model.whh, &model.why] {
            assert!(t.data.iter().all(|&w| w.abs() <= limit));
        }
        assert!(model.bh.data.iter().all(|&b| b == 0.0));
        assert!(model.by.data.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_forward_returns_distribution() {
        let mut model = test_model(5, 8, 42);
        for idx in 0..5 {
            let probs = model.forward(idx).unwrap();
            assert_eq!(probs.len(), 5);
            assert!(probs.iter().all(|&p| p >= 0.0));
            let sum: f32 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "sum = {}", sum);
        }
    }

    #[test]
    fn test_forward_stable_for_large_logits() {
        let mut model = test_model(3, 4, 1);
        // Force huge logits through the output bias; softmax must not
        // overflow into NaN/inf.
        model.by.data = vec![1000.0, -1000.0, 500.0];
        let probs = model.forward(0).unwrap();
        assert!(probs.iter().all(|p| p.is_finite()));
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_forward_rejects_out_of_range() {
        let mut model = test_model(4, 4, 2);
        assert!(matches!(
            model.forward(4),
            Err(RnnError::IndexOutOfRange { index: 4, vocab_size: 4 })
        ));
    }

    #[test]
    fn test_forward_advances_hidden_state() {
        let mut model = test_model(4, 4, 3);
        let p1 = model.forward(0).unwrap();
        let p2 = model.forward(0).unwrap();
        // Same input, different recurrent state: distributions differ.
        assert!(p1.iter().zip(&p2).any(|(a, b)| (a - b).abs() > 1e-7));

        model.reset_hidden();
        let p3 = model.forward(0).unwrap();
        assert_eq!(p1, p3);
    }

    #[test]
    fn test_backward_rejects_out_of_range() {
        let mut model = test_model(4, 4, 4);
        let probs = model.forward(1).unwrap();
        assert!(model.backward(9, &probs).is_err());
    }

    /// Finite-difference check of the analytic gradients.
    ///
    /// Uses the first step after a hidden-state reset, where `h_prev` is
    /// zero and the single-step backward pass is the exact gradient of the
    /// step loss.
    #[test]
    fn test_gradients_match_finite_differences() {
        let input = 1;
        let target = 2;
        let eps = 1e-3f32;

        let mut model = test_model(3, 4, 99);
        model.reset_hidden();
        let probs = model.forward(input).unwrap();
        let grads = model.backward(target, &probs).unwrap();

        let loss = |m: &mut CharRnn| -> f32 {
            m.reset_hidden();
            let p = m.forward(input).unwrap();
            -(p[target] + LOG_EPSILON).ln()
        };

        // Sample a handful of coordinates in each tensor that carries
        // gradient on a first step (whh does not: h_prev is zero).
        let mut check = |get: &dyn Fn(&CharRnn) -> &Tensor,
                         get_mut: &dyn Fn(&mut CharRnn) -> &mut Tensor,
                         grad: &Tensor,
                         name: &str| {
            let len = get(&model).len();
            for idx in [0, len / 2, len - 1] {
                let original = get(&model).data[idx];
                get_mut(&mut model).data[idx] = original + eps;
                let plus = loss(&mut model);
                get_mut(&mut model).data[idx] = original - eps;
                let minus = loss(&mut model);
                get_mut(&mut model).data[idx] = original;
                // Restore forward state for subsequent coordinates.
                model.reset_hidden();
                model.forward(input).unwrap();

                let numeric = (plus - minus) / (2.0 * eps);
                let analytic = grad.data[idx];
                assert!(
                    (numeric - analytic).abs() < 1e-2,
                    "{}[{}]: numeric {} vs analytic {}",
                    name,
                    idx,
                    numeric,
                    analytic
                );
            }
        };

        check(&|m| &m.wxh, &|m| &mut m.wxh, &grads.wxh, "wxh");
        check(&|m| &m.why, &|m| &mut m.why, &grads.why, "why");
        check(&|m| &m.bh, &|m| &mut m.bh, &grads.bh, "bh");
        check(&|m| &m.by, &|m| &mut m.by, &grads.by, "by");
    }

    /// The recurrent-weight gradient is the outer product of the tanh
    /// pre-activation gradient and the previous hidden state, and gradient
    /// never flows further back than that.
    #[test]
    fn test_whh_gradient_is_single_step() {
        let mut model = test_model(3, 4, 5);
        model.reset_hidden();

        // First step from zero state: h_prev is zero, so dwhh must be zero.
        let probs = model.forward(0).unwrap();
        let grads = model.backward(1, &probs).unwrap();
        assert!(grads.whh.data.iter().all(|&g| g == 0.0));

        // Second step: dwhh[i][j] == dbh[i] * h_prev[j] exactly, because
        // h_prev is treated as a constant.
        model.forward(2).unwrap();
        let probs = model.forward(1).unwrap();
        let grads = model.backward(2, &probs).unwrap();
        let hidden = model.hidden_size();
        for i in 0..hidden {
            for j in 0..hidden {
                let expected = grads.bh.data[i] * model.h_prev[j];
                let got = grads.whh.data[i * hidden + j];
                assert!((expected - got).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn test_apply_update_moves_against_gradient() {
        let mut model = test_model(3, 4, 6);
        let before = model.wxh.data.clone();

        let mut grads = RnnGradients::zeros_like(&model);
        grads.wxh.data[0] = 2.0;
        model.apply_update(&grads, 0.5);

        assert!((model.wxh.data[0] - (before[0] - 1.0)).abs() < 1e-7);
        assert_eq!(&model.wxh.data[1..], &before[1..]);
    }

    #[test]
    fn test_gradient_accumulation() {
        let mut acc = RnnGradients::zeros(2, 3);
        let mut g = RnnGradients::zeros(2, 3);
        g.by.data = vec![1.0, 2.0, 3.0];
        acc.accumulate(&g);
        acc.accumulate(&g);
        assert_eq!(acc.by.data, vec![2.0, 4.0, 6.0]);
    }
}
