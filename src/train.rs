//! Mini-Batch Training
//!
//! The trainer drives the model through a three-level loop —
//! `epoch → batch → sequence-step` — with gradient accumulation, global-norm
//! clipping, and a count-scaled update at the end of each batch.
//!
//! ## How Sequences Are Sampled
//!
//! Candidate sequence start offsets step through the corpus at half the
//! sequence length, then get shuffled fresh each epoch:
//!
//! ```text
//! Indices: [........................................]   len n
//! Starts:   0     s/2     s     3s/2    2s    ...        (stride = seq_len/2)
//! Epoch:    shuffle(starts), process in batches of batch_size
//! ```
//!
//! Each sequence contributes `seq_len` (input, target) steps, with the
//! target always one position ahead of the input.
//!
//! ## Batch Accounting
//!
//! Per-step gradients are *accumulated* (summed) into one bundle for the
//! whole batch, clipped once, then applied with an effective learning rate
//! of `base_rate / valid_sequences`. Dividing the rate by the contributing
//! sequence count is equivalent to averaging the accumulated gradient
//! before scaling by the base rate.
//!
//! ## Failure Posture
//!
//! Isolated bad steps (an index outside the vocabulary, a failed forward or
//! backward call) are logged and skipped without touching the batch
//! accumulator. Systemic problems — a corpus whose indices exceed the
//! model's vocabulary, or one too short to yield a single sequence — are
//! configuration errors reported before any training happens. An epoch
//! whose average loss exceeds the divergence threshold stops training
//! early, keeping the parameters from the last completed batch.

use crate::error::{Result, RnnError};
use crate::gradients::clip_gradients;
use crate::model::{CharRnn, RnnGradients, LOG_EPSILON};
use crate::training_logger::TrainingLogger;
use rand::seq::SliceRandom;
use rand::Rng;

/// Hyperparameters for a training run.
#[derive(Clone, Debug)]
pub struct TrainingConfig {
    /// Passes over the corpus
    pub epochs: usize,
    /// Symbols per training sequence
    pub seq_len: usize,
    /// Sequences per parameter update
    pub batch_size: usize,
    /// Base learning rate (divided by the batch's valid-sequence count)
    pub learning_rate: f32,
    /// Global L2 bound for gradient clipping
    pub max_grad_norm: f32,
    /// Average epoch loss above which training stops as diverged
    pub divergence_threshold: f32,
    /// Console progress cadence when no logger is attached (in epochs)
    pub log_every: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            seq_len: 20,
            batch_size: 8,
            learning_rate: 0.1,
            max_grad_norm: 5.0,
            divergence_threshold: 100.0,
            log_every: 3,
        }
    }
}

impl TrainingConfig {
    /// A configuration small enough for tests and quick experiments.
    pub fn tiny() -> Self {
        Self {
            epochs: 20,
            seq_len: 5,
            batch_size: 4,
            learning_rate: 0.1,
            ..Self::default()
        }
    }
}

/// Outcome of a training run.
#[derive(Debug)]
pub struct TrainingReport {
    /// Average per-batch loss for each completed epoch
    pub epoch_losses: Vec<f32>,
    /// True when training stopped early on the divergence threshold
    pub diverged: bool,
    /// Total parameter updates applied
    pub batches_run: usize,
}

impl TrainingReport {
    /// Average loss of the final completed epoch.
    pub fn final_loss(&self) -> Option<f32> {
        self.epoch_losses.last().copied()
    }
}

/// Validate corpus and configuration before any work starts.
fn validate(model: &CharRnn, data: &[usize], config: &TrainingConfig) -> Result<usize> {
    if config.seq_len == 0 || config.batch_size == 0 {
        return Err(RnnError::Config(
            "seq_len and batch_size must be positive".into(),
        ));
    }
    // n_sequences must be positive: the corpus needs seq_len + 2 symbols to
    // yield even one (input, target) sequence.
    if data.len() < config.seq_len + 2 {
        return Err(RnnError::CorpusTooShort {
            len: data.len(),
            needed: config.seq_len + 2,
        });
    }
    if let Some(&max_idx) = data.iter().max() {
        if max_idx >= model.vocab_size() {
            return Err(RnnError::Config(format!(
                "corpus contains index {} but vocab size is {}",
                max_idx,
                model.vocab_size()
            )));
        }
    }
    Ok(data.len() - config.seq_len - 1)
}

/// Train the model on an index sequence.
///
/// All shuffling randomness comes from the injected `rng`; a seeded
/// generator makes the run reproducible. When a [`TrainingLogger`] is
/// attached, every epoch is logged to it; otherwise progress prints every
/// `log_every` epochs.
///
/// # Errors
///
/// Configuration errors (corpus too short, indices beyond the vocabulary,
/// zero-sized sequence or batch) are returned before any parameter is
/// touched. Per-step failures during training are logged and skipped, never
/// propagated.
pub fn train(
    model: &mut CharRnn,
    data: &[usize],
    config: &TrainingConfig,
    rng: &mut impl Rng,
    mut logger: Option<&mut TrainingLogger>,
) -> Result<TrainingReport> {
    let n_sequences = validate(model, data, config)?;

    println!("Training on {} sequences...", n_sequences);

    let stride = (config.seq_len / 2).max(1);
    let mut report = TrainingReport {
        epoch_losses: Vec::with_capacity(config.epochs),
        diverged: false,
        batches_run: 0,
    };

    for epoch in 0..config.epochs {
        let mut total_loss = 0.0f32;
        let mut n_batches = 0usize;

        // Fresh permutation of candidate sequence starts each epoch.
        let mut starts: Vec<usize> = (0..n_sequences.saturating_sub(config.seq_len))
            .step_by(stride)
            .collect();
        starts.shuffle(rng);

        for batch in starts.chunks(config.batch_size) {
            let mut accum = RnnGradients::zeros_like(model);
            let mut batch_loss = 0.0f32;
            let mut valid_sequences = 0usize;

            for &seq_start in batch {
                if seq_start + config.seq_len + 1 >= data.len() {
                    continue;
                }

                model.reset_hidden();
                let mut sequence_loss = 0.0f32;

                for t in 0..config.seq_len {
                    let input_idx = data[seq_start + t];
                    let target_idx = data[seq_start + t + 1];

                    if input_idx >= model.vocab_size() || target_idx >= model.vocab_size() {
                        println!(
                            "Skipping invalid indices: input={}, target={}, vocab_size={}",
                            input_idx,
                            target_idx,
                            model.vocab_size()
                        );
                        continue;
                    }

                    let probs = match model.forward(input_idx) {
                        Ok(p) => p,
                        Err(e) => {
                            println!("Error in forward pass: {}", e);
                            continue;
                        }
                    };

                    sequence_loss -= (probs[target_idx] + LOG_EPSILON).ln();

                    match model.backward(target_idx, &probs) {
                        Ok(grads) => accum.accumulate(&grads),
                        Err(e) => {
                            println!("Error in backward pass: {}", e);
                            continue;
                        }
                    }
                }

                batch_loss += sequence_loss;
                valid_sequences += 1;
            }

            if valid_sequences == 0 {
                continue;
            }

            clip_gradients(&mut accum, config.max_grad_norm);
            model.apply_update(&accum, config.learning_rate / valid_sequences as f32);

            total_loss += batch_loss;
            n_batches += 1;
        }

        let avg_loss = total_loss / n_batches.max(1) as f32;
        report.epoch_losses.push(avg_loss);
        report.batches_run += n_batches;

        match logger.as_deref_mut() {
            Some(lg) => lg.log(epoch, avg_loss)?,
            None => {
                if epoch % config.log_every.max(1) == 0 {
                    println!("Epoch {:2} - Avg Loss: {:.4}", epoch, avg_loss);
                }
            }
        }

        if avg_loss > config.divergence_threshold {
            println!("Loss too high, stopping training");
            report.diverged = true;
            break;
        }
    }

    Ok(report)
}
