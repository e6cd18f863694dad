//! # Puck: A Character-Level Recurrent Network From Scratch
//!
//! Puck trains a small recurrent network to predict the next character of a
//! text corpus, with every piece of the machinery written out by hand: the
//! parameter tensors, the forward pass, the backward pass via the explicit
//! chain rule, gradient clipping, and mini-batch SGD. There is no autograd
//! and no graph — the point is to see all of it.
//!
//! ## Pipeline
//!
//! ```text
//! corpus text
//!     │  preprocess: filter control chars, build sorted vocabulary
//!     ▼
//! index sequence ──► train: epoch → batch → step loop
//!     │                │  accumulate grads, clip, count-scaled update
//!     │                ▼
//!     │            CharRnn (wxh, whh, why, bh, by)
//!     │                │  snapshot / restore
//!     │                ▼
//!     │            weights.json
//!     ▼
//! generate: prime on a seed, sample with temperature until '\n'
//! ```
//!
//! ## Module Map
//!
//! - [`tensor`]: flat row-major storage with shape checking
//! - [`vocab`]: corpus preprocessing and the char ↔ index mapping
//! - [`model`]: the network, its forward pass, and its hand-written backward
//! - [`gradients`]: global-norm gradient clipping
//! - [`train`]: the mini-batch training loop
//! - [`training_logger`]: per-epoch CSV metrics
//! - [`sampler`]: temperature sampling and text generation
//! - [`checkpoint`]: JSON weight persistence
//! - [`error`]: the crate's error type
//!
//! ## Example
//!
//! ```rust,no_run
//! use puck::{preprocess, train, generate, CharRnn, TrainingConfig};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! # fn main() -> puck::Result<()> {
//! let text = std::fs::read_to_string("corpus.txt")?;
//! let (vocab, data) = preprocess(&text);
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut model = CharRnn::new(vocab.len(), 32, &mut rng)?;
//! train(&mut model, &data, &TrainingConfig::default(), &mut rng, None)?;
//!
//! if let Some(text) = generate(&mut model, &vocab, "hello", 50, 0.7, &mut rng)? {
//!     println!("{}", text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod error;
pub mod gradients;
pub mod model;
pub mod sampler;
pub mod tensor;
pub mod train;
pub mod training_logger;
pub mod vocab;

pub use checkpoint::Weights;
pub use error::{Result, RnnError};
pub use gradients::{clip_gradients, grad_norm};
pub use model::{CharRnn, RnnGradients};
pub use sampler::{generate, sample};
pub use tensor::Tensor;
pub use train::{train, TrainingConfig, TrainingReport};
pub use training_logger::TrainingLogger;
pub use vocab::{preprocess, Vocabulary};
