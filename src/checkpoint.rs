//! Weight Persistence
//!
//! Serializes the five parameter tensors to JSON so a trained model can be
//! reloaded and trained further or used for generation. The hidden state is
//! deliberately not persisted: it is per-run scratch, reset at every
//! sequence boundary.
//!
//! Loading validates every tensor's shape against the receiving model
//! before anything is assigned, so a failed restore leaves the model
//! exactly as it was.

use crate::error::{Result, RnnError};
use crate::model::CharRnn;
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::fs;

/// A serializable snapshot of a model's parameters.
#[derive(Debug, Serialize, Deserialize)]
pub struct Weights {
    pub wxh: Tensor,
    pub whh: Tensor,
    pub why: Tensor,
    pub bh: Tensor,
    pub by: Tensor,
}

impl Weights {
    /// Write the snapshot to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a snapshot from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl CharRnn {
    /// Clone the current parameters into a [`Weights`] snapshot.
    pub fn snapshot(&self) -> Weights {
        Weights {
            wxh: self.wxh.clone(),
            whh: self.whh.clone(),
            why: self.why.clone(),
            bh: self.bh.clone(),
            by: self.by.clone(),
        }
    }

    /// Replace the model's parameters with a snapshot.
    ///
    /// All five shapes are checked before any tensor is assigned: a snapshot
    /// taken from a model with different dimensions is rejected whole, and
    /// the receiving model keeps its current parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RnnError::ShapeMismatch`] naming the first tensor whose
    /// shape disagrees with this model's dimensions.
    pub fn restore(&mut self, weights: Weights) -> Result<()> {
        let expected: [(&'static str, &Tensor, &Tensor); 5] = [
            ("wxh", &self.wxh, &weights.wxh),
            ("whh", &self.whh, &weights.whh),
            ("why", &self.why, &weights.why),
            ("bh", &self.bh, &weights.bh),
            ("by", &self.by, &weights.by),
        ];
        for (name, current, incoming) in expected {
            if current.shape != incoming.shape {
                return Err(RnnError::ShapeMismatch {
                    tensor: name,
                    expected: current.shape.clone(),
                    found: incoming.shape.clone(),
                });
            }
        }

        self.wxh = weights.wxh;
        self.whh = weights.whh;
        self.why = weights.why;
        self.bh = weights.bh;
        self.by = weights.by;
        self.reset_hidden();
        Ok(())
    }
}
