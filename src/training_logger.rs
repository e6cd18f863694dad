//! Training Logger
//!
//! Tracks per-epoch training metrics to a CSV file and mirrors them to the
//! console. The CSV can be plotted later to compare runs.
//!
//! ## CSV Format
//!
//! - `epoch`: epoch number (0-based)
//! - `elapsed_seconds`: wall-clock time since the logger was created
//! - `avg_loss`: average per-batch loss for the epoch
//! - `perplexity`: `exp(avg_loss)` — only comparable between runs with the
//!   same batch accounting, since `avg_loss` is a per-batch sum
//!
//! Each row is flushed immediately so a crashed run still leaves a usable
//! log behind.

use std::fs::File;
use std::io::Write;
use std::time::Instant;

/// Per-epoch CSV + console logger.
pub struct TrainingLogger {
    log_file: File,
    start_time: Instant,
    last_log_time: Instant,
}

impl TrainingLogger {
    /// Create the CSV file and write its header.
    pub fn new(log_path: &str) -> std::io::Result<Self> {
        let mut log_file = File::create(log_path)?;
        writeln!(log_file, "epoch,elapsed_seconds,avg_loss,perplexity")?;

        let now = Instant::now();
        Ok(Self {
            log_file,
            start_time: now,
            last_log_time: now,
        })
    }

    /// Record one epoch: a CSV row plus a console line with timing.
    pub fn log(&mut self, epoch: usize, avg_loss: f32) -> std::io::Result<()> {
        let elapsed = self.start_time.elapsed().as_secs_f32();
        let perplexity = avg_loss.exp();

        writeln!(
            self.log_file,
            "{},{:.2},{:.4},{:.2}",
            epoch, elapsed, avg_loss, perplexity
        )?;
        self.log_file.flush()?;

        let epoch_time = self.last_log_time.elapsed().as_secs_f32();
        println!(
            "Epoch {:3} | Time: {:7.1}s (+{:.1}s) | Avg Loss: {:.4}",
            epoch, elapsed, epoch_time, avg_loss
        );

        self.last_log_time = Instant::now();
        Ok(())
    }
}
