//! Train a character-level recurrent network on a text corpus and generate
//! completions for a few prompts.
//!
//! ```text
//! puck --data chat.txt --epochs 40 --hidden-size 32
//! puck --prompt "you: hi" --prompt "you: how" --temperature 0.9
//! ```
//!
//! When the corpus file is missing, a tiny built-in chat corpus is used so
//! the whole pipeline can be exercised without any setup.

use clap::Parser;
use puck::{
    generate, preprocess, train, CharRnn, Result, RnnError, TrainingConfig, TrainingLogger,
    Weights,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::process;

#[derive(Parser, Debug)]
#[command(about = "Train a character-level RNN from scratch")]
struct Args {
    /// Path to the training corpus
    #[arg(long, default_value = "chat.txt")]
    data: String,

    /// Hidden layer width
    #[arg(long, default_value_t = 32)]
    hidden_size: usize,

    /// Base learning rate
    #[arg(long, default_value_t = 0.05)]
    learning_rate: f32,

    /// Number of training epochs
    #[arg(long, default_value_t = 40)]
    epochs: usize,

    /// Symbols per training sequence
    #[arg(long, default_value_t = 15)]
    seq_len: usize,

    /// Sequences per parameter update
    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    /// Global L2 bound for gradient clipping
    #[arg(long, default_value_t = 5.0)]
    grad_clip: f32,

    /// Weight checkpoint path (loaded if present, saved after training)
    #[arg(long, default_value = "weights.json")]
    weights: String,

    /// CSV training log path
    #[arg(long, default_value = "training_log.csv")]
    log: String,

    /// Maximum characters per generated completion
    #[arg(long, default_value_t = 50)]
    gen_len: usize,

    /// Sampling temperature (lower is more conservative)
    #[arg(long, default_value_t = 0.7)]
    temperature: f32,

    /// RNG seed for reproducible runs; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Prompt to complete after training (repeatable)
    #[arg(long = "prompt")]
    prompts: Vec<String>,

    /// Start from fresh weights even if a checkpoint exists
    #[arg(long)]
    no_resume: bool,
}

/// A minimal chat corpus for runs without a data file.
fn fallback_corpus() -> String {
    let pairs = [
        "you: hi\nbot: hello there\n",
        "you: how are you\nbot: doing well thanks\n",
        "you: what is your name\nbot: i am a small rnn\n",
        "you: bye\nbot: see you later\n",
    ];
    pairs.join("").repeat(10)
}

fn run(args: Args) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let text = match fs::read_to_string(&args.data) {
        Ok(text) => text.replace('\t', "\n"),
        Err(_) => {
            println!("No corpus at {}, using built-in chat data", args.data);
            fallback_corpus()
        }
    };

    let (vocab, data) = preprocess(&text);
    if vocab.len() < 2 {
        return Err(RnnError::Config(format!(
            "corpus yields only {} distinct symbols, need at least 2",
            vocab.len()
        )));
    }

    println!(
        "Corpus: {} symbols, vocabulary: {} characters {}",
        data.len(),
        vocab.len(),
        vocab.preview(20)
    );

    let mut model = CharRnn::new(vocab.len(), args.hidden_size, &mut rng)?;
    println!(
        "Model: hidden {}, {} parameters",
        model.hidden_size(),
        model.num_parameters()
    );

    if !args.no_resume {
        match Weights::load(&args.weights) {
            Ok(weights) => match model.restore(weights) {
                Ok(()) => println!("Resumed from {}", args.weights),
                Err(e) => println!("Ignoring incompatible checkpoint: {}", e),
            },
            Err(_) => println!("No checkpoint at {}, starting fresh", args.weights),
        }
    }

    let config = TrainingConfig {
        epochs: args.epochs,
        seq_len: args.seq_len,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        max_grad_norm: args.grad_clip,
        ..TrainingConfig::default()
    };

    let mut logger = TrainingLogger::new(&args.log)?;
    let report = train(&mut model, &data, &config, &mut rng, Some(&mut logger))?;

    if report.diverged {
        println!("Training diverged; keeping last checkpoint-worthy parameters");
    }
    if let Some(loss) = report.final_loss() {
        println!(
            "Finished {} epochs, final avg loss {:.4}",
            report.epoch_losses.len(),
            loss
        );
    }

    model.snapshot().save(&args.weights)?;
    println!("Saved weights to {}", args.weights);

    let prompts = if args.prompts.is_empty() {
        vec![
            "you: hi".to_string(),
            "you: how".to_string(),
            "you: what".to_string(),
        ]
    } else {
        args.prompts.clone()
    };

    println!("\nGenerating at temperature {}:", args.temperature);
    for prompt in &prompts {
        let completion = generate(
            &mut model,
            &vocab,
            prompt,
            args.gen_len,
            args.temperature,
            &mut rng,
        )?;
        match completion {
            Some(text) => println!("  {:?} -> {:?}", prompt, text),
            None => println!("  {:?} -> (no output - try training longer)", prompt),
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
