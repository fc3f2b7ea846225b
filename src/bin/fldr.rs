//! Draw samples from a weight file.
//!
//! ```text
//! fldr 10 weights.txt            # integer weights
//! fldr 10 weights.txt --real     # f64 weights, sampled exactly
//! fldr 10 weights.txt --write    # also export weights.txt.fldr(f)
//! ```
//!
//! The weight file holds a count `n` followed by `n` weights.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use fldr::codec::{self, INTEGER_EXTENSION, REAL_EXTENSION};
use fldr::{BitSource, BitStream, DEFAULT_WORD_BITS, DdgTree, FldrError, IndexSampler, RealDdgTree};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use tracing::info;

#[derive(Parser)]
#[command(name = "fldr", about = "Exact sampling from a discrete distribution", version)]
struct Cli {
    /// Number of samples to draw
    count: usize,

    /// Weight file: a count followed by that many weights
    path: PathBuf,

    /// Read weights as reals instead of integers
    #[arg(long)]
    real: bool,

    /// Export the built structure next to the weight file
    #[arg(long)]
    write: bool,

    /// Seed the generator for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Bits taken from each generator word
    #[arg(long, default_value_t = DEFAULT_WORD_BITS)]
    word_bits: u32,

    /// Enable verbose output
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all logs
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    // Logs are off unless --verbose; RUST_LOG only refines --verbose.
    let filter = if cli.verbose && !cli.quiet {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn export_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// `Pcg32` when seeded so runs are reproducible, the thread generator otherwise.
fn generator(seed: Option<u64>) -> Box<dyn RngCore> {
    match seed {
        Some(seed) => Box::new(Pcg32::seed_from_u64(seed)),
        None => Box::new(rand::rng()),
    }
}

fn draw<S: IndexSampler, B: BitStream>(sampler: &S, bits: &mut B, count: usize) -> Vec<usize> {
    (0..count).map(|_| sampler.sample_index(bits)).collect()
}

fn finish<T: Display>(tree: &T, samples: &[usize], cli: &Cli, extension: &str) -> Result<(), FldrError> {
    let line = samples
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    println!("{line}");

    if cli.write {
        let out = export_path(&cli.path, extension);
        codec::write_file(&out, tree)?;
        info!(path = %out.display(), "wrote structure");
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<(), FldrError> {
    let text = fs::read_to_string(&cli.path)?;
    let mut bits = BitSource::with_word_bits(generator(cli.seed), cli.word_bits)?;

    if cli.real {
        let weights: Vec<f64> = codec::parse_weights(&text)?;
        let tree = RealDdgTree::new(&weights)?;
        info!(n = tree.len(), k = tree.depth(), "loaded real weights");
        let samples = draw(&tree, &mut bits, cli.count);
        finish(&tree, &samples, cli, REAL_EXTENSION)?;
    } else {
        let weights: Vec<u64> = codec::parse_weights(&text)?;
        let tree = DdgTree::new(&weights)?;
        info!(n = tree.len(), k = tree.depth(), "loaded integer weights");
        let samples = draw(&tree, &mut bits, cli.count);
        finish(&tree, &samples, cli, INTEGER_EXTENSION)?;
    }
    info!(bits = bits.bits_consumed(), "done");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(seed: Option<u64>) -> Vec<usize> {
        let tree = DdgTree::new(&[1, 1, 2, 3, 1]).unwrap();
        let mut bits = BitSource::new(generator(seed));
        draw(&tree, &mut bits, 64)
    }

    #[test]
    fn seeded_runs_repeat() {
        assert_eq!(samples(Some(42)), samples(Some(42)));
        assert_ne!(samples(Some(42)), samples(Some(43)));
    }

    #[test]
    fn seed_selects_pcg32() {
        let mut ours = generator(Some(9));
        let mut pcg = Pcg32::seed_from_u64(9);
        for _ in 0..8 {
            assert_eq!(ours.next_u32(), pcg.next_u32());
        }
    }

    #[test]
    fn export_path_appends_extension() {
        let out = export_path(Path::new("w.txt"), INTEGER_EXTENSION);
        assert_eq!(out, PathBuf::from("w.txt.fldr"));
    }
}
