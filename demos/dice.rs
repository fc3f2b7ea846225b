use fldr::{BitSource, WeightedEnum};
use std::collections::HashMap;

#[derive(Copy, Eq, PartialEq, Clone, Debug, Hash, WeightedEnum)]
enum Face {
    #[weight(1)]
    One,
    #[weight(1)]
    Two,
    #[weight(1)]
    Three,
    #[weight(1)]
    Four,
    #[weight(1)]
    Five,
    // loaded
    #[weight(3)]
    Six,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let die = Face::droptable()?;
    let mut bits = BitSource::from_thread_rng();
    let mut hist: HashMap<Face, u64> = HashMap::default();

    let rolls = 200_000;
    for _ in 0..rolls {
        *hist.entry(die.sample_owned(&mut bits)).or_default() += 1;
    }

    let total: u64 = Face::WEIGHTS.iter().sum();
    for (face, &w) in Face::VARIANTS.iter().zip(Face::WEIGHTS) {
        let seen = hist.get(face).copied().unwrap_or(0);
        println!(
            "{face:?}: {seen:>7}  ({:.4} vs exact {w}/{total})",
            seen as f64 / rolls as f64
        );
    }
    println!(
        "{:.3} bits per roll",
        bits.bits_consumed() as f64 / rolls as f64
    );

    Ok(())
}
