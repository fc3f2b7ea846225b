use fldr::{BitSource, RealDdgTree};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // None of these is a short binary fraction; the total is still exact.
    let weights = [0.25, 0.13, 1.12];
    let tree = RealDdgTree::new(&weights)?;

    println!("depth k = {}", tree.depth());
    println!("total m = {} ({} digits)", tree.total(), tree.total().len());
    println!("reject r = {}", tree.reject());
    println!("\nexported structure:\n{tree}");

    let parsed: RealDdgTree = tree.to_string().parse()?;
    assert_eq!(parsed, tree);

    let mut bits = BitSource::from_thread_rng();
    let draws = 100_000;
    let mut counts = [0u64; 3];
    for _ in 0..draws {
        counts[tree.sample(&mut bits)] += 1;
    }
    let sum: f64 = weights.iter().sum();
    for (i, c) in counts.iter().enumerate() {
        println!(
            "outcome {i}: {:.4} (target {:.4})",
            *c as f64 / draws as f64,
            weights[i] / sum
        );
    }
    Ok(())
}
