use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fldr::{BitSource, DdgTree, RealDdgTree};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

fn gen_weights(n: usize) -> Vec<u64> {
    let mut rng = Pcg32::seed_from_u64(777);
    (0..n).map(|_| rng.random_range(1..=1024u64)).collect()
}

fn gen_real_weights(n: usize) -> Vec<f64> {
    let mut rng = Pcg32::seed_from_u64(778);
    (0..n).map(|_| 0.1 + rng.random::<f64>()).collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddg_build");
    for &n in &[2usize, 8, 64, 256, 1024] {
        let weights = gen_weights(n);
        let reals = gen_real_weights(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("integer_n={n}"), |b| {
            b.iter(|| black_box(DdgTree::new(black_box(&weights))).unwrap());
        });
        group.bench_function(format!("real_n={n}"), |b| {
            b.iter(|| black_box(RealDdgTree::new(black_box(&reals))).unwrap());
        });
    }
    group.finish();
}

fn bench_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddg_sample");
    const DRAWS_PER_ITER: usize = 1024;

    for &n in &[2usize, 8, 64, 256, 1024] {
        let tree = DdgTree::new(&gen_weights(n)).unwrap();
        let real = RealDdgTree::new(&gen_real_weights(n)).unwrap();
        group.throughput(Throughput::Elements(DRAWS_PER_ITER as u64));

        group.bench_function(format!("integer_n={n}"), |b| {
            b.iter_batched_ref(
                || BitSource::new(Pcg32::seed_from_u64(999)),
                |bits| {
                    let mut s = 0usize;
                    for _ in 0..DRAWS_PER_ITER {
                        s ^= tree.sample(bits);
                    }
                    black_box(s)
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(format!("real_n={n}"), |b| {
            b.iter_batched_ref(
                || BitSource::new(Pcg32::seed_from_u64(1001)),
                |bits| {
                    let mut s = 0usize;
                    for _ in 0..DRAWS_PER_ITER {
                        s ^= real.sample(bits);
                    }
                    black_box(s)
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(ddg, bench_build, bench_sample);
criterion_main!(ddg);
