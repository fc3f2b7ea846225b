use crate::{
    IndexSampler,
    ddg::{DdgTree, Levels, RealDdgTree},
    flip::BitStream,
};

/// Random walk down the implicit DDG tree.
///
/// Two registers: depth `c` and rank `d` among the nodes at that depth.
/// Landing on the reject leaf restarts from the root, so retries loop
/// here instead of recursing.
pub(crate) fn walk<B: BitStream + ?Sized>(n: usize, levels: &Levels, bits: &mut B) -> usize {
    if n == 1 {
        return 0;
    }
    let h = levels.h();
    let mut c = 0usize;
    let mut d = 0usize;
    loop {
        let b = bits.next_bit() as usize;
        d = 2 * d + (1 - b);
        if d < h[c] {
            match levels.leaf(d, c) {
                Some(z) if z < n => return z,
                // reject
                _ => {
                    c = 0;
                    d = 0;
                }
            }
        } else {
            d -= h[c];
            c += 1;
        }
    }
}

impl DdgTree {
    /// Draw one outcome index in `0..n`.
    ///
    /// Consumes, in expectation, fewer than two bits beyond the entropy of the
    /// weights. A single-outcome tree returns `0` without reading any bits.
    #[inline]
    pub fn sample<B: BitStream + ?Sized>(&self, bits: &mut B) -> usize {
        walk(self.n, &self.levels, bits)
    }
}

impl RealDdgTree {
    /// Draw one outcome index in `0..n`. See [`DdgTree::sample`].
    #[inline]
    pub fn sample<B: BitStream + ?Sized>(&self, bits: &mut B) -> usize {
        walk(self.n, &self.levels, bits)
    }
}

impl IndexSampler for DdgTree {
    #[inline]
    fn len(&self) -> usize {
        // call the inherent method explicitly to avoid trait-recursion
        DdgTree::len(self)
    }
    #[inline]
    fn sample_index<B: BitStream + ?Sized>(&self, bits: &mut B) -> usize {
        DdgTree::sample(self, bits)
    }
}

impl IndexSampler for RealDdgTree {
    #[inline]
    fn len(&self) -> usize {
        RealDdgTree::len(self)
    }
    #[inline]
    fn sample_index<B: BitStream + ?Sized>(&self, bits: &mut B) -> usize {
        RealDdgTree::sample(self, bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flip::BitSource;
    use rand::{SeedableRng, rngs::StdRng};

    /// Replays scripted bits and counts how many were read.
    struct Script {
        bits: Vec<u32>,
        read: usize,
    }

    impl Script {
        fn new(bits: &[u32]) -> Self {
            Self {
                bits: bits.to_vec(),
                read: 0,
            }
        }
    }

    impl BitStream for Script {
        fn next_bit(&mut self) -> u32 {
            let b = self.bits[self.read];
            self.read += 1;
            b
        }
    }

    fn sample_counts(tree: &DdgTree, rng: &mut BitSource<StdRng>, draws: usize) -> Vec<usize> {
        let mut counts = vec![0usize; tree.len()];
        for _ in 0..draws {
            counts[tree.sample(rng)] += 1;
        }
        counts
    }

    #[test]
    fn degenerate_singleton() {
        let tree = DdgTree::new(&[5]).unwrap();
        let mut bits = BitSource::new(StdRng::seed_from_u64(7));
        for _ in 0..1000 {
            assert_eq!(tree.sample(&mut bits), 0);
        }
        assert_eq!(bits.bits_consumed(), 0);

        let real = RealDdgTree::new(&[0.3]).unwrap();
        let mut none = Script::new(&[]);
        assert_eq!(real.sample(&mut none), 0);
    }

    #[test]
    fn follows_scripted_paths() {
        // [1, 2, 3]: h = [0, 3, 2]
        //   level 1 holds 1, 2, reject; level 2 holds 0, 2
        let tree = DdgTree::new(&[1, 2, 3]).unwrap();

        // 1,1: d = 0 -> not a leaf at level 0; d = 0 at level 1 -> outcome 1
        let mut s = Script::new(&[1, 1]);
        assert_eq!(tree.sample(&mut s), 1);
        assert_eq!(s.read, 2);

        // 1,0: d = 1 at level 1 -> outcome 2
        assert_eq!(tree.sample(&mut Script::new(&[1, 0])), 2);

        // 0,1: d = 1 at level 0, then d = 2 -> reject; restart with 1,1
        let mut s = Script::new(&[0, 1, 1, 1]);
        assert_eq!(tree.sample(&mut s), 1);
        assert_eq!(s.read, 4);

        // 0,0: d = 3 at level 1, past h = 3 -> d = 0 at level 2;
        // then 0 -> d = 1 -> outcome 2
        assert_eq!(tree.sample(&mut Script::new(&[0, 0, 0])), 2);
        assert_eq!(tree.sample(&mut Script::new(&[0, 0, 1])), 0);
    }

    #[test]
    fn roughly_matches_distribution() {
        let weights = [1u64, 2, 3, 4];
        let tree = DdgTree::new(&weights).unwrap();

        let mut rng = BitSource::new(StdRng::seed_from_u64(42));
        let draws = 20_000usize;
        let counts = sample_counts(&tree, &mut rng, draws);

        let sum_w: u64 = weights.iter().sum();
        for (i, &c) in counts.iter().enumerate() {
            let p = weights[i] as f64 / sum_w as f64;
            let emp = c as f64 / draws as f64;
            assert!((emp - p).abs() < 0.02, "i={i} emp={emp} p={p}");
        }
    }

    #[test]
    fn trait_and_inherent_agree() {
        let tree = RealDdgTree::new(&[0.25, 0.13, 1.12]).unwrap();
        let mut a = BitSource::new(StdRng::seed_from_u64(3));
        let mut b = BitSource::new(StdRng::seed_from_u64(3));
        for _ in 0..500 {
            assert_eq!(tree.sample(&mut a), IndexSampler::sample_index(&tree, &mut b));
        }
        assert_eq!(IndexSampler::len(&tree), 3);
    }
}
