//! Construction of discrete distribution generating (DDG) trees.
//!
//! A weight vector with total `m` is padded with a reject outcome of weight
//! `2^k - m`, making the total exactly `2^k`. Every outcome then owns one
//! leaf at depth `j + 1` for each set bit at position `j` of its weight.
//! Reading the bits of all `n + 1` weights level by level gives the tree.
//! Nothing else has to be stored.
//!
//! Two builders share the level construction:
//! * [`DdgTree`] for `u64` weights;
//! * [`RealDdgTree`] for `f64` weights, totalled exactly in binary digits.

use tracing::{debug, trace};

use crate::digits::Digits;
use crate::error::{FldrError, Result};
use crate::exact::ExactWeight;

/// Smallest `k` with `2^k >= x`, in constant time.
///
/// Binary search over fixed masks finds `floor(log2 x)`; one more is added
/// unless `x` is a power of two. `x` must be non-zero.
pub fn ceil_log2(x: u64) -> u32 {
    const MASKS: [u64; 6] = [
        0xFFFF_FFFF_0000_0000,
        0x0000_0000_FFFF_0000,
        0x0000_0000_0000_FF00,
        0x0000_0000_0000_00F0,
        0x0000_0000_0000_000C,
        0x0000_0000_0000_0002,
    ];
    debug_assert!(x != 0, "ceil_log2(0) is undefined");

    let mut y = if x & x.wrapping_sub(1) == 0 { 0 } else { 1 };
    let mut x = x;
    let mut j = 32;
    for mask in MASKS {
        let shift = if x & mask == 0 { 0 } else { j };
        y += shift;
        x >>= shift;
        j >>= 1;
    }
    y
}

/// Outcome labels of the leaves, one column per tree level.
///
/// Row-major `(n + 1) x k` with stride `k`. Column `j` lists, densely from
/// row 0, the outcomes owning a leaf at depth `j + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafTable {
    rows: usize,
    stride: usize,
    cells: Vec<Option<usize>>,
}

impl LeafTable {
    pub(crate) fn new(rows: usize, stride: usize) -> Result<Self> {
        let size = rows
            .checked_mul(stride)
            .ok_or(FldrError::Invariant("leaf table size overflows usize"))?;
        Ok(Self {
            rows,
            stride,
            cells: vec![None; size],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Outcome in slot `(row, col)`; `None` when the slot is empty or out of
    /// range.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        if row >= self.rows || col >= self.stride {
            return None;
        }
        self.cells[row * self.stride + col]
    }

    pub fn row(&self, row: usize) -> &[Option<usize>] {
        &self.cells[row * self.stride..(row + 1) * self.stride]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, outcome: usize) {
        assert!(row < self.rows && col < self.stride, "leaf slot out of range");
        self.cells[row * self.stride + col] = Some(outcome);
    }
}

/// Per-level leaf counts `h` with their labels `H`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Levels {
    h: Vec<usize>,
    table: LeafTable,
}

impl Levels {
    /// `digit(i, j)` reports bit `j` (most significant first, of `k`) of
    /// outcome `i`'s weight, where `i == n` is the reject outcome.
    pub(crate) fn build<F>(n: usize, k: usize, mut digit: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> bool,
    {
        let mut h = vec![0usize; k];
        let mut table = LeafTable::new(n + 1, k)?;
        for j in 0..k {
            let mut d = 0;
            for i in 0..=n {
                if digit(i, j) {
                    table.set(d, j, i);
                    d += 1;
                }
            }
            h[j] = d;
            trace!(level = j, leaves = d, "level built");
        }
        Ok(Self { h, table })
    }

    /// Parts that were not produced by [`Levels::build`], checked so that
    /// sampling from them still terminates.
    pub(crate) fn from_parts(n: usize, h: Vec<usize>, table: LeafTable) -> Result<Self> {
        let k = h.len();
        if table.rows() != n + 1 || table.stride() != k {
            return Err(FldrError::Invariant("leaf table shape does not match h"));
        }
        let mut seen = vec![false; n + 1];
        for (j, &count) in h.iter().enumerate() {
            if count > n + 1 {
                return Err(FldrError::Invariant("more leaves at a level than outcomes"));
            }
            seen.iter_mut().for_each(|s| *s = false);
            for row in 0..=n {
                match (row < count, table.get(row, j)) {
                    (true, Some(z)) if z <= n && !seen[z] => seen[z] = true,
                    (false, None) => {}
                    _ => return Err(FldrError::Invariant("leaf labels do not match h")),
                }
            }
        }
        let levels = Self { h, table };
        if n > 1 && !levels.is_closed(n) {
            return Err(FldrError::Invariant("leaf counts do not close the tree"));
        }
        Ok(levels)
    }

    /// Whether every path ends in a leaf by depth `k`.
    fn is_closed(&self, n: usize) -> bool {
        // A complete tree never has more than (n + 1) * k open nodes.
        let bound = ((n + 1) * self.depth()) as u128;
        let mut open: u128 = 1;
        for &count in &self.h {
            open *= 2;
            match open.checked_sub(count as u128) {
                Some(rest) if rest <= bound => open = rest,
                _ => return false,
            }
        }
        open == 0
    }

    /// Whether `outcome` owns a leaf at `level`.
    pub fn has_leaf(&self, outcome: usize, level: usize) -> bool {
        let count = self.h.get(level).copied().unwrap_or(0);
        (0..count).any(|rank| self.table.get(rank, level) == Some(outcome))
    }

    /// Tree depth `k`.
    #[inline]
    pub fn depth(&self) -> usize {
        self.h.len()
    }

    #[inline]
    pub fn h(&self) -> &[usize] {
        &self.h
    }

    #[inline]
    pub fn table(&self) -> &LeafTable {
        &self.table
    }

    /// Label of the `rank`-th leaf at `level`.
    #[inline]
    pub fn leaf(&self, rank: usize, level: usize) -> Option<usize> {
        self.table.get(rank, level)
    }
}

/// `2^k - m`, taken modulo `2^64` so that `k == 64` works.
pub(crate) fn reject_weight(m: u64, k: usize) -> u64 {
    1u64.checked_shl(k as u32).unwrap_or(0).wrapping_sub(m)
}

/// DDG tree for integer weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdgTree {
    pub(crate) n: usize,
    pub(crate) m: u64,
    pub(crate) r: u64,
    pub(crate) levels: Levels,
}

impl DdgTree {
    /// Build from positive integer weights. O(n·k).
    ///
    /// # Errors
    /// * [`FldrError::Empty`] if there are no weights.
    /// * [`FldrError::ZeroWeight`] if any weight is zero.
    /// * [`FldrError::Overflow`] if the total does not fit in a `u64`.
    pub fn new(weights: &[u64]) -> Result<Self> {
        if weights.is_empty() {
            return Err(FldrError::Empty);
        }
        let mut m = 0u64;
        for (index, &w) in weights.iter().enumerate() {
            if w == 0 {
                return Err(FldrError::ZeroWeight { index });
            }
            m = m.checked_add(w).ok_or(FldrError::Overflow)?;
        }

        let n = weights.len();
        let k = ceil_log2(m) as usize;
        let r = reject_weight(m, k);
        let levels = Levels::build(n, k, |i, j| {
            let w = if i < n { weights[i] } else { r };
            (w >> (k - 1 - j)) & 1 == 1
        })?;
        debug!(n, m, k, reject = r, "built integer DDG tree");

        Ok(Self { n, m, r, levels })
    }

    /// Number of outcomes `n`.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Total weight `m`.
    pub fn total(&self) -> u64 {
        self.m
    }

    /// Weight `2^k - m` of the reject outcome.
    pub fn reject(&self) -> u64 {
        self.r
    }

    pub fn depth(&self) -> usize {
        self.levels.depth()
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }
}

/// Depth and reject digits for an exact total `m`.
///
/// A total that is already a power of two needs no reject outcome and one
/// level less; the two cases stay separate.
pub(crate) fn reject_digits(m: &Digits) -> Result<(usize, Digits)> {
    if m.is_power_of_two() {
        return Ok((m.len() - 1, Digits::zero()));
    }
    let k = m.len();
    let r = Digits::sub(&Digits::power_of_two(k), m);
    if r.len() > k {
        return Err(FldrError::Invariant("reject digits wider than the tree"));
    }
    Ok((k, r))
}

/// Digit `j` of `x` read as a `k`-digit number, left-padded with zeros.
#[inline]
pub(crate) fn padded_digit(x: &Digits, k: usize, j: usize) -> bool {
    (j + x.len())
        .checked_sub(k)
        .and_then(|idx| x.bit(idx))
        == Some(1)
}

/// DDG tree for real weights, with the total and reject weight kept as
/// exact binary digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealDdgTree {
    pub(crate) n: usize,
    pub(crate) m: Digits,
    pub(crate) r: Digits,
    pub(crate) levels: Levels,
}

impl RealDdgTree {
    /// Build from positive finite `f64` weights without rounding. O(n·k).
    ///
    /// # Errors
    /// * [`FldrError::Empty`] if there are no weights.
    /// * [`FldrError::NonPositive`] for zero or negative weights.
    /// * [`FldrError::Domain`] for `NaN` or infinite weights.
    /// * [`FldrError::Invariant`] if the reject arithmetic is inconsistent,
    ///   which indicates a defect here rather than bad input.
    pub fn new(weights: &[f64]) -> Result<Self> {
        if weights.is_empty() {
            return Err(FldrError::Empty);
        }
        let (aligned, scale) = ExactWeight::aligned_batch(weights)?;
        let m = Digits::sum(&aligned);
        let (k, r) = reject_digits(&m)?;

        let n = weights.len();
        let levels = Levels::build(n, k, |i, j| {
            let x = if i < n { &aligned[i] } else { &r };
            padded_digit(x, k, j)
        })?;
        debug!(n, k, scale, has_reject = !r.is_empty(), "built real DDG tree");

        Ok(Self { n, m, r, levels })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Total weight at the common scale of the inputs.
    pub fn total(&self) -> &Digits {
        &self.m
    }

    /// Reject weight digits; empty when the total is a power of two.
    pub fn reject(&self) -> &Digits {
        &self.r
    }

    pub fn depth(&self) -> usize {
        self.levels.depth()
    }

    pub fn levels(&self) -> &Levels {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(levels: &Levels, j: usize) -> Vec<Option<usize>> {
        (0..levels.table().rows()).map(|i| levels.leaf(i, j)).collect()
    }

    #[test]
    fn ceil_log2_on_powers_and_between() {
        for e in 0..64 {
            assert_eq!(ceil_log2(1u64 << e), e);
        }
        for e in 2..64 {
            let lo = (1u64 << (e - 1)) + 1;
            let hi = (1u64 << e) - 1;
            assert_eq!(ceil_log2(lo), e);
            assert_eq!(ceil_log2(hi), e);
        }
        assert_eq!(ceil_log2(u64::MAX), 64);
        assert_eq!(ceil_log2(3), 2);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(DdgTree::new(&[]), Err(FldrError::Empty)));
        assert!(matches!(
            DdgTree::new(&[1, 0, 2]),
            Err(FldrError::ZeroWeight { index: 1 })
        ));
        assert!(matches!(
            DdgTree::new(&[u64::MAX, 1]),
            Err(FldrError::Overflow)
        ));
        assert!(matches!(RealDdgTree::new(&[]), Err(FldrError::Empty)));
    }

    #[test]
    fn integer_table_for_small_weights() {
        // m = 6, k = 3, r = 2 = 010
        // w0 = 1 = 001, w1 = 2 = 010, w2 = 3 = 011
        let t = DdgTree::new(&[1, 2, 3]).unwrap();
        assert_eq!((t.total(), t.depth(), t.reject()), (6, 3, 2));
        assert_eq!(t.levels().h(), &[0, 3, 2]);
        assert_eq!(column(t.levels(), 0), vec![None; 4]);
        assert_eq!(column(t.levels(), 1), vec![Some(1), Some(2), Some(3), None]);
        assert_eq!(column(t.levels(), 2), vec![Some(0), Some(2), None, None]);
    }

    #[test]
    fn power_of_two_total_has_no_reject() {
        let t = DdgTree::new(&[1, 1, 2, 3, 1]).unwrap();
        assert_eq!((t.total(), t.depth(), t.reject()), (8, 3, 0));
        assert_eq!(t.levels().h(), &[0, 2, 4]);

        let r = RealDdgTree::new(&[1.0, 1.0, 2.0, 3.0, 1.0]).unwrap();
        assert!(r.reject().is_empty());
        assert_eq!(r.depth(), 3);
        assert_eq!(r.levels(), t.levels());
    }

    #[test]
    fn real_matches_integer_on_whole_weights() {
        let ints = [7u64, 3, 12, 1, 10];
        let reals: Vec<f64> = ints.iter().map(|&x| x as f64).collect();
        let t = DdgTree::new(&ints).unwrap();
        let r = RealDdgTree::new(&reals).unwrap();
        assert_eq!(r.total().to_u128(), Some(t.total() as u128));
        assert_eq!(r.reject().to_u128(), Some(t.reject() as u128));
        assert_eq!(r.levels(), t.levels());
    }

    #[test]
    fn real_matches_integer_after_scaling() {
        // 0.5, 0.25, 1.5 at scale 2^-2 are 2, 1, 6
        let t = DdgTree::new(&[2, 1, 6]).unwrap();
        let r = RealDdgTree::new(&[0.5, 0.25, 1.5]).unwrap();
        assert_eq!(r.total().to_u128(), Some(9));
        assert_eq!(r.levels(), t.levels());
    }

    #[test]
    fn single_outcome_still_builds() {
        let t = DdgTree::new(&[5]).unwrap();
        assert_eq!((t.len(), t.depth(), t.reject()), (1, 3, 3));
        let one = DdgTree::new(&[1]).unwrap();
        assert_eq!(one.depth(), 0);
        assert!(one.levels().h().is_empty());
    }

    #[test]
    fn reject_weight_wraps_at_64_bits() {
        let t = DdgTree::new(&[u64::MAX - 1, 1]).unwrap();
        assert_eq!(t.depth(), 64);
        assert_eq!(t.reject(), 1);
        assert_eq!(t.levels().h()[63], 2);
    }

    #[test]
    fn from_parts_rejects_open_trees() {
        let t = DdgTree::new(&[1, 2, 3]).unwrap();
        let Levels { h, table } = t.levels().clone();
        assert!(Levels::from_parts(3, h.clone(), table.clone()).is_ok());

        let mut short = h.clone();
        short[2] = 1;
        let mut table_short = LeafTable::new(4, 3).unwrap();
        for j in 0..3 {
            for i in 0..short[j] {
                table_short.set(i, j, table.get(i, j).unwrap());
            }
        }
        assert!(matches!(
            Levels::from_parts(3, short, table_short),
            Err(FldrError::Invariant(_))
        ));
    }

    #[test]
    fn oversized_leaf_tables_are_errors() {
        assert!(matches!(
            LeafTable::new(usize::MAX, 2),
            Err(FldrError::Invariant(_))
        ));
        assert_eq!(LeafTable::new(usize::MAX, 0).unwrap().rows(), usize::MAX);
    }

    #[test]
    fn from_parts_rejects_repeats() {
        let mut table = LeafTable::new(3, 1).unwrap();
        table.set(0, 0, 1);
        table.set(1, 0, 1);
        assert!(Levels::from_parts(2, vec![2], table).is_err());
    }
}
