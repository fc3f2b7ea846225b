//! # fldr
//!
//! Exact, bit-optimal sampling from a fixed discrete distribution.
//!
//! This crate implements the Fast Loaded Dice Roller: weights are turned
//! once into a discrete distribution generating (DDG) tree. Each draw then
//! walks that tree one fair coin flip at a time. Sampling is *exact*: for
//! integer weights and for `f64` weights alike, every outcome is produced
//! with probability exactly `w_i / sum(w)`, with no floating-point drift. It
//! consumes fewer than two bits beyond the entropy of the distribution in
//! expectation.
//!
//! There are three ways in:
//!
//! 1. **Index trees**: [`DdgTree`] (`u64` weights) and [`RealDdgTree`]
//!    (`f64` weights, totalled exactly in binary digits).
//! 2. **Ad-hoc pairs** with [`DropTable::from_pairs`] or
//!    [`DropTable::from_real_pairs`].
//! 3. **Compile-time enums** with the [`WeightedEnum`] derive macro (from the
//!    companion `fldr_macros` crate).
//!
//! ## Quick start (indices)
//!
//! ```rust,ignore
//! use fldr::{BitSource, DdgTree};
//!
//! # fn main() -> Result<(), fldr::FldrError> {
//! let tree = DdgTree::new(&[1, 1, 2, 3, 1])?;
//! let mut bits = BitSource::from_thread_rng();
//! let i = tree.sample(&mut bits); // 3 with probability 3/8
//! # Ok(()) }
//! ```
//!
//! ## Quick start (enum + macro)
//!
//! ```rust,ignore
//! use fldr::{BitSource, WeightedEnum};
//!
//! #[derive(Copy, Clone, Debug, WeightedEnum)]
//! enum Face {
//!     #[weight(1)] One,
//!     #[weight(1)] Two,
//!     #[weight(4)] Six,
//! }
//!
//! # fn main() -> Result<(), fldr::FldrError> {
//! let die = Face::droptable()?;
//! let mut bits = BitSource::from_thread_rng();
//! let face = die.sample_owned(&mut bits);
//! # Ok(()) }
//! ```
//!
//! ## Performance
//! * **Build**: O(n·k) where `k` is the bit length of the total weight.
//! * **Sample**: expected O(1) coin flips, within 2 bits of the entropy.
//! * **Space**: `k` level counts plus an `(n + 1) x k` leaf table.
//!
//! ## Gotchas
//! * Weights must be **positive**. `NaN` and infinities are rejected.
//! * Integer totals must fit in a `u64`. Real totals have no bound.
//! * A [`BitSource`] is mutable state. Trees are immutable and can be shared
//!   across threads, but each thread needs its own source.
//!
//! ## Persistence
//! Both tree types print to, and parse from, a whitespace-separated text
//! layout through `Display` / `FromStr`; see [`codec`].

pub mod codec;
mod ddg;
mod digits;
mod error;
mod exact;
mod flip;
mod sampler;
mod staticdt;

/// A minimal interface for “index samplers”.
/// Implemented by [`DdgTree`] and [`RealDdgTree`].
#[allow(clippy::len_without_is_empty)]
pub trait IndexSampler {
    fn len(&self) -> usize;
    fn sample_index<B: BitStream + ?Sized>(&self, bits: &mut B) -> usize;
}

pub use ddg::{DdgTree, LeafTable, Levels, RealDdgTree, ceil_log2};
pub use digits::Digits;
pub use error::{ErrorKind, FldrError, Result};
pub use exact::ExactWeight;
pub use flip::{BitSource, BitStream, DEFAULT_WORD_BITS};
pub use staticdt::StaticDropTable;

/// Derive macro imported from `fldr_macros`.
/// See the crate-level example for usage.
pub use fldr_macros::WeightedEnum;

/// A generic “drop table”: associates items with weights and samples them
/// through an [`IndexSampler`].
#[derive(Debug, Clone)]
pub struct DropTable<T, S = DdgTree> {
    sampler: S,
    items: Vec<T>,
}

/// Trait implemented by the `WeightedEnum` derive macro.
///
/// Variants and their integer weights are exposed in declaration order,
/// which enables building a ready-to-sample [`StaticDropTable`].
pub trait WeightedEnum: Sized + 'static {
    /// All variants, in declaration order.
    const VARIANTS: &'static [Self];
    /// Weight of each entry in [`WeightedEnum::VARIANTS`].
    const WEIGHTS: &'static [u64];

    /// Zero-alloc table over the static variant slice.
    ///
    /// # Errors
    /// See [`DdgTree::new`]: no variants, a zero weight or an overflowing
    /// total will error.
    fn droptable() -> Result<StaticDropTable<DdgTree, Self>> {
        let tree = DdgTree::new(Self::WEIGHTS)?;
        Ok(StaticDropTable::new(tree, Self::VARIANTS))
    }
}

fn unzip_pairs<T, W, I>(pairs: I) -> (Vec<T>, Vec<W>)
where
    I: IntoIterator<Item = (T, W)>,
{
    pairs.into_iter().unzip()
}

impl<T> DropTable<T, DdgTree> {
    /// Build from any `(item, weight)` iterator with integer weights.
    ///
    /// # Errors
    /// * [`FldrError::Empty`] if there are no items.
    /// * [`FldrError::ZeroWeight`] if any weight is zero.
    /// * [`FldrError::Overflow`] if the total overflows `u64`.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, u64)>,
    {
        let (items, weights) = unzip_pairs(pairs);
        let sampler = DdgTree::new(&weights)?;
        Ok(Self { sampler, items })
    }
}

impl<T> DropTable<T, RealDdgTree> {
    /// Build from any `(item, weight)` iterator with real weights. The
    /// weights are used exactly as the `f64` values they are.
    ///
    /// # Errors
    /// * [`FldrError::Empty`] if there are no items.
    /// * [`FldrError::NonPositive`] if any weight is zero or negative.
    /// * [`FldrError::Domain`] if any weight is `NaN` or infinite.
    pub fn from_real_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let (items, weights) = unzip_pairs(pairs);
        let sampler = RealDdgTree::new(&weights)?;
        Ok(Self { sampler, items })
    }
}

impl<T, S: IndexSampler> DropTable<T, S> {
    /// Sample an item **by reference** (no `Clone` bound).
    ///
    /// # Examples
    /// ```rust,ignore
    /// # use fldr::{BitSource, DropTable};
    /// # let table = DropTable::from_pairs([("a", 1), ("b", 3)]).unwrap();
    /// let mut bits = BitSource::from_thread_rng();
    /// let s = table.sample(&mut bits); // &str
    /// ```
    pub fn sample<'a, B: BitStream + ?Sized>(&'a self, bits: &mut B) -> &'a T {
        let idx = self.sampler.sample_index(bits);
        &self.items[idx]
    }

    /// Sample an item **by value** (clones the chosen element).
    ///
    /// Prefer [`sample`](Self::sample) if you don’t need ownership.
    pub fn sample_owned<B: BitStream + ?Sized>(&self, bits: &mut B) -> T
    where
        T: Clone,
    {
        self.items[self.sampler.sample_index(bits)].clone()
    }

    /// Number of items in the table.
    pub fn len(&self) -> usize {
        self.sampler.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.sampler.len() == 0
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// The underlying tree, e.g. for export.
    pub fn sampler(&self) -> &S {
        &self.sampler
    }
}
