use crate::{IndexSampler, flip::BitStream};

/// Items in a `&'static` slice, drawn through a DDG tree built over their
/// weights.
///
/// This is what `#[derive(WeightedEnum)]` produces: the variants live in a
/// constant slice, and only the tree is built at run time. Draws consume
/// bits from the caller's [`BitStream`], so the same table can be shared
/// between threads that each hold their own source.
#[derive(Debug, Clone)]
pub struct StaticDropTable<S: IndexSampler, T: 'static> {
    tree: S,
    items: &'static [T],
}

impl<S: IndexSampler, T> StaticDropTable<S, T> {
    /// Pairs outcome `i` of `tree` with `items[i]`. The two must have the
    /// same length.
    pub const fn new(tree: S, items: &'static [T]) -> Self {
        Self { tree, items }
    }

    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Walk the tree once and return the matching item.
    #[inline]
    pub fn sample<B: BitStream + ?Sized>(&self, bits: &mut B) -> &'static T {
        &self.items[self.tree.sample_index(bits)]
    }

    #[inline]
    pub fn sample_owned<B: BitStream + ?Sized>(&self, bits: &mut B) -> T
    where
        T: Copy,
    {
        *self.sample(bits)
    }

    #[inline]
    pub const fn items(&self) -> &'static [T] {
        self.items
    }

    /// The underlying tree, e.g. to inspect its levels or export it.
    pub fn sampler(&self) -> &S {
        &self.tree
    }
}
