//! Binary digit arrays with the exact add/subtract needed to total real
//! weights without rounding.

use std::fmt;

/// Binary digits, most significant first.
///
/// Arrays produced by arithmetic are canonical: no leading zero digit, and
/// zero is the empty array. Aligned weights are built directly and may carry
/// trailing zeros but never a leading zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Digits {
    items: Vec<u8>,
}

impl Digits {
    /// Zero.
    pub const fn zero() -> Self {
        Self { items: Vec::new() }
    }

    /// Wrap raw digits as given (no canonicalization).
    ///
    /// # Panics
    /// If any entry is not `0` or `1`.
    pub fn from_bits(items: Vec<u8>) -> Self {
        assert!(items.iter().all(|&b| b <= 1), "digits must be 0 or 1");
        Self { items }
    }

    /// Canonical digits of `x`.
    pub fn from_u64(x: u64) -> Self {
        let width = (u64::BITS - x.leading_zeros()) as usize;
        let items = (0..width)
            .rev()
            .map(|i| ((x >> i) & 1) as u8)
            .collect();
        Self { items }
    }

    /// `2^k`: a one followed by `k` zeros.
    pub fn power_of_two(k: usize) -> Self {
        let mut items = vec![0; k + 1];
        items[0] = 1;
        Self { items }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.items
    }

    /// Digit `i` counted from the most significant end.
    #[inline]
    pub fn bit(&self, i: usize) -> Option<u8> {
        self.items.get(i).copied()
    }

    /// Number of one digits.
    pub fn digit_sum(&self) -> usize {
        self.items.iter().filter(|&&b| b == 1).count()
    }

    /// Whether the value is exactly `2^(len-1)`.
    pub fn is_power_of_two(&self) -> bool {
        self.items.first() == Some(&1) && self.digit_sum() == 1
    }

    /// Strip leading zeros; an all-zero array becomes empty.
    pub fn canonicalize(&mut self) {
        let lead = self
            .items
            .iter()
            .position(|&b| b == 1)
            .unwrap_or(self.items.len());
        self.items.drain(..lead);
    }

    /// Value as an integer, if it fits in 128 bits.
    pub fn to_u128(&self) -> Option<u128> {
        let lead = self
            .items
            .iter()
            .position(|&b| b == 1)
            .unwrap_or(self.items.len());
        let significant = &self.items[lead..];
        if significant.len() > 128 {
            return None;
        }
        Some(
            significant
                .iter()
                .fold(0u128, |acc, &b| (acc << 1) | b as u128),
        )
    }

    /// Digit `i` places from the least significant end, zero beyond the top.
    #[inline]
    fn low_digit(&self, i: usize) -> u8 {
        let len = self.items.len();
        if i < len { self.items[len - 1 - i] } else { 0 }
    }

    /// Ripple-carry `a + b`, right-aligned.
    pub fn add(a: &Digits, b: &Digits) -> Digits {
        let l = a.len().max(b.len());
        let mut items = vec![0u8; l + 1];
        let mut carry = 0u8;
        for i in 0..l {
            let (ai, bi) = (a.low_digit(i), b.low_digit(i));
            items[l - i] = ai ^ bi ^ carry;
            carry = (ai & bi) | (ai & carry) | (bi & carry);
        }
        items[0] = carry;
        let mut out = Digits { items };
        out.canonicalize();
        out
    }

    /// `a - b`. The caller guarantees `a >= b`; otherwise the digits are
    /// meaningless.
    pub fn sub(a: &Digits, b: &Digits) -> Digits {
        let l = a.len().max(b.len());
        let mut items = vec![0u8; l];
        let mut borrow = 0u8;
        for i in 0..l {
            let (ai, bi) = (a.low_digit(i), b.low_digit(i));
            items[l - 1 - i] = ai ^ bi ^ borrow;
            borrow = (borrow & !(ai ^ bi) & 1) | (!ai & bi & 1);
        }
        let mut out = Digits { items };
        out.canonicalize();
        out
    }

    /// Left fold of [`Digits::add`]. One array sums to itself.
    pub fn sum<'a, I>(arrays: I) -> Digits
    where
        I: IntoIterator<Item = &'a Digits>,
    {
        let mut arrays = arrays.into_iter();
        let Some(first) = arrays.next() else {
            return Digits::zero();
        };
        arrays.fold(first.clone(), |acc, x| Digits::add(&acc, x))
    }
}

/// Space-separated digits, as written by the text codec.
impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b}")?;
        }
        Ok(())
    }
}
