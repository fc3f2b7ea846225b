//! Lazy stream of fair random bits.

use rand::RngCore;
use rand::rngs::ThreadRng;

use crate::error::{FldrError, Result};

/// Bits taken from each generator word unless configured otherwise.
pub const DEFAULT_WORD_BITS: u32 = 31;

/// Anything that can hand the sampler one fair bit at a time.
pub trait BitStream {
    /// Next bit, `0` or `1`.
    fn next_bit(&mut self) -> u32;
}

impl<B: BitStream + ?Sized> BitStream for &mut B {
    #[inline]
    fn next_bit(&mut self) -> u32 {
        (**self).next_bit()
    }
}

/// Buffers generator words and yields their bits high to low.
///
/// Only the top `word_bits` bits of each `u32` are used; low-order bits of
/// simple generators are the weakest. A word is drawn only after the
/// previous one is spent. The stream cannot be rewound.
///
/// One instance per consumer: the buffered word is mutable state.
#[derive(Debug, Clone)]
pub struct BitSource<R> {
    rng: R,
    word: u32,
    pos: u32,
    word_bits: u32,
    consumed: u64,
}

impl BitSource<ThreadRng> {
    /// Source backed by the thread-local generator.
    pub fn from_thread_rng() -> Self {
        Self::new(rand::rng())
    }
}

impl<R: RngCore> BitSource<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            word: 0,
            pos: 0,
            word_bits: DEFAULT_WORD_BITS,
            consumed: 0,
        }
    }

    /// # Errors
    /// [`FldrError::WordBits`] unless `1 <= word_bits <= 32`.
    pub fn with_word_bits(rng: R, word_bits: u32) -> Result<Self> {
        if !(1..=32).contains(&word_bits) {
            return Err(FldrError::WordBits(word_bits));
        }
        Ok(Self {
            word_bits,
            ..Self::new(rng)
        })
    }

    #[inline]
    pub fn next_bit(&mut self) -> u32 {
        if self.pos == 0 {
            self.word = self.rng.next_u32() >> (32 - self.word_bits);
            self.pos = self.word_bits;
        }
        self.pos -= 1;
        self.consumed += 1;
        (self.word >> self.pos) & 1
    }

    /// Total bits handed out so far.
    pub fn bits_consumed(&self) -> u64 {
        self.consumed
    }

    pub fn word_bits(&self) -> u32 {
        self.word_bits
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: RngCore> BitStream for BitSource<R> {
    #[inline]
    fn next_bit(&mut self) -> u32 {
        BitSource::next_bit(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    /// Replays a fixed list of words.
    struct Words(Vec<u32>, usize);

    impl RngCore for Words {
        fn next_u32(&mut self) -> u32 {
            let w = self.0[self.1 % self.0.len()];
            self.1 += 1;
            w
        }
        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }
        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.iter_mut().for_each(|b| *b = self.next_u32() as u8);
        }
    }

    #[test]
    fn yields_high_bits_first() {
        let rng = Words(vec![0xA000_0000], 0);
        let mut bits = BitSource::with_word_bits(rng, 4).unwrap();
        let got: Vec<u32> = (0..8).map(|_| bits.next_bit()).collect();
        assert_eq!(got, vec![1, 0, 1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn draws_a_word_only_when_spent() {
        let rng = Words(vec![0x0000_FFFF, 0xE000_0000], 0);
        let mut bits = BitSource::with_word_bits(rng, 3).unwrap();
        let got: Vec<u32> = (0..6).map(|_| bits.next_bit()).collect();
        // low bits of the first word are never seen
        assert_eq!(got, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(bits.bits_consumed(), 6);
        assert_eq!(bits.into_inner().1, 2);
    }

    #[test]
    fn default_width_uses_31_bits() {
        let rng = Words(vec![u32::MAX], 0);
        let mut bits = BitSource::new(rng);
        for _ in 0..31 {
            assert_eq!(bits.next_bit(), 1);
        }
        assert_eq!(bits.word_bits(), DEFAULT_WORD_BITS);
        assert_eq!(bits.into_inner().1, 1);
    }

    #[test]
    fn rejects_bad_word_width() {
        let rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            BitSource::with_word_bits(rng.clone(), 0),
            Err(FldrError::WordBits(0))
        ));
        assert!(matches!(
            BitSource::with_word_bits(rng, 33),
            Err(FldrError::WordBits(33))
        ));
    }

    #[test]
    fn roughly_fair() {
        let mut bits = BitSource::new(StdRng::seed_from_u64(42));
        let draws = 100_000;
        let ones: u32 = (0..draws).map(|_| bits.next_bit()).sum();
        let p = ones as f64 / draws as f64;
        assert!((p - 0.5).abs() < 0.01, "p={p}");
    }
}
