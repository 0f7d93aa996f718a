//! Bit-packed 2D buffer for boolean masks.
//!
//! Every row starts on a word boundary so rows can be scanned and written
//! independently. Bits past `width` in the last word of a row are always zero.

const BITS_PER_WORD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitBuffer2 {
    /// Packed bit storage, LSB first, `words_per_row` words per row.
    words: Vec<u64>,
    width: usize,
    height: usize,
    words_per_row: usize,
}

impl BitBuffer2 {
    /// Create a new bit buffer with all bits cleared.
    pub fn new_default(width: usize, height: usize) -> Self {
        let words_per_row = width.div_ceil(BITS_PER_WORD);
        Self {
            words: vec![0; words_per_row * height],
            width,
            height,
            words_per_row,
        }
    }

    /// Create a new bit buffer filled with the given value.
    pub fn new_filled(width: usize, height: usize, value: bool) -> Self {
        let mut buf = Self::new_default(width, height);
        buf.fill(value);
        buf
    }

    /// Build a mask from a byte buffer, setting every bit whose byte satisfies `pred`.
    pub fn from_bytes(width: usize, height: usize, data: &[u8], pred: impl Fn(u8) -> bool) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length {} does not match dimensions {}x{}",
            data.len(),
            width,
            height
        );

        let mut buf = Self::new_default(width, height);
        for (y, row) in data.chunks_exact(width.max(1)).take(height).enumerate() {
            let row_words = &mut buf.words[y * buf.words_per_row..(y + 1) * buf.words_per_row];
            for (x, &value) in row.iter().enumerate() {
                if pred(value) {
                    row_words[x / BITS_PER_WORD] |= 1u64 << (x % BITS_PER_WORD);
                }
            }
        }
        buf
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of u64 words per row.
    #[inline]
    pub fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    #[inline]
    pub fn get_xy(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.width && y < self.height);
        let word = self.words[y * self.words_per_row + x / BITS_PER_WORD];
        (word >> (x % BITS_PER_WORD)) & 1 != 0
    }

    #[inline]
    pub fn set_xy(&mut self, x: usize, y: usize, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        let word = &mut self.words[y * self.words_per_row + x / BITS_PER_WORD];
        let bit = 1u64 << (x % BITS_PER_WORD);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Fill all bits with the given value, keeping the row padding cleared.
    pub fn fill(&mut self, value: bool) {
        if !value {
            self.words.fill(0);
            return;
        }
        let tail_bits = self.width % BITS_PER_WORD;
        let tail_mask = if tail_bits == 0 {
            !0u64
        } else {
            (1u64 << tail_bits) - 1
        };
        for row in self.words.chunks_exact_mut(self.words_per_row.max(1)) {
            row.fill(!0);
            if let Some(last) = row.last_mut() {
                *last = tail_mask;
            }
        }
    }

    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    pub fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }

    #[inline]
    pub fn row_words(&self, y: usize) -> &[u64] {
        &self.words[y * self.words_per_row..(y + 1) * self.words_per_row]
    }

    /// Count the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate `(x, y)` of set bits in row-major order.
    pub fn iter_ones(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |y| {
            self.row_words(y)
                .iter()
                .enumerate()
                .flat_map(move |(word_idx, &word)| {
                    let mut remaining = word;
                    std::iter::from_fn(move || {
                        if remaining == 0 {
                            return None;
                        }
                        let bit = remaining.trailing_zeros() as usize;
                        remaining &= remaining - 1;
                        Some((word_idx * BITS_PER_WORD + bit, y))
                    })
                })
        })
    }
}
