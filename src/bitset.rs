//! Fixed-width bit set backing concept and role denotations.
//!
//! Bits beyond `width` are always zero, so equality and hashing can work on
//! the raw words.

/// A fixed-width bit set backed by a vector of u64 words.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// Storage: each u64 holds 64 bits
    words: Vec<u64>,
    /// Number of addressable bits
    width: usize,
}

impl BitSet {
    /// Number of bits per word.
    const BITS_PER_WORD: usize = 64;

    /// Creates an empty bit set able to hold `width` bits.
    pub fn new(width: usize) -> Self {
        let num_words = width.div_ceil(Self::BITS_PER_WORD);
        Self {
            words: vec![0; num_words],
            width,
        }
    }

    /// Creates a bit set with all `width` bits set.
    pub fn full(width: usize) -> Self {
        let mut bs = Self::new(width);
        bs.words.fill(u64::MAX);
        bs.clear_tail();
        bs
    }

    /// Returns the number of set bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns true if no bits are set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Gets the word index and bit position for a given bit index.
    #[inline]
    fn word_and_bit(index: usize) -> (usize, usize) {
        let word = index / Self::BITS_PER_WORD;
        let bit = index % Self::BITS_PER_WORD;
        (word, bit)
    }

    /// Zeroes the unused bits of the last word.
    fn clear_tail(&mut self) {
        let used = self.width % Self::BITS_PER_WORD;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }

    /// Returns true if the bit at the given index is set.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        if index >= self.width {
            return false;
        }
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        (self.words[word_idx] >> bit_idx) & 1 == 1
    }

    /// Sets the bit at the given index. Returns true if the bit was not previously set.
    ///
    /// # Panics
    ///
    /// Panics if `index >= width`.
    #[inline]
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.width, "Bit {} is out of width {}", index, self.width);
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        let mask = 1u64 << bit_idx;
        let was_clear = (self.words[word_idx] & mask) == 0;
        self.words[word_idx] |= mask;
        was_clear
    }

    /// Clears the bit at the given index. Returns true if the bit was previously set.
    #[inline]
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.width {
            return false;
        }
        let (word_idx, bit_idx) = Self::word_and_bit(index);
        let mask = 1u64 << bit_idx;
        let was_set = (self.words[word_idx] & mask) != 0;
        self.words[word_idx] &= !mask;
        was_set
    }

    fn zip_with(&mut self, other: &BitSet, f: impl Fn(u64, u64) -> u64) {
        assert_eq!(self.width, other.width, "Bit sets have different widths");
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            *a = f(*a, b);
        }
    }

    pub fn union_with(&mut self, other: &BitSet) {
        self.zip_with(other, |a, b| a | b);
    }

    pub fn intersect_with(&mut self, other: &BitSet) {
        self.zip_with(other, |a, b| a & b);
    }

    pub fn difference_with(&mut self, other: &BitSet) {
        self.zip_with(other, |a, b| a & !b);
    }

    pub fn symmetric_difference_with(&mut self, other: &BitSet) {
        self.zip_with(other, |a, b| a ^ b);
    }

    /// Flips every bit within the width.
    pub fn complement(&mut self) {
        for w in &mut self.words {
            *w = !*w;
        }
        self.clear_tail();
    }

    /// Returns true if every bit of `self` is also set in `other`.
    pub fn is_subset(&self, other: &BitSet) -> bool {
        self.words.iter().zip(&other.words).all(|(&a, &b)| a & !b == 0)
    }

    /// Extends the bit set by setting all bits from an iterator.
    pub fn extend(&mut self, iter: impl IntoIterator<Item = usize>) {
        for index in iter {
            self.insert(index);
        }
    }

    /// Returns an iterator over all set bit indices.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            bitset: self,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }
}

/// Iterator over set bits in a BitSet.
pub struct BitSetIter<'a> {
    bitset: &'a BitSet,
    word_idx: usize,
    current_word: u64,
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit_idx = self.current_word.trailing_zeros() as usize;
                self.current_word &= self.current_word - 1; // Clear lowest set bit
                return Some(self.word_idx * BitSet::BITS_PER_WORD + bit_idx);
            }

            self.word_idx += 1;
            if self.word_idx >= self.bitset.words.len() {
                return None;
            }
            self.current_word = self.bitset.words[self.word_idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let bs = BitSet::new(100);
        assert!(bs.is_empty());
        assert_eq!(bs.len(), 0);
        assert!(!bs.contains(0));
        assert!(!bs.contains(100));
    }

    #[test]
    fn test_insert_contains() {
        let mut bs = BitSet::new(100);
        assert!(!bs.contains(42));
        assert!(bs.insert(42));
        assert!(bs.contains(42));
        assert!(!bs.insert(42)); // Already set
        assert_eq!(bs.len(), 1);
    }

    #[test]
    #[should_panic(expected = "out of width")]
    fn test_insert_out_of_width() {
        let mut bs = BitSet::new(10);
        bs.insert(10);
    }

    #[test]
    fn test_remove() {
        let mut bs = BitSet::new(100);
        bs.insert(42);
        assert!(bs.remove(42));
        assert!(!bs.contains(42));
        assert!(!bs.remove(42)); // Already cleared
        assert_eq!(bs.len(), 0);
    }

    #[test]
    fn test_iter() {
        let mut bs = BitSet::new(130);
        bs.extend([5, 10, 3, 64, 65, 129]);
        let indices: Vec<_> = bs.iter().collect();
        assert_eq!(indices, vec![3, 5, 10, 64, 65, 129]);
    }

    #[test]
    fn test_complement_keeps_tail_clear() {
        let mut bs = BitSet::new(70);
        bs.insert(3);
        bs.complement();
        assert_eq!(bs.len(), 69);
        assert!(!bs.contains(3));
        assert_eq!(bs, {
            let mut full = BitSet::full(70);
            full.remove(3);
            full
        });
    }

    #[test]
    fn test_algebra() {
        let mut a = BitSet::new(8);
        a.extend([1, 2, 3]);
        let mut b = BitSet::new(8);
        b.extend([3, 4]);

        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        let mut i = a.clone();
        i.intersect_with(&b);
        assert_eq!(i.iter().collect::<Vec<_>>(), vec![3]);

        let mut d = a.clone();
        d.difference_with(&b);
        assert_eq!(d.iter().collect::<Vec<_>>(), vec![1, 2]);

        let mut x = a.clone();
        x.symmetric_difference_with(&b);
        assert_eq!(x.iter().collect::<Vec<_>>(), vec![1, 2, 4]);

        assert!(i.is_subset(&a));
        assert!(!a.is_subset(&b));
    }

    #[test]
    fn test_zero_width() {
        let mut bs = BitSet::new(0);
        bs.complement();
        assert!(bs.is_empty());
        assert_eq!(bs, BitSet::full(0));
        assert_eq!(bs.iter().count(), 0);
    }
}
