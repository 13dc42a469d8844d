//! Shannon entropy of k-mer base composition.

/// Entropy in bits (0..=2) of a composition of `k` bases.
///
/// Counts are sorted before summation so that the result is bit-identical for
/// any permutation of the counts, in particular for a k-mer and its reverse
/// complement.
#[inline]
pub fn entropy(counts: &[u32; 4], k: usize) -> f64 {
    let mut counts = *counts;
    counts.sort_unstable();
    let inv = 1.0 / k as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 * inv;
            -p * p.log2()
        })
        .sum()
}

/// Base composition of a packed k-mer.
#[inline]
pub fn composition(kmer: u64, k: usize) -> [u32; 4] {
    let mut counts = [0; 4];
    for i in 0..k {
        counts[(kmer >> (2 * i) & 3) as usize] += 1;
    }
    counts
}

#[inline]
pub fn kmer_entropy(kmer: u64, k: usize) -> f64 {
    entropy(&composition(kmer, k), k)
}

/// Entropy of the last `k` pushed bases, updated in O(1) per base.
#[derive(Clone, Debug)]
pub struct RollingEntropy {
    k: usize,
    /// Ring buffer of the last `k` codes.
    ring: Vec<u8>,
    idx: usize,
    filled: usize,
    counts: [u32; 4],
}

impl RollingEntropy {
    pub fn new(k: usize) -> Self {
        assert!(k > 0);
        Self {
            k,
            ring: vec![0; k],
            idx: 0,
            filled: 0,
            counts: [0; 4],
        }
    }

    /// Push the 2-bit code of the next base, dropping the oldest once `k` are held.
    #[inline(always)]
    pub fn push(&mut self, code: u8) {
        debug_assert!(code < 4);
        if self.filled == self.k {
            self.counts[self.ring[self.idx] as usize] -= 1;
        } else {
            self.filled += 1;
        }
        self.ring[self.idx] = code;
        self.counts[code as usize] += 1;
        self.idx += 1;
        if self.idx == self.k {
            self.idx = 0;
        }
    }

    /// Whether `k` bases have been pushed since the last reset.
    pub fn is_full(&self) -> bool {
        self.filled == self.k
    }

    #[inline(always)]
    pub fn value(&self) -> f64 {
        entropy(&self.counts, self.k)
    }

    pub fn reset(&mut self) {
        self.idx = 0;
        self.filled = 0;
        self.counts = [0; 4];
    }
}
