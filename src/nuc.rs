//! 2-bit nucleotide codes.
//!
//! A=0, C=1, G=2, T=3 (case-insensitive), so that the complement of a code is
//! `3 - c == c ^ 3` and numeric order of packed k-mers is lexicographic order.
//! Every other byte is ambiguous.

/// Marker in [`LUT`] for bytes that are not one of ACGT.
pub const INVALID: u8 = 0xff;

/// Byte to 2-bit code lookup table.
pub static LUT: [u8; 256] = {
    let mut lut = [INVALID; 256];
    lut[b'A' as usize] = 0;
    lut[b'a' as usize] = 0;
    lut[b'C' as usize] = 1;
    lut[b'c' as usize] = 1;
    lut[b'G' as usize] = 2;
    lut[b'g' as usize] = 2;
    lut[b'T' as usize] = 3;
    lut[b't' as usize] = 3;
    lut
};

/// The 2-bit code of a nucleotide, or `None` for ambiguous symbols such as `N`.
#[inline(always)]
pub fn code(base: u8) -> Option<u8> {
    let c = LUT[base as usize];
    (c != INVALID).then_some(c)
}

/// Mask covering the low `2k` bits.
#[inline(always)]
pub fn kmer_mask(k: usize) -> u64 {
    debug_assert!(0 < k && k <= 32);
    u64::MAX >> (64 - 2 * k)
}

/// Reverse complement of a packed k-mer of `k` bases.
#[inline]
pub fn reverse_complement(kmer: u64, k: usize) -> u64 {
    debug_assert!(0 < k && k <= 32);
    // Complement every base, then reverse the order of the 2-bit groups.
    let mut x = !kmer;
    x = (x >> 2 & 0x3333_3333_3333_3333) | (x & 0x3333_3333_3333_3333) << 2;
    x = (x >> 4 & 0x0f0f_0f0f_0f0f_0f0f) | (x & 0x0f0f_0f0f_0f0f_0f0f) << 4;
    x = x.swap_bytes();
    x >> (64 - 2 * k)
}

/// The smaller of a k-mer and its reverse complement.
#[inline(always)]
pub fn canonical(kmer: u64, k: usize) -> u64 {
    kmer.min(reverse_complement(kmer, k))
}

/// Pack a contiguous nucleotide string into a k-mer. `None` if it contains an
/// ambiguous symbol or is longer than 32 bases.
pub fn encode(bases: &[u8]) -> Option<u64> {
    if bases.is_empty() || bases.len() > 32 {
        return None;
    }
    bases
        .iter()
        .try_fold(0u64, |kmer, &b| Some(kmer << 2 | code(b)? as u64))
}
