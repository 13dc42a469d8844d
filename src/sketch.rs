//! Accumulators for k-mers: an exact set and a HyperLogLog sketch.
//!
//! Both merge commutatively and associatively, so the cardinality of a file
//! set does not depend on how files are split over workers.

use fxhash::FxHashSet;

use crate::error::ConfigError;

/// Exact set of k-mers.
pub trait ExactSet: Default + Send {
    fn insert(&mut self, kmer: u64);
    /// Add all elements of `other`.
    fn union(&mut self, other: &Self);
    /// Number of distinct elements.
    fn size(&self) -> u64;
}

/// Probabilistic cardinality sketch.
pub trait Sketch: Clone + Send + Sync {
    fn add(&mut self, kmer: u64);
    fn merge(&mut self, other: &Self);
    fn estimate(&self) -> f64;
    fn clear(&mut self);
}

#[derive(Clone, Debug, Default)]
pub struct KmerSet(FxHashSet<u64>);

impl KmerSet {
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, kmer: u64) -> bool {
        self.0.contains(&kmer)
    }
}

impl ExactSet for KmerSet {
    #[inline(always)]
    fn insert(&mut self, kmer: u64) {
        self.0.insert(kmer);
    }

    fn union(&mut self, other: &Self) {
        self.0.extend(other.0.iter().copied());
    }

    fn size(&self) -> u64 {
        self.0.len() as u64
    }
}

impl FromIterator<u64> for KmerSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Seed for hashing k-mers into the sketch. Sketches only merge correctly
/// when built with the same seed.
const SEED: u64 = 213456;

pub const MIN_PRECISION: u8 = 4;
pub const MAX_PRECISION: u8 = 24;
pub const DEFAULT_PRECISION: u8 = 23;

/// HyperLogLog with `2^p` one-byte registers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hll {
    p: u8,
    registers: Vec<u8>,
}

impl Hll {
    pub fn new(p: u8) -> Result<Self, ConfigError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&p) {
            return Err(ConfigError::Precision(p));
        }
        Ok(Self {
            p,
            registers: vec![0; 1 << p],
        })
    }

    pub fn precision(&self) -> u8 {
        self.p
    }

    pub fn m(&self) -> usize {
        self.registers.len()
    }

    /// Standard error of the estimate, relative to the true cardinality.
    pub fn relative_error(&self) -> f64 {
        1.04 / (self.m() as f64).sqrt()
    }

    /// Add every k-mer of an exact set, optionally clearing the sketch first.
    pub fn add_set(&mut self, set: &KmerSet, clear: bool) {
        if clear {
            log::debug!("clearing sketch before adding {} k-mers", set.size());
            self.clear();
        }
        for kmer in set.iter() {
            self.add(kmer);
        }
    }

    fn alpha(&self) -> f64 {
        match self.m() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            m => 0.7213 / (1.0 + 1.079 / m as f64),
        }
    }
}

impl Sketch for Hll {
    #[inline(always)]
    fn add(&mut self, kmer: u64) {
        let h = wyhash::wyhash(&kmer.to_le_bytes(), SEED);
        let idx = (h >> (64 - self.p)) as usize;
        // The sentinel bit bounds the rank by 64 - p + 1.
        let rho = ((h << self.p) | (1 << (self.p - 1))).leading_zeros() as u8 + 1;
        let reg = &mut self.registers[idx];
        if rho > *reg {
            *reg = rho;
        }
    }

    fn merge(&mut self, other: &Self) {
        assert_eq!(self.p, other.p, "can't merge sketches of different precision");
        for (a, &b) in self.registers.iter_mut().zip(&other.registers) {
            *a = (*a).max(b);
        }
    }

    fn estimate(&self) -> f64 {
        let m = self.m() as f64;
        let (sum, zeros) = self
            .registers
            .iter()
            .fold((0f64, 0usize), |(sum, zeros), &r| {
                (sum + (-(r as i32) as f64).exp2(), zeros + (r == 0) as usize)
            });
        let raw = self.alpha() * m * m / sum;
        if raw <= 2.5 * m && zeros > 0 {
            // Linear counting for the small range.
            m * (m / zeros as f64).ln()
        } else {
            raw
        }
    }

    fn clear(&mut self) {
        self.registers.fill(0);
    }
}
