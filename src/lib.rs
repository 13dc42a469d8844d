//! Spaced-seed minimizers over nucleotide sequences, and parallel k-mer
//! cardinality counting on top of them.
//!
//! A [`Spacer`] fixes the geometry (k, window, spacing), a [`Scoring`] the
//! order in which k-mers are compared. An [`Encoder`] streams one sequence at a
//! time and emits the minimizer of every window. The [`driver`] runs one
//! encoder per input file and merges the k-mers into an exact set or a
//! HyperLogLog sketch.

pub mod de_bruijn;
pub mod driver;
pub mod encoder;
pub mod entropy;
pub mod error;
pub mod nuc;
pub mod order;
pub mod sketch;
pub mod source;
pub mod spacer;
pub mod window;

pub use driver::{DriverConfig, Scheme};
pub use encoder::{Cursor, Encoder};
pub use error::{ConfigError, Error, Result};
pub use order::{PriorityTable, Scoring, ScoringKind};
pub use sketch::{ExactSet, Hll, KmerSet, Sketch};
pub use spacer::Spacer;

use rand_chacha::{
    rand_core::{RngCore, SeedableRng},
    ChaChaRng,
};

/// Generate a random `ACGT` string, deterministic in `seed`.
pub fn generate_random_dna(n: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    (0..n)
        .map(|_| b"ACGT"[(rng.next_u64() % 4) as usize])
        .collect()
}
