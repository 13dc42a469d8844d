//! Scoring policies: maps each k-mer to a u64 priority. Lower is better.

use std::{
    fmt,
    io::BufRead,
    path::Path,
    sync::Arc,
};

use fxhash::FxHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    entropy::{kmer_entropy, RollingEntropy},
    error::{ConfigError, Error, Result},
    nuc,
    spacer::Spacer,
};

/// Mixes lexicographic scores so that k-mers with many leading `A`s are not
/// systematically preferred.
pub const XOR_MASK: u64 = 0xe37e_28c4_271b_5a2d;

/// Scale mapping an entropy in `[0, 2]` bits onto `[0, u64::MAX]`.
pub const ENTROPY_SCALE: u64 = 7958933093282078720;

#[inline(always)]
pub fn lex_score(kmer: u64) -> u64 {
    kmer ^ XOR_MASK
}

/// Higher entropy gives a lower score, so low-complexity k-mers are avoided.
#[inline(always)]
pub fn entropy_score(entropy: f64) -> u64 {
    u64::MAX - (ENTROPY_SCALE as f64 * entropy) as u64
}

/// Scoring policy selector for configuration and the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScoringKind {
    Lex,
    Entropy,
    Priority,
}

/// Scoring configuration, shared read-only between all workers.
#[derive(Clone)]
pub enum Scoring {
    Lex,
    Entropy,
    Priority(Arc<PriorityTable>),
}

impl Scoring {
    pub fn new(kind: ScoringKind, table: Option<Arc<PriorityTable>>) -> Result<Self> {
        Ok(match kind {
            ScoringKind::Lex => Scoring::Lex,
            ScoringKind::Entropy => Scoring::Entropy,
            ScoringKind::Priority => Scoring::Priority(table.ok_or(ConfigError::MissingPriorities)?),
        })
    }

    pub fn kind(&self) -> ScoringKind {
        match self {
            Scoring::Lex => ScoringKind::Lex,
            Scoring::Entropy => ScoringKind::Entropy,
            Scoring::Priority(_) => ScoringKind::Priority,
        }
    }
}

impl fmt::Debug for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scoring::Priority(t) => write!(f, "Priority({} k-mers)", t.len()),
            _ => write!(f, "{:?}", self.kind()),
        }
    }
}

/// Per-encoder scorer. Each variant carries the state its policy needs.
#[derive(Clone, Debug)]
pub enum Scorer {
    Lex,
    /// `rolling` is present exactly when the geometry is contiguous and
    /// windowed, where the encoder updates entropy incrementally.
    Entropy { k: usize, rolling: Option<RollingEntropy> },
    Priority(Arc<PriorityTable>),
}

impl Scorer {
    pub fn new(scoring: &Scoring, sp: &Spacer) -> Self {
        match scoring {
            Scoring::Lex => Scorer::Lex,
            Scoring::Entropy => Scorer::Entropy {
                k: sp.k(),
                rolling: (sp.unspaced() && !sp.unwindowed())
                    .then(|| RollingEntropy::new(sp.k())),
            },
            Scoring::Priority(table) => Scorer::Priority(table.clone()),
        }
    }

    /// Score a k-mer from its value alone.
    #[inline(always)]
    pub fn score(&self, kmer: u64) -> u64 {
        match self {
            Scorer::Lex => lex_score(kmer),
            Scorer::Entropy { k, .. } => entropy_score(kmer_entropy(kmer, *k)),
            Scorer::Priority(table) => table.priority(kmer),
        }
    }

    pub fn has_rolling_entropy(&self) -> bool {
        matches!(self, Scorer::Entropy { rolling: Some(_), .. })
    }

    pub fn rolling_entropy(&mut self) -> Option<&mut RollingEntropy> {
        match self {
            Scorer::Entropy { rolling, .. } => rolling.as_mut(),
            _ => None,
        }
    }
}

/// Externally supplied k-mer priorities.
///
/// Every k-mer that is scored must be present. A missing k-mer means the
/// table was built for different inputs or parameters, and is fatal.
#[derive(Clone, Debug, Default)]
pub struct PriorityTable {
    map: FxHashMap<u64, u64>,
}

impl PriorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kmer: u64, priority: u64) {
        self.map.insert(kmer, priority);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn priority(&self, kmer: u64) -> u64 {
        if let Some(&p) = self.map.get(&kmer) {
            return p;
        }
        log::debug!("k-mer {kmer} not found by lookup, scanning the table");
        match self.map.iter().find(|(&key, _)| key == kmer) {
            Some((_, &p)) => p,
            None => panic!("k-mer {kmer} is missing from the priority table"),
        }
    }

    /// Parse `KMER<TAB>PRIORITY` lines. `KMER` is the string of the `k` bases
    /// a (possibly spaced) k-mer reads. Blank lines and `#` comments are skipped.
    pub fn from_reader(reader: impl BufRead, k: usize) -> Result<Self> {
        let mut table = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |reason: String| Error::PriorityFormat {
                line: i + 1,
                reason,
            };
            let (kmer, priority) = line
                .split_whitespace()
                .collect_tuple()
                .ok_or_else(|| err("expected two columns".to_string()))?;
            if kmer.len() != k {
                return Err(err(format!("k-mer {kmer} does not have length {k}")));
            }
            let kmer = nuc::encode(kmer.as_bytes())
                .ok_or_else(|| err(format!("k-mer {kmer} contains non-ACGT bases")))?;
            let priority = priority
                .parse::<u64>()
                .map_err(|e| err(format!("bad priority {priority:?}: {e}")))?;
            table.insert(kmer, priority);
        }
        log::debug!("loaded {} k-mer priorities", table.len());
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>, k: usize) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), k)
    }
}

impl FromIterator<(u64, u64)> for PriorityTable {
    fn from_iter<I: IntoIterator<Item = (u64, u64)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lex_is_a_bijection() {
        assert_eq!(lex_score(0), XOR_MASK);
        assert_eq!(lex_score(lex_score(12345)), 12345);
        assert_ne!(lex_score(1), lex_score(2));
    }

    #[test]
    fn entropy_prefers_complex_kmers() {
        let k = 8;
        let low = entropy_score(kmer_entropy(nuc::encode(b"AAAAAAAA").unwrap(), k));
        let mid = entropy_score(kmer_entropy(nuc::encode(b"ACACACAC").unwrap(), k));
        let high = entropy_score(kmer_entropy(nuc::encode(b"ACGTACGT").unwrap(), k));
        assert_eq!(low, u64::MAX);
        assert!(high < mid && mid < low);
    }

    #[test]
    fn rolling_only_for_contiguous_windows() {
        let has_rolling = |sp: Spacer| {
            Scorer::new(&Scoring::Entropy, &sp)
                .rolling_entropy()
                .is_some()
        };
        assert!(has_rolling(Spacer::new(5, 12, &[]).unwrap()));
        assert!(!has_rolling(Spacer::contiguous(5).unwrap()));
        assert!(!has_rolling(Spacer::new(3, 12, &[1, 0]).unwrap()));
        let sp = Spacer::new(5, 12, &[]).unwrap();
        assert!(Scorer::new(&Scoring::Lex, &sp).rolling_entropy().is_none());
    }

    #[test]
    fn priorities() {
        let table: PriorityTable = [(1, 10), (2, 5)].into_iter().collect();
        let scorer = Scorer::new(
            &Scoring::Priority(Arc::new(table)),
            &Spacer::contiguous(3).unwrap(),
        );
        assert_eq!(scorer.score(1), 10);
        assert_eq!(scorer.score(2), 5);
    }

    #[test]
    #[should_panic(expected = "missing from the priority table")]
    fn missing_priority_is_fatal() {
        let table: PriorityTable = [(1, 10)].into_iter().collect();
        table.priority(7);
    }

    #[test]
    fn missing_table() {
        assert!(matches!(
            Scoring::new(ScoringKind::Priority, None),
            Err(Error::Config(ConfigError::MissingPriorities))
        ));
        assert_eq!(
            Scoring::new(ScoringKind::Entropy, None).unwrap().kind(),
            ScoringKind::Entropy
        );
    }

    #[test]
    fn parse_table() {
        let text = "# kmer\tpriority\nACG\t3\n\nTTT 9\n";
        let table = PriorityTable::from_reader(text.as_bytes(), 3).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.priority(nuc::encode(b"ACG").unwrap()), 3);
        assert_eq!(table.priority(nuc::encode(b"TTT").unwrap()), 9);

        let bad = PriorityTable::from_reader("ACGT\t1\n".as_bytes(), 3);
        assert!(matches!(bad, Err(Error::PriorityFormat { line: 1, .. })));
        let bad = PriorityTable::from_reader("ACG\tx\n".as_bytes(), 3);
        assert!(matches!(bad, Err(Error::PriorityFormat { line: 1, .. })));
        let bad = PriorityTable::from_reader("ACG\t1\t2\n".as_bytes(), 3);
        assert!(matches!(bad, Err(Error::PriorityFormat { line: 1, .. })));
        let bad = PriorityTable::from_reader("ANG\t1\n".as_bytes(), 3);
        assert!(matches!(bad, Err(Error::PriorityFormat { .. })));
    }
}
