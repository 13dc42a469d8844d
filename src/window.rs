use std::collections::{BTreeMap, VecDeque};

/// Sliding-window minimum over (kmer, score) candidates.
///
/// Candidates are pushed with strictly increasing positions. The window holds
/// the last `w` positions; once it has seen `w` positions since the last reset
/// every push reports the best candidate in it.
///
/// Candidates are ranked by `(score, kmer)`. A k-mer occurring several times
/// in the window is one entry with a count, and leaves the ranking only when
/// its last occurrence is evicted. Equal `(score, kmer)` entries are the same
/// k-mer, so ties between positions never change the reported value.
#[derive(Clone, Debug)]
pub struct Window {
    w: usize,
    /// Position of the first candidate since the last reset.
    first: Option<usize>,
    /// Candidates in position order.
    fifo: VecDeque<(usize, u64, u64)>,
    /// Distinct `(score, kmer)` in the window, with occurrence counts.
    ranked: BTreeMap<(u64, u64), u32>,
}

impl Window {
    /// A window over `w` consecutive candidate positions.
    pub fn new(w: usize) -> Self {
        assert!(w > 0);
        Self {
            w,
            first: None,
            fifo: VecDeque::with_capacity(w),
            ranked: BTreeMap::new(),
        }
    }

    pub fn w(&self) -> usize {
        self.w
    }

    /// Push the candidate at `pos` and evict positions before `pos - (w-1)`.
    /// Returns the best k-mer of the window ending at `pos`, or `None` while
    /// fewer than `w` positions have been seen.
    #[inline]
    pub fn push(&mut self, pos: usize, kmer: u64, score: u64) -> Option<u64> {
        debug_assert!(self.fifo.back().map_or(true, |&(p, _, _)| p < pos));
        let first = *self.first.get_or_insert(pos);
        self.fifo.push_back((pos, kmer, score));
        *self.ranked.entry((score, kmer)).or_insert(0) += 1;

        let start = (pos + 1).saturating_sub(self.w);
        while let Some(&(p, old_kmer, old_score)) = self.fifo.front() {
            if p >= start {
                break;
            }
            self.fifo.pop_front();
            self.release(old_score, old_kmer);
        }

        if pos + 1 >= first + self.w {
            self.best()
        } else {
            None
        }
    }

    /// Best k-mer currently held, whether or not the window is full.
    pub fn best(&self) -> Option<u64> {
        self.ranked.first_key_value().map(|(&(_, kmer), _)| kmer)
    }

    /// Number of candidate positions currently held.
    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    /// Number of distinct k-mers currently held.
    pub fn distinct(&self) -> usize {
        self.ranked.len()
    }

    pub fn reset(&mut self) {
        self.first = None;
        self.fifo.clear();
        self.ranked.clear();
    }

    fn release(&mut self, score: u64, kmer: u64) {
        if let Some(cnt) = self.ranked.get_mut(&(score, kmer)) {
            *cnt -= 1;
            if *cnt == 0 {
                self.ranked.remove(&(score, kmer));
            }
        }
    }
}
