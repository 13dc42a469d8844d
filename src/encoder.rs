//! Streaming k-mer encoding and windowed minimizer selection.
//!
//! An [`Encoder`] holds everything that outlives a single sequence: the
//! geometry, the scorer and the window. [`Encoder::assign`] binds it to one
//! sequence buffer and returns a [`Cursor`] that scans it.
//!
//! All iteration entry points emit exactly the stream of the generic
//! composition decode -> canonicalize -> score -> select
//! ([`Cursor::next_minimizer`]); the specialised ones only avoid redundant
//! work.

use std::sync::Arc;

use crate::{
    nuc,
    order::{entropy_score, Scorer, Scoring},
    spacer::Spacer,
    window::Window,
};

pub struct Encoder {
    sp: Arc<Spacer>,
    scorer: Scorer,
    window: Window,
    canonicalize: bool,
}

impl Encoder {
    pub fn new(sp: Arc<Spacer>, scoring: &Scoring, canonicalize: bool) -> Self {
        log::debug!("encoder: {sp:?} scoring={scoring:?} canonicalize={canonicalize}");
        let scorer = Scorer::new(scoring, &sp);
        let window = Window::new(sp.window_kmers());
        Self {
            sp,
            scorer,
            window,
            canonicalize,
        }
    }

    /// Bind to a new sequence, clearing all window state.
    pub fn assign<'e, 's>(&'e mut self, seq: &'s [u8]) -> Cursor<'e, 's> {
        self.window.reset();
        if let Some(ent) = self.scorer.rolling_entropy() {
            ent.reset();
        }
        Cursor {
            enc: self,
            seq,
            pos: 0,
        }
    }

    /// Call `f` on every minimizer of `seq`.
    pub fn for_each(&mut self, seq: &[u8], f: impl FnMut(u64)) {
        self.assign(seq).for_each_minimizer(f);
    }

    pub fn spacer(&self) -> &Spacer {
        &self.sp
    }
    pub fn k(&self) -> usize {
        self.sp.k()
    }
    pub fn canonicalize(&self) -> bool {
        self.canonicalize
    }
    pub fn set_canonicalize(&mut self, canonicalize: bool) {
        self.canonicalize = canonicalize;
    }
}

/// Scan state over one sequence. Also an iterator over its minimizers.
pub struct Cursor<'e, 's> {
    enc: &'e mut Encoder,
    seq: &'s [u8],
    pos: usize,
}

impl<'e, 's> Cursor<'e, 's> {
    /// Start of the next k-mer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Whether a full k-mer span remains.
    #[inline(always)]
    pub fn has_next_kmer(&self) -> bool {
        self.pos + self.enc.sp.span() <= self.seq.len()
    }

    /// Encode the k-mer starting at `start`, following the spacing.
    /// `None` when the span runs past the end or contains an ambiguous base.
    #[inline]
    pub fn decode(&self, start: usize) -> Option<u64> {
        let sp = &*self.enc.sp;
        if start + sp.span() > self.seq.len() {
            return None;
        }
        let mut i = start;
        let mut kmer = nuc::code(self.seq[i])? as u64;
        for &o in sp.offsets() {
            i += o;
            kmer = kmer << 2 | nuc::code(self.seq[i])? as u64;
        }
        Some(kmer)
    }

    /// Decode at the current position and advance by one.
    #[inline]
    pub fn next_raw_kmer(&mut self) -> Option<u64> {
        let kmer = self.decode(self.pos);
        self.pos += 1;
        kmer
    }

    /// Advance by one k-mer and return the minimizer of the window ending
    /// there, if that window is complete and free of ambiguous bases.
    #[inline]
    pub fn next_minimizer(&mut self) -> Option<u64> {
        self.next_selected(false)
    }

    /// As [`Self::next_minimizer`], on canonical k-mers.
    #[inline]
    pub fn next_canonical_minimizer(&mut self) -> Option<u64> {
        self.next_selected(true)
    }

    #[inline(always)]
    fn next_selected(&mut self, canon: bool) -> Option<u64> {
        let pos = self.pos;
        let Some(kmer) = self.next_raw_kmer() else {
            // Resynchronize: no window may contain an ambiguous k-mer.
            self.enc.window.reset();
            return None;
        };
        let k = self.enc.sp.k();
        let kmer = if canon { nuc::canonical(kmer, k) } else { kmer };
        let score = self.enc.scorer.score(kmer);
        self.enc.window.push(pos, kmer, score)
    }

    /// Call `f` on every remaining minimizer, using the fastest path for the
    /// geometry, scoring and canonicalization of the encoder.
    pub fn for_each_minimizer(self, f: impl FnMut(u64)) {
        if !self.has_next_kmer() {
            return;
        }
        let canon = self.enc.canonicalize;
        let sp = &*self.enc.sp;
        match (sp.unwindowed(), sp.unspaced()) {
            (true, true) => self.for_each_unwindowed_unspaced(canon, f),
            (true, false) => self.for_each_unwindowed_spaced(canon, f),
            (false, true) => {
                if self.enc.scorer.has_rolling_entropy() {
                    self.for_each_windowed_unspaced_entropy(canon, f)
                } else {
                    self.for_each_windowed_unspaced(canon, f)
                }
            }
            (false, false) => self.for_each_windowed(canon, f),
        }
    }

    /// Generic path: any geometry.
    pub fn for_each_windowed(mut self, canon: bool, mut f: impl FnMut(u64)) {
        while self.has_next_kmer() {
            if let Some(min) = self.next_selected(canon) {
                f(min);
            }
        }
    }

    /// Every valid k-mer, decoded one by one.
    pub fn for_each_unwindowed_spaced(mut self, canon: bool, mut f: impl FnMut(u64)) {
        assert!(self.enc.sp.unwindowed());
        let k = self.enc.sp.k();
        while self.has_next_kmer() {
            if let Some(kmer) = self.next_raw_kmer() {
                f(if canon { nuc::canonical(kmer, k) } else { kmer });
            }
        }
    }

    /// Every valid k-mer, with rolling forward and reverse-complement codes.
    pub fn for_each_unwindowed_unspaced(mut self, canon: bool, mut f: impl FnMut(u64)) {
        let sp = &*self.enc.sp;
        assert!(sp.unwindowed() && sp.unspaced());
        let k = sp.k();
        let mask = nuc::kmer_mask(k);
        let shift = 2 * (k - 1);
        let (mut fwd, mut rev, mut filled) = (0u64, 0u64, 0);
        for &b in &self.seq[self.pos..] {
            let Some(c) = nuc::code(b) else {
                filled = 0;
                continue;
            };
            fwd = (fwd << 2 | c as u64) & mask;
            rev = rev >> 2 | ((3 - c) as u64) << shift;
            filled += 1;
            if filled >= k {
                f(if canon { fwd.min(rev) } else { fwd });
            }
        }
        self.pos = self.seq.len();
    }

    /// Contiguous k-mers with rolling codes, scored one by one and selected
    /// through the window.
    pub fn for_each_windowed_unspaced(mut self, canon: bool, mut f: impl FnMut(u64)) {
        let Encoder {
            sp, scorer, window, ..
        } = &mut *self.enc;
        assert!(sp.unspaced());
        let k = sp.k();
        let mask = nuc::kmer_mask(k);
        let shift = 2 * (k - 1);
        let (mut fwd, mut rev, mut filled) = (0u64, 0u64, 0);
        for (i, &b) in self.seq.iter().enumerate().skip(self.pos) {
            let Some(c) = nuc::code(b) else {
                filled = 0;
                window.reset();
                continue;
            };
            fwd = (fwd << 2 | c as u64) & mask;
            rev = rev >> 2 | ((3 - c) as u64) << shift;
            filled += 1;
            if filled >= k {
                let kmer = if canon { fwd.min(rev) } else { fwd };
                if let Some(min) = window.push(i + 1 - k, kmer, scorer.score(kmer)) {
                    f(min);
                }
            }
        }
        self.pos = self.seq.len();
    }

    /// As [`Self::for_each_windowed_unspaced`], with the entropy score
    /// updated incrementally as bases enter and leave the k-mer.
    pub fn for_each_windowed_unspaced_entropy(mut self, canon: bool, mut f: impl FnMut(u64)) {
        if !self.enc.scorer.has_rolling_entropy() {
            return self.for_each_windowed_unspaced(canon, f);
        }
        let Encoder {
            sp, scorer, window, ..
        } = &mut *self.enc;
        assert!(sp.unspaced());
        let k = sp.k();
        let Some(ent) = scorer.rolling_entropy() else {
            return;
        };
        let mask = nuc::kmer_mask(k);
        let shift = 2 * (k - 1);
        let (mut fwd, mut rev) = (0u64, 0u64);
        for (i, &b) in self.seq.iter().enumerate().skip(self.pos) {
            let Some(c) = nuc::code(b) else {
                ent.reset();
                window.reset();
                continue;
            };
            fwd = (fwd << 2 | c as u64) & mask;
            rev = rev >> 2 | ((3 - c) as u64) << shift;
            ent.push(c);
            if ent.is_full() {
                // A k-mer and its reverse complement have the same entropy.
                let kmer = if canon { fwd.min(rev) } else { fwd };
                if let Some(min) = window.push(i + 1 - k, kmer, entropy_score(ent.value())) {
                    f(min);
                }
            }
        }
        self.pos = self.seq.len();
    }
}

impl<'e, 's> Iterator for Cursor<'e, 's> {
    type Item = u64;

    /// Generic path, one minimizer at a time.
    fn next(&mut self) -> Option<u64> {
        let canon = self.enc.canonicalize;
        while self.has_next_kmer() {
            if let Some(min) = self.next_selected(canon) {
                return Some(min);
            }
        }
        None
    }
}
