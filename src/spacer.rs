use crate::error::ConfigError;

/// Largest k that fits 2 bits per base in a u64.
pub const MAX_K: usize = 32;

/// k-mer geometry: k-mer size, window size and spaced-seed pattern.
///
/// A spaced k-mer reads `k` bases; between consecutive bases the `offsets`
/// give the distance to the next base (1 = adjacent). The `span` is the number
/// of sequence positions one k-mer covers. A window of `w` positions contains
/// `w - span + 1` overlapping k-mers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spacer {
    k: usize,
    w: usize,
    span: usize,
    offsets: Vec<usize>,
}

impl Spacer {
    /// `skips[i]` is the number of positions skipped between base `i` and
    /// base `i+1`. An empty `skips` means contiguous. `w` is raised to the span
    /// if it is smaller.
    pub fn new(k: usize, w: usize, skips: &[u8]) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroK);
        }
        if k > MAX_K {
            return Err(ConfigError::KTooLarge { k, max: MAX_K });
        }
        let offsets: Vec<usize> = if skips.is_empty() {
            vec![1; k - 1]
        } else {
            skips.iter().map(|&s| s as usize + 1).collect()
        };
        if offsets.len() != k - 1 {
            return Err(ConfigError::SpacingLength {
                expected: k - 1,
                actual: skips.len(),
            });
        }
        let span = 1 + offsets.iter().sum::<usize>();
        let w = w.max(span);
        log::debug!("spacer: k={k} w={w} span={span}");
        Ok(Self { k, w, span, offsets })
    }

    /// Contiguous k-mers, no window reduction.
    pub fn contiguous(k: usize) -> Result<Self, ConfigError> {
        Self::new(k, k, &[])
    }

    pub fn k(&self) -> usize {
        self.k
    }
    pub fn w(&self) -> usize {
        self.w
    }
    pub fn span(&self) -> usize {
        self.span
    }
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of k-mers in one window.
    pub fn window_kmers(&self) -> usize {
        self.w - self.span + 1
    }

    /// All bases are adjacent.
    pub fn unspaced(&self) -> bool {
        self.offsets.iter().all(|&o| o == 1)
    }

    /// Every k-mer is its own window: no minimizer reduction.
    pub fn unwindowed(&self) -> bool {
        self.w == self.span
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn contiguous() {
        let sp = Spacer::contiguous(21).unwrap();
        assert_eq!(sp.span(), 21);
        assert_eq!(sp.w(), 21);
        assert!(sp.unspaced());
        assert!(sp.unwindowed());
        assert_eq!(sp.window_kmers(), 1);
        assert_eq!(sp.offsets(), &[1; 20]);
    }

    #[test]
    fn spaced_windowed() {
        let sp = Spacer::new(4, 20, &[0, 2, 1]).unwrap();
        assert_eq!(sp.offsets(), &[1, 3, 2]);
        assert_eq!(sp.span(), 7);
        assert!(!sp.unspaced());
        assert!(!sp.unwindowed());
        assert_eq!(sp.window_kmers(), 14);
    }

    #[test]
    fn largest_skip() {
        for skip in [254u8, 255] {
            let sp = Spacer::new(2, 2, &[skip]).unwrap();
            assert_eq!(sp.offsets(), &[skip as usize + 1], "skip={skip}");
            assert_eq!(sp.span(), skip as usize + 2, "skip={skip}");
        }
        assert_ne!(
            Spacer::new(2, 2, &[254]).unwrap(),
            Spacer::new(2, 2, &[255]).unwrap()
        );
    }

    #[test]
    fn window_raised_to_span() {
        let sp = Spacer::new(5, 3, &[1, 1, 0, 0]).unwrap();
        assert_eq!(sp.span(), 7);
        assert_eq!(sp.w(), 7);
        assert!(sp.unwindowed());
    }

    #[test]
    fn single_base() {
        let sp = Spacer::new(1, 10, &[]).unwrap();
        assert_eq!(sp.span(), 1);
        assert!(sp.unspaced());
        assert_eq!(sp.window_kmers(), 10);
    }

    #[test]
    fn invalid() {
        assert_eq!(Spacer::new(0, 4, &[]), Err(ConfigError::ZeroK));
        assert_eq!(
            Spacer::new(33, 40, &[]),
            Err(ConfigError::KTooLarge { k: 33, max: 32 })
        );
        assert_eq!(
            Spacer::new(4, 8, &[0, 0]),
            Err(ConfigError::SpacingLength {
                expected: 3,
                actual: 2
            })
        );
        assert!(Spacer::new(32, 32, &[]).is_ok());
    }
}
