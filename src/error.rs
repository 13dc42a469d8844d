use std::path::PathBuf;

/// Invalid parameters. Raised at construction time and never recovered from.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("k must be at least 1")]
    ZeroK,

    #[error("provided k {k} greater than max {max}")]
    KTooLarge { k: usize, max: usize },

    #[error("spacing must have k - 1 = {expected} entries, got {actual}")]
    SpacingLength { expected: usize, actual: usize },

    #[error("sketch precision {0} is outside of 4..=24")]
    Precision(u8),

    #[error("priority scoring needs a priority table")]
    MissingPriorities,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("can't open sequence file {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed sequence record in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: needletail::errors::ParseError,
    },

    #[error("priority table line {line}: {reason}")]
    PriorityFormat { line: usize, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to launch a worker after {tries} attempts: {source}")]
    LaunchExhausted { tries: u32, source: std::io::Error },

    #[error("worker processing {path:?} panicked")]
    WorkerPanicked { path: PathBuf },

    #[error("can't build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
