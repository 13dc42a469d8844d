//! Parallel k-mer cardinality over many sequence files.
//!
//! Every file is processed by a private [`Encoder`] into a private accumulator.
//! Accumulators are only combined once their files are done, so no state is
//! shared between workers apart from the read-only [`Scheme`].
//!
//! Exact counting runs one thread per file, at most `threads` at a time, and
//! starts the next file as soon as any thread finishes. Sketching runs on a
//! rayon pool, with one sketch per worker merged at the end.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    encoder::Encoder,
    error::{Error, Result},
    order::Scoring,
    sketch::{ExactSet, Hll, Sketch},
    source,
    spacer::Spacer,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Number of files processed concurrently. 0 uses all cores.
    pub threads: usize,
    /// Attempts to start a worker before giving up.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// How long to wait between checks for finished workers.
    pub poll_interval_ms: u64,
    /// Skip files that can't be opened instead of failing.
    pub skip_unreadable: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_retries: 10,
            retry_delay_ms: 1000,
            poll_interval_ms: 1,
            skip_unreadable: false,
        }
    }
}

impl DriverConfig {
    pub fn threads(&self) -> usize {
        match self.threads {
            0 => thread::available_parallelism().map_or(1, |n| n.get()),
            t => t,
        }
    }

    pub fn log(&self) {
        log::info!("Driver configuration:");
        log::info!("  threads: {}", self.threads());
        log::info!(
            "  launch retries: {} every {}ms",
            self.max_retries,
            self.retry_delay_ms
        );
        log::info!("  poll interval: {}ms", self.poll_interval_ms);
        log::info!("  skip unreadable files: {}", self.skip_unreadable);
    }
}

/// Everything a worker needs to build its own encoder. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Scheme {
    pub spacer: Arc<Spacer>,
    pub scoring: Scoring,
    pub canonicalize: bool,
}

impl Scheme {
    pub fn new(spacer: Spacer, scoring: Scoring, canonicalize: bool) -> Self {
        Self {
            spacer: Arc::new(spacer),
            scoring,
            canonicalize,
        }
    }

    pub fn encoder(&self) -> Encoder {
        Encoder::new(self.spacer.clone(), &self.scoring, self.canonicalize)
    }
}

/// Exact set of all minimizers of one file.
pub fn count_file<S: ExactSet>(path: &Path, scheme: &Scheme) -> Result<S> {
    let mut set = S::default();
    let mut enc = scheme.encoder();
    source::for_each_sequence(path, |seq| enc.for_each(seq, |m| set.insert(m)))?;
    Ok(set)
}

/// Add all minimizers of one file to `sketch`.
pub fn sketch_file<H: Sketch>(sketch: &mut H, path: &Path, scheme: &Scheme) -> Result<()> {
    let mut enc = scheme.encoder();
    source::for_each_sequence(path, |seq| enc.for_each(seq, |m| sketch.add(m)))?;
    Ok(())
}

/// Number of distinct minimizers over all `paths`.
pub fn count_cardinality<S: ExactSet + 'static>(
    paths: &[PathBuf],
    scheme: &Scheme,
    cfg: &DriverConfig,
) -> Result<u64> {
    log::info!(
        "Counting distinct k-mers of {} files on {} threads",
        paths.len(),
        cfg.threads()
    );
    let sets = run_bounded(paths, cfg, |path| {
        let path = path.to_path_buf();
        let scheme = scheme.clone();
        thread::Builder::new()
            .name("count".into())
            .spawn(move || count_file::<S>(&path, &scheme))
    })?;
    let mut sets = sets.into_iter();
    let mut total = sets.next().unwrap_or_default();
    for set in sets {
        total.union(&set);
    }
    let size = total.size();
    log::info!("Counted {size} distinct k-mers");
    Ok(size)
}

/// Add the minimizers of all `paths` to `master`.
///
/// Each rayon worker fills a private copy of an empty `master`; the copies are
/// merged pairwise and finally into `master`.
pub fn fill_sketch<H: Sketch>(
    master: &mut H,
    paths: &[PathBuf],
    scheme: &Scheme,
    cfg: &DriverConfig,
) -> Result<()> {
    log::info!(
        "Sketching {} files on {} threads",
        paths.len(),
        cfg.threads()
    );
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cfg.threads())
        .build()?;
    let mut empty = master.clone();
    empty.clear();
    let filled = pool.install(|| {
        paths
            .par_iter()
            .try_fold(
                || empty.clone(),
                |mut sketch, path| match sketch_file(&mut sketch, path, scheme) {
                    Ok(()) => Ok(sketch),
                    Err(e @ Error::Open { .. }) if cfg.skip_unreadable => {
                        log::warn!("Skipping: {e}");
                        Ok(sketch)
                    }
                    Err(e) => Err(e),
                },
            )
            .try_reduce(
                || empty.clone(),
                |mut a, b| {
                    a.merge(&b);
                    Ok(a)
                },
            )
    })?;
    master.merge(&filled);
    Ok(())
}

/// A HyperLogLog of precision `p` over the minimizers of all `paths`.
pub fn make_sketch(
    paths: &[PathBuf],
    scheme: &Scheme,
    p: u8,
    cfg: &DriverConfig,
) -> Result<Hll> {
    let mut hll = Hll::new(p)?;
    fill_sketch(&mut hll, paths, scheme, cfg)?;
    Ok(hll)
}

/// Estimated number of distinct minimizers over all `paths`.
pub fn estimate_cardinality(
    paths: &[PathBuf],
    scheme: &Scheme,
    p: u8,
    cfg: &DriverConfig,
) -> Result<f64> {
    let hll = make_sketch(paths, scheme, p, cfg)?;
    let est = hll.estimate();
    log::info!(
        "Estimated {est:.0} distinct k-mers (relative error {:.4})",
        hll.relative_error()
    );
    Ok(est)
}

/// Run one worker per path with at most `cfg.threads()` alive at a time.
///
/// Results are returned in completion order. Unreadable files are skipped
/// when `cfg.skip_unreadable` is set. On any other error no new workers are
/// started, the running ones are joined, and the first error is returned.
fn run_bounded<T>(
    paths: &[PathBuf],
    cfg: &DriverConfig,
    mut launch: impl FnMut(&Path) -> io::Result<JoinHandle<Result<T>>>,
) -> Result<Vec<T>> {
    let concurrency = cfg.threads();
    let poll = Duration::from_millis(cfg.poll_interval_ms);
    let mut running: Vec<(usize, JoinHandle<Result<T>>)> = Vec::with_capacity(concurrency);
    let mut results = Vec::with_capacity(paths.len());
    let mut next = 0;
    while next < paths.len() || !running.is_empty() {
        while running.len() < concurrency && next < paths.len() {
            match launch_retrying(&paths[next], cfg, &mut launch) {
                Ok(handle) => running.push((next, handle)),
                Err(e) => return Err(drain(running, e)),
            }
            next += 1;
        }

        let Some(i) = running.iter().position(|(_, h)| h.is_finished()) else {
            thread::sleep(poll);
            continue;
        };
        let (idx, handle) = running.swap_remove(i);
        let path = &paths[idx];
        match handle.join() {
            Ok(Ok(r)) => {
                log::debug!("Finished {}", path.display());
                results.push(r);
            }
            Ok(Err(e @ Error::Open { .. })) if cfg.skip_unreadable => {
                log::warn!("Skipping: {e}");
            }
            Ok(Err(e)) => return Err(drain(running, e)),
            Err(_) => {
                let e = Error::WorkerPanicked { path: path.clone() };
                return Err(drain(running, e));
            }
        }
    }
    Ok(results)
}

/// Wait for the remaining workers and discard their results.
fn drain<T>(running: Vec<(usize, JoinHandle<Result<T>>)>, err: Error) -> Error {
    log::debug!("Waiting for {} running workers after: {err}", running.len());
    for (_, handle) in running {
        let _ = handle.join();
    }
    err
}

/// Start a worker, retrying transient failures every `retry_delay_ms`.
fn launch_retrying<H>(
    path: &Path,
    cfg: &DriverConfig,
    launch: &mut impl FnMut(&Path) -> io::Result<H>,
) -> Result<H> {
    let max_tries = cfg.max_retries.max(1);
    let mut tries = 0;
    loop {
        match launch(path) {
            Ok(handle) => return Ok(handle),
            Err(source) => {
                tries += 1;
                if tries >= max_tries {
                    log::error!("Exceeded maximum retries launching a worker");
                    return Err(Error::LaunchExhausted { tries, source });
                }
                log::debug!(
                    "Launching worker for {} failed: {source}. Retry #{tries}",
                    path.display()
                );
                thread::sleep(Duration::from_millis(cfg.retry_delay_ms));
            }
        }
    }
}
