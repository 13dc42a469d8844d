use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use spacemin::{
    driver::{count_cardinality, make_sketch},
    sketch::{Sketch, DEFAULT_PRECISION},
    DriverConfig, KmerSet, PriorityTable, Scheme, Scoring, ScoringKind, Spacer,
};

#[derive(clap::Args, Debug)]
struct SchemeArgs {
    /// k-mer length: number of bases read.
    #[arg(short, default_value_t = 31)]
    k: usize,
    /// Window length in bases. Raised to the k-mer span if smaller.
    #[arg(short, default_value_t = 31)]
    w: usize,
    /// Positions skipped between consecutive bases, comma-separated (k-1 values).
    #[arg(long, value_delimiter = ',')]
    spacing: Vec<u8>,
    /// Use k-mers as read instead of their canonical form.
    #[arg(long)]
    no_canon: bool,
    #[arg(long, value_enum, default_value_t = ScoringKind::Lex)]
    scoring: ScoringKind,
    /// KMER<TAB>PRIORITY table for priority scoring.
    #[arg(long)]
    priorities: Option<PathBuf>,
    /// Worker threads. 0 uses all cores.
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
    /// Attempts to start a worker before giving up.
    #[arg(long, default_value_t = 10)]
    retries: u32,
    /// Skip sequence files that can't be opened.
    #[arg(long)]
    skip_unreadable: bool,
    /// FASTA/FASTQ files, optionally gzipped.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

impl SchemeArgs {
    fn scheme(&self) -> anyhow::Result<Scheme> {
        let spacer = Spacer::new(self.k, self.w, &self.spacing)?;
        let table = match &self.priorities {
            Some(path) => Some(Arc::new(
                PriorityTable::from_path(path, self.k)
                    .with_context(|| format!("reading priorities from {}", path.display()))?,
            )),
            None => None,
        };
        let scoring = Scoring::new(self.scoring, table)?;
        Ok(Scheme::new(spacer, scoring, !self.no_canon))
    }

    fn config(&self) -> DriverConfig {
        DriverConfig {
            threads: self.threads,
            max_retries: self.retries,
            skip_unreadable: self.skip_unreadable,
            ..DriverConfig::default()
        }
    }
}

#[derive(clap::Subcommand)]
enum Command {
    /// Exact number of distinct minimizers.
    Count {
        #[command(flatten)]
        args: SchemeArgs,
    },
    /// HyperLogLog estimate of the number of distinct minimizers.
    Estimate {
        /// Sketch precision: 2^p registers.
        #[arg(short, long, default_value_t = DEFAULT_PRECISION)]
        precision: u8,
        #[command(flatten)]
        args: SchemeArgs,
    },
}

/// Count distinct (spaced, windowed) minimizers over sequence files.
#[derive(clap::Parser)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

/// Exact counts stay integers in the JSON output.
#[derive(Serialize, Debug, PartialEq)]
#[serde(untagged)]
enum Cardinality {
    Exact(u64),
    Estimate(f64),
}

#[derive(Serialize)]
struct Report {
    k: usize,
    w: usize,
    span: usize,
    scoring: ScoringKind,
    canonicalize: bool,
    files: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relative_error: Option<f64>,
    cardinality: Cardinality,
}

impl Report {
    fn new(scheme: &Scheme, files: usize, cardinality: Cardinality) -> Self {
        Self {
            k: scheme.spacer.k(),
            w: scheme.spacer.w(),
            span: scheme.spacer.span(),
            scoring: scheme.scoring.kind(),
            canonicalize: scheme.canonicalize,
            files,
            precision: None,
            relative_error: None,
            cardinality,
        }
    }
}

fn main() -> anyhow::Result<()> {
    color_backtrace::install();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let report = match Cli::parse().command {
        Command::Count { args } => {
            let scheme = args.scheme()?;
            let cfg = args.config();
            cfg.log();
            let n = count_cardinality::<KmerSet>(&args.paths, &scheme, &cfg)?;
            Report::new(&scheme, args.paths.len(), Cardinality::Exact(n))
        }
        Command::Estimate { precision, args } => {
            let scheme = args.scheme()?;
            let cfg = args.config();
            cfg.log();
            let hll = make_sketch(&args.paths, &scheme, precision, &cfg)?;
            Report {
                precision: Some(precision),
                relative_error: Some(hll.relative_error()),
                ..Report::new(&scheme, args.paths.len(), Cardinality::Estimate(hll.estimate()))
            }
        }
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
