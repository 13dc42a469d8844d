use std::{io::Write, path::PathBuf};

use spacemin::{
    de_bruijn::dna_de_bruijn,
    driver::{count_cardinality, count_file, estimate_cardinality, make_sketch},
    generate_random_dna, DriverConfig, Error, ExactSet, KmerSet, Scheme, Scoring, Sketch, Spacer,
};
use tempfile::TempDir;

#[ctor::ctor]
fn init() {
    color_backtrace::install();
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(threads: usize) -> DriverConfig {
    DriverConfig {
        threads,
        retry_delay_ms: 10,
        ..DriverConfig::default()
    }
}

fn write_fasta(dir: &TempDir, name: &str, records: &[&[u8]]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    for (i, seq) in records.iter().enumerate() {
        writeln!(file, ">{name}_{i}").unwrap();
        file.write_all(seq).unwrap();
        writeln!(file).unwrap();
    }
    path
}

/// 4 files of 1000 distinct 6-mers each, no 6-mer shared between files.
fn disjoint_files(dir: &TempDir) -> Vec<PathBuf> {
    let seq = dna_de_bruijn(6);
    (0..4)
        .map(|i| {
            let part = &seq[1000 * i..1000 * i + 1005];
            write_fasta(dir, &format!("part{i}.fa"), &[part])
        })
        .collect()
}

fn unwindowed_6mers() -> Scheme {
    Scheme::new(Spacer::contiguous(6).unwrap(), Scoring::Lex, false)
}

#[test]
fn exact_count_is_independent_of_concurrency() {
    let dir = tempfile::tempdir().unwrap();
    let paths = disjoint_files(&dir);
    let scheme = unwindowed_6mers();
    for threads in [1, 8] {
        let n = count_cardinality::<KmerSet>(&paths, &scheme, &config(threads)).unwrap();
        assert_eq!(n, 4000, "threads={threads}");
    }
}

#[test]
fn sketch_estimate_is_independent_of_concurrency() {
    let dir = tempfile::tempdir().unwrap();
    let paths = disjoint_files(&dir);
    let scheme = unwindowed_6mers();
    let p = 14;
    let one = make_sketch(&paths, &scheme, p, &config(1)).unwrap();
    let eight = make_sketch(&paths, &scheme, p, &config(8)).unwrap();
    assert_eq!(one, eight);
    let est = estimate_cardinality(&paths, &scheme, p, &config(8)).unwrap();
    assert_eq!(est.to_bits(), one.estimate().to_bits());
    let bound = 3.0 * one.relative_error() * 4000.0;
    assert!((est - 4000.0).abs() < bound, "est={est} bound={bound}");
}

#[test]
fn windowed_spaced_counts_match_sequential_union() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..7)
        .map(|i| {
            let mut a = generate_random_dna(3000, i);
            a[1500] = b'N';
            let b = generate_random_dna(200, 100 + i);
            write_fasta(&dir, &format!("r{i}.fa"), &[&a[..], &b[..]])
        })
        .collect();
    for canon in [false, true] {
        for scoring in [Scoring::Lex, Scoring::Entropy] {
            let spacer = Spacer::new(9, 25, &[0, 1, 0, 0, 2, 0, 0, 1]).unwrap();
            let scheme = Scheme::new(spacer, scoring, canon);
            let mut expected = KmerSet::default();
            for path in &paths {
                expected.union(&count_file::<KmerSet>(path, &scheme).unwrap());
            }
            for threads in [1, 2, 8] {
                let n = count_cardinality::<KmerSet>(&paths, &scheme, &config(threads)).unwrap();
                assert_eq!(n, expected.size(), "threads={threads} canon={canon}");
            }
        }
    }
}

#[test]
fn unreadable_file_fails_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = disjoint_files(&dir);
    paths.insert(2, dir.path().join("missing.fa"));
    let scheme = unwindowed_6mers();

    let res = count_cardinality::<KmerSet>(&paths, &scheme, &config(2));
    assert!(matches!(res, Err(Error::Open { .. })));
    let res = make_sketch(&paths, &scheme, 12, &config(2));
    assert!(matches!(res, Err(Error::Open { .. })));

    let cfg = DriverConfig {
        skip_unreadable: true,
        ..config(2)
    };
    assert_eq!(count_cardinality::<KmerSet>(&paths, &scheme, &cfg).unwrap(), 4000);
    let skipped = make_sketch(&paths, &scheme, 12, &cfg).unwrap();
    let all = make_sketch(&disjoint_files(&dir), &scheme, 12, &config(2)).unwrap();
    assert_eq!(skipped, all);
}

#[test]
fn malformed_file_is_never_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("notes.txt");
    std::fs::write(&bad, "this is not a sequence file\n").unwrap();
    let mut paths = disjoint_files(&dir);
    paths.insert(1, bad);
    let scheme = unwindowed_6mers();

    for skip_unreadable in [false, true] {
        let cfg = DriverConfig {
            skip_unreadable,
            ..config(2)
        };
        let res = count_cardinality::<KmerSet>(&paths, &scheme, &cfg);
        assert!(matches!(res, Err(Error::Parse { .. })), "skip={skip_unreadable}");
        let res = make_sketch(&paths, &scheme, 12, &cfg);
        assert!(matches!(res, Err(Error::Parse { .. })), "skip={skip_unreadable}");
    }
}

#[test]
fn empty_file_counts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.fa");
    std::fs::File::create(&empty).unwrap();
    let mut paths = disjoint_files(&dir);
    paths.push(empty);
    let n = count_cardinality::<KmerSet>(&paths, &unwindowed_6mers(), &config(3)).unwrap();
    assert_eq!(n, 4000);
}

#[test]
fn invalid_precision() {
    let dir = tempfile::tempdir().unwrap();
    let paths = disjoint_files(&dir);
    let res = make_sketch(&paths, &unwindowed_6mers(), 30, &config(1));
    assert!(matches!(res, Err(Error::Config(_))));
}
