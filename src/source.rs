//! Sequence records from FASTA/FASTQ files, plain or compressed.

use std::{fs::File, path::Path};

use needletail::{errors::ParseErrorKind, parse_fastx_reader, FastxReader};

use crate::error::{Error, Result};

/// Call `f` on the sequence of every record in `path`, in file order.
///
/// Only failing to open `path` is an [`Error::Open`]. Content that is not
/// FASTA/FASTQ is an [`Error::Parse`]. An empty file has no records and is
/// not an error.
pub fn for_each_sequence(path: &Path, mut f: impl FnMut(&[u8])) -> Result<usize> {
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader: Box<dyn FastxReader> = match parse_fastx_reader(file) {
        Ok(reader) => reader,
        Err(e) if matches!(e.kind, ParseErrorKind::EmptyFile) => {
            log::warn!("{} is empty", path.display());
            return Ok(0);
        }
        Err(source) => {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut records = 0;
    while let Some(record) = reader.next() {
        let record = record.map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        f(&record.seq());
        records += 1;
    }
    log::debug!("{}: {records} records", path.display());
    Ok(records)
}
