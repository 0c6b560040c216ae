use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a filter pass. None of them are recovered from; they carry enough context to
/// tell which file or row the underlying `csv`/io error came from.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Can't open input file {path:?}: {source}")]
    OpenInput { path: PathBuf, source: io::Error },
    #[error("Can't create output file {path:?}: {source}")]
    CreateOutput { path: PathBuf, source: io::Error },
    #[error("Can't read input: {0}")]
    Load(io::Error),
    #[error("Can't read row {row}: {source}")]
    Read { row: u64, source: csv::Error },
    #[error("Can't write row {row}: {source}")]
    Write { row: u64, source: csv::Error },
    #[error("Can't flush output: {0}")]
    Flush(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
