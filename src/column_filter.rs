use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{FilterError, Result};

pub const INPUT_PATH: &str = "IncidentsIn.csv";
pub const OUTPUT_PATH: &str = "IncidentsOut.csv";

/// Zero-based positions of the columns kept in the output, sorted ascending.
///
/// Selection is positional only: a header row is filtered like any other row, and a file that
/// has already been filtered gets renumbered columns, so filtering it again drops more fields.
pub const ALLOWED_COLUMNS: [usize; 17] = [
    0, 1, 2, 3, 7, 8, 10, 13, 14, 15, 16, 18, 19, 20, 23, 24, 25,
];

/// Counts collected over one pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterSummary {
    pub rows_read: u64,
    pub rows_written: u64,
    pub fields_read: u64,
    pub fields_kept: u64,
}

pub fn is_allowed(index: usize) -> bool {
    ALLOWED_COLUMNS.binary_search(&index).is_ok()
}

/// Keep the fields at allowed positions, in their original order.
///
/// Positions past the end of a short row are simply absent, they are not padded.
pub fn project(row: &StringRecord) -> StringRecord {
    row.iter()
        .enumerate()
        .filter(|e| is_allowed(e.0))
        .map(|e| e.1)
        .collect()
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true);
    builder
}

fn writer_builder() -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder.flexible(true).terminator(Terminator::CRLF);
    builder
}

/// Count the empty lines the reader skipped in `data[start..end]`, the bytes consumed by one
/// `read_record` call.
///
/// Skipped lines are the leading run of `\r`/`\n` bytes. A `\n` right after a `\r` that closed
/// the previous record belongs to that record, not to an empty line.
fn skipped_lines(data: &[u8], start: usize, end: usize) -> u64 {
    let consumed = &data[start..end];
    let run = consumed
        .iter()
        .take_while(|b| **b == b'\r' || **b == b'\n')
        .count();
    let mut gap = &consumed[..run];
    if start > 0 && data[start - 1] == b'\r' && gap.first() == Some(&b'\n') {
        gap = &gap[1..];
    }

    let mut lines = 0;
    let mut i = 0;
    while i < gap.len() {
        i += if gap[i] == b'\r' && gap.get(i + 1) == Some(&b'\n') {
            2
        } else {
            1
        };
        lines += 1;
    }
    lines
}

/// An empty input line comes out as a bare terminator. `csv::Writer` would write `""` for a
/// record without fields, so the terminator goes straight to the underlying sink.
fn write_empty_row<W: io::Write>(wtr: &mut csv::Writer<W>) -> io::Result<()> {
    wtr.flush()?;
    wtr.get_mut().write_all(b"\r\n")
}

/// Read every row from `src`, write its projection to `dst`, one output row per input line.
///
/// Empty input lines, which the `csv` reader skips, are written back as empty rows.
pub fn filter_columns<R: io::Read, W: io::Write>(mut src: R, dst: W) -> Result<FilterSummary> {
    let mut data = Vec::new();
    src.read_to_end(&mut data).map_err(FilterError::Load)?;

    let mut rdr = reader_builder().from_reader(data.as_slice());
    let mut wtr = writer_builder().from_writer(dst);

    let mut summary = FilterSummary::default();
    let mut record = StringRecord::new();
    loop {
        let start = rdr.position().byte() as usize;
        let read = rdr.read_record(&mut record);
        let end = rdr.position().byte() as usize;

        for _ in 0..skipped_lines(&data, start, end) {
            summary.rows_read += 1;
            let row = summary.rows_read;
            write_empty_row(&mut wtr).map_err(|e| FilterError::Write {
                row,
                source: e.into(),
            })?;
            summary.rows_written += 1;
        }

        let row = summary.rows_read + 1;
        if !read.map_err(|source| FilterError::Read { row, source })? {
            break;
        }
        summary.rows_read = row;
        summary.fields_read += record.len() as u64;

        let kept = project(&record);
        wtr.write_record(&kept)
            .map_err(|source| FilterError::Write { row, source })?;
        summary.rows_written += 1;
        summary.fields_kept += kept.len() as u64;
    }
    wtr.flush()?;

    debug!(
        fields_read = summary.fields_read,
        fields_kept = summary.fields_kept,
        "column filter finished"
    );
    Ok(summary)
}

/// Filter `input` into `output`, creating or truncating `output`.
///
/// The input is opened before the output is touched, so a missing input leaves no output file
/// behind. Both handles are closed when this returns, on success or error.
pub fn run(input: &Path, output: &Path) -> Result<FilterSummary> {
    info!(input = %input.display(), output = %output.display(), "filtering columns");

    let src = File::open(input).map_err(|source| FilterError::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;
    let dst = File::create(output).map_err(|source| FilterError::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;

    let summary = filter_columns(src, dst)?;
    info!(
        rows = summary.rows_written,
        fields_kept = summary.fields_kept,
        "wrote {}",
        output.display()
    );
    Ok(summary)
}
