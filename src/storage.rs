//! History persistence
//!
//! A [`HistoryStore`] moves whole histories in and out of storage as flat
//! [`CalculationRecord`] rows. [`CsvHistoryStore`] keeps them in a CSV file
//! with the columns `operation,operand1,operand2,result,timestamp`; the
//! header is written even when there are no rows.

use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::calculation::CalculationRecord;
use crate::error::{CalcError, Result};

/// Storage capability used by the calculator
pub trait HistoryStore: fmt::Debug {
    /// Read every stored row in file order
    ///
    /// A store with nothing saved yet yields no rows.
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] if storage cannot be read or a row is
    /// malformed; no rows are returned in that case.
    fn read_all(&self) -> Result<Vec<CalculationRecord>>;

    /// Replace the stored rows with `rows`
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] if storage cannot be written.
    fn write_all(&self, rows: &[CalculationRecord]) -> Result<()>;
}

/// CSV file backed history store
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for CsvHistoryStore {
    fn read_all(&self) -> Result<Vec<CalculationRecord>> {
        if !self.path.exists() {
            log::info!(
                "No history file at {} - starting with empty history",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path).map_err(|e| {
            CalcError::operation(format!(
                "Failed to read history file {}: {e}",
                self.path.display()
            ))
        })?;

        let rows = read_csv(file)?;
        log::debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn write_all(&self, rows: &[CalculationRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CalcError::operation(format!(
                    "Failed to create history directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let file = fs::File::create(&self.path).map_err(|e| {
            CalcError::operation(format!(
                "Failed to write history file {}: {e}",
                self.path.display()
            ))
        })?;

        write_csv(file, rows)?;
        log::debug!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/// Parse history rows from CSV text
///
/// The header must name exactly the history columns. An empty input is an
/// empty history.
///
/// # Errors
/// Returns [`CalcError::Operation`] for unexpected columns or the first
/// malformed row (1-indexed, excluding the header).
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<CalculationRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| CalcError::operation(format!("Failed to read history header: {e}")))?
        .clone();

    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if headers.iter().ne(CalculationRecord::COLUMNS) {
        return Err(CalcError::operation(format!(
            "Unexpected history columns: expected {}, found {}",
            CalculationRecord::COLUMNS.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    reader
        .deserialize::<CalculationRecord>()
        .enumerate()
        .map(|(index, row)| {
            row.map_err(|e| {
                CalcError::operation(format!("Malformed history row {}: {e}", index + 1))
            })
        })
        .collect()
}

/// Write history rows as CSV, header first
///
/// # Errors
/// Returns [`CalcError::Operation`] if serialization or the underlying
/// writer fails.
pub fn write_csv<W: Write>(writer: W, rows: &[CalculationRecord]) -> Result<()> {
    let to_error = |e: csv::Error| CalcError::operation(format!("Failed to write history: {e}"));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer
        .write_record(CalculationRecord::COLUMNS)
        .map_err(to_error)?;
    for row in rows {
        writer.serialize(row).map_err(to_error)?;
    }
    writer
        .flush()
        .map_err(|e| CalcError::operation(format!("Failed to flush history: {e}")))?;

    Ok(())
}
