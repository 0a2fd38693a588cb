//! CSV file reading.
//!
//! Every cell is read as text exactly as written (no trimming, no type
//! inference); typing happens later in coercion.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use csv::ReaderBuilder;
use ledger_model::{HeaderMap, Table, Value};
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Header row plus data rows, all as raw text.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Rename the columns through `headers` and wrap every cell as a string value.
    ///
    /// The map must come from [`normalize_headers`](super::normalize_headers)
    /// over this table's header row; columns are matched by position.
    pub fn into_table(self, headers: &HeaderMap) -> Result<Table> {
        if headers.len() != self.headers.len() {
            return Err(IngestError::HeaderMismatch {
                expected: self.headers.len(),
                found: headers.len(),
            });
        }
        let columns: Vec<String> = headers.normalized().map(str::to_string).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Value::String).collect())
            .collect();
        Ok(Table::from_rows(columns, rows)?)
    }
}

fn open_error(path: &Path, e: std::io::Error) -> IngestError {
    match e.kind() {
        ErrorKind::NotFound => IngestError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => IngestError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => IngestError::FileRead {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

/// Confirm the input exists, is a regular file, and can be opened for reading.
///
/// Runs before any processing so access problems are reported without retries.
pub fn check_input_access(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| open_error(path, e))?;
    if !metadata.is_file() {
        return Err(IngestError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    File::open(path).map_err(|e| open_error(path, e))?;
    debug!(path = %path.display(), bytes = metadata.len(), "input file accessible");
    Ok(())
}

/// Detect encoding and validate it's supported (UTF-8 only).
///
/// Checks for UTF-16 BOM markers which are not supported.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| open_error(path, e))?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }

    // UTF-8 BOM is acceptable (stripped from the first header)
    Ok(())
}

fn csv_error(path: &Path, err: csv::Error) -> IngestError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        },
        _ => IngestError::CsvParse {
            path: path.to_path_buf(),
            message,
        },
    }
}

/// Read a comma-delimited UTF-8 file with one header row.
///
/// - A leading UTF-8 BOM is stripped from the first header.
/// - Blank lines are skipped.
/// - Short rows are padded with empty cells.
/// - Trailing empty cells beyond the header are dropped; non-empty ones are
///   an error.
pub fn read_csv_table(path: &Path) -> Result<RawTable> {
    validate_encoding(path)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| csv_error(path, e))?
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                if idx == 0 {
                    field.trim_start_matches('\u{feff}').to_string()
                } else {
                    field.to_string()
                }
            })
            .collect(),
        None => {
            return Err(IngestError::EmptyCsv {
                path: path.to_path_buf(),
            });
        }
    };

    let width = headers.len();
    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        if row.len() > width {
            if row[width..].iter().any(|cell| !cell.is_empty()) {
                return Err(IngestError::RowTooWide {
                    path: path.to_path_buf(),
                    row: idx + 1,
                    found: row.len(),
                    expected: width,
                });
            }
            row.truncate(width);
        }
        row.resize(width, String::new());
        rows.push(row);
    }

    info!(
        path = %path.display(),
        columns = width,
        rows = rows.len(),
        "loaded CSV"
    );
    Ok(RawTable { headers, rows })
}
