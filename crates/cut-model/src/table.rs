//! Generic ordered record tables.
//!
//! Interval tables arrive as delimited text or JSON records. Both are
//! normalized into a `Table`: named columns plus rows of optional string
//! cells, where an empty cell counts as missing.

use std::path::{Path, PathBuf};

/// Header names plus rows of optional cells, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Errors raised while reading a table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unsupported table format '{extension}'; use .csv, .tsv or .json")]
    UnsupportedFormat { extension: String },
}

impl Table {
    /// Build a table from headers and rows. Short rows are padded with
    /// missing cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, None);
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a table file, choosing the parser from the extension.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let delimiter = match extension.as_str() {
            "csv" => Some(','),
            "tsv" => Some('\t'),
            "json" => None,
            _ => return Err(TableError::UnsupportedFormat { extension }),
        };

        let content = std::fs::read_to_string(path).map_err(|e| TableError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        match delimiter {
            Some(delimiter) => Self::from_delimited(&content, delimiter),
            None => Self::from_json_records(&content),
        }
    }

    /// Parse delimited text whose first non-blank line is the header.
    ///
    /// Fields may be wrapped in double quotes; `""` inside quotes is a
    /// literal quote. Quoted fields may not span lines.
    pub fn from_delimited(text: &str, delimiter: char) -> Result<Self, TableError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((header_line, header)) = lines.next() else {
            return Ok(Self::default());
        };
        let headers = split_record(header, delimiter, header_line)?
            .into_iter()
            .map(|cell| cell.unwrap_or_default())
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let mut cells = split_record(line, delimiter, line_no)?;
            if cells.len() > headers.len() {
                return Err(TableError::Parse {
                    line: line_no,
                    message: format!(
                        "expected at most {} fields, found {}",
                        headers.len(),
                        cells.len()
                    ),
                });
            }
            cells.resize(headers.len(), None);
            rows.push(cells);
        }

        Ok(Self { headers, rows })
    }

    /// Parse a JSON array of flat objects.
    ///
    /// Strings become cells, numbers and booleans are stringified, `null`
    /// and empty strings are missing. Columns are ordered by the record in
    /// which they first appear.
    pub fn from_json_records(text: &str) -> Result<Self, TableError> {
        let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(text)
            .map_err(|e| TableError::Parse {
                line: e.line(),
                message: e.to_string(),
            })?;

        let mut headers: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| match record.get(h) {
                        None | Some(serde_json::Value::Null) => None,
                        Some(serde_json::Value::String(s)) => non_empty(s),
                        Some(other) => Some(other.to_string()),
                    })
                    .collect()
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Column names in order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of a named column, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).and_then(|c| c.as_deref()))
                .collect(),
        )
    }
}

fn non_empty(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn split_record(
    line: &str,
    delimiter: char,
    line_no: usize,
) -> Result<Vec<Option<String>>, TableError> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                cells.push(non_empty(&current));
                current.clear();
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(TableError::Parse {
            line: line_no,
            message: "unterminated quoted field".to_string(),
        });
    }
    cells.push(non_empty(&current));
    Ok(cells)
}
