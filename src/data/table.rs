use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV has no header row")]
    MissingHeader,
    #[error("line {line}: expected {expected} fields, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column {column}: '{value}' is not a number")]
    InvalidNumber {
        line: usize,
        column: usize,
        value: String,
    },
    #[error("{names} column names given for {columns} columns")]
    HeaderWidth { names: usize, columns: usize },
    #[error("column '{name}' has {found} rows, expected {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Named numeric columns, all the same length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        let data = vec![Vec::new(); columns.len()];
        Self { columns, data }
    }

    pub fn from_columns(columns: Vec<String>, data: Vec<Vec<f64>>) -> Result<Self, TableError> {
        let expected = data.first().map_or(0, Vec::len);
        for (i, column) in data.iter().enumerate() {
            if column.len() != expected {
                return Err(TableError::ColumnLength {
                    name: columns.get(i).cloned().unwrap_or_default(),
                    expected,
                    found: column.len(),
                });
            }
        }
        if columns.len() != data.len() {
            return Err(TableError::HeaderWidth {
                names: columns.len(),
                columns: data.len(),
            });
        }
        Ok(Self { columns, data })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.data.get(index).map(Vec::as_slice)
    }

    #[allow(dead_code)]
    pub fn column_by_name(&self, name: &str) -> Option<&[f64]> {
        let index = self.columns.iter().position(|c| c == name)?;
        self.column(index)
    }

    fn push_row(&mut self, row: Vec<f64>) {
        for (column, value) in self.data.iter_mut().zip(row) {
            column.push(value);
        }
    }
}

/// Parse a header row followed by rows of numbers.
pub fn parse_csv(text: &str) -> Result<Table, TableError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines.next().ok_or(TableError::MissingHeader)?;
    let mut table = Table::new(split_fields(header));

    for (line_no, line) in lines {
        let fields = split_fields(line);
        if fields.len() != table.num_columns() {
            return Err(TableError::RowWidth {
                line: line_no,
                expected: table.num_columns(),
                found: fields.len(),
            });
        }
        let row = fields
            .iter()
            .enumerate()
            .map(|(column, field)| {
                field.parse::<f64>().map_err(|_| TableError::InvalidNumber {
                    line: line_no,
                    column,
                    value: field.clone(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        table.push_row(row);
    }

    Ok(table)
}

pub fn read_csv(path: &Path) -> Result<Table, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_csv(&text)?;
    log::debug!(
        "Read {}: {} columns x {} rows",
        path.display(),
        table.num_columns(),
        table.num_rows()
    );
    Ok(table)
}

pub fn to_csv_string(table: &Table) -> String {
    let mut out = table
        .columns
        .iter()
        .map(|name| quote(name))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    for row in 0..table.num_rows() {
        for (i, column) in table.data.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            // `{:?}` keeps enough digits to round-trip
            let _ = write!(out, "{:?}", column[row]);
        }
        out.push('\n');
    }
    out
}

pub fn write_csv(path: &Path, table: &Table) -> Result<(), TableError> {
    let io_err = |source| TableError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, to_csv_string(table)).map_err(io_err)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Split one line on commas outside double quotes; `""` inside quotes is a literal quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

fn quote(name: &str) -> Cow<'_, str> {
    if name.contains(|c: char| c == ',' || c == '"') {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(name)
    }
}
