use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::PlotError;

/// A single parsed field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Cell::Empty;
        }
        match parse_number(s) {
            Some(v) => Cell::Number(v),
            None => Cell::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// Accepts Fortran-style `D` exponents (`1.5D-03`) besides the usual forms.
fn parse_number(s: &str) -> Option<f64> {
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    if s.contains(['D', 'd']) {
        return s.replace(['D', 'd'], "E").parse::<f64>().ok();
    }
    None
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

/// Column-major table. The first column is the independent variable.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    source: Option<PathBuf>,
}

impl Table {
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self {
            columns,
            source: None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn first_column(&self) -> Option<&Column> {
        self.columns.first()
    }

    /// Values of `name` as floats; non-numeric cells become `NaN`.
    pub fn numeric(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name).map(|c| {
            c.values
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect()
        })
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// File name of the source, or `"<memory>"` for tables built in code.
    pub fn source_name(&self) -> String {
        self.source
            .as_deref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Byte(u8),
    Whitespace,
}

/// Pick the delimiter from the header line: comma, semicolon, tab, else whitespace runs.
fn sniff_delimiter(header: &str) -> Delimiter {
    for b in [b',', b';', b'\t'] {
        if header.as_bytes().contains(&b) {
            return Delimiter::Byte(b);
        }
    }
    Delimiter::Whitespace
}

/// Read a delimiter-agnostic text table with a header row.
pub fn load_table(path: &Path) -> Result<Table> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read table: {}", path.display()))?;
    let mut table =
        parse_table(&text, path).with_context(|| format!("Failed to parse {}", path.display()))?;
    table.source = Some(path.to_path_buf());
    log::debug!(
        "Loaded {} ({} columns, {} rows)",
        path.display(),
        table.columns.len(),
        table.n_rows()
    );
    Ok(table)
}

/// Parse table text. `path` is only used in error messages.
pub fn parse_table(text: &str, path: &Path) -> Result<Table> {
    let header_line = text
        .lines()
        .find(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .ok_or_else(|| PlotError::EmptyTable {
            file: path.to_path_buf(),
        })?;

    let (headers, rows) = match sniff_delimiter(header_line) {
        Delimiter::Byte(b) => read_delimited(text, b, path)?,
        Delimiter::Whitespace => read_whitespace(text, path)?,
    };

    let mut columns: Vec<Column> = headers
        .into_iter()
        .map(|name| Column {
            name,
            values: Vec::with_capacity(rows.len()),
        })
        .collect();
    for row in rows {
        for (i, col) in columns.iter_mut().enumerate() {
            col.values
                .push(row.get(i).map_or(Cell::Empty, |f| Cell::parse(f)));
        }
    }

    Ok(Table::from_columns(columns))
}

type Rows = Vec<Vec<String>>;

fn read_delimited(text: &str, delimiter: u8, path: &Path) -> Result<(Vec<String>, Rows)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {}", row_no + 1))?;
        if record.len() > headers.len() {
            let line = record
                .position()
                .map_or(row_no + 2, |p| p.line() as usize);
            return Err(PlotError::RaggedRow {
                file: path.to_path_buf(),
                line,
                expected: headers.len(),
                found: record.len(),
            }
            .into());
        }
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    Ok((headers, rows))
}

fn read_whitespace(text: &str, path: &Path) -> Result<(Vec<String>, Rows)> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'));

    let headers: Vec<String> = match lines.next() {
        Some((_, l)) => l.split_whitespace().map(|s| s.to_string()).collect(),
        None => {
            return Err(PlotError::EmptyTable {
                file: path.to_path_buf(),
            }
            .into())
        }
    };

    let mut rows = Vec::new();
    for (idx, line) in lines {
        let fields: Vec<String> = line.split_whitespace().map(|s| s.to_string()).collect();
        if fields.len() > headers.len() {
            return Err(PlotError::RaggedRow {
                file: path.to_path_buf(),
                line: idx + 1,
                expected: headers.len(),
                found: fields.len(),
            }
            .into());
        }
        rows.push(fields);
    }
    Ok((headers, rows))
}
