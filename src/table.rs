//! Row/column access over delimited text.
//!
//! The exporters only see [`TabularSource`]. [`CsvTable`] is the implementation
//! backed by the `csv` crate; callers with their own grid can implement the
//! trait directly, as long as cells come back escaped (see [`escape_cell`]).

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use csv::ReaderBuilder;

use crate::{
    errors::{ExportError, ExportResult},
    mapping::ProfileParams,
};

pub trait TabularSource {
    /// Number of data rows, header excluded.
    fn row_count(&self) -> usize;

    fn column_index(&self, name: &str) -> ExportResult<usize>;

    /// Escaped cell value. `row` is 0-based over data rows.
    fn cell(&self, row: usize, column: usize) -> &str;
}

/// Makes a raw cell safe for both output formats.
///
/// `&`, `<` and `>` become entity references and line breaks collapse to a
/// single space. An `&` that already starts an entity reference is kept, so
/// escaping escaped text changes nothing.
pub fn escape_cell(value: &str) -> String {
    let collapsed = value.replace("\r\n", " ").replace(['\n', '\r'], " ");

    let mut out = String::with_capacity(collapsed.len());
    for (i, c) in collapsed.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' if is_entity_reference(&collapsed[i + 1..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_entity_reference(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    let name = &rest[..end];

    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(dec) = name.strip_prefix('#') {
        return !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit());
    }
    matches!(name, "amp" | "lt" | "gt" | "quot" | "apos")
}

/// A fully loaded CSV file: one header row plus equally sized data rows.
#[derive(Debug, Clone)]
pub struct CsvTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: HashMap<String, usize>,
}

impl CsvTable {
    /// Reads delimited text using the profile's delimiter and trailer settings.
    ///
    /// Empty lines are ignored; a line of bare delimiters is a row of empty
    /// cells. `skip_last_rows` counts from the end of the file, before the
    /// header is split off.
    pub fn from_reader<R: Read>(reader: R, params: &ProfileParams) -> ExportResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(params.delimiter_byte()?)
            .quote(b'"')
            .from_reader(reader);

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let keep = records.len().saturating_sub(params.skip_last_rows);
        records.truncate(keep);

        let mut records = records.into_iter();
        let header = records.next().ok_or(ExportError::MissingHeader)?;
        Self::from_rows(header, records.collect())
    }

    pub fn from_path<P: AsRef<Path>>(path: P, params: &ProfileParams) -> ExportResult<Self> {
        Self::from_reader(File::open(path)?, params)
    }

    pub fn parse(content: &str, params: &ProfileParams) -> ExportResult<Self> {
        Self::from_reader(content.as_bytes(), params)
    }

    /// Builds a table from raw (unescaped) cells.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<String>>) -> ExportResult<Self> {
        let mut escaped = Vec::with_capacity(rows.len());
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != header.len() {
                return Err(ExportError::RaggedRow {
                    row,
                    expected: header.len(),
                    found: cells.len(),
                });
            }
            escaped.push(cells.iter().map(|c| escape_cell(c)).collect());
        }

        let columns = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Ok(CsvTable {
            header,
            rows: escaped,
            columns,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }
}

impl TabularSource for CsvTable {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_index(&self, name: &str) -> ExportResult<usize> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| ExportError::UnknownColumn(name.to_string()))
    }

    fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}
