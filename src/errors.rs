use thiserror::Error;

/// Errors that can abort an export.
///
/// Every variant is fatal. The one non-fatal condition (currency mismatch inside
/// an account) is reported through [`crate::ExportWarning`] instead.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The mapping profile is incomplete or malformed for the requested format
    #[error("Invalid mapping profile: {0}")]
    Configuration(String),

    /// A header name referenced by the profile does not exist in the table
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A value that should be numeric could not be parsed as an amount
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    /// The date column could not be parsed with the profile's date parser
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    /// A profile strategy failed for one field of one row
    #[error("Failed to extract field '{field}' at row {row}: {source}")]
    FieldExtraction {
        field: &'static str,
        row: usize,
        #[source]
        source: Box<ExportError>,
    },

    /// The table has a header but no data rows
    #[error("Table has no data rows")]
    EmptyDataset,

    /// The input did not even contain a header row
    #[error("Table has no header row")]
    MissingHeader,

    /// A data row does not have the same number of cells as the header
    #[error("Row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A split row appeared before any parent transaction
    #[error("Split row {row} has no parent transaction")]
    OrphanSplit { row: usize },

    /// The requested output format is neither OFX nor QIF
    #[error("Unsupported export format: {0:?}")]
    UnsupportedFormat(String),

    // ── Collaborator errors ─────────────────────────────────────────────────────

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read mapping profile: {0}")]
    ProfileJson(#[from] serde_json::Error),
}

impl ExportError {
    /// Wraps `self` as the cause of a failed field extraction.
    pub(crate) fn in_field(self, field: &'static str, row: usize) -> Self {
        ExportError::FieldExtraction {
            field,
            row,
            source: Box::new(self),
        }
    }
}

/// Convenient alias for Result with our main error type
pub type ExportResult<T> = Result<T, ExportError>;
