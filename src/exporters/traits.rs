use std::io::Write;

use crate::{
    errors::ExportResult,
    mapping::MappingProfile,
    table::TabularSource,
    types::{ExportOptions, ExportSummary},
};

pub trait Exporter {
    /// File extension the format is usually saved with.
    const EXTENSION: &'static str;

    /// Writes one complete document for every account found in `table`.
    ///
    /// Profile problems surface before any row is read, and every row is
    /// extracted before the first byte is written, so extraction failures
    /// leave `out` untouched.
    fn export<W, S>(
        out: &mut W,
        table: &S,
        profile: &MappingProfile,
        options: &ExportOptions,
    ) -> ExportResult<ExportSummary>
    where
        W: Write + ?Sized,
        S: TabularSource + ?Sized;
}
