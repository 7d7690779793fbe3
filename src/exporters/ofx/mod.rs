mod dto;
mod exporter;

use std::io::Write;

pub use dto::{OfxAccount, OfxTransaction};
pub use exporter::OfxExporter;

use crate::{
    errors::ExportResult,
    exporters::traits::Exporter,
    mapping::MappingProfile,
    table::TabularSource,
    types::{AccountType, ExportOptions, ExportSummary},
};

/// Writes `table` as one OFX 2 document stamped with the current time.
pub fn export<W, S>(
    out: &mut W,
    profile: &MappingProfile,
    account_type: AccountType,
    table: &S,
) -> ExportResult<ExportSummary>
where
    W: Write + ?Sized,
    S: TabularSource + ?Sized,
{
    let options = ExportOptions {
        account_type: Some(account_type),
        stamp: None,
    };
    OfxExporter::export(out, table, profile, &options)
}
