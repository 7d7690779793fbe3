mod dto;
mod exporter;

use std::io::Write;

pub use dto::{QifAccount, QifEntry, QifSplit, QifTransaction};
pub use exporter::{QifAccounts, QifExporter, SplitState};

use crate::{
    errors::ExportResult,
    exporters::traits::Exporter,
    mapping::MappingProfile,
    table::TabularSource,
    types::{AccountType, ExportOptions, ExportSummary},
};

/// Writes `table` as QIF, one `!Account` block per account.
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
    QifExporter::export(out, table, profile, &options)
}
