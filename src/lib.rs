//! Convert bank and credit card CSV exports into OFX and QIF statements.
//!
//! A [`MappingProfile`] describes how one bank's columns map onto the OFX and
//! QIF field sets. Profiles are plain JSON, so new sources need no code.
//!
//! ```rust,ignore
//! use csv2ofx_rs::{CsvTable, ExportBuilder, ExportFormat, ProfileCatalog};
//!
//! let catalog = ProfileCatalog::builtin()?;
//! let profile = catalog.require("Credit Union")?;
//! let table = CsvTable::from_path("history.csv", &profile.params)?;
//!
//! let summary = ExportBuilder::new()
//!     .profile(profile)
//!     .format(ExportFormat::Ofx)
//!     .export_to_path(&table, "history.ofx")?;
//! ```

mod amount;
mod builder;
mod catalog;
mod context;
mod grouping;
mod types;

pub mod errors;
pub mod exporters;
pub mod mapping;
pub mod table;

pub use amount::{format_two_places, invert_sign};
pub use builder::{ExportBuilder, ExportFormat};
pub use catalog::ProfileCatalog;
pub use context::{DateRange, ExportContext};
pub use errors::{ExportError, ExportResult};
pub use exporters::prelude::*;
pub use grouping::{AccountBucket, AccountGrouper, AccountInfo, RecordLocation};
pub use mapping::MappingProfile;
pub use table::{CsvTable, TabularSource};
pub use types::{
    AccountType, DocumentStamp, ExportOptions, ExportSummary, ExportWarning, TransactionType,
};
