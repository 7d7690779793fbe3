use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    str::FromStr,
};

use crate::{
    errors::{ExportError, ExportResult},
    exporters::prelude::*,
    mapping::MappingProfile,
    table::TabularSource,
    types::{AccountType, DocumentStamp, ExportOptions, ExportSummary},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "ofx")]
    Ofx,
    #[serde(rename = "qif")]
    Qif,
}

impl ExportFormat {
    pub fn default_extension(&self) -> &'static str {
        match self {
            ExportFormat::Ofx => OfxExporter::EXTENSION,
            ExportFormat::Qif => QifExporter::EXTENSION,
        }
    }

    /// Picks the format from a file name such as `statement.QIF`.
    pub fn from_extension<P: AsRef<Path>>(path: P) -> ExportResult<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ExportError::UnsupportedFormat(path.display().to_string()))?
            .parse()
    }

    /// Fails on a profile that has no field map for this format.
    fn check(&self, profile: &MappingProfile) -> ExportResult<()> {
        match self {
            ExportFormat::Ofx => profile.ofx_fields().map(|_| ()),
            ExportFormat::Qif => profile.qif_fields().map(|_| ()),
        }
    }

    fn export<W, S>(
        &self,
        out: &mut W,
        table: &S,
        profile: &MappingProfile,
        options: &ExportOptions,
    ) -> ExportResult<ExportSummary>
    where
        W: Write + ?Sized,
        S: TabularSource + ?Sized,
    {
        match self {
            ExportFormat::Ofx => OfxExporter::export(out, table, profile, options),
            ExportFormat::Qif => QifExporter::export(out, table, profile, options),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ofx" => Ok(ExportFormat::Ofx),
            "qif" => Ok(ExportFormat::Qif),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Default)]
pub struct ExportBuilder<'p> {
    profile: Option<&'p MappingProfile>,
    format: Option<ExportFormat>,
    account_type: Option<AccountType>,
    stamp: Option<DocumentStamp>,
}

impl<'p> ExportBuilder<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(mut self, profile: &'p MappingProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn format(mut self, format: ExportFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Overrides the profile's account type.
    pub fn account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    /// Fixes the OFX server date and `TRNUID` instead of using the clock.
    pub fn stamp(mut self, stamp: DocumentStamp) -> Self {
        self.stamp = Some(stamp);
        self
    }

    fn require_profile(&self) -> ExportResult<&'p MappingProfile> {
        self.profile
            .ok_or_else(|| ExportError::Configuration("no mapping profile given".to_string()))
    }

    fn options(&self) -> ExportOptions {
        ExportOptions {
            account_type: self.account_type,
            stamp: self.stamp,
        }
    }

    /// Writes the whole document to `out`. Defaults to OFX.
    pub fn export<S, W>(&self, table: &S, out: &mut W) -> ExportResult<ExportSummary>
    where
        S: TabularSource + ?Sized,
        W: Write + ?Sized,
    {
        let profile = self.require_profile()?;
        let format = self.format.unwrap_or(ExportFormat::Ofx);
        format.export(out, table, profile, &self.options())
    }

    /// Creates `path` and writes the document into it. Without an explicit
    /// format the file extension decides.
    ///
    /// Profile problems are reported before the file is created. Once it is
    /// created the file is flushed and closed before any error is returned.
    pub fn export_to_path<S, P>(&self, table: &S, path: P) -> ExportResult<ExportSummary>
    where
        S: TabularSource + ?Sized,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let profile = self.require_profile()?;
        let format = self
            .format
            .map(Ok)
            .unwrap_or_else(|| ExportFormat::from_extension(path))?;
        format.check(profile)?;

        let mut out = BufWriter::new(File::create(path)?);
        let result = format.export(&mut out, table, profile, &self.options());
        let flushed = out.flush();
        drop(out);

        match &result {
            Ok(summary) => tracing::info!(
                path = %path.display(),
                transactions = summary.transactions,
                warnings = summary.warnings.len(),
                "export finished"
            ),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "export failed"),
        }

        let summary = result?;
        flushed?;
        Ok(summary)
    }
}
