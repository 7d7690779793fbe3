//! Per-export view over one table and one profile.
//!
//! Holds the lazily computed statement date range and the transaction-id
//! prefix derived from it, and wraps strategy failures with the field name
//! and row they happened on.

use std::cell::OnceCell;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ExportError, ExportResult},
    mapping::{FieldSource, MappingProfile, RowPredicate},
    table::TabularSource,
};

/// Earliest and latest transaction date of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `YYYYMMDD:YYYYMMDD`, the stable part of generated transaction ids.
    pub fn id_prefix(&self) -> String {
        format!("{}:{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

pub struct ExportContext<'a, S: TabularSource + ?Sized> {
    table: &'a S,
    profile: &'a MappingProfile,
    exclude_key: &'static str,
    exclude: &'a RowPredicate,
    date_range: OnceCell<DateRange>,
    id_prefix: OnceCell<String>,
}

impl<'a, S: TabularSource + ?Sized> ExportContext<'a, S> {
    /// `exclude` marks rows that are not transactions of their own for the
    /// active format (OFX `skip`, QIF `isSplit`); they do not count towards
    /// the date range.
    pub fn new(
        table: &'a S,
        profile: &'a MappingProfile,
        exclude_key: &'static str,
        exclude: &'a RowPredicate,
    ) -> Self {
        ExportContext {
            table,
            profile,
            exclude_key,
            exclude,
            date_range: OnceCell::new(),
            id_prefix: OnceCell::new(),
        }
    }

    pub fn table(&self) -> &'a S {
        self.table
    }

    pub fn profile(&self) -> &'a MappingProfile {
        self.profile
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn cell(&self, row: usize, column: &str) -> ExportResult<&'a str> {
        let index = self.table.column_index(column)?;
        Ok(self.table.cell(row, index))
    }

    /// The row's transaction date, read with the profile's date parser.
    pub fn date(&self, row: usize) -> ExportResult<NaiveDate> {
        let params = &self.profile.params;
        let value = self.cell(row, &params.date_column)?;
        params.date_parser.parse(value)
    }

    pub fn is_excluded(&self, row: usize) -> ExportResult<bool> {
        self.test(self.exclude_key, self.exclude, row)
    }

    /// Global date range over every non-excluded row, computed on first use.
    pub fn date_range(&self) -> ExportResult<DateRange> {
        if let Some(range) = self.date_range.get() {
            return Ok(*range);
        }
        let range = self.scan_date_range()?;
        Ok(*self.date_range.get_or_init(|| range))
    }

    fn scan_date_range(&self) -> ExportResult<DateRange> {
        if self.row_count() == 0 {
            return Err(ExportError::EmptyDataset);
        }

        let mut range: Option<DateRange> = None;
        for row in 0..self.row_count() {
            if self.is_excluded(row)? {
                continue;
            }
            let date = self
                .date(row)
                .map_err(|e| e.in_field("dateColumnName", row))?;
            range = Some(match range {
                None => DateRange { start: date, end: date },
                Some(r) => DateRange {
                    start: r.start.min(date),
                    end: r.end.max(date),
                },
            });
        }

        let range = range.ok_or(ExportError::EmptyDataset)?;
        tracing::debug!(start = %range.start, end = %range.end, "computed statement date range");
        Ok(range)
    }

    /// Stable identifier for sources that have none: `min:max:row`.
    ///
    /// The same table and profile always produce the same ids, so consuming
    /// applications can detect re-imports.
    pub fn transaction_id(&self, row: usize) -> ExportResult<String> {
        let prefix = match self.id_prefix.get() {
            Some(prefix) => prefix,
            None => {
                let prefix = self.date_range()?.id_prefix();
                self.id_prefix.get_or_init(|| prefix)
            }
        };
        Ok(format!("{prefix}:{row}"))
    }

    /// Resolves one field of one row. Failures carry the field key and row.
    pub fn extract(
        &self,
        key: &'static str,
        source: &FieldSource,
        row: usize,
    ) -> ExportResult<String> {
        source.resolve(row, self).map_err(|e| e.in_field(key, row))
    }

    pub fn test(
        &self,
        key: &'static str,
        predicate: &RowPredicate,
        row: usize,
    ) -> ExportResult<bool> {
        predicate.test(row, self).map_err(|e| e.in_field(key, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapping::{DateParser, ProfileParams},
        table::CsvTable,
    };
    use rstest::rstest;

    const CSV: &str = "Date,Amount,Type\n\
03/15/2025,10.00,\n\
01/02/2025,-5.00,\n\
12/31/2024,1.00,Split\n\
02/28/2025,7.50,\n";

    fn profile() -> MappingProfile {
        MappingProfile::new("test", ProfileParams::new("Date", DateParser::UsSlash))
    }

    fn table(content: &str) -> CsvTable {
        CsvTable::parse(content, &profile().params).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_spans_all_rows() {
        let table = table(CSV);
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);

        let range = ctx.date_range().unwrap();
        assert_eq!(range.start, ymd(2024, 12, 31));
        assert_eq!(range.end, ymd(2025, 3, 15));

        for row in 0..ctx.row_count() {
            assert!(range.contains(ctx.date(row).unwrap()));
        }
    }

    #[test]
    fn test_date_range_ignores_excluded_rows() {
        let table = table(CSV);
        let profile = profile();
        let split = RowPredicate::ColumnEquals {
            column: "Type".to_string(),
            value: "Split".to_string(),
        };
        let ctx = ExportContext::new(&table, &profile, "isSplit", &split);

        let range = ctx.date_range().unwrap();
        assert_eq!(range.start, ymd(2025, 1, 2));
        assert_eq!(range.end, ymd(2025, 3, 15));
    }

    #[test]
    fn test_single_row_range_is_one_day() {
        let table = table("Date,Amount\n06/01/2025,1.00\n");
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);

        let range = ctx.date_range().unwrap();
        assert_eq!(range.start, range.end);
        assert_eq!(ctx.transaction_id(0).unwrap(), "20250601:20250601:0");
    }

    #[test]
    fn test_empty_table_fails_before_scanning() {
        let table = table("Date,Amount\n");
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);

        assert!(matches!(ctx.date_range(), Err(ExportError::EmptyDataset)));
        assert!(matches!(ctx.transaction_id(0), Err(ExportError::EmptyDataset)));
    }

    #[test]
    fn test_all_rows_excluded_is_empty() {
        let table = table(CSV);
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Always);
        assert!(matches!(ctx.date_range(), Err(ExportError::EmptyDataset)));
    }

    #[test]
    fn test_transaction_ids_are_deterministic_and_unique() {
        let table = table(CSV);
        let profile = profile();

        let ids = |ctx: &ExportContext<'_, CsvTable>| {
            (0..ctx.row_count())
                .map(|row| ctx.transaction_id(row).unwrap())
                .collect::<Vec<_>>()
        };

        let first = ids(&ExportContext::new(&table, &profile, "skip", &RowPredicate::Never));
        let second = ids(&ExportContext::new(&table, &profile, "skip", &RowPredicate::Never));
        assert_eq!(first, second);
        assert_eq!(first[2], "20241231:20250315:2");

        let mut unique = first.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), first.len());
    }

    #[rstest]
    #[case("Date,Amount\n13/45/2025,1.00\n")]
    #[case("Date,Amount\nyesterday,1.00\n")]
    fn test_bad_date_names_the_row(#[case] content: &str) {
        let table = table(content);
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);

        match ctx.date_range() {
            Err(ExportError::FieldExtraction { field, row, source }) => {
                assert_eq!(field, "dateColumnName");
                assert_eq!(row, 0);
                assert!(matches!(*source, ExportError::InvalidDate(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_date_column() {
        let table = table("When,Amount\n01/01/2025,1.00\n");
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);

        let err = ctx.date(0).unwrap_err();
        assert!(matches!(err, ExportError::UnknownColumn(name) if name == "Date"));
    }

    #[test]
    fn test_extract_wraps_errors() {
        let table = table(CSV);
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);

        assert_eq!(ctx.extract("amount", &FieldSource::column("Amount"), 1).unwrap(), "-5.00");

        let err = ctx.extract("payee", &FieldSource::column("Payee"), 3).unwrap_err();
        assert!(matches!(
            err,
            ExportError::FieldExtraction { field: "payee", row: 3, .. }
        ));
    }
}
