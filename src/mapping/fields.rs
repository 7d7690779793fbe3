use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::{
    amount::{debit_credit, invert_sign},
    context::ExportContext,
    errors::{ExportError, ExportResult},
    table::{escape_cell, TabularSource},
};

/// How one output field is computed from one row.
///
/// Every variant is a pure function of the row index and the table. Literal
/// text coming from the profile is escaped the same way table cells are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldSource {
    /// The cell under a header name.
    Column { column: String },
    /// A fixed value.
    Literal { value: String },
    /// The 0-based data row number.
    RowIndex,
    /// A generated `min:max:row` identifier, for sources without one.
    TransactionId,
    /// The profile's date column, parsed and re-formatted with a chrono format.
    Date { format: String },
    /// One part of a cell split on `separator`.
    Split {
        column: String,
        separator: String,
        take: SplitTake,
    },
    /// All parts joined with `separator`.
    Concat {
        parts: Vec<FieldSource>,
        separator: String,
    },
    /// The non-empty parts joined with `separator`.
    JoinNonEmpty {
        parts: Vec<FieldSource>,
        separator: String,
    },
    /// The first non-empty part, else `fallback`.
    FirstNonEmpty {
        parts: Vec<FieldSource>,
        #[serde(default)]
        fallback: String,
    },
    Replace {
        input: Box<FieldSource>,
        from: String,
        #[serde(default)]
        to: String,
    },
    /// Flips the sign of a numeric field, two decimal places.
    InvertSign { input: Box<FieldSource> },
    /// `credit - debit` from two columns, either of which may be empty.
    DebitCredit {
        debit: String,
        credit: String,
        #[serde(default)]
        strip: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitTake {
    First,
    Last,
    /// Everything after the first part, re-joined with `join`.
    Rest { join: String },
}

impl SplitTake {
    fn apply(&self, value: &str, separator: &str) -> String {
        match self {
            SplitTake::First => value.split(separator).next().unwrap_or("").to_string(),
            SplitTake::Last => value.rsplit(separator).next().unwrap_or("").to_string(),
            SplitTake::Rest { join } => value
                .split(separator)
                .skip(1)
                .collect::<Vec<_>>()
                .join(join),
        }
    }
}

impl FieldSource {
    pub fn column(name: impl Into<String>) -> Self {
        FieldSource::Column { column: name.into() }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        FieldSource::Literal { value: value.into() }
    }

    pub fn date(format: impl Into<String>) -> Self {
        FieldSource::Date { format: format.into() }
    }

    pub fn invert_sign(input: FieldSource) -> Self {
        FieldSource::InvertSign { input: Box::new(input) }
    }

    pub fn resolve<S>(&self, row: usize, ctx: &ExportContext<'_, S>) -> ExportResult<String>
    where
        S: TabularSource + ?Sized,
    {
        match self {
            FieldSource::Column { column } => Ok(ctx.cell(row, column)?.to_string()),
            FieldSource::Literal { value } => Ok(escape_cell(value)),
            FieldSource::RowIndex => Ok(row.to_string()),
            FieldSource::TransactionId => ctx.transaction_id(row),
            FieldSource::Date { format } => {
                let date = ctx.date(row)?;
                let mut out = String::new();
                write!(out, "{}", date.format(format)).map_err(|_| bad_date_format(format))?;
                Ok(out)
            }
            FieldSource::Split {
                column,
                separator,
                take,
            } => Ok(take.apply(ctx.cell(row, column)?, separator)),
            FieldSource::Concat { parts, separator } => {
                Ok(resolve_all(parts, row, ctx)?.join(&escape_cell(separator)))
            }
            FieldSource::JoinNonEmpty { parts, separator } => {
                let values: Vec<String> = resolve_all(parts, row, ctx)?
                    .into_iter()
                    .filter(|v| !v.is_empty())
                    .collect();
                Ok(values.join(&escape_cell(separator)))
            }
            FieldSource::FirstNonEmpty { parts, fallback } => {
                for part in parts {
                    let value = part.resolve(row, ctx)?;
                    if !value.is_empty() {
                        return Ok(value);
                    }
                }
                Ok(escape_cell(fallback))
            }
            FieldSource::Replace { input, from, to } => {
                Ok(input.resolve(row, ctx)?.replace(from.as_str(), &escape_cell(to)))
            }
            FieldSource::InvertSign { input } => invert_sign(&input.resolve(row, ctx)?),
            FieldSource::DebitCredit {
                debit,
                credit,
                strip,
            } => debit_credit(ctx.cell(row, debit)?, ctx.cell(row, credit)?, strip),
        }
    }

    /// Catches strategy mistakes that would otherwise only show up mid-export.
    pub(crate) fn validate(&self) -> ExportResult<()> {
        match self {
            FieldSource::Date { format } => {
                if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                    return Err(bad_date_format(format));
                }
                Ok(())
            }
            FieldSource::Split { separator, .. } if separator.is_empty() => Err(
                ExportError::Configuration("split separator must not be empty".to_string()),
            ),
            FieldSource::Replace { from, .. } if from.is_empty() => Err(
                ExportError::Configuration("replace pattern must not be empty".to_string()),
            ),
            FieldSource::Replace { input, .. } | FieldSource::InvertSign { input } => {
                input.validate()
            }
            FieldSource::Concat { parts, .. }
            | FieldSource::JoinNonEmpty { parts, .. }
            | FieldSource::FirstNonEmpty { parts, .. } => {
                parts.iter().try_for_each(FieldSource::validate)
            }
            _ => Ok(()),
        }
    }
}

fn resolve_all<S>(
    parts: &[FieldSource],
    row: usize,
    ctx: &ExportContext<'_, S>,
) -> ExportResult<Vec<String>>
where
    S: TabularSource + ?Sized,
{
    parts.iter().map(|part| part.resolve(row, ctx)).collect()
}

fn bad_date_format(format: &str) -> ExportError {
    ExportError::Configuration(format!("invalid date format {format:?}"))
}

/// A yes/no question about one row, used for the `skip` and `isSplit` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RowPredicate {
    Never,
    Always,
    ColumnEquals { column: String, value: String },
    /// True when the cell is empty or whitespace.
    ColumnEmpty { column: String },
}

impl RowPredicate {
    pub fn test<S>(&self, row: usize, ctx: &ExportContext<'_, S>) -> ExportResult<bool>
    where
        S: TabularSource + ?Sized,
    {
        match self {
            RowPredicate::Never => Ok(false),
            RowPredicate::Always => Ok(true),
            RowPredicate::ColumnEquals { column, value } => {
                Ok(ctx.cell(row, column)? == escape_cell(value))
            }
            RowPredicate::ColumnEmpty { column } => Ok(ctx.cell(row, column)?.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapping::{DateParser, MappingProfile, ProfileParams},
        table::CsvTable,
    };
    use rstest::rstest;

    const CSV: &str = "Date,Account Name,Amount,Debit,Credit,Memo,Category,Split Type\n\
01/05/2025,Big Bank - 12345,-20.00,20.00,,Lunch & drinks,Food,\n\
01/03/2025,Big Bank - Savings - 999,100,,\"1,000.00\",,Salary,Split\n";

    fn table() -> CsvTable {
        CsvTable::parse(CSV, &ProfileParams::new("Date", DateParser::UsSlash)).unwrap()
    }

    fn profile() -> MappingProfile {
        MappingProfile::new("test", ProfileParams::new("Date", DateParser::UsSlash))
    }

    fn resolve(source: &FieldSource, row: usize) -> ExportResult<String> {
        let table = table();
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);
        source.resolve(row, &ctx)
    }

    fn split(take: SplitTake, separator: &str) -> FieldSource {
        FieldSource::Split {
            column: "Account Name".to_string(),
            separator: separator.to_string(),
            take,
        }
    }

    #[rstest]
    #[case(FieldSource::column("Memo"), 0, "Lunch &amp; drinks")]
    #[case(FieldSource::literal("AT&T"), 0, "AT&amp;T")]
    #[case(FieldSource::RowIndex, 1, "1")]
    #[case(FieldSource::date("%Y%m%d"), 0, "20250105")]
    #[case(FieldSource::date("%m/%d/%Y"), 1, "01/03/2025")]
    #[case(split(SplitTake::First, " - "), 1, "Big Bank")]
    #[case(split(SplitTake::Last, " - "), 1, "999")]
    #[case(split(SplitTake::Rest { join: " ".to_string() }, "-"), 0, " 12345")]
    #[case(FieldSource::invert_sign(FieldSource::column("Amount")), 0, "20.00")]
    #[case(FieldSource::invert_sign(FieldSource::column("Amount")), 1, "-100.00")]
    fn test_resolve(#[case] source: FieldSource, #[case] row: usize, #[case] expected: &str) {
        assert_eq!(resolve(&source, row).unwrap(), expected);
    }

    #[test]
    fn test_transaction_id_uses_global_date_range() {
        assert_eq!(
            resolve(&FieldSource::TransactionId, 1).unwrap(),
            "20250103:20250105:1"
        );
    }

    #[test]
    fn test_concat_and_join_non_empty() {
        let parts = vec![
            FieldSource::column("Memo"),
            FieldSource::column("Category"),
        ];
        let concat = FieldSource::Concat {
            parts: parts.clone(),
            separator: " - ".to_string(),
        };
        let join = FieldSource::JoinNonEmpty {
            parts,
            separator: " - ".to_string(),
        };

        assert_eq!(resolve(&concat, 1).unwrap(), " - Salary");
        assert_eq!(resolve(&join, 1).unwrap(), "Salary");
        assert_eq!(resolve(&join, 0).unwrap(), "Lunch &amp; drinks - Food");
    }

    #[test]
    fn test_first_non_empty_falls_back() {
        let source = FieldSource::FirstNonEmpty {
            parts: vec![FieldSource::column("Memo"), FieldSource::column("Split Type")],
            fallback: "UBS".to_string(),
        };
        assert_eq!(resolve(&source, 0).unwrap(), "Lunch &amp; drinks");

        let source = FieldSource::FirstNonEmpty {
            parts: vec![FieldSource::column("Debit")],
            fallback: "UBS".to_string(),
        };
        assert_eq!(resolve(&source, 1).unwrap(), "UBS");
    }

    #[test]
    fn test_replace_and_debit_credit() {
        let replace = FieldSource::Replace {
            input: Box::new(FieldSource::column("Credit")),
            from: ",".to_string(),
            to: String::new(),
        };
        assert_eq!(resolve(&replace, 1).unwrap(), "1000.00");

        let amount = FieldSource::DebitCredit {
            debit: "Debit".to_string(),
            credit: "Credit".to_string(),
            strip: ",".to_string(),
        };
        assert_eq!(resolve(&amount, 0).unwrap(), "-20.00");
        assert_eq!(resolve(&amount, 1).unwrap(), "1000.00");
    }

    #[test]
    fn test_unknown_column() {
        let result = resolve(&FieldSource::column("Nope"), 0);
        assert!(matches!(result, Err(ExportError::UnknownColumn(name)) if name == "Nope"));
    }

    #[test]
    fn test_invert_sign_of_text_fails() {
        let result = resolve(&FieldSource::invert_sign(FieldSource::column("Memo")), 0);
        assert!(matches!(result, Err(ExportError::InvalidAmount(_))));
    }

    #[rstest]
    #[case(RowPredicate::Never, 1, false)]
    #[case(RowPredicate::Always, 0, true)]
    #[case(RowPredicate::ColumnEquals { column: "Split Type".into(), value: "Split".into() }, 1, true)]
    #[case(RowPredicate::ColumnEquals { column: "Split Type".into(), value: "Split".into() }, 0, false)]
    #[case(RowPredicate::ColumnEmpty { column: "Memo".into() }, 1, true)]
    #[case(RowPredicate::ColumnEmpty { column: "Memo".into() }, 0, false)]
    fn test_predicates(
        #[case] predicate: RowPredicate,
        #[case] row: usize,
        #[case] expected: bool,
    ) {
        let table = table();
        let profile = profile();
        let ctx = ExportContext::new(&table, &profile, "skip", &RowPredicate::Never);
        assert_eq!(predicate.test(row, &ctx).unwrap(), expected);
    }

    #[rstest]
    #[case(FieldSource::date("%Q"))]
    #[case(split(SplitTake::First, ""))]
    #[case(FieldSource::Replace { input: Box::new(FieldSource::RowIndex), from: String::new(), to: String::new() })]
    #[case(FieldSource::JoinNonEmpty { parts: vec![FieldSource::date("%Q")], separator: " ".into() })]
    fn test_validate_rejects(#[case] source: FieldSource) {
        assert!(matches!(source.validate(), Err(ExportError::Configuration(_))));
    }

    #[test]
    fn test_serialization() {
        let source = FieldSource::JoinNonEmpty {
            parts: vec![
                FieldSource::column("Memo"),
                split(SplitTake::Rest { join: " ".to_string() }, "-"),
            ],
            separator: " / ".to_string(),
        };
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains(r#""kind":"joinNonEmpty""#));
        assert!(json.contains(r#""kind":"column""#));

        let deserialized: FieldSource = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, source);

        let predicate: RowPredicate = serde_json::from_str(
            r#"{"kind":"columnEquals","column":"Split Type","value":"Split"}"#,
        )
        .unwrap();
        assert!(matches!(predicate, RowPredicate::ColumnEquals { .. }));
    }
}
