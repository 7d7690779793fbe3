use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    amount::parse_amount,
    context::ExportContext,
    errors::ExportResult,
    grouping::AccountInfo,
    mapping::{QifField, QifFieldMap},
    table::TabularSource,
    types::ExportWarning,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QifAccount {
    pub name: String,
    pub description: String,
}

impl AccountInfo for QifAccount {
    /// The description of the latest row wins.
    fn reassert(&mut self, _key: &str, _row: usize, seen: Self) -> Option<ExportWarning> {
        self.description = seen.description;
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QifTransaction {
    pub date: String,
    pub amount: Decimal,
    pub payee: String,
    pub memo: String,
    pub category: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default)]
    pub splits: Vec<QifSplit>,
}

/// One category allocation of a parent transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QifSplit {
    pub category: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub memo: String,
    pub amount: Decimal,
}

/// A row after classification: either a transaction of its own or a split
/// of the current parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QifEntry {
    Parent {
        account: QifAccount,
        transaction: QifTransaction,
    },
    Split(QifSplit),
}

fn amount<S>(ctx: &ExportContext<'_, S>, fields: &QifFieldMap, row: usize) -> ExportResult<Decimal>
where
    S: TabularSource + ?Sized,
{
    let key = QifField::Amount.key();
    let value = ctx.extract(key, fields.source(QifField::Amount), row)?;
    parse_amount(&value).map_err(|e| e.in_field(key, row))
}

pub(super) fn extract_parent<S>(
    ctx: &ExportContext<'_, S>,
    fields: &QifFieldMap,
    row: usize,
) -> ExportResult<QifEntry>
where
    S: TabularSource + ?Sized,
{
    let get = |field: QifField| ctx.extract(field.key(), fields.source(field), row);

    let account = QifAccount {
        name: get(QifField::Account)?,
        description: get(QifField::AccountDescription)?,
    };
    let number = get(QifField::Number)?;
    let transaction = QifTransaction {
        date: get(QifField::Date)?,
        amount: amount(ctx, fields, row)?,
        payee: get(QifField::Payee)?,
        memo: get(QifField::Memo)?,
        category: get(QifField::Category)?,
        class_name: get(QifField::Class)?,
        number: Some(number).filter(|n| !n.trim().is_empty()),
        splits: Vec::new(),
    };

    Ok(QifEntry::Parent {
        account,
        transaction,
    })
}

/// Split rows usually leave the date and payee columns blank, so only the
/// fields a split line carries are read.
pub(super) fn extract_split<S>(
    ctx: &ExportContext<'_, S>,
    fields: &QifFieldMap,
    row: usize,
) -> ExportResult<QifEntry>
where
    S: TabularSource + ?Sized,
{
    let get = |field: QifField| ctx.extract(field.key(), fields.source(field), row);

    Ok(QifEntry::Split(QifSplit {
        category: get(QifField::Category)?,
        class_name: get(QifField::Class)?,
        memo: get(QifField::Memo)?,
        amount: amount(ctx, fields, row)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_description_wins() {
        let mut account = QifAccount {
            name: "Checking".to_string(),
            description: "Old".to_string(),
        };
        let warning = account.reassert(
            "Checking",
            4,
            QifAccount {
                name: "Checking".to_string(),
                description: "New".to_string(),
            },
        );

        assert!(warning.is_none());
        assert_eq!(account.description, "New");
    }
}
