use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    amount::parse_amount,
    context::ExportContext,
    errors::ExportResult,
    grouping::AccountInfo,
    mapping::{OfxField, OfxFieldMap},
    table::TabularSource,
    types::{ExportWarning, TransactionType},
};

/// Statement-level values of one OFX account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfxAccount {
    #[serde(rename = "BANKID")]
    pub bank_id: String,
    #[serde(rename = "ACCTID")]
    pub acct_id: String,
    #[serde(rename = "CURDEF")]
    pub currency: String,
}

impl OfxAccount {
    /// `bankId-acctId`, the grouping key and the credit-card `ACCTKEY`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.bank_id, self.acct_id)
    }
}

impl AccountInfo for OfxAccount {
    fn reassert(&mut self, key: &str, row: usize, seen: Self) -> Option<ExportWarning> {
        (self.currency != seen.currency).then(|| ExportWarning::CurrencyMismatch {
            account: key.to_string(),
            row,
            expected: self.currency.clone(),
            found: seen.currency,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfxTransaction {
    #[serde(rename = "TRNTYPE")]
    pub trn_type: TransactionType,
    #[serde(rename = "DTPOSTED")]
    pub date_posted: String,
    #[serde(rename = "TRNAMT")]
    pub amount: Decimal,
    #[serde(rename = "FITID")]
    pub fitid: String,
    #[serde(rename = "CHECKNUM", default, skip_serializing_if = "Option::is_none")]
    pub check_num: Option<String>,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "MEMO")]
    pub memo: String,
}

/// Extracts the account and transaction of one non-skipped row.
pub(super) fn extract_row<S>(
    ctx: &ExportContext<'_, S>,
    fields: &OfxFieldMap,
    row: usize,
) -> ExportResult<(OfxAccount, OfxTransaction)>
where
    S: TabularSource + ?Sized,
{
    let get = |field: OfxField| ctx.extract(field.key(), fields.source(field), row);

    let account = OfxAccount {
        bank_id: get(OfxField::BankId)?,
        acct_id: get(OfxField::AcctId)?,
        currency: get(OfxField::Currency)?,
    };

    let amount = parse_amount(&get(OfxField::Amount)?)
        .map_err(|e| e.in_field(OfxField::Amount.key(), row))?;
    let check_num = get(OfxField::CheckNum)?;

    let transaction = OfxTransaction {
        trn_type: TransactionType::from_amount(&amount),
        date_posted: get(OfxField::DatePosted)?,
        amount,
        fitid: get(OfxField::TransactionId)?,
        check_num: Some(check_num).filter(|n| !n.trim().is_empty()),
        name: get(OfxField::Payee)?,
        memo: get(OfxField::Memo)?,
    };

    Ok((account, transaction))
}
