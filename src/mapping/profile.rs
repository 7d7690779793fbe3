use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use super::{DateParser, FieldSource, RowPredicate};
use crate::{
    errors::{ExportError, ExportResult},
    types::AccountType,
};

fn default_delimiter() -> char {
    ','
}

/// Reader-side settings of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileParams {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Trailer lines (totals, balances) to drop from the end of the file.
    #[serde(default)]
    pub skip_last_rows: usize,
    pub date_parser: DateParser,
    /// Header of the column holding the transaction date.
    #[serde(rename = "dateColumnName")]
    pub date_column: String,
}

impl ProfileParams {
    pub fn new(date_column: impl Into<String>, date_parser: DateParser) -> Self {
        ProfileParams {
            delimiter: default_delimiter(),
            skip_last_rows: 0,
            date_parser,
            date_column: date_column.into(),
        }
    }

    pub(crate) fn delimiter_byte(&self) -> ExportResult<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                ExportError::Configuration(format!(
                    "delimiter {:?} is not an ASCII character",
                    self.delimiter
                ))
            })
    }

    fn validate(&self) -> ExportResult<()> {
        if self.date_column.trim().is_empty() {
            return Err(ExportError::Configuration(
                "dateColumnName must not be empty".to_string(),
            ));
        }
        self.delimiter_byte()?;
        self.date_parser.validate()
    }
}

/// Keys of the OFX field map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfxField {
    BankId,
    AcctId,
    DatePosted,
    Amount,
    TransactionId,
    Payee,
    Memo,
    Currency,
    CheckNum,
}

impl OfxField {
    pub const ALL: [OfxField; 9] = [
        OfxField::BankId,
        OfxField::AcctId,
        OfxField::DatePosted,
        OfxField::Amount,
        OfxField::TransactionId,
        OfxField::Payee,
        OfxField::Memo,
        OfxField::Currency,
        OfxField::CheckNum,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            OfxField::BankId => "bankId",
            OfxField::AcctId => "acctId",
            OfxField::DatePosted => "datePosted",
            OfxField::Amount => "amount",
            OfxField::TransactionId => "transactionId",
            OfxField::Payee => "payee",
            OfxField::Memo => "memo",
            OfxField::Currency => "currency",
            OfxField::CheckNum => "checkNum",
        }
    }
}

/// Keys of the QIF field map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QifField {
    Account,
    AccountDescription,
    Date,
    Payee,
    Memo,
    Category,
    Class,
    Amount,
    Number,
}

impl QifField {
    pub const ALL: [QifField; 9] = [
        QifField::Account,
        QifField::AccountDescription,
        QifField::Date,
        QifField::Payee,
        QifField::Memo,
        QifField::Category,
        QifField::Class,
        QifField::Amount,
        QifField::Number,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            QifField::Account => "account",
            QifField::AccountDescription => "accountDescription",
            QifField::Date => "date",
            QifField::Payee => "payee",
            QifField::Memo => "memo",
            QifField::Category => "category",
            QifField::Class => "class",
            QifField::Amount => "amount",
            QifField::Number => "number",
        }
    }
}

pub const SKIP_KEY: &str = "skip";
pub const IS_SPLIT_KEY: &str = "isSplit";

/// OFX strategies. Every key is mandatory; serde rejects missing or unknown keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OfxFieldMap {
    /// Rows to leave out entirely, e.g. split lines OFX cannot represent.
    pub skip: RowPredicate,
    pub bank_id: FieldSource,
    pub acct_id: FieldSource,
    pub date_posted: FieldSource,
    pub amount: FieldSource,
    pub transaction_id: FieldSource,
    pub payee: FieldSource,
    pub memo: FieldSource,
    pub currency: FieldSource,
    pub check_num: FieldSource,
}

impl OfxFieldMap {
    pub fn source(&self, field: OfxField) -> &FieldSource {
        match field {
            OfxField::BankId => &self.bank_id,
            OfxField::AcctId => &self.acct_id,
            OfxField::DatePosted => &self.date_posted,
            OfxField::Amount => &self.amount,
            OfxField::TransactionId => &self.transaction_id,
            OfxField::Payee => &self.payee,
            OfxField::Memo => &self.memo,
            OfxField::Currency => &self.currency,
            OfxField::CheckNum => &self.check_num,
        }
    }
}

/// QIF strategies. Every key is mandatory; serde rejects missing or unknown keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QifFieldMap {
    /// Marks rows that belong to the preceding parent transaction.
    pub is_split: RowPredicate,
    pub account: FieldSource,
    pub account_description: FieldSource,
    pub date: FieldSource,
    pub payee: FieldSource,
    pub memo: FieldSource,
    pub category: FieldSource,
    #[serde(rename = "class")]
    pub class_name: FieldSource,
    pub amount: FieldSource,
    pub number: FieldSource,
}

impl QifFieldMap {
    pub fn source(&self, field: QifField) -> &FieldSource {
        match field {
            QifField::Account => &self.account,
            QifField::AccountDescription => &self.account_description,
            QifField::Date => &self.date,
            QifField::Payee => &self.payee,
            QifField::Memo => &self.memo,
            QifField::Category => &self.category,
            QifField::Class => &self.class_name,
            QifField::Amount => &self.amount,
            QifField::Number => &self.number,
        }
    }
}

/// Adapts one source's column layout to the standard OFX and QIF field sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MappingProfile {
    pub name: String,
    pub params: ProfileParams,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ofx: Option<OfxFieldMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qif: Option<QifFieldMap>,
}

impl MappingProfile {
    pub fn new(name: impl Into<String>, params: ProfileParams) -> Self {
        MappingProfile {
            name: name.into(),
            params,
            account_type: AccountType::default(),
            ofx: None,
            qif: None,
        }
    }

    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }

    pub fn with_ofx(mut self, ofx: OfxFieldMap) -> Self {
        self.ofx = Some(ofx);
        self
    }

    pub fn with_qif(mut self, qif: QifFieldMap) -> Self {
        self.qif = Some(qif);
        self
    }

    /// Parses and validates a JSON profile.
    ///
    /// Missing, unknown or mistyped keys are `Configuration` errors; only
    /// malformed JSON is reported as `ProfileJson`.
    pub fn from_json(json: &str) -> ExportResult<Self> {
        let profile: MappingProfile = serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                ExportError::Configuration(e.to_string())
            } else {
                ExportError::ProfileJson(e)
            }
        })?;
        profile.params.validate()?;
        if let Some(ofx) = &profile.ofx {
            validate_sources(OfxField::ALL.iter().map(|f| ofx.source(*f)))?;
        }
        if let Some(qif) = &profile.qif {
            validate_sources(QifField::ALL.iter().map(|f| qif.source(*f)))?;
        }
        Ok(profile)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ExportResult<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// The OFX map, checked for use. Fails before any row is read.
    pub fn ofx_fields(&self) -> ExportResult<&OfxFieldMap> {
        self.params.validate()?;
        let ofx = self.ofx.as_ref().ok_or_else(|| {
            ExportError::Configuration(format!("profile '{}' has no OFX field map", self.name))
        })?;
        validate_sources(OfxField::ALL.iter().map(|f| ofx.source(*f)))?;
        Ok(ofx)
    }

    /// The QIF map, checked for use. Fails before any row is read.
    pub fn qif_fields(&self) -> ExportResult<&QifFieldMap> {
        self.params.validate()?;
        let qif = self.qif.as_ref().ok_or_else(|| {
            ExportError::Configuration(format!("profile '{}' has no QIF field map", self.name))
        })?;
        validate_sources(QifField::ALL.iter().map(|f| qif.source(*f)))?;
        Ok(qif)
    }
}

fn validate_sources<'a>(sources: impl Iterator<Item = &'a FieldSource>) -> ExportResult<()> {
    for source in sources {
        source.validate()?;
    }
    Ok(())
}
