use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which statement wrapper the exported accounts use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    #[default]
    Bank,
    CreditCard,
}

impl AccountType {
    pub fn qif_type(&self) -> &'static str {
        match self {
            AccountType::Bank => "Bank",
            AccountType::CreditCard => "CCard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// Zero and positive amounts are credits.
    pub fn from_amount(amount: &Decimal) -> Self {
        if *amount < Decimal::ZERO {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
        }
    }
}

/// Document-wide values shared by every statement of one OFX export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStamp {
    pub server_date: NaiveDate,
    pub trn_uid: i64,
}

impl DocumentStamp {
    pub fn now() -> Self {
        Self::from(Local::now())
    }
}

impl From<DateTime<Local>> for DocumentStamp {
    fn from(now: DateTime<Local>) -> Self {
        DocumentStamp {
            server_date: now.date_naive(),
            trn_uid: now.timestamp(),
        }
    }
}

/// Per-call settings for an exporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Overrides the profile's account type when set.
    pub account_type: Option<AccountType>,
    /// Fixed OFX document stamp; the current time when unset.
    pub stamp: Option<DocumentStamp>,
}

impl ExportOptions {
    pub fn account_type_for(&self, profile_default: AccountType) -> AccountType {
        self.account_type.unwrap_or(profile_default)
    }

    pub fn stamp(&self) -> DocumentStamp {
        self.stamp.unwrap_or_else(DocumentStamp::now)
    }
}

/// Non-fatal findings collected during an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportWarning {
    /// A row reported a currency other than the first one seen for its account.
    /// The first-seen currency is kept.
    CurrencyMismatch {
        account: String,
        row: usize,
        expected: String,
        found: String,
    },
}

/// What an export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub accounts: usize,
    pub transactions: usize,
    pub splits: usize,
    pub skipped: usize,
    pub warnings: Vec<ExportWarning>,
}
