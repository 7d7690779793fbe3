use std::io::{self, Write};

use super::dto::{QifAccount, QifEntry, QifTransaction, extract_parent, extract_split};
use crate::{
    context::ExportContext,
    errors::{ExportError, ExportResult},
    exporters::traits::Exporter,
    grouping::{AccountBucket, AccountGrouper, RecordLocation},
    mapping::{IS_SPLIT_KEY, MappingProfile, QifFieldMap},
    table::TabularSource,
    types::{AccountType, ExportOptions, ExportSummary},
};

pub struct QifExporter;

pub type QifAccounts = AccountGrouper<QifAccount, QifTransaction>;

/// The parent transaction the next split row attaches to.
///
/// The parent is not scoped to an account: a split follows the most recent
/// parent row even when that parent was filed under another account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitState {
    pub current_parent: Option<RecordLocation>,
}

impl SplitState {
    /// Files one classified row and returns the state for the next one.
    pub fn accept(
        self,
        row: usize,
        entry: QifEntry,
        accounts: &mut QifAccounts,
    ) -> ExportResult<SplitState> {
        match entry {
            QifEntry::Parent {
                account,
                transaction,
            } => {
                let key = account.name.clone();
                let location = accounts.push(key, row, account, transaction);
                Ok(SplitState {
                    current_parent: Some(location),
                })
            }
            QifEntry::Split(split) => {
                let parent = self
                    .current_parent
                    .and_then(|location| accounts.get_mut(location))
                    .ok_or(ExportError::OrphanSplit { row })?;
                parent.splits.push(split);
                Ok(self)
            }
        }
    }
}

impl QifExporter {
    fn group<S>(
        ctx: &ExportContext<'_, S>,
        fields: &QifFieldMap,
    ) -> ExportResult<(QifAccounts, usize)>
    where
        S: TabularSource + ?Sized,
    {
        let mut accounts = QifAccounts::new();
        let mut state = SplitState::default();
        let mut splits = 0;

        for row in 0..ctx.row_count() {
            let entry = if ctx.is_excluded(row)? {
                if state.current_parent.is_none() {
                    return Err(ExportError::OrphanSplit { row });
                }
                splits += 1;
                extract_split(ctx, fields, row)?
            } else {
                extract_parent(ctx, fields, row)?
            };
            state = state.accept(row, entry, &mut accounts)?;
        }

        Ok((accounts, splits))
    }
}

impl Exporter for QifExporter {
    const EXTENSION: &'static str = "qif";

    fn export<W, S>(
        out: &mut W,
        table: &S,
        profile: &MappingProfile,
        options: &ExportOptions,
    ) -> ExportResult<ExportSummary>
    where
        W: Write + ?Sized,
        S: TabularSource + ?Sized,
    {
        let fields = profile.qif_fields()?;
        let account_type = options.account_type_for(profile.account_type);
        let ctx = ExportContext::new(table, profile, IS_SPLIT_KEY, &fields.is_split);
        if ctx.row_count() == 0 {
            return Err(ExportError::EmptyDataset);
        }

        let (accounts, splits) = Self::group(&ctx, fields)?;
        let transactions = accounts.transaction_count();
        let (buckets, warnings) = accounts.into_parts();

        for bucket in &buckets {
            write_account(out, bucket, account_type)?;
        }
        out.flush()?;

        tracing::debug!(
            profile = %profile.name,
            accounts = buckets.len(),
            transactions,
            splits,
            "wrote QIF document"
        );

        Ok(ExportSummary {
            accounts: buckets.len(),
            transactions,
            splits,
            skipped: 0,
            warnings,
        })
    }
}

/// `category` or `category/class`.
fn category_line(category: &str, class_name: &str) -> String {
    if class_name.is_empty() {
        category.to_string()
    } else {
        format!("{category}/{class_name}")
    }
}

fn write_account<W: Write + ?Sized>(
    out: &mut W,
    bucket: &AccountBucket<QifAccount, QifTransaction>,
    account_type: AccountType,
) -> io::Result<()> {
    let account = &bucket.account;
    write!(out, "!Account\nN{}\nD{}\n^\n", account.name, account.description)?;
    writeln!(out, "!Type:{}", account_type.qif_type())?;

    for transaction in &bucket.transactions {
        writeln!(out, "D{}", transaction.date)?;
        writeln!(out, "T{}", transaction.amount)?;
        if let Some(number) = &transaction.number {
            writeln!(out, "N{number}")?;
        }
        writeln!(out, "P{}", transaction.payee)?;
        writeln!(out, "M{}", transaction.memo)?;
        writeln!(out, "L{}", category_line(&transaction.category, &transaction.class_name))?;
        for split in &transaction.splits {
            writeln!(out, "S{}", category_line(&split.category, &split.class_name))?;
            writeln!(out, "E{}", split.memo)?;
            writeln!(out, "${}", split.amount)?;
        }
        writeln!(out, "^")?;
    }
    Ok(())
}
