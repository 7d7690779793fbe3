use std::{fmt::Display, io::Write};

use super::dto::{OfxAccount, OfxTransaction, extract_row};
use crate::{
    context::{DateRange, ExportContext},
    errors::ExportResult,
    exporters::traits::Exporter,
    grouping::{AccountBucket, AccountGrouper},
    mapping::{MappingProfile, OfxFieldMap, SKIP_KEY},
    table::TabularSource,
    types::{AccountType, DocumentStamp, ExportOptions, ExportSummary},
};

const INDENT: usize = 2;

pub struct OfxExporter;

type Statements = AccountGrouper<OfxAccount, OfxTransaction>;

impl OfxExporter {
    /// Groups every non-skipped row into its `bankId-acctId` statement.
    fn group<S>(
        ctx: &ExportContext<'_, S>,
        fields: &OfxFieldMap,
    ) -> ExportResult<(Statements, usize)>
    where
        S: TabularSource + ?Sized,
    {
        let mut statements = Statements::new();
        let mut skipped = 0;

        for row in 0..ctx.row_count() {
            if ctx.is_excluded(row)? {
                skipped += 1;
                continue;
            }
            let (account, transaction) = extract_row(ctx, fields, row)?;
            statements.push(account.key(), row, account, transaction);
        }

        Ok((statements, skipped))
    }
}

impl Exporter for OfxExporter {
    const EXTENSION: &'static str = "ofx";

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
        let fields = profile.ofx_fields()?;
        let account_type = options.account_type_for(profile.account_type);
        let ctx = ExportContext::new(table, profile, SKIP_KEY, &fields.skip);

        let range = ctx.date_range()?;
        let (statements, skipped) = Self::group(&ctx, fields)?;
        let transactions = statements.transaction_count();
        let (buckets, warnings) = statements.into_parts();

        let stamp = options.stamp();
        let mut writer = OfxWriter::new(out);
        writer.document_header(&stamp)?;
        for bucket in &buckets {
            writer.statement(bucket, account_type, &range, &stamp)?;
        }
        writer.finish()?;

        tracing::debug!(
            profile = %profile.name,
            accounts = buckets.len(),
            transactions,
            skipped,
            "wrote OFX document"
        );

        Ok(ExportSummary {
            accounts: buckets.len(),
            transactions,
            splits: 0,
            skipped,
            warnings,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Init,
    HeaderWritten,
    AccountHeaderWritten,
    TransactionsWritten,
    AccountFooterWritten,
    DocumentClosed,
}

/// Streams one OFX document. Every statement shares the document header's
/// `TRNUID` and server date.
struct OfxWriter<'w, W: Write + ?Sized> {
    out: &'w mut W,
    state: WriterState,
}

impl<'w, W: Write + ?Sized> OfxWriter<'w, W> {
    fn new(out: &'w mut W) -> Self {
        OfxWriter {
            out,
            state: WriterState::Init,
        }
    }

    fn open(&mut self, depth: usize, tag: &str) -> ExportResult<()> {
        writeln!(self.out, "{:width$}<{tag}>", "", width = depth * INDENT)?;
        Ok(())
    }

    fn close(&mut self, depth: usize, tag: &str) -> ExportResult<()> {
        writeln!(self.out, "{:width$}</{tag}>", "", width = depth * INDENT)?;
        Ok(())
    }

    fn element(&mut self, depth: usize, tag: &str, value: impl Display) -> ExportResult<()> {
        writeln!(self.out, "{:width$}<{tag}>{value}</{tag}>", "", width = depth * INDENT)?;
        Ok(())
    }

    fn status(&mut self, depth: usize) -> ExportResult<()> {
        self.open(depth, "STATUS")?;
        self.element(depth + 1, "CODE", 0)?;
        self.element(depth + 1, "SEVERITY", "INFO")?;
        self.close(depth, "STATUS")
    }

    fn document_header(&mut self, stamp: &DocumentStamp) -> ExportResult<()> {
        debug_assert_eq!(self.state, WriterState::Init);

        writeln!(self.out, r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#)?;
        writeln!(
            self.out,
            r#"<?OFX OFXHEADER="200" VERSION="220" SECURITY="NONE" OLDFILEUID="NONE" NEWFILEUID="NONE"?>"#
        )?;
        self.open(0, "OFX")?;
        self.open(1, "SIGNONMSGSRSV1")?;
        self.open(2, "SONRS")?;
        self.status(3)?;
        self.element(3, "DTSERVER", stamp.server_date.format("%Y%m%d"))?;
        self.element(3, "LANGUAGE", "ENG")?;
        self.close(2, "SONRS")?;
        self.close(1, "SIGNONMSGSRSV1")?;
        self.open(1, "BANKMSGSRSV1")?;
        self.open(2, "STMTTRNRS")?;
        self.element(3, "TRNUID", stamp.trn_uid)?;
        self.status(3)?;

        self.state = WriterState::HeaderWritten;
        Ok(())
    }

    fn statement(
        &mut self,
        bucket: &AccountBucket<OfxAccount, OfxTransaction>,
        account_type: AccountType,
        range: &DateRange,
        stamp: &DocumentStamp,
    ) -> ExportResult<()> {
        self.account_header(&bucket.account, account_type, range)?;
        for transaction in &bucket.transactions {
            self.transaction(transaction)?;
        }
        self.account_footer(account_type, stamp)
    }

    fn account_header(
        &mut self,
        account: &OfxAccount,
        account_type: AccountType,
        range: &DateRange,
    ) -> ExportResult<()> {
        debug_assert!(matches!(
            self.state,
            WriterState::HeaderWritten | WriterState::AccountFooterWritten
        ));

        match account_type {
            AccountType::Bank => {
                self.open(3, "STMTRS")?;
                self.element(4, "CURDEF", &account.currency)?;
                self.open(4, "BANKACCTFROM")?;
                self.element(5, "BANKID", &account.bank_id)?;
                self.element(5, "ACCTID", &account.acct_id)?;
                self.element(5, "ACCTTYPE", "CHECKING")?;
                self.close(4, "BANKACCTFROM")?;
            }
            AccountType::CreditCard => {
                self.open(3, "CCSTMTRS")?;
                self.element(4, "CURDEF", &account.currency)?;
                self.open(4, "CCACCTFROM")?;
                self.element(5, "ACCTID", &account.acct_id)?;
                self.element(5, "ACCTKEY", account.key())?;
                self.close(4, "CCACCTFROM")?;
            }
        }

        self.open(4, "BANKTRANLIST")?;
        self.element(5, "DTSTART", range.start.format("%Y%m%d"))?;
        self.element(5, "DTEND", range.end.format("%Y%m%d"))?;

        self.state = WriterState::AccountHeaderWritten;
        Ok(())
    }

    fn transaction(&mut self, transaction: &OfxTransaction) -> ExportResult<()> {
        debug_assert!(matches!(
            self.state,
            WriterState::AccountHeaderWritten | WriterState::TransactionsWritten
        ));

        self.open(5, "STMTTRN")?;
        self.element(6, "TRNTYPE", transaction.trn_type.as_str())?;
        self.element(6, "DTPOSTED", &transaction.date_posted)?;
        self.element(6, "TRNAMT", transaction.amount)?;
        self.element(6, "FITID", &transaction.fitid)?;
        if let Some(check_num) = &transaction.check_num {
            self.element(6, "CHECKNUM", check_num)?;
        }
        self.element(6, "NAME", &transaction.name)?;
        self.element(6, "MEMO", &transaction.memo)?;
        self.close(5, "STMTTRN")?;

        self.state = WriterState::TransactionsWritten;
        Ok(())
    }

    fn account_footer(
        &mut self,
        account_type: AccountType,
        stamp: &DocumentStamp,
    ) -> ExportResult<()> {
        debug_assert!(matches!(
            self.state,
            WriterState::AccountHeaderWritten | WriterState::TransactionsWritten
        ));

        self.close(4, "BANKTRANLIST")?;
        self.open(4, "LEDGERBAL")?;
        self.element(5, "BALAMT", 0)?;
        self.element(5, "DTASOF", stamp.server_date.format("%Y%m%d"))?;
        self.close(4, "LEDGERBAL")?;
        match account_type {
            AccountType::Bank => self.close(3, "STMTRS")?,
            AccountType::CreditCard => self.close(3, "CCSTMTRS")?,
        }

        self.state = WriterState::AccountFooterWritten;
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<()> {
        debug_assert!(matches!(
            self.state,
            WriterState::HeaderWritten | WriterState::AccountFooterWritten
        ));

        self.close(2, "STMTTRNRS")?;
        self.close(1, "BANKMSGSRSV1")?;
        self.close(0, "OFX")?;
        self.out.flush()?;

        self.state = WriterState::DocumentClosed;
        Ok(())
    }
}
