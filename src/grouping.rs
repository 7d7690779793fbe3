use std::collections::HashMap;

use crate::types::ExportWarning;

/// Account-level values that every row repeats.
pub trait AccountInfo: Sized {
    /// Reconciles the values seen on a later row of the same account.
    fn reassert(&mut self, key: &str, row: usize, seen: Self) -> Option<ExportWarning>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountBucket<A, R> {
    /// Composite key the rows were grouped by.
    pub key: String,
    pub account: A,
    /// In source row order.
    pub transactions: Vec<R>,
}

/// Position of a record inside the grouper, `(bucket, transaction)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLocation {
    pub bucket: usize,
    pub transaction: usize,
}

/// Partitions transactions into per-account buckets, first-seen order.
#[derive(Debug)]
pub struct AccountGrouper<A, R> {
    buckets: Vec<AccountBucket<A, R>>,
    index: HashMap<String, usize>,
    warnings: Vec<ExportWarning>,
}

impl<A: AccountInfo, R> Default for AccountGrouper<A, R> {
    fn default() -> Self {
        AccountGrouper {
            buckets: Vec::new(),
            index: HashMap::new(),
            warnings: Vec::new(),
        }
    }
}

impl<A: AccountInfo, R> AccountGrouper<A, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: String, row: usize, account: A, record: R) -> RecordLocation {
        let bucket = match self.index.get(&key) {
            Some(&bucket) => {
                if let Some(warning) = self.buckets[bucket].account.reassert(&key, row, account) {
                    tracing::warn!(?warning, "inconsistent account data, keeping first value");
                    self.warnings.push(warning);
                }
                bucket
            }
            None => {
                self.index.insert(key.clone(), self.buckets.len());
                self.buckets.push(AccountBucket {
                    key,
                    account,
                    transactions: Vec::new(),
                });
                self.buckets.len() - 1
            }
        };

        let transactions = &mut self.buckets[bucket].transactions;
        transactions.push(record);
        RecordLocation {
            bucket,
            transaction: transactions.len() - 1,
        }
    }

    pub fn get_mut(&mut self, location: RecordLocation) -> Option<&mut R> {
        self.buckets
            .get_mut(location.bucket)
            .and_then(|b| b.transactions.get_mut(location.transaction))
    }

    pub fn transaction_count(&self) -> usize {
        self.buckets.iter().map(|b| b.transactions.len()).sum()
    }

    pub fn into_parts(self) -> (Vec<AccountBucket<A, R>>, Vec<ExportWarning>) {
        (self.buckets, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Currency(String);

    impl AccountInfo for Currency {
        fn reassert(&mut self, key: &str, row: usize, seen: Self) -> Option<ExportWarning> {
            (self.0 != seen.0).then(|| ExportWarning::CurrencyMismatch {
                account: key.to_string(),
                row,
                expected: self.0.clone(),
                found: seen.0,
            })
        }
    }

    fn usd() -> Currency {
        Currency("USD".to_string())
    }

    #[test]
    fn test_buckets_keep_first_seen_and_row_order() {
        let mut grouper = AccountGrouper::new();
        grouper.push("b".to_string(), 0, usd(), 0);
        grouper.push("a".to_string(), 1, usd(), 1);
        grouper.push("b".to_string(), 2, usd(), 2);
        grouper.push("a".to_string(), 3, usd(), 3);
        grouper.push("b".to_string(), 4, usd(), 4);

        assert_eq!(grouper.transaction_count(), 5);
        let (buckets, warnings) = grouper.into_parts();
        assert!(warnings.is_empty());
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key, "b");
        assert_eq!(buckets[0].transactions, vec![0, 2, 4]);
        assert_eq!(buckets[1].key, "a");
        assert_eq!(buckets[1].transactions, vec![1, 3]);
    }

    #[test]
    fn test_reassert_warning_is_collected() {
        let mut grouper = AccountGrouper::new();
        grouper.push("acct".to_string(), 0, usd(), ());
        grouper.push("acct".to_string(), 1, Currency("EUR".to_string()), ());

        let (buckets, warnings) = grouper.into_parts();
        assert_eq!(buckets[0].account, usd());
        assert_eq!(
            warnings,
            vec![ExportWarning::CurrencyMismatch {
                account: "acct".to_string(),
                row: 1,
                expected: "USD".to_string(),
                found: "EUR".to_string(),
            }]
        );
    }

    #[test]
    fn test_location_points_at_pushed_record() {
        let mut grouper = AccountGrouper::new();
        grouper.push("x".to_string(), 0, usd(), vec!["parent-x"]);
        let location = grouper.push("y".to_string(), 1, usd(), vec!["parent-y"]);

        grouper.get_mut(location).unwrap().push("split");

        let (buckets, _) = grouper.into_parts();
        assert_eq!(buckets[1].transactions[0], vec!["parent-y", "split"]);
        assert_eq!(buckets[0].transactions[0], vec!["parent-x"]);
    }
}
