//! In-memory ledger; rows live only as long as the process

use async_trait::async_trait;
use feed_relay_domain::{Ledger, LedgerError, PublishRecord};
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

/// In-memory ledger implementation
#[derive(Default)]
pub struct InMemoryLedger {
    rows: RwLock<HashSet<(String, String)>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn is_published(&self, entry_id: &str, destination: &str) -> Result<bool, LedgerError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        Ok(rows.contains(&(entry_id.to_string(), destination.to_string())))
    }

    async fn record_published(&self, record: &PublishRecord) -> Result<(), LedgerError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        rows.insert((record.entry_id.clone(), record.destination.clone()));
        Ok(())
    }

    async fn counts_by_destination(&self) -> Result<Vec<(String, u64)>, LedgerError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        let mut counts = BTreeMap::new();
        for (_, destination) in rows.iter() {
            *counts.entry(destination.clone()).or_insert(0u64) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pairs_are_independent() {
        let ledger = InMemoryLedger::new();
        ledger
            .record_published(&PublishRecord::new("entry", "one"))
            .await
            .unwrap();

        assert!(ledger.is_published("entry", "one").await.unwrap());
        assert!(!ledger.is_published("entry", "two").await.unwrap());
        assert_eq!(
            ledger.counts_by_destination().await.unwrap(),
            vec![("one".to_string(), 1)]
        );
    }
}
