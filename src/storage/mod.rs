//! Persistence: two opaque JSON blobs under fixed keys, the last-ingested
//! batch (overwritten wholesale per ingestion) and the daily net-worth
//! history. The backend is injected so everything above it can run against
//! an in-memory store in tests.
//!
//! Reads never fail: a corrupt or unreadable blob is logged and treated as
//! absent. Only writes surface errors.

use crate::error::StoreError;
use crate::models::{PortfolioBatch, PortfolioHistoryItem, PortfolioSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

pub const BATCH_KEY: &str = "portfolio_batch";
pub const HISTORY_KEY: &str = "portfolio_history";

// ── Backends ──────────────────────────────────────────────────────────────────

/// Minimal key-value surface the repository needs.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One file per key under the data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryStore {
    cells: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cells.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.cells.lock().unwrap().insert(key.into(), value.into());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.cells.lock().unwrap().remove(key);
        Ok(())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct Repository<S> {
    store: S,
}

impl Repository<FileStore> {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(FileStore::open(dir)?))
    }
}

impl<S: KvStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read {:?}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Corrupt blob under {:?}, treating as absent: {}", key, e);
                None
            }
        }
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.store.set(key, &serde_json::to_string(value)?)
    }

    // ── Ingested batch ────────────────────────────────────────────────────────

    /// None when nothing has been ingested yet (or the blob is corrupt).
    pub fn load_batch(&self) -> Option<PortfolioBatch> {
        self.read_json(BATCH_KEY)
    }

    pub fn save_batch(&self, batch: &PortfolioBatch) -> Result<(), StoreError> {
        self.write_json(BATCH_KEY, batch)
    }

    pub fn clear_batch(&self) -> Result<(), StoreError> {
        self.store.remove(BATCH_KEY)
    }

    // ── Net-worth history ─────────────────────────────────────────────────────

    pub fn history(&self) -> Vec<PortfolioHistoryItem> {
        self.read_json(HISTORY_KEY).unwrap_or_default()
    }

    /// Append a snapshot for today, replacing any existing entry on the same
    /// UTC calendar day, and return the re-sorted list.
    pub fn save_snapshot(
        &self,
        summary: &PortfolioSummary,
    ) -> Result<Vec<PortfolioHistoryItem>, StoreError> {
        self.save_snapshot_at(summary, Utc::now())
    }

    pub fn save_snapshot_at(
        &self,
        summary: &PortfolioSummary,
        now: DateTime<Utc>,
    ) -> Result<Vec<PortfolioHistoryItem>, StoreError> {
        let today = now.date_naive();
        let mut history = self.history();
        history.retain(|item| item.date.date_naive() != today);

        history.push(PortfolioHistoryItem {
            id: format!("snap-{}", now.timestamp_millis()),
            date: now,
            net_worth: summary.net_worth,
            total_assets: summary.total_assets_value,
            total_liabilities: summary.total_liabilities_value,
            total_income: summary.total_income,
        });
        history.sort_by_key(|item| item.date);

        self.write_json(HISTORY_KEY, &history)?;
        Ok(history)
    }

    pub fn clear_history(&self) -> Result<(), StoreError> {
        self.store.remove(HISTORY_KEY)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(net_worth: f64) -> PortfolioSummary {
        PortfolioSummary {
            net_worth,
            total_assets_value: net_worth + 100.0,
            total_liabilities_value: 100.0,
            total_profit: 0.0,
            profit_percentage: 0.0,
            total_income: 5.0,
            projected_monthly_passive_income: 0.0,
            asset_allocation: vec![],
            top_performer: None,
            worst_performer: None,
        }
    }

    #[test]
    fn test_same_day_snapshot_replaces() {
        let repo = Repository::new(MemoryStore::default());
        let morning = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 6, 1, 21, 0, 0).unwrap();

        repo.save_snapshot_at(&summary(1000.0), morning).unwrap();
        let history = repo.save_snapshot_at(&summary(2000.0), evening).unwrap();

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].net_worth, 2000.0);
        assert_eq!(history[0].total_income, 5.0);
    }

    #[test]
    fn test_snapshots_across_days_sort_ascending() {
        let repo = Repository::new(MemoryStore::default());
        // saved out of order on purpose
        for (y, m, d, worth) in [
            (2024, 6, 3, 3.0),
            (2024, 6, 1, 1.0),
            (2024, 6, 2, 2.0),
        ] {
            let at = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
            repo.save_snapshot_at(&summary(worth), at).unwrap();
        }

        let history = repo.history();
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(history[0].net_worth, 1.0);
        assert_eq!(history[2].net_worth, 3.0);
    }

    #[test]
    fn test_corrupt_blob_reads_as_absent() {
        let store = MemoryStore::default();
        store.set(HISTORY_KEY, "{not json").unwrap();
        store.set(BATCH_KEY, "[1,2,3]").unwrap();
        let repo = Repository::new(store);

        assert!(repo.history().is_empty());
        assert!(repo.load_batch().is_none());
    }

    #[test]
    fn test_clear_history() {
        let repo = Repository::new(MemoryStore::default());
        repo.save_snapshot(&summary(10.0)).unwrap();
        assert_eq!(repo.history().len(), 1);
        repo.clear_history().unwrap();
        assert!(repo.history().is_empty());
    }

    #[test]
    fn test_batch_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::open(dir.path()).unwrap();

        assert!(repo.load_batch().is_none());
        let batch = PortfolioBatch::default();
        repo.save_batch(&batch).unwrap();
        assert_eq!(repo.load_batch().unwrap(), batch);

        repo.clear_batch().unwrap();
        assert!(repo.load_batch().is_none());
        // clearing twice is fine
        repo.clear_batch().unwrap();
    }
}
