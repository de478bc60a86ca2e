//! Process-local transactional storage.
//!
//! Tables are ordered maps of id -> record. A transactional scope is owned
//! by the thread that opened it; operations from other threads block until
//! the scope commits or rolls back, which serializes storage access across
//! threads. Nested scopes on the owning thread join the outermost one.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use indexmap::IndexMap;
use serde_json::Value;

use corebank_api::{BankingError, BankingResult};
use corebank_db::{Record, StorageInterface};

#[derive(Default)]
struct TxnState {
    owner: Option<ThreadId>,
    depth: usize,
    /// First-touch originals for every row written in the scope.
    /// `None` means the row did not exist before the scope.
    undo: HashMap<(String, String), Option<Record>>,
    rolled_back: bool,
}

#[derive(Default)]
struct State {
    tables: IndexMap<String, IndexMap<String, Record>>,
    txn: Option<TxnState>,
}

#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
    txn_released: Condvar,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the state, waiting out transactional scopes owned by other
    /// threads.
    fn guard(&self) -> BankingResult<MutexGuard<'_, State>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BankingError::StorageFailure("storage mutex poisoned".to_string()))?;
        loop {
            let blocked = matches!(
                &state.txn,
                Some(txn) if txn.owner != Some(thread::current().id())
            );
            if !blocked {
                return Ok(state);
            }
            state = self
                .txn_released
                .wait(state)
                .map_err(|_| BankingError::StorageFailure("storage mutex poisoned".to_string()))?;
        }
    }

    fn remember_original(state: &mut State, table: &str, id: &str) {
        let State { tables, txn } = state;
        if let Some(txn) = txn {
            let key = (table.to_string(), id.to_string());
            if !txn.undo.contains_key(&key) {
                let original = tables.get(table).and_then(|rows| rows.get(id)).cloned();
                txn.undo.insert(key, original);
            }
        }
    }

    fn restore(state: &mut State, undo: HashMap<(String, String), Option<Record>>) {
        for ((table, id), original) in undo {
            let rows = state.tables.entry(table).or_default();
            match original {
                Some(record) => {
                    rows.insert(id, record);
                }
                None => {
                    rows.shift_remove(&id);
                }
            }
        }
    }

    fn matches_filter(record: &Record, filter: &[(&str, Value)]) -> bool {
        filter
            .iter()
            .all(|(field, value)| record.get(*field) == Some(value))
    }
}

impl StorageInterface for MemoryStorage {
    fn save(&self, table: &str, id: &str, record: Record) -> BankingResult<()> {
        let mut state = self.guard()?;
        Self::remember_original(&mut state, table, id);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(id.to_string(), record);
        Ok(())
    }

    fn load(&self, table: &str, id: &str) -> BankingResult<Option<Record>> {
        let state = self.guard()?;
        Ok(state
            .tables
            .get(table)
            .and_then(|rows| rows.get(id))
            .cloned())
    }

    fn load_all(&self, table: &str) -> BankingResult<Vec<Record>> {
        let state = self.guard()?;
        Ok(state
            .tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    fn find(&self, table: &str, filter: &[(&str, Value)]) -> BankingResult<Vec<Record>> {
        let state = self.guard()?;
        Ok(state
            .tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|record| Self::matches_filter(record, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn delete(&self, table: &str, id: &str) -> BankingResult<bool> {
        let mut state = self.guard()?;
        Self::remember_original(&mut state, table, id);
        Ok(state
            .tables
            .get_mut(table)
            .map(|rows| rows.shift_remove(id).is_some())
            .unwrap_or(false))
    }

    fn exists(&self, table: &str, id: &str) -> BankingResult<bool> {
        let state = self.guard()?;
        Ok(state
            .tables
            .get(table)
            .map(|rows| rows.contains_key(id))
            .unwrap_or(false))
    }

    fn count(&self, table: &str) -> BankingResult<usize> {
        let state = self.guard()?;
        Ok(state.tables.get(table).map(|rows| rows.len()).unwrap_or(0))
    }

    fn clear_table(&self, table: &str) -> BankingResult<()> {
        let mut state = self.guard()?;
        let ids: Vec<String> = state
            .tables
            .get(table)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default();
        for id in ids {
            Self::remember_original(&mut state, table, &id);
        }
        if let Some(rows) = state.tables.get_mut(table) {
            rows.clear();
        }
        Ok(())
    }

    fn begin(&self) -> BankingResult<()> {
        let mut state = self.guard()?;
        match &mut state.txn {
            Some(txn) => {
                // Same thread re-entering: join the outermost scope.
                txn.depth += 1;
            }
            None => {
                state.txn = Some(TxnState {
                    owner: Some(thread::current().id()),
                    depth: 1,
                    undo: HashMap::new(),
                    rolled_back: false,
                });
            }
        }
        Ok(())
    }

    fn commit(&self) -> BankingResult<()> {
        let mut state = self.guard()?;
        let txn = state.txn.as_mut().ok_or_else(|| {
            BankingError::StorageFailure("commit without an open transaction".to_string())
        })?;
        txn.depth -= 1;
        if txn.depth > 0 {
            return Ok(());
        }

        let Some(txn) = state.txn.take() else {
            return Err(BankingError::StorageFailure(
                "commit without an open transaction".to_string(),
            ));
        };
        if txn.rolled_back {
            // An inner scope already rolled back; the joined scope cannot
            // commit partially.
            Self::restore(&mut state, txn.undo);
            self.txn_released.notify_all();
            return Err(BankingError::StorageFailure(
                "transaction was rolled back by an inner scope".to_string(),
            ));
        }
        tracing::trace!(writes = txn.undo.len(), "storage transaction committed");
        self.txn_released.notify_all();
        Ok(())
    }

    fn rollback(&self) -> BankingResult<()> {
        let mut state = self.guard()?;
        let txn = state.txn.as_mut().ok_or_else(|| {
            BankingError::StorageFailure("rollback without an open transaction".to_string())
        })?;
        txn.rolled_back = true;
        txn.depth -= 1;
        if txn.depth > 0 {
            return Ok(());
        }

        let Some(txn) = state.txn.take() else {
            return Err(BankingError::StorageFailure(
                "rollback without an open transaction".to_string(),
            ));
        };
        let writes = txn.undo.len();
        Self::restore(&mut state, txn.undo);
        tracing::trace!(writes, "storage transaction rolled back");
        self.txn_released.notify_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebank_db::StorageExt;
    use serde_json::json;

    fn record(fields: &[(&str, Value)]) -> Record {
        fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn save_load_delete_roundtrip() {
        let storage = MemoryStorage::new();
        let row = record(&[("id", json!("a1")), ("name", json!("checking"))]);

        storage.save("accounts", "a1", row.clone()).unwrap();
        assert_eq!(storage.load("accounts", "a1").unwrap(), Some(row));
        assert!(storage.exists("accounts", "a1").unwrap());
        assert_eq!(storage.count("accounts").unwrap(), 1);

        assert!(storage.delete("accounts", "a1").unwrap());
        assert!(!storage.delete("accounts", "a1").unwrap());
        assert_eq!(storage.load("accounts", "a1").unwrap(), None);
    }

    #[test]
    fn find_matches_all_filter_fields() {
        let storage = MemoryStorage::new();
        storage
            .save(
                "transactions",
                "t1",
                record(&[("state", json!("pending")), ("channel", json!("online"))]),
            )
            .unwrap();
        storage
            .save(
                "transactions",
                "t2",
                record(&[("state", json!("pending")), ("channel", json!("system"))]),
            )
            .unwrap();

        let pending = storage
            .find("transactions", &[("state", json!("pending"))])
            .unwrap();
        assert_eq!(pending.len(), 2);

        let online = storage
            .find(
                "transactions",
                &[("state", json!("pending")), ("channel", json!("online"))],
            )
            .unwrap();
        assert_eq!(online.len(), 1);
    }

    #[test]
    fn rollback_restores_previous_contents() {
        let storage = MemoryStorage::new();
        storage
            .save("accounts", "a1", record(&[("balance", json!("100"))]))
            .unwrap();

        let result: BankingResult<()> = storage.atomic(|| {
            storage
                .save("accounts", "a1", record(&[("balance", json!("50"))]))?;
            storage
                .save("accounts", "a2", record(&[("balance", json!("10"))]))?;
            storage.delete("accounts", "a1")?;
            Err(BankingError::StorageFailure("boom".to_string()))
        });
        assert!(result.is_err());

        // a1 restored with its original value, a2 gone again
        let a1 = storage.load("accounts", "a1").unwrap().unwrap();
        assert_eq!(a1.get("balance"), Some(&json!("100")));
        assert_eq!(storage.load("accounts", "a2").unwrap(), None);
    }

    #[test]
    fn commit_keeps_writes() {
        let storage = MemoryStorage::new();
        storage
            .atomic(|| storage.save("accounts", "a1", record(&[("x", json!(1))])))
            .unwrap();
        assert!(storage.exists("accounts", "a1").unwrap());
    }

    #[test]
    fn nested_scopes_join_the_outermost() {
        let storage = MemoryStorage::new();

        let result: BankingResult<()> = storage.atomic(|| {
            storage.save("t", "outer", record(&[("v", json!(1))]))?;
            // Inner scope commits, but its writes only survive with the
            // outer scope.
            storage.atomic(|| storage.save("t", "inner", record(&[("v", json!(2))])))?;
            Err(BankingError::StorageFailure("outer fails".to_string()))
        });
        assert!(result.is_err());
        assert!(!storage.exists("t", "outer").unwrap());
        assert!(!storage.exists("t", "inner").unwrap());
    }

    #[test]
    fn clear_table_is_transactional() {
        let storage = MemoryStorage::new();
        storage.save("t", "a", record(&[("v", json!(1))])).unwrap();
        storage.save("t", "b", record(&[("v", json!(2))])).unwrap();

        let result: BankingResult<()> = storage.atomic(|| {
            storage.clear_table("t")?;
            Err(BankingError::StorageFailure("abort".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(storage.count("t").unwrap(), 2);
    }

    #[test]
    fn writers_on_other_threads_wait_for_the_scope() {
        use std::sync::Arc;

        let storage = Arc::new(MemoryStorage::new());
        let contender = Arc::clone(&storage);

        storage
            .atomic(|| {
                storage.save("t", "a", record(&[("from", json!("owner"))]))?;
                let handle = std::thread::spawn(move || {
                    contender
                        .save("t", "a", record(&[("from", json!("contender"))]))
                        .unwrap();
                });
                // The contender blocks until this scope commits, so the
                // owner's write is still visible here.
                std::thread::sleep(std::time::Duration::from_millis(20));
                let row = storage.load("t", "a")?.unwrap();
                assert_eq!(row.get("from"), Some(&json!("owner")));
                storage.save("t", "handle", record(&[("v", json!(0))]))?;
                drop(handle);
                Ok(())
            })
            .unwrap();

        // After commit the contender gets through eventually.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
        loop {
            let row = storage.load("t", "a").unwrap().unwrap();
            if row.get("from") == Some(&json!("contender")) {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "contender never ran");
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }
}
