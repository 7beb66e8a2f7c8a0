//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

//! The commit journal: a bounded ring of past transactions, grounded on the
//! teacher's `northbound::db` rollback log (`transaction_record` /
//! `transaction_get` / `transaction_get_all`) but capped rather than kept
//! as a full history (see DESIGN.md).

use std::path::Path;

use chrono::{DateTime, Utc};
use derive_new::new;
use pickledb::{PickleDb, PickleDbDumpPolicy, SerializationMethod};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::Error;

/// Oldest entries are evicted once the journal holds this many transactions.
pub const RING_CAPACITY: usize = 100;

const NEXT_ID_KEY: &str = "next_id";
const TRANSACTION_PREFIX: &str = "transaction";

/// A single committed change, as recorded in the journal.
#[derive(Clone, Debug, new, Deserialize, Serialize)]
pub struct Transaction {
    #[new(default)]
    pub id: u32,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub comment: String,
    /// The post-commit running configuration, marshaled to the internal
    /// encoding (spec §4.H step 7 "append a journal entry").
    pub configuration: String,
}

pub struct Journal {
    db: PickleDb,
}

impl Journal {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let db = if path.exists() {
            PickleDb::load(path, PickleDbDumpPolicy::AutoDump, SerializationMethod::Json)?
        } else {
            PickleDb::new(path, PickleDbDumpPolicy::AutoDump, SerializationMethod::Json)
        };
        Ok(Journal { db })
    }

    /// Appends `transaction`, assigning it the next id and evicting the
    /// oldest entry once the ring is full.
    pub fn record(&mut self, comment: String, configuration: String, date: DateTime<Utc>) -> Result<u32, Error> {
        let mut transaction = Transaction::new(date, comment, configuration);
        transaction.id = self.next_id();
        self.db.set(&key_for(transaction.id), &transaction)?;
        self.evict_oldest_past_capacity()?;
        Ok(transaction.id)
    }

    pub fn get(&self, id: u32) -> Option<Transaction> {
        self.db.get(&key_for(id))
    }

    /// All retained transactions, oldest first.
    pub fn list(&self) -> Vec<Transaction> {
        let mut entries: Vec<Transaction> = self
            .db
            .iter()
            .filter(|entry| entry.get_key().starts_with(TRANSACTION_PREFIX))
            .filter_map(|entry| entry.get_value::<Transaction>())
            .collect();
        entries.sort_by_key(|t| t.id);
        entries
    }

    fn next_id(&mut self) -> u32 {
        let next_id = self.db.get::<u32>(NEXT_ID_KEY).unwrap_or(0) + 1;
        if let Err(e) = self.db.set(NEXT_ID_KEY, &next_id) {
            error!(error = %e, "failed to advance the journal's next transaction id");
        }
        next_id
    }

    fn evict_oldest_past_capacity(&mut self) -> Result<(), Error> {
        let entries = self.list();
        if entries.len() <= RING_CAPACITY {
            return Ok(());
        }
        for stale in &entries[..entries.len() - RING_CAPACITY] {
            self.db.rem(&key_for(stale.id))?;
        }
        Ok(())
    }
}

fn key_for(id: u32) -> String {
    format!("{TRANSACTION_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    fn tmp_path(tag: &str) -> std::path::PathBuf {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("confd-commit-journal-{tag}-{}-{n}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn record_assigns_increasing_ids_and_list_returns_them_in_order() {
        let path = tmp_path("order");
        let mut journal = Journal::open(&path).unwrap();
        let a = journal.record("first".into(), "{}".into(), Utc::now()).unwrap();
        let b = journal.record("second".into(), "{}".into(), Utc::now()).unwrap();
        assert_eq!((a, b), (1, 2));

        let entries = journal.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].comment, "first");
        assert_eq!(entries[1].comment, "second");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn ring_evicts_oldest_entry_past_capacity() {
        let path = tmp_path("ring");
        let mut journal = Journal::open(&path).unwrap();
        for i in 0..RING_CAPACITY + 5 {
            journal.record(format!("change {i}"), "{}".into(), Utc::now()).unwrap();
        }
        let entries = journal.list();
        assert_eq!(entries.len(), RING_CAPACITY);
        assert_eq!(entries[0].comment, "change 5");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn get_returns_none_for_an_unknown_id() {
        let path = tmp_path("missing");
        let journal = Journal::open(&path).unwrap();
        assert!(journal.get(999).is_none());
        let _ = std::fs::remove_file(&path);
    }
}
