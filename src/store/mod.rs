// src/store/mod.rs
pub mod postgrest;

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::ingest::types::{RecordKey, ResultRecord};

/// Persistent home of the results. Both calls are single batched operations.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Delete every record whose draw date is strictly before `threshold`.
    /// Returns the number of deleted rows when the backend reports it.
    async fn delete_older_than(&self, threshold: NaiveDate) -> Result<u64>;

    /// Insert or overwrite `records`, keyed by (source, draw time, position, draw date).
    async fn upsert(&self, records: &[ResultRecord]) -> Result<()>;
}

/// Keep one record per key, the last one seen, in first-seen key order.
pub fn collapse_by_key(records: &[ResultRecord]) -> Vec<ResultRecord> {
    let mut slot: HashMap<RecordKey, usize> = HashMap::new();
    let mut out: Vec<ResultRecord> = Vec::with_capacity(records.len());
    for r in records {
        match slot.get(&r.key()) {
            Some(&i) => out[i] = r.clone(),
            None => {
                slot.insert(r.key(), out.len());
                out.push(r.clone());
            }
        }
    }
    out
}

/// In-memory store with the same key semantics as the database table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: std::sync::Mutex<BTreeMap<RecordKey, ResultRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ResultRecord>) -> Self {
        let rows = records.into_iter().map(|r| (r.key(), r)).collect();
        Self {
            rows: std::sync::Mutex::new(rows),
        }
    }

    /// All stored rows, ordered by key.
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        let rows = self.rows.lock().expect("memory store mutex poisoned");
        rows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("memory store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ResultStore for MemoryStore {
    async fn delete_older_than(&self, threshold: NaiveDate) -> Result<u64> {
        let mut rows = self.rows.lock().expect("memory store mutex poisoned");
        let before = rows.len();
        rows.retain(|_, r| r.draw_date >= threshold);
        Ok((before - rows.len()) as u64)
    }

    async fn upsert(&self, records: &[ResultRecord]) -> Result<()> {
        let mut rows = self.rows.lock().expect("memory store mutex poisoned");
        for r in records {
            rows.insert(r.key(), r.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pos: &str, number: &str, date: NaiveDate) -> ResultRecord {
        ResultRecord {
            source: "LOOK".into(),
            draw_time: "14:00".into(),
            position: pos.into(),
            number: number.into(),
            group: 1,
            label: "Avestruz".into(),
            draw_date: date,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn collapse_keeps_last_value_per_key() {
        let batch = vec![rec("1º", "1111", d(1)), rec("2º", "2222", d(1)), rec("1º", "3333", d(1))];
        let out = collapse_by_key(&batch);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].number, "3333");
        assert_eq!(out[1].number, "2222");
    }

    #[tokio::test]
    async fn upsert_overwrites_same_key() {
        let store = MemoryStore::new();
        store.upsert(&[rec("1º", "1111", d(1))]).await.unwrap();
        store.upsert(&[rec("1º", "9999", d(1)), rec("1º", "1111", d(2))]).await.unwrap();
        let rows = store.snapshot();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, "9999");
    }

    #[tokio::test]
    async fn delete_is_strictly_before_threshold() {
        let store = MemoryStore::with_records(vec![rec("1º", "1", d(1)), rec("1º", "2", d(2)), rec("1º", "3", d(3))]);
        let deleted = store.delete_older_than(d(2)).await.unwrap();
        assert_eq!(deleted, 1);
        let dates: Vec<_> = store.snapshot().iter().map(|r| r.draw_date).collect();
        assert_eq!(dates, vec![d(2), d(3)]);
    }
}
