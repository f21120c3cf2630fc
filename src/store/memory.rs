use async_trait::async_trait;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use super::AttendanceStore;
use crate::config::StorageBackend;
use crate::error::{AttendanceError, Result};
use crate::model::attendance::{
    AttendanceRecord, AttendanceStats, NewAttendance, Status, timestamp_now,
};

/// Process-local store. Nothing survives a restart.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

struct Inner {
    records: BTreeMap<i64, AttendanceRecord>,
    next_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn collect<F>(&self, keep: F) -> Result<Vec<AttendanceRecord>>
    where
        F: Fn(&AttendanceRecord) -> bool,
    {
        let inner = self.inner.read().map_err(|_| AttendanceError::Poisoned)?;
        Ok(inner.records.values().filter(|r| keep(r)).cloned().collect())
    }
}

fn newest_first(a: &AttendanceRecord, b: &AttendanceRecord) -> Ordering {
    b.date.cmp(&a.date).then(b.id.cmp(&a.id))
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn create(&self, new: NewAttendance) -> Result<AttendanceRecord> {
        let entry = new.validate()?;

        let mut inner = self.inner.write().map_err(|_| AttendanceError::Poisoned)?;
        let id = inner.next_id;
        inner.next_id += 1;

        let record = entry.into_record(id, timestamp_now());
        inner.records.insert(id, record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<AttendanceRecord>> {
        let mut records = self.collect(|_| true)?;
        records.sort_by(newest_first);
        Ok(records)
    }

    async fn get_by_id(&self, id: i64) -> Result<AttendanceRecord> {
        let inner = self.inner.read().map_err(|_| AttendanceError::Poisoned)?;
        inner
            .records
            .get(&id)
            .cloned()
            .ok_or(AttendanceError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut inner = self.inner.write().map_err(|_| AttendanceError::Poisoned)?;
        Ok(inner.records.remove(&id).is_some())
    }

    async fn search(&self, query: &str) -> Result<Vec<AttendanceRecord>> {
        let needle = query.to_lowercase();
        let mut records = self.collect(|r| r.matches_lowercase(&needle))?;
        records.sort_by(newest_first);
        Ok(records)
    }

    async fn filter_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        // BTreeMap iterates ids ascending
        let mut records = self.collect(|r| r.date == date)?;
        records.reverse();
        Ok(records)
    }

    async fn stats(&self) -> Result<AttendanceStats> {
        let inner = self.inner.read().map_err(|_| AttendanceError::Poisoned)?;

        let mut stats = AttendanceStats::default();
        let mut employees = HashSet::new();
        for record in inner.records.values() {
            stats.total_records += 1;
            employees.insert(record.employee_id.as_str());
            match record.status {
                Status::Present => stats.present_count += 1,
                Status::Absent => stats.absent_count += 1,
            }
        }
        stats.total_employees = employees.len() as i64;

        Ok(stats)
    }

    async fn ping(&self) -> Result<()> {
        self.inner
            .read()
            .map(|_| ())
            .map_err(|_| AttendanceError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;
    use std::sync::Arc;
    use std::thread;

    #[actix_web::test]
    async fn create_then_get_returns_same_record() {
        conformance::create_then_get_returns_same_record(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn invalid_create_adds_nothing() {
        conformance::invalid_create_adds_nothing(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn get_missing_is_not_found() {
        conformance::get_missing_is_not_found(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn delete_twice_reports_not_found() {
        conformance::delete_twice_reports_not_found(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn ids_are_never_reused() {
        conformance::ids_are_never_reused(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn list_orders_by_date_then_id_descending() {
        conformance::list_orders_by_date_then_id_descending(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn search_matches_name_or_id_case_insensitively() {
        conformance::search_matches_name_or_id_case_insensitively(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn search_folds_non_ascii_case() {
        conformance::search_folds_non_ascii_case(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn filter_returns_exact_date_only() {
        conformance::filter_returns_exact_date_only(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn two_employee_scenario() {
        conformance::two_employee_scenario(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn duplicate_employee_day_is_allowed() {
        conformance::duplicate_employee_day_is_allowed(&MemoryStore::new()).await;
    }

    #[actix_web::test]
    async fn employee_ids_differing_in_case_are_distinct() {
        conformance::employee_ids_differing_in_case_are_distinct(&MemoryStore::new()).await;
    }

    #[test]
    fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..25)
                        .map(|n| {
                            let payload = NewAttendance::new(
                                format!("Worker {worker}"),
                                format!("W{worker}-{n}"),
                                "2024-01-01",
                                "Present",
                            );
                            futures::executor::block_on(store.create(payload))
                                .unwrap()
                                .id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 200);
        assert_eq!(ids.first(), Some(&1));
        assert_eq!(ids.last(), Some(&200));
    }
}
