//! Attendance storage.
//!
//! [`AttendanceStore`] is the only way records are created, read or removed.
//! The backend is picked once from [`Config`] by [`connect`]; handlers hold an
//! `Arc<dyn AttendanceStore>` and never know which one is behind it.
//!
//! - [`memory::MemoryStore`]: process-local, lost on restart
//! - [`mysql::MySqlStore`]: `attendance` table on MySQL
//! - [`sqlite::SqliteStore`]: `attendance` table on SQLite (file or `sqlite::memory:`)
//!
//! Every backend assigns ids from one strictly increasing sequence and never
//! hands out an id again after its record is deleted.

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::db::{init_mysql, init_sqlite};
use crate::error::Result;
use crate::model::attendance::{AttendanceRecord, AttendanceStats, NewAttendance};

pub mod memory;
pub mod mysql;
pub mod sqlite;

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    fn backend(&self) -> StorageBackend;

    /// Validate and persist a record, assigning `id` and `createdAt`.
    async fn create(&self, new: NewAttendance) -> Result<AttendanceRecord>;

    /// All records, `date` descending then `id` descending.
    async fn list(&self) -> Result<Vec<AttendanceRecord>>;

    /// Fails with `NotFound` when no record has this id.
    async fn get_by_id(&self, id: i64) -> Result<AttendanceRecord>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Case-insensitive substring match on employee name or employee id,
    /// ordered like [`AttendanceStore::list`].
    async fn search(&self, query: &str) -> Result<Vec<AttendanceRecord>>;

    /// Records on exactly this date, `id` descending.
    async fn filter_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>>;

    async fn stats(&self) -> Result<AttendanceStats>;

    /// Cheap reachability check used by `/health`.
    async fn ping(&self) -> Result<()>;
}

pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn AttendanceStore>> {
    let store: Arc<dyn AttendanceStore> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(memory::MemoryStore::new()),
        StorageBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for mysql")?;
            let pool = init_mysql(url, config.database_max_connections)
                .await
                .context("Failed to connect to MySQL")?;
            Arc::new(mysql::MySqlStore::new(pool))
        }
        StorageBackend::Sqlite => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for sqlite")?;
            let pool = init_sqlite(url, config.database_max_connections)
                .await
                .context("Failed to open SQLite database")?;
            Arc::new(sqlite::SqliteStore::new(pool))
        }
    };

    info!(backend = %store.backend(), "Attendance store ready");
    Ok(store)
}

/// Behaviour every backend must share. Each backend's tests run these
/// against a fresh, empty store.
#[cfg(test)]
pub(crate) mod conformance {
    use super::AttendanceStore;
    use crate::error::AttendanceError;
    use crate::model::attendance::{NewAttendance, Status};
    use chrono::NaiveDate;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    pub async fn create_then_get_returns_same_record(store: &dyn AttendanceStore) {
        let payload = NewAttendance {
            check_in: Some("09:00".into()),
            department: Some("IT".into()),
            ..NewAttendance::new("Alice", "E1", "2024-01-02", "Present")
        };
        let created = store.create(payload).await.unwrap();

        assert_eq!(created.employee_name, "Alice");
        assert_eq!(created.employee_id, "E1");
        assert_eq!(created.date, day("2024-01-02"));
        assert_eq!(created.status, Status::Present);
        assert_eq!(created.check_in.as_deref(), Some("09:00"));
        assert_eq!(created.check_out, None);

        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    pub async fn invalid_create_adds_nothing(store: &dyn AttendanceStore) {
        store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Present"))
            .await
            .unwrap();

        let err = store
            .create(NewAttendance::new("Bob", "E2", "2024-01-02", "Late"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));

        let err = store
            .create(NewAttendance::new("Bob", "", "2024-01-02", "Absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));

        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    pub async fn get_missing_is_not_found(store: &dyn AttendanceStore) {
        let err = store.get_by_id(42).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NotFound(42)));
    }

    pub async fn delete_twice_reports_not_found(store: &dyn AttendanceStore) {
        let a = store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Present"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Bob", "E2", "2024-01-01", "Absent"))
            .await
            .unwrap();

        assert!(store.delete(a.id).await.unwrap());
        assert!(!store.delete(a.id).await.unwrap());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    pub async fn ids_are_never_reused(store: &dyn AttendanceStore) {
        let first = store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Present"))
            .await
            .unwrap();
        let second = store
            .create(NewAttendance::new("Bob", "E2", "2024-01-02", "Absent"))
            .await
            .unwrap();
        assert!(second.id > first.id);

        store.delete(second.id).await.unwrap();
        let third = store
            .create(NewAttendance::new("Carol", "E3", "2024-01-02", "Present"))
            .await
            .unwrap();
        assert!(third.id > second.id);
    }

    pub async fn list_orders_by_date_then_id_descending(store: &dyn AttendanceStore) {
        for (name, id, date) in [
            ("A", "E1", "2024-01-01"),
            ("B", "E2", "2024-03-01"),
            ("C", "E3", "2024-01-01"),
            ("D", "E4", "2024-02-15"),
            ("E", "E5", "2024-03-01"),
        ] {
            store
                .create(NewAttendance::new(name, id, date, "Present"))
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.employee_name)
            .collect();
        assert_eq!(names, ["E", "B", "D", "C", "A"]);
    }

    pub async fn search_matches_name_or_id_case_insensitively(store: &dyn AttendanceStore) {
        store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Present"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Bob", "E2", "2024-01-01", "Absent"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Malik", "emp-9", "2024-01-03", "Present"))
            .await
            .unwrap();

        let hits = store.search("ali").await.unwrap();
        let names: Vec<&str> = hits.iter().map(|r| r.employee_name.as_str()).collect();
        assert_eq!(names, ["Malik", "Alice"]);

        let by_id = store.search("e2").await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].employee_name, "Bob");

        let by_id = store.search("EMP").await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].employee_name, "Malik");

        // wildcard characters are literal
        assert!(store.search("%").await.unwrap().is_empty());
        assert!(store.search("_").await.unwrap().is_empty());
    }

    pub async fn search_folds_non_ascii_case(store: &dyn AttendanceStore) {
        let emile = store
            .create(NewAttendance::new("Émile", "EMP-7", "2024-01-02", "Present"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Emily", "EMP-8", "2024-01-02", "Absent"))
            .await
            .unwrap();

        for query in ["émile", "ÉMILE", "Émile"] {
            let hits = store.search(query).await.unwrap();
            let ids: Vec<i64> = hits.iter().map(|r| r.id).collect();
            assert_eq!(ids, [emile.id], "query {query}");
        }
    }

    pub async fn filter_returns_exact_date_only(store: &dyn AttendanceStore) {
        let first = store
            .create(NewAttendance::new("Alice", "E1", "2024-01-01", "Present"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Bob", "E2", "2024-01-02", "Absent"))
            .await
            .unwrap();
        let second = store
            .create(NewAttendance::new("Carol", "E3", "2024-01-01", "Absent"))
            .await
            .unwrap();

        let hits = store.filter_by_date(day("2024-01-01")).await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|r| r.id).collect();
        assert_eq!(ids, [second.id, first.id]);

        assert!(store.filter_by_date(day("2023-12-31")).await.unwrap().is_empty());
    }

    pub async fn two_employee_scenario(store: &dyn AttendanceStore) {
        let empty = store.stats().await.unwrap();
        assert_eq!(empty.total_records, 0);
        assert_eq!(empty.present_count, 0);

        let alice = store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Present"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Bob", "E2", "2024-01-01", "Absent"))
            .await
            .unwrap();

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.employee_name)
            .collect();
        assert_eq!(names, ["Alice", "Bob"]);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_employees, 2);
        assert_eq!(stats.present_count, 1);
        assert_eq!(stats.absent_count, 1);

        let hits = store.search("ali").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, alice.id);

        assert!(store.delete(alice.id).await.unwrap());
        let remaining = store.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].employee_name, "Bob");
        assert_eq!(store.stats().await.unwrap().total_records, 1);
    }

    pub async fn duplicate_employee_day_is_allowed(store: &dyn AttendanceStore) {
        store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Present"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Absent"))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_employees, 1);
    }

    pub async fn employee_ids_differing_in_case_are_distinct(store: &dyn AttendanceStore) {
        store
            .create(NewAttendance::new("Alice", "E1", "2024-01-02", "Present"))
            .await
            .unwrap();
        store
            .create(NewAttendance::new("Alice", "e1", "2024-01-02", "Present"))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_employees, 2);

        // search still folds case on ids
        assert_eq!(store.search("E1").await.unwrap().len(), 2);
    }
}
