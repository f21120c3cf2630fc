use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use super::AttendanceStore;
use crate::config::StorageBackend;
use crate::error::{AttendanceError, Result};
use crate::model::attendance::{AttendanceRecord, AttendanceStats, NewAttendance, timestamp_now};

/// SQLite-backed store. Dates are kept as `YYYY-MM-DD` text, so ordering and
/// equality on `date` are plain string comparisons.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for SqliteStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    async fn create(&self, new: NewAttendance) -> Result<AttendanceRecord> {
        let entry = new.validate()?;
        let created_at = timestamp_now();

        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_name, employee_id, date, status, check_in, check_out, department, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.employee_name)
        .bind(&entry.employee_id)
        .bind(entry.date)
        .bind(entry.status.as_ref())
        .bind(&entry.check_in)
        .bind(&entry.check_out)
        .bind(&entry.department)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, "Inserted attendance row");

        Ok(entry.into_record(id, created_at))
    }

    async fn list(&self) -> Result<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_name, employee_id, date, status, check_in, check_out, department, created_at
            FROM attendance
            ORDER BY date DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn get_by_id(&self, id: i64) -> Result<AttendanceRecord> {
        sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_name, employee_id, date, status, check_in, check_out, department, created_at
            FROM attendance
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AttendanceError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, query: &str) -> Result<Vec<AttendanceRecord>> {
        // SQLite's LOWER and LIKE only fold ASCII, so matching happens here
        let needle = query.to_lowercase();
        let records = self.list().await?;

        Ok(records
            .into_iter()
            .filter(|record| record.matches_lowercase(&needle))
            .collect())
    }

    async fn filter_by_date(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_name, employee_id, date, status, check_in, check_out, department, created_at
            FROM attendance
            WHERE date = ?
            ORDER BY id DESC
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn stats(&self) -> Result<AttendanceStats> {
        let stats = sqlx::query_as::<_, AttendanceStats>(
            r#"
            SELECT
                COUNT(*) AS total_records,
                COUNT(DISTINCT employee_id) AS total_employees,
                COALESCE(SUM(CASE WHEN status = 'Present' THEN 1 ELSE 0 END), 0) AS present_count,
                COALESCE(SUM(CASE WHEN status = 'Absent' THEN 1 ELSE 0 END), 0) AS absent_count
            FROM attendance
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
