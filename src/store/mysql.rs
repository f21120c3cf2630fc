use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use super::AttendanceStore;
use crate::config::StorageBackend;
use crate::error::{AttendanceError, Result};
use crate::model::attendance::{AttendanceRecord, AttendanceStats, NewAttendance, timestamp_now};
use crate::utils::db_utils::contains_pattern;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Mysql
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

        let id = result.last_insert_id() as i64;
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
        let pattern = contains_pattern(query);

        // LIKE narrows the rows; the final case fold is Rust's so every
        // backend agrees on non-ASCII names
        let records = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT id, employee_name, employee_id, date, status, check_in, check_out, department, created_at
            FROM attendance
            WHERE LOWER(employee_name) LIKE ? ESCAPE '!'
               OR LOWER(employee_id) LIKE ? ESCAPE '!'
            ORDER BY date DESC, id DESC
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let needle = query.to_lowercase();
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
        // SUM yields DECIMAL on MySQL, cast back to BIGINT
        let stats = sqlx::query_as::<_, AttendanceStats>(
            r#"
            SELECT
                COUNT(*) AS total_records,
                COUNT(DISTINCT employee_id) AS total_employees,
                CAST(COALESCE(SUM(CASE WHEN status = 'Present' THEN 1 ELSE 0 END), 0) AS SIGNED) AS present_count,
                CAST(COALESCE(SUM(CASE WHEN status = 'Absent' THEN 1 ELSE 0 END), 0) AS SIGNED) AS absent_count
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

/// Runs against a live server: `DATABASE_URL=mysql://... cargo test -- --ignored`.
/// The `attendance` table is emptied before every case.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_mysql;
    use crate::store::conformance;

    async fn live_store() -> MySqlStore {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").unwrap_or_default();
        assert!(
            url.starts_with("mysql://"),
            "DATABASE_URL must point at a MySQL server, got {url:?}"
        );
        MySqlStore::new(init_mysql(&url, 2).await.unwrap())
    }

    async fn emptied(store: &MySqlStore) -> &MySqlStore {
        sqlx::query("DELETE FROM attendance")
            .execute(&store.pool)
            .await
            .unwrap();
        store
    }

    #[actix_web::test]
    #[ignore = "needs a MySQL DATABASE_URL"]
    async fn conforms_to_store_contract() {
        let store = live_store().await;
        assert!(store.ping().await.is_ok());

        conformance::create_then_get_returns_same_record(emptied(&store).await).await;
        conformance::invalid_create_adds_nothing(emptied(&store).await).await;
        conformance::get_missing_is_not_found(emptied(&store).await).await;
        conformance::delete_twice_reports_not_found(emptied(&store).await).await;
        conformance::ids_are_never_reused(emptied(&store).await).await;
        conformance::list_orders_by_date_then_id_descending(emptied(&store).await).await;
        conformance::search_matches_name_or_id_case_insensitively(emptied(&store).await).await;
        conformance::search_folds_non_ascii_case(emptied(&store).await).await;
        conformance::filter_returns_exact_date_only(emptied(&store).await).await;
        conformance::two_employee_scenario(emptied(&store).await).await;
        conformance::duplicate_employee_day_is_allowed(emptied(&store).await).await;
        conformance::employee_ids_differing_in_case_are_distinct(emptied(&store).await).await;

        emptied(&store).await;
    }
}
