use sqlx::mysql::MySqlPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{MySqlPool, SqlitePool};
use std::str::FromStr;
use tracing::info;

// employee_id compares byte-wise so `E1` and `e1` count as two employees,
// matching the other backends
const MYSQL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
    employee_name VARCHAR(255) NOT NULL,
    employee_id VARCHAR(50) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL,
    date DATE NOT NULL,
    status VARCHAR(16) NOT NULL,
    check_in VARCHAR(32) NULL,
    check_out VARCHAR(32) NULL,
    department VARCHAR(255) NULL,
    created_at TIMESTAMP(6) NOT NULL,
    INDEX idx_attendance_date (date),
    CONSTRAINT chk_attendance_status CHECK (status IN ('Present', 'Absent'))
) DEFAULT CHARSET = utf8mb4
"#;

// AUTOINCREMENT keeps ids from being reused after the highest row is deleted
const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_name TEXT NOT NULL,
    employee_id TEXT NOT NULL,
    date TEXT NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('Present', 'Absent')),
    check_in TEXT,
    check_out TEXT,
    department TEXT,
    created_at TEXT NOT NULL
)
"#;

pub async fn init_mysql(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::query(MYSQL_SCHEMA).execute(&pool).await?;
    info!("MySQL attendance table verified");

    Ok(pool)
}

pub async fn init_sqlite(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // an in-memory database lives and dies with its single connection
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?
    };

    sqlx::query(SQLITE_SCHEMA).execute(&pool).await?;
    info!("SQLite attendance table verified");

    Ok(pool)
}
