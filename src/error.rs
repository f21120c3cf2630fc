use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttendanceError {
    /// Missing or malformed input; surfaced as 400
    #[error("{0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Storage error: in-memory store lock poisoned")]
    Poisoned,
}

impl AttendanceError {
    pub fn is_storage(&self) -> bool {
        matches!(self, AttendanceError::Storage(_) | AttendanceError::Poisoned)
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
