use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::error::{AttendanceError, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
pub enum Status {
    Present,
    Absent,
}

impl TryFrom<String> for Status {
    type Error = strum::ParseError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employeeName": "Alice",
    "employeeID": "E1",
    "date": "2024-01-02",
    "status": "Present",
    "checkIn": "09:00",
    "createdAt": "2024-01-02T09:00:00Z"
}))]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: i64,

    #[serde(rename = "employeeName")]
    #[schema(example = "Alice")]
    pub employee_name: String,

    #[serde(rename = "employeeID")]
    #[schema(example = "E1")]
    pub employee_id: String,

    #[schema(example = "2024-01-02", format = "date", value_type = String)]
    pub date: NaiveDate,

    #[sqlx(try_from = "String")]
    pub status: Status,

    #[serde(rename = "checkIn", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "09:00", nullable = true)]
    pub check_in: Option<String>,

    #[serde(rename = "checkOut", default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "17:00", nullable = true)]
    pub check_out: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "IT", nullable = true)]
    pub department: Option<String>,

    #[serde(rename = "createdAt")]
    #[schema(example = "2024-01-02T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Create payload as received. Every field is optional at the wire level so
/// that missing fields surface as one validation error instead of a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewAttendance {
    #[serde(rename = "employeeName")]
    #[schema(example = "Alice")]
    pub employee_name: Option<String>,

    #[serde(rename = "employeeID", alias = "employeeId")]
    #[schema(example = "E1")]
    pub employee_id: Option<String>,

    #[schema(example = "2024-01-02", format = "date")]
    pub date: Option<String>,

    #[schema(example = "Present")]
    pub status: Option<String>,

    #[serde(rename = "checkIn")]
    #[schema(example = "09:00")]
    pub check_in: Option<String>,

    #[serde(rename = "checkOut")]
    #[schema(example = "17:00")]
    pub check_out: Option<String>,

    #[schema(example = "IT")]
    pub department: Option<String>,
}

/// A create payload that passed validation. Only stores build records from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAttendance {
    pub employee_name: String,
    pub employee_id: String,
    pub date: NaiveDate,
    pub status: Status,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    #[schema(example = 2)]
    pub total_records: i64,
    #[schema(example = 2)]
    pub total_employees: i64,
    #[schema(example = 1)]
    pub present_count: i64,
    #[schema(example = 1)]
    pub absent_count: i64,
}

impl NewAttendance {
    pub fn new(
        employee_name: impl Into<String>,
        employee_id: impl Into<String>,
        date: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            employee_name: Some(employee_name.into()),
            employee_id: Some(employee_id.into()),
            date: Some(date.into()),
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn validate(self) -> Result<ValidAttendance> {
        let employee_name = required(self.employee_name);
        let employee_id = required(self.employee_id);
        let date = required(self.date);
        let status = required(self.status);

        let missing: Vec<&str> = [
            ("employeeName", employee_name.is_none()),
            ("employeeID", employee_id.is_none()),
            ("date", date.is_none()),
            ("status", status.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, is_missing)| is_missing.then_some(field))
        .collect();

        let (Some(employee_name), Some(employee_id), Some(date), Some(status)) =
            (employee_name, employee_id, date, status)
        else {
            return Err(AttendanceError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let status = status.parse::<Status>().map_err(|_| {
            let allowed: Vec<String> = Status::iter().map(|s| s.to_string()).collect();
            AttendanceError::Validation(format!(
                "Invalid status '{}'. Allowed: {}",
                status,
                allowed.join(", ")
            ))
        })?;

        Ok(ValidAttendance {
            employee_name,
            employee_id,
            date: parse_date(&date)?,
            status,
            check_in: required(self.check_in),
            check_out: required(self.check_out),
            department: required(self.department),
        })
    }
}

impl AttendanceRecord {
    /// Case-insensitive substring match on employee name or employee ID.
    /// `needle` must already be lower-cased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.employee_name.to_lowercase().contains(needle)
            || self.employee_id.to_lowercase().contains(needle)
    }
}

impl ValidAttendance {
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_name: self.employee_name,
            employee_id: self.employee_id,
            date: self.date,
            status: self.status,
            check_in: self.check_in,
            check_out: self.check_out,
            department: self.department,
            created_at,
        }
    }
}

/// Trimmed value, or None when absent or blank.
fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a canonical `YYYY-MM-DD` date. Unpadded forms such as `2024-1-2`
/// are rejected so that stored and filtered dates compare as literal strings.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == trimmed)
        .ok_or_else(|| {
            AttendanceError::Validation(format!("Invalid date '{}'. Expected YYYY-MM-DD", raw))
        })
}

/// Creation timestamp, truncated to what a `TIMESTAMP(6)` column keeps.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
