use crate::api::health::{ApiInfo, HealthStatus};
use crate::model::attendance::{AttendanceRecord, AttendanceStats, NewAttendance, Status};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Employee Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance Tracker

Records daily presence or absence per employee and serves the dashboard that
lists, searches, filters and deletes those records.

### Records
- `status` is exactly `Present` or `Absent`
- `date` is `YYYY-MM-DD`
- ids are assigned by the server and never reused
- records are never edited; they are created and deleted

### Paths
Paths below use the default `/api` prefix. A deployment that sets
`API_PREFIX` serves the same routes under that prefix instead; `/health`
and the Swagger UI never move.

### Response Format
Every response is an envelope:
`{ success, data?, count?, message?, error?, details?, timestamp }`.
Branch on `success`; `details` is only filled outside production.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::create_attendance,
        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::search_attendance,
        crate::api::attendance::filter_attendance,
        crate::api::attendance::attendance_stats,

        crate::api::health::health,
        crate::api::health::api_info
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStats,
            NewAttendance,
            Status,
            HealthStatus,
            ApiInfo
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance record APIs"),
        (name = "System", description = "Liveness and service info"),
    )
)]
pub struct ApiDoc;
