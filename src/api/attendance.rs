use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument};
use utoipa::IntoParams;

use crate::api::envelope::{Envelope, bad_request, error_response};
use crate::config::Config;
use crate::error::AttendanceError;
use crate::model::attendance::{NewAttendance, parse_date};
use crate::store::AttendanceStore;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Substring of the employee name or employee ID (case-insensitive)
    #[param(example = "ali")]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Exact date, YYYY-MM-DD
    #[param(example = "2024-01-01")]
    pub date: Option<String>,
}

/// Create attendance record
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = NewAttendance,
    responses(
        (status = 201, description = "Attendance record created", body = Object, example = json!({
            "success": true,
            "message": "Attendance record created successfully",
            "data": {
                "id": 1,
                "employeeName": "Alice",
                "employeeID": "E1",
                "date": "2024-01-02",
                "status": "Present",
                "createdAt": "2024-01-02T09:00:00Z"
            },
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 400, description = "Missing field or invalid status/date", body = Object, example = json!({
            "success": false,
            "error": "Invalid status 'Late'. Allowed: Present, Absent",
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 500, description = "Storage failure")
    ),
    tag = "Attendance"
)]
pub async fn create_attendance(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
    payload: web::Json<NewAttendance>,
) -> HttpResponse {
    let payload = payload.into_inner();
    debug!(
        employee_id = ?payload.employee_id,
        date = ?payload.date,
        status = ?payload.status,
        "Received attendance data"
    );

    match store.create(payload).await {
        Ok(record) => {
            info!(id = record.id, employee_id = %record.employee_id, "Attendance record created");
            HttpResponse::Created()
                .json(Envelope::ok(record).with_message("Attendance record created successfully"))
        }
        Err(e) => error_response(
            &e,
            "Failed to create attendance record",
            config.expose_error_details(),
        ),
    }
}

/// List all attendance records, newest date first
#[utoipa::path(
    get,
    path = "/api/attendance",
    responses(
        (status = 200, description = "All records", body = Object, example = json!({
            "success": true,
            "count": 1,
            "data": [{
                "id": 1,
                "employeeName": "Alice",
                "employeeID": "E1",
                "date": "2024-01-02",
                "status": "Present",
                "createdAt": "2024-01-02T09:00:00Z"
            }],
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 500, description = "Storage failure")
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    match store.list().await {
        Ok(records) => {
            debug!(count = records.len(), "Retrieved attendance records");
            HttpResponse::Ok().json(Envelope::list(records))
        }
        Err(e) => error_response(
            &e,
            "Failed to fetch attendance records",
            config.expose_error_details(),
        ),
    }
}

/// Get attendance record by id
#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(
        ("id" = i64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Record found", body = Object),
        (status = 404, description = "Record not found", body = Object, example = json!({
            "success": false,
            "error": "Record not found",
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 500, description = "Storage failure")
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> HttpResponse {
    let id = path.into_inner();

    match store.get_by_id(id).await {
        Ok(record) => HttpResponse::Ok().json(Envelope::ok(record)),
        Err(e) => error_response(
            &e,
            "Failed to fetch attendance record",
            config.expose_error_details(),
        ),
    }
}

/// Delete attendance record permanently
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(
        ("id" = i64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Record deleted", body = Object, example = json!({
            "success": true,
            "message": "Attendance record deleted successfully",
            "data": { "deletedId": 1 },
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 404, description = "Record not found"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Attendance"
)]
#[instrument(name = "delete_attendance", skip_all, fields(id = %path))]
pub async fn delete_attendance(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
    path: web::Path<i64>,
) -> HttpResponse {
    let id = path.into_inner();

    let result = match store.delete(id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(AttendanceError::NotFound(id)),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            info!("Attendance record deleted");
            HttpResponse::Ok().json(
                Envelope::ok(json!({ "deletedId": id }))
                    .with_message("Attendance record deleted successfully"),
            )
        }
        Err(e) => error_response(
            &e,
            "Failed to delete attendance record",
            config.expose_error_details(),
        ),
    }
}

/// Search by employee name or ID
#[utoipa::path(
    get,
    path = "/api/attendance/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching records", body = Object, example = json!({
            "success": true,
            "query": "ali",
            "count": 1,
            "data": [{
                "id": 1,
                "employeeName": "Alice",
                "employeeID": "E1",
                "date": "2024-01-02",
                "status": "Present",
                "createdAt": "2024-01-02T09:00:00Z"
            }],
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 400, description = "Query parameter q missing or blank"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Attendance"
)]
pub async fn search_attendance(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
    query: web::Query<SearchQuery>,
) -> HttpResponse {
    let Some(q) = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
    else {
        return bad_request("Query parameter \"q\" is required", None);
    };

    match store.search(q).await {
        Ok(records) => {
            debug!(query = %q, count = records.len(), "Search complete");
            HttpResponse::Ok().json(Envelope::list(records).with_query(q))
        }
        Err(e) => error_response(
            &e,
            "Failed to search attendance records",
            config.expose_error_details(),
        ),
    }
}

/// Records on one date
#[utoipa::path(
    get,
    path = "/api/attendance/filter",
    params(DateQuery),
    responses(
        (status = 200, description = "Records on that date, newest id first", body = Object, example = json!({
            "success": true,
            "date": "2024-01-01",
            "count": 0,
            "data": [],
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 400, description = "Date missing or not YYYY-MM-DD"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Attendance"
)]
pub async fn filter_attendance(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
    query: web::Query<DateQuery>,
) -> HttpResponse {
    let Some(raw) = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    else {
        return bad_request("Query parameter \"date\" is required (YYYY-MM-DD)", None);
    };

    let result = match parse_date(raw) {
        Ok(date) => store.filter_by_date(date).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(records) => {
            debug!(date = %raw, count = records.len(), "Filter complete");
            HttpResponse::Ok().json(Envelope::list(records).with_date(raw))
        }
        Err(e) => error_response(
            &e,
            "Failed to filter attendance records",
            config.expose_error_details(),
        ),
    }
}

/// Aggregate counts over all records
#[utoipa::path(
    get,
    path = "/api/attendance/stats",
    responses(
        (status = 200, description = "Aggregate counts", body = Object, example = json!({
            "success": true,
            "data": {
                "totalRecords": 2,
                "totalEmployees": 2,
                "presentCount": 1,
                "absentCount": 1
            },
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 500, description = "Storage failure")
    ),
    tag = "Attendance"
)]
pub async fn attendance_stats(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    match store.stats().await {
        Ok(stats) => HttpResponse::Ok().json(Envelope::ok(stats)),
        Err(e) => error_response(
            &e,
            "Failed to fetch attendance statistics",
            config.expose_error_details(),
        ),
    }
}
