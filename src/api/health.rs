use actix_web::{HttpResponse, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::envelope::{Envelope, error_response};
use crate::config::Config;
use crate::store::AttendanceStore;

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    #[schema(example = "OK")]
    pub status: String,
    #[schema(example = "mysql")]
    pub backend: String,
    #[schema(example = "development")]
    pub environment: String,
}

#[derive(Serialize, ToSchema)]
pub struct ApiInfo {
    #[schema(example = "Employee Attendance Tracker API")]
    pub name: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "development")]
    pub environment: String,
    #[schema(example = "memory")]
    pub backend: String,
    #[schema(example = json!(["GET /api/attendance", "GET /health"]))]
    pub endpoints: Vec<String>,
}

/// Liveness check, pings the storage connection too
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process and storage reachable", body = Object, example = json!({
            "success": true,
            "data": { "status": "OK", "backend": "mysql", "environment": "production" },
            "timestamp": "2024-01-02T09:00:00Z"
        })),
        (status = 500, description = "Storage unreachable")
    ),
    tag = "System"
)]
pub async fn health(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(Envelope::ok(HealthStatus {
            status: "OK".to_string(),
            backend: store.backend().to_string(),
            environment: config.app_env.clone(),
        })),
        Err(e) => error_response(&e, "Storage unreachable", config.expose_error_details()),
    }
}

/// Service name, version and the routes it serves
#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "Service description with prefixed endpoint list", body = Object, example = json!({
            "success": true,
            "data": {
                "name": "Employee Attendance Tracker API",
                "version": "0.1.0",
                "environment": "development",
                "backend": "memory",
                "endpoints": ["POST /api/attendance", "GET /api/attendance", "GET /health"]
            },
            "timestamp": "2024-01-02T09:00:00Z"
        }))
    ),
    tag = "System"
)]
pub async fn api_info(
    store: web::Data<dyn AttendanceStore>,
    config: web::Data<Config>,
) -> HttpResponse {
    let prefix = config.api_prefix.trim_end_matches('/');
    let endpoints = [
        "POST /attendance",
        "GET /attendance",
        "GET /attendance/{id}",
        "DELETE /attendance/{id}",
        "GET /attendance/search?q=",
        "GET /attendance/filter?date=YYYY-MM-DD",
        "GET /attendance/stats",
    ]
    .into_iter()
    .map(|route| {
        let (method, path) = route.split_once(' ').unwrap_or(("GET", route));
        format!("{method} {prefix}{path}")
    })
    .chain(std::iter::once("GET /health".to_string()))
    .collect();

    HttpResponse::Ok().json(Envelope::ok(ApiInfo {
        name: "Employee Attendance Tracker API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: config.app_env.clone(),
        backend: store.backend().to_string(),
        endpoints,
    }))
}
