use actix_web::{HttpRequest, HttpResponse, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::error::AttendanceError;

/// Uniform response wrapper. Clients branch on `success` alone.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            query: None,
            date: None,
            count: None,
            data: Some(data),
            error: None,
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}

impl<T: Serialize> Envelope<Vec<T>> {
    /// List payload with `count` filled in.
    pub fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self::ok(data).with_count(count)
    }
}

impl Envelope<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            query: None,
            date: None,
            count: None,
            data: None,
            error: Some(error.into()),
            details: None,
            timestamp: Utc::now(),
        }
    }
}

pub fn status_of(err: &AttendanceError) -> StatusCode {
    match err {
        AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
        AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
        AttendanceError::Storage(_) | AttendanceError::Poisoned => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Turns a store error into an envelope response.
///
/// Validation and not-found errors are reported as-is. Storage errors are
/// logged and reported with `context` as the message; the underlying error
/// text goes into `details` only when `expose_details` is set.
pub fn error_response(err: &AttendanceError, context: &str, expose_details: bool) -> HttpResponse {
    let status = status_of(err);

    let body = if err.is_storage() {
        error!(error = %err, "{}", context);
        Envelope::failure(context).with_details(expose_details.then(|| err.to_string()))
    } else {
        info!(error = %err, "Request rejected");
        match err {
            AttendanceError::NotFound(_) => Envelope::failure("Record not found"),
            _ => Envelope::failure(err.to_string()),
        }
    };

    HttpResponse::build(status).json(body)
}

pub fn bad_request(error: impl Into<String>, details: Option<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(Envelope::failure(error).with_details(details))
}

/// Default service for unknown routes.
pub async fn route_not_found(req: HttpRequest) -> HttpResponse {
    info!(method = %req.method(), path = %req.path(), "Route not found");
    HttpResponse::NotFound().json(Envelope::failure("Route not found"))
}
