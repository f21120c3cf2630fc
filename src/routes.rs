use crate::{
    api::{attendance, envelope, health},
    config::Config,
    docs::ApiDoc,
    store::AttendanceStore,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, KeyExtractor, PeerIpKeyExtractor,
    governor::{
        NotUntil,
        clock::{Clock, DefaultClock, QuantaInstant},
        middleware::NoOpMiddleware,
    },
};
use actix_web::{
    App, Error, HttpResponse, HttpResponseBuilder, Resource, ResponseError,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    error::InternalError,
    http::{StatusCode, header},
    middleware::{Condition, Logger, NormalizePath},
    web,
};
use anyhow::Context;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub type ApiLimiter = Governor<ClientIpKeyExtractor, NoOpMiddleware>;

/// Keys the limiter by peer IP and answers rejections with the JSON envelope.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor;

#[derive(Debug, thiserror::Error)]
#[error("Could not determine client address")]
pub struct UnknownPeer;

impl ResponseError for UnknownPeer {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(envelope::Envelope::failure(self.to_string()))
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;
    type KeyExtractionError = UnknownPeer;

    fn extract(&self, req: &ServiceRequest) -> Result<Self::Key, Self::KeyExtractionError> {
        PeerIpKeyExtractor.extract(req).map_err(|_| UnknownPeer)
    }

    fn exceed_rate_limit_response(
        &self,
        negative: &NotUntil<QuantaInstant>,
        mut response: HttpResponseBuilder,
    ) -> HttpResponse {
        let wait_secs = negative
            .wait_time_from(DefaultClock::default().now())
            .as_secs()
            .max(1);
        warn!(retry_after = wait_secs, "Rate limit exceeded");

        response
            .insert_header((header::RETRY_AFTER, wait_secs))
            .json(envelope::Envelope::failure("Too many requests"))
    }
}

/// Per-IP limiter shared by every worker. Built once, before the server starts.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Arc<ApiLimiter>> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(ClientIpKeyExtractor)
        .finish()
        .context("Invalid rate limiter settings")?;

    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn build_app(
    store: Arc<dyn AttendanceStore>,
    config: Config,
    limiter: Arc<ApiLimiter>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(Logger::default())
        .wrap(NormalizePath::trim())
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets match
                .url("/api-doc/openapi.json", ApiDoc::openapi()),
        )
        .app_data(web::Data::from(store))
        .app_data(web::Data::new(config.clone()))
        .app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .configure(|cfg| configure(cfg, &config, limiter))
        .default_service(web::to(envelope::route_not_found))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: Arc<ApiLimiter>) {
    cfg.service(resource("/health").route(web::get().to(health::health)));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Condition::new(config.rate_api_per_min > 0, limiter))
            .service(resource("").route(web::get().to(health::api_info)))
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        resource("")
                            .route(web::post().to(attendance::create_attendance))
                            .route(web::get().to(attendance::list_attendance)),
                    )
                    // fixed paths before /{id}
                    .service(resource("/search").route(web::get().to(attendance::search_attendance)))
                    .service(resource("/filter").route(web::get().to(attendance::filter_attendance)))
                    .service(resource("/stats").route(web::get().to(attendance::attendance_stats)))
                    // /attendance/{id}
                    .service(
                        resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            ),
    );
}

fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::to(method_not_allowed))
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(envelope::Envelope::failure("Method not allowed"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let resp = envelope::bad_request("Invalid JSON payload", Some(err.to_string()));
        InternalError::from_response(err, resp).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let resp = envelope::bad_request("Invalid record id", Some(err.to_string()));
        InternalError::from_response(err, resp).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let resp = envelope::bad_request("Invalid query string", Some(err.to_string()));
        InternalError::from_response(err, resp).into()
    })
}
