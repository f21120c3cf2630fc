use actix_web::HttpServer;
use anyhow::Context;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod store;
mod utils;

use config::Config;

use tracing::info;
use tracing_appender::rolling;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(
        addr = %config.server_addr,
        backend = %config.storage_backend,
        env = %config.app_env,
        "Server starting..."
    );

    let store = store::connect(&config).await?;
    let limiter = routes::build_limiter(config.rate_api_per_min)?;

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || routes::build_app(store.clone(), config.clone(), limiter.clone()))
        .bind(&server_addr)
        .with_context(|| format!("Failed to bind {server_addr}"))?
        .run()
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
