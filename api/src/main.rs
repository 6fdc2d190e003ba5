//! Campus API Server
//!
//! Content and admin-console backend for a school website.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sea_orm::Database;

mod adapters;
mod app;
mod auth;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;
mod logging;
mod routes;

#[cfg(test)]
mod test_utils;


use adapters::{
    bootstrap_schema, LocalUploadStore, OutboxMailer, PostgresRecordRepository,
    PostgresUserRepository,
};
use app::{AuthService, HousekeepingService, HousekeepingSettings, ResourceService, TokenKeys};
use config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub resource_service: Arc<ResourceService>,
    pub auth_service: Arc<AuthService>,
    pub config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Invalid configuration")?;

    let _log_guard = logging::init(&config.log_dir).context("Failed to set up logging")?;

    tracing::info!("Starting Campus API...");

    for name in config.insecure_defaults() {
        tracing::warn!("{} is not set, using an insecure development value", name);
    }

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    bootstrap_schema(&db).await?;
    tracing::info!("Database connected");

    // Create adapters
    let record_repo = Arc::new(PostgresRecordRepository::new(db.clone()));
    let user_repo = Arc::new(PostgresUserRepository::new(db.clone()));
    let uploads = Arc::new(
        LocalUploadStore::new(config.upload_dir.clone())
            .await
            .context("Failed to prepare upload directory")?,
    );
    let mailer = Arc::new(
        OutboxMailer::new(config.mail_outbox_dir.clone())
            .await
            .context("Failed to prepare mail outbox")?,
    );

    // Create application services
    let resource_service = Arc::new(ResourceService::new(
        record_repo,
        uploads,
        config.max_upload_bytes,
    ));

    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        TokenKeys::from_config(&config),
        config.crypto_key.clone(),
        config.bcrypt_cost,
    ));

    // Housekeeping: default admin and log shipping
    let housekeeping = Arc::new(HousekeepingService::new(
        user_repo,
        mailer,
        HousekeepingSettings::from_config(&config),
    ));
    let every = Duration::from_secs(config.housekeeping_interval_secs.max(1));
    let _housekeeping_task = housekeeping.spawn(every);

    // Create app state
    let state = AppState {
        resource_service,
        auth_service,
        config: config.clone(),
    };

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
