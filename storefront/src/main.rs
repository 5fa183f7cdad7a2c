// storefront/src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::PgDocumentStore;
use crate::services::notifier::SpawnedConfirmationNotifier;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use ordergate::CheckoutService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_format: &str) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter) // RUST_LOG overrides the default
    .with_span_events(FmtSpan::CLOSE); // span close events carry durations
  if log_format == "json" {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Logging depends on LOG_FORMAT, so read it before the full config.
  dotenvy::dotenv().ok();
  init_tracing(&std::env::var("LOG_FORMAT").unwrap_or_default());

  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e).context("configuration");
    }
  };

  let db_pool = PgPoolOptions::new()
    .max_connections(app_config.database_max_connections)
    .connect(&app_config.database_url)
    .await
    .context("connecting to the database")?;
  tracing::info!("Successfully connected to the database.");

  if app_config.run_migrations {
    sqlx::migrate!("./migrations")
      .run(&db_pool)
      .await
      .context("running database migrations")?;
    tracing::info!("Database migrations applied.");
  }

  let store = Arc::new(PgDocumentStore::new(db_pool.clone()));
  let checkout = CheckoutService::new(store, app_config.checkout.clone())
    .context("checkout settings")?
    .with_notifier(Arc::new(SpawnedConfirmationNotifier));

  let app_state = AppState {
    db_pool: db_pool.clone(),
    checkout: Arc::new(checkout),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(web::routes::json_config())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await?;

  Ok(())
}
