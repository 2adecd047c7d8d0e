// storefront_server/src/main.rs

mod config;
mod db;
mod errors;
mod state;
mod web;

use crate::config::{AppConfig, LogFormat};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  match format {
    LogFormat::Text => tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_span_events(FmtSpan::CLOSE)
      .init(),
    LogFormat::Json => tracing_subscriber::fmt()
      .json()
      .with_env_filter(filter)
      .with_current_span(true)
      .init(),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      // No subscriber yet; the log format is part of the configuration.
      eprintln!("Failed to load application configuration: {}", e);
      return Err(std::io::Error::other(e.to_string()));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!(
    storage = app_config.storage_backend.as_str(),
    "Starting storefront order server..."
  );

  let app_state = match AppState::build(app_config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise storage.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let server_address = app_config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(web::json_config())
      .app_data(web::query_config())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
