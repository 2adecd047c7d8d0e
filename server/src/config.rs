// storefront_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use storefront::{LifecycleConfig, RetryPolicy, StatusPolicy};

/// Where orders and stock live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
  Postgres,
  /// Process-local maps, for local runs and tests. Nothing survives a restart.
  Memory,
}

impl StorageBackend {
  pub fn as_str(&self) -> &'static str {
    match self {
      StorageBackend::Postgres => "postgres",
      StorageBackend::Memory => "memory",
    }
  }
}

impl FromStr for StorageBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
      "memory" => Ok(StorageBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORAGE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub storage_backend: StorageBackend,
  /// Required for the postgres backend only.
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub run_migrations: bool,
  pub seed_db: bool,
  pub log_format: LogFormat,
  pub lifecycle: LifecycleConfig,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| lookup(var_name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_var(&get_env, "SERVER_PORT", 8080u16)?;

    let storage_backend = match get_env("STORAGE_BACKEND") {
      Some(raw) => raw.parse::<StorageBackend>()?,
      None => StorageBackend::Postgres,
    };
    let database_url = get_env("DATABASE_URL");
    if storage_backend == StorageBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required when STORAGE_BACKEND=postgres)".to_string(),
      ));
    }
    let database_max_connections = parse_var(&get_env, "DATABASE_MAX_CONNECTIONS", 10u32)?;
    let run_migrations = parse_var(&get_env, "RUN_MIGRATIONS", true)?;
    let seed_db = parse_var(&get_env, "SEED_DB", false)?;

    let log_format = match get_env("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase).as_deref() {
      None | Some("text") => LogFormat::Text,
      Some("json") => LogFormat::Json,
      Some(other) => {
        return Err(AppError::Config(format!(
          "Invalid LOG_FORMAT '{}': expected 'text' or 'json'",
          other
        )))
      }
    };

    let defaults = LifecycleConfig::default();
    let status_policy = match get_env("ORDER_STATUS_POLICY") {
      Some(raw) => raw
        .parse::<StatusPolicy>()
        .map_err(|e| AppError::Config(format!("Invalid ORDER_STATUS_POLICY: {}", e)))?,
      None => defaults.status_policy,
    };
    let restock_on_cancel = parse_var(&get_env, "RESTOCK_ON_CANCEL", defaults.restock_on_cancel)?;
    let max_quantity_per_order = parse_var(&get_env, "MAX_QTY_PER_ORDER", defaults.max_quantity_per_order)?;
    if max_quantity_per_order == 0 {
      return Err(AppError::Config("MAX_QTY_PER_ORDER must be at least 1".to_string()));
    }
    let compensation_attempts =
      parse_var(&get_env, "COMPENSATION_ATTEMPTS", defaults.compensation_retry.max_attempts)?;
    let compensation_backoff_ms = parse_var(
      &get_env,
      "COMPENSATION_BACKOFF_MS",
      u64::try_from(defaults.compensation_retry.backoff.as_millis()).unwrap_or(50),
    )?;

    Ok(Self {
      server_host,
      server_port,
      storage_backend,
      database_url,
      database_max_connections,
      run_migrations,
      seed_db,
      log_format,
      lifecycle: LifecycleConfig {
        status_policy,
        restock_on_cancel,
        max_quantity_per_order,
        compensation_retry: RetryPolicy::new(compensation_attempts, Duration::from_millis(compensation_backoff_ms)),
        ..defaults
      },
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_var<T>(get_env: &impl Fn(&str) -> Option<String>, var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match get_env(var_name) {
    Some(raw) => raw
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
    None => Ok(default),
  }
}
