// storefront_server/src/state.rs
use crate::config::{AppConfig, StorageBackend};
use crate::db::{self, seed, PgLedger, PgOrderStore};
use crate::errors::Result;
use std::sync::Arc;
use storefront::{InventoryLedger, MemoryLedger, MemoryOrderStore, OrderLifecycle, OrderStore};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
  pub lifecycle: Arc<OrderLifecycle>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the lifecycle controller to the configured storage backend.
  pub async fn build(config: Arc<AppConfig>) -> Result<Self> {
    let (ledger, store): (Arc<dyn InventoryLedger>, Arc<dyn OrderStore>) = match config.storage_backend {
      StorageBackend::Postgres => {
        let pool = db::connect(&config).await?;
        if config.seed_db {
          seed::seed_products(&pool).await?;
        }
        let ledger: Arc<dyn InventoryLedger> = Arc::new(PgLedger::new(pool.clone()));
        let store: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool));
        (ledger, store)
      }
      StorageBackend::Memory => {
        let catalog = if config.seed_db { seed::demo_catalog() } else { Vec::new() };
        info!(products = catalog.len(), "Using in-memory storage.");
        let ledger: Arc<dyn InventoryLedger> = Arc::new(MemoryLedger::with_products(catalog));
        let store: Arc<dyn OrderStore> = Arc::new(MemoryOrderStore::new());
        (ledger, store)
      }
    };

    let lifecycle = OrderLifecycle::new(ledger, store, config.lifecycle.clone());
    info!(
      status_policy = %config.lifecycle.status_policy,
      restock_on_cancel = config.lifecycle.restock_on_cancel,
      "Order lifecycle ready."
    );
    Ok(Self {
      lifecycle: Arc::new(lifecycle),
      config,
    })
  }
}

#[cfg(test)]
pub(crate) fn test_state(
  lifecycle: storefront::LifecycleConfig,
  products: Vec<storefront::CatalogProduct>,
) -> (AppState, Arc<MemoryLedger>) {
  use crate::config::LogFormat;

  let config = AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    storage_backend: StorageBackend::Memory,
    database_url: None,
    database_max_connections: 1,
    run_migrations: false,
    seed_db: false,
    log_format: LogFormat::Text,
    lifecycle,
  };
  let ledger = Arc::new(MemoryLedger::with_products(products));
  let lifecycle = OrderLifecycle::new(ledger.clone(), Arc::new(MemoryOrderStore::new()), config.lifecycle.clone());
  let state = AppState {
    lifecycle: Arc::new(lifecycle),
    config: Arc::new(config),
  };
  (state, ledger)
}
