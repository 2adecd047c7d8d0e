// storefront/src/inventory/memory.rs
use super::{CatalogProduct, InventoryLedger, Reservation};
use crate::error::LedgerError;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// In-process ledger keyed by product id.
///
/// The map lock is only taken for writing when products are added; a
/// reservation holds the map's read lock just long enough to clone the
/// product's slot, then serializes on that product's own mutex.
#[derive(Debug, Default)]
pub struct MemoryLedger {
  products: RwLock<HashMap<Uuid, Arc<Mutex<CatalogProduct>>>>,
}

impl MemoryLedger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_products(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
    let ledger = Self::new();
    for product in products {
      ledger.upsert_product(product);
    }
    ledger
  }

  /// Adds a product or replaces its catalog data and stock.
  pub fn upsert_product(&self, product: CatalogProduct) {
    let mut products = self.products.write();
    match products.get(&product.id) {
      Some(slot) => *slot.lock() = product,
      None => {
        products.insert(product.id, Arc::new(Mutex::new(product)));
      }
    }
  }

  pub fn stock_of(&self, product_id: Uuid) -> Option<u32> {
    self.slot(product_id).map(|slot| slot.lock().stock)
  }

  pub fn product(&self, product_id: Uuid) -> Option<CatalogProduct> {
    self.slot(product_id).map(|slot| slot.lock().clone())
  }

  fn slot(&self, product_id: Uuid) -> Option<Arc<Mutex<CatalogProduct>>> {
    self.products.read().get(&product_id).cloned()
  }
}

#[async_trait]
impl InventoryLedger for MemoryLedger {
  #[instrument(name = "MemoryLedger::reserve", skip(self), err(Display))]
  async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<Reservation, LedgerError> {
    let slot = self.slot(product_id).ok_or(LedgerError::ProductNotFound(product_id))?;
    let mut product = slot.lock();

    if product.stock < quantity {
      warn!(available = product.stock, "Reservation refused.");
      return Err(LedgerError::InsufficientStock {
        product_id,
        requested: quantity,
        available: product.stock,
      });
    }
    product.stock -= quantity;
    debug!(remaining = product.stock, "Stock reserved.");

    Ok(Reservation {
      product_id,
      product_title: product.title.clone(),
      product_image: product.image.clone(),
      quantity,
      unit_price_cents: product.price_cents,
      remaining_stock: product.stock,
    })
  }

  #[instrument(name = "MemoryLedger::release", skip(self), err(Display))]
  async fn release(&self, product_id: Uuid, quantity: u32) -> Result<u32, LedgerError> {
    let slot = self.slot(product_id).ok_or(LedgerError::ProductNotFound(product_id))?;
    let mut product = slot.lock();
    product.stock = product.stock.saturating_add(quantity);
    debug!(remaining = product.stock, "Stock released.");
    Ok(product.stock)
  }
}
