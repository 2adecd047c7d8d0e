// storefront/src/inventory/mod.rs

//! The inventory ledger: the only component allowed to change stock counters.

pub mod memory;

use crate::error::LedgerError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::MemoryLedger;

/// A product as the ledger knows it. Owned by the catalog; the ledger only
/// guards its stock counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
  pub id: Uuid,
  pub title: String,
  pub image: Option<String>,
  pub price_cents: i64,
  pub stock: u32,
}

/// Outcome of a successful reservation. Price and title are read in the same
/// atomic step as the decrement, so the order is priced from trusted data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
  pub product_id: Uuid,
  pub product_title: String,
  pub product_image: Option<String>,
  pub quantity: u32,
  pub unit_price_cents: i64,
  pub remaining_stock: u32,
}

#[async_trait]
pub trait InventoryLedger: Send + Sync {
  /// Atomically checks that `quantity` units are available and decrements the
  /// counter. Concurrent reservations of the same product are serialized.
  async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<Reservation, LedgerError>;

  /// Puts `quantity` units back. Used to compensate a reservation whose order
  /// could not be recorded, and for optional restocking on cancellation.
  /// Returns the stock after the release.
  async fn release(&self, product_id: Uuid, quantity: u32) -> Result<u32, LedgerError>;
}
