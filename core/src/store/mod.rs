// storefront/src/store/mod.rs

//! The order record store.

pub mod memory;

use crate::error::StoreError;
use crate::model::{Order, OrderRef, OrderStatus, StatusEntry};
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryOrderStore;

/// Durable collection of order documents.
///
/// Implementations keep a unique index on `order_id` and serve listings
/// newest first (`created_at` descending, insertion order breaking ties).
#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Inserts a new order. Fails with [`StoreError::DuplicateOrderId`] if the
  /// public order id is already taken.
  async fn insert(&self, order: Order) -> Result<Order, StoreError>;

  async fn find(&self, order_ref: &OrderRef) -> Result<Option<Order>, StoreError>;

  async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError>;

  async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError>;

  /// Conditionally moves order `id` from `expected` to `entry.status`,
  /// appending `entry` to the history and refreshing `updated_at`.
  /// Fails with [`StoreError::Conflict`] if the stored status is not `expected`.
  async fn transition(&self, id: Uuid, expected: OrderStatus, entry: StatusEntry) -> Result<Order, StoreError>;
}
