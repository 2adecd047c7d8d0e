// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::sync::{
  atomic::{AtomicU32, AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;
use storefront::{
  CatalogProduct, CreateOrderRequest, InventoryLedger, LedgerError, LifecycleConfig, MemoryLedger,
  MemoryOrderStore, Order, OrderLifecycle, OrderRef, OrderStatus, OrderStore, Reservation, RetryPolicy,
  StatusEntry, StoreError,
};
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---

pub fn product(title: &str, price_cents: i64, stock: u32) -> CatalogProduct {
  CatalogProduct {
    id: Uuid::new_v4(),
    title: title.to_string(),
    image: Some(format!("https://cdn.example.com/{}.png", title.to_lowercase().replace(' ', "-"))),
    price_cents,
    stock,
  }
}

pub fn cod_request(product_id: Uuid, qty: i64) -> CreateOrderRequest {
  CreateOrderRequest {
    product_id: Some(product_id.to_string()),
    qty: Some(qty),
    payment_method: Some("Cash on Delivery".to_string()),
    customer_name: Some("Rahim Uddin".to_string()),
    email: Some("rahim@example.com".to_string()),
    phone: Some("01711000000".to_string()),
    physical_address: Some("House 4, Road 7, Dhanmondi".to_string()),
    ..Default::default()
  }
}

pub fn wallet_request(product_id: Uuid, method: &str) -> CreateOrderRequest {
  CreateOrderRequest {
    payment_method: Some(method.to_string()),
    transaction_id: Some("8N7A6KX1".to_string()),
    sender_number: Some("01811000000".to_string()),
    ..cod_request(product_id, 1)
  }
}

/// Retries quickly so that exhaustion paths stay fast.
pub fn fast_config() -> LifecycleConfig {
  LifecycleConfig {
    compensation_retry: RetryPolicy::new(3, Duration::from_millis(1)),
    ..LifecycleConfig::default()
  }
}

pub struct Harness {
  pub ledger: Arc<MemoryLedger>,
  pub store: Arc<MemoryOrderStore>,
  pub lifecycle: Arc<OrderLifecycle>,
}

pub fn harness(config: LifecycleConfig, products: Vec<CatalogProduct>) -> Harness {
  let ledger = Arc::new(MemoryLedger::with_products(products));
  let store = Arc::new(MemoryOrderStore::new());
  let lifecycle = Arc::new(OrderLifecycle::new(ledger.clone(), store.clone(), config));
  Harness {
    ledger,
    store,
    lifecycle,
  }
}

pub fn by_public_id(order: &Order) -> OrderRef {
  OrderRef::Public(order.order_id.clone())
}

// --- Faulty collaborators ---

/// Order store whose inserts always fail; reads go to the wrapped store.
pub struct FailingStore {
  pub inner: MemoryOrderStore,
  pub insert_calls: AtomicUsize,
}

impl FailingStore {
  pub fn new() -> Self {
    Self {
      inner: MemoryOrderStore::new(),
      insert_calls: AtomicUsize::new(0),
    }
  }
}

#[async_trait]
impl OrderStore for FailingStore {
  async fn insert(&self, _order: Order) -> Result<Order, StoreError> {
    self.insert_calls.fetch_add(1, Ordering::SeqCst);
    Err(StoreError::Unavailable("write rejected".to_string()))
  }

  async fn find(&self, order_ref: &OrderRef) -> Result<Option<Order>, StoreError> {
    self.inner.find(order_ref).await
  }

  async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
    self.inner.list_by_user(user_id).await
  }

  async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
    self.inner.list_all(status).await
  }

  async fn transition(&self, id: Uuid, expected: OrderStatus, entry: StatusEntry) -> Result<Order, StoreError> {
    self.inner.transition(id, expected, entry).await
  }
}

/// Order store that reports the first `collisions` inserts as duplicate public ids.
pub struct CollidingStore {
  pub inner: MemoryOrderStore,
  pub collisions: AtomicU32,
  pub insert_calls: AtomicUsize,
}

impl CollidingStore {
  pub fn new(collisions: u32) -> Self {
    Self {
      inner: MemoryOrderStore::new(),
      collisions: AtomicU32::new(collisions),
      insert_calls: AtomicUsize::new(0),
    }
  }
}

#[async_trait]
impl OrderStore for CollidingStore {
  async fn insert(&self, order: Order) -> Result<Order, StoreError> {
    self.insert_calls.fetch_add(1, Ordering::SeqCst);
    let collide = self
      .collisions
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
      .is_ok();
    if collide {
      return Err(StoreError::DuplicateOrderId(order.order_id));
    }
    self.inner.insert(order).await
  }

  async fn find(&self, order_ref: &OrderRef) -> Result<Option<Order>, StoreError> {
    self.inner.find(order_ref).await
  }

  async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
    self.inner.list_by_user(user_id).await
  }

  async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
    self.inner.list_all(status).await
  }

  async fn transition(&self, id: Uuid, expected: OrderStatus, entry: StatusEntry) -> Result<Order, StoreError> {
    self.inner.transition(id, expected, entry).await
  }
}

/// Ledger whose releases fail `release_failures` times before going through.
pub struct FlakyLedger {
  pub inner: MemoryLedger,
  pub release_failures: AtomicU32,
  pub release_calls: AtomicUsize,
}

impl FlakyLedger {
  pub fn new(inner: MemoryLedger, release_failures: u32) -> Self {
    Self {
      inner,
      release_failures: AtomicU32::new(release_failures),
      release_calls: AtomicUsize::new(0),
    }
  }
}

#[async_trait]
impl InventoryLedger for FlakyLedger {
  async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<Reservation, LedgerError> {
    self.inner.reserve(product_id, quantity).await
  }

  async fn release(&self, product_id: Uuid, quantity: u32) -> Result<u32, LedgerError> {
    self.release_calls.fetch_add(1, Ordering::SeqCst);
    let fail = self
      .release_failures
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
      .is_ok();
    if fail {
      return Err(LedgerError::Unavailable("ledger connection reset".to_string()));
    }
    self.inner.release(product_id, quantity).await
  }
}
