// storefront/src/store/memory.rs
use super::OrderStore;
use crate::error::StoreError;
use crate::model::{Order, OrderRef, OrderStatus, StatusEntry};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Collection {
  /// Primary storage, keyed by record id. The second field is insertion order.
  records: HashMap<Uuid, (Order, u64)>,
  /// Unique secondary index: public order id -> record id.
  by_order_id: HashMap<String, Uuid>,
  /// Secondary index: user id -> record ids.
  by_user: HashMap<String, Vec<Uuid>>,
  next_seq: u64,
}

impl Collection {
  fn resolve(&self, order_ref: &OrderRef) -> Option<Uuid> {
    match order_ref {
      OrderRef::Record(id) => self.records.contains_key(id).then_some(*id),
      OrderRef::Public(order_id) => self.by_order_id.get(order_id).copied(),
    }
  }

  fn newest_first<'a>(&'a self, ids: impl Iterator<Item = &'a Uuid>) -> Vec<Order> {
    let mut rows: Vec<&(Order, u64)> = ids.filter_map(|id| self.records.get(id)).collect();
    rows.sort_by(|(a, a_seq), (b, b_seq)| b.created_at.cmp(&a.created_at).then(b_seq.cmp(a_seq)));
    rows.into_iter().map(|(order, _)| order.clone()).collect()
  }
}

/// In-process order store.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
  inner: RwLock<Collection>,
}

impl MemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.inner.read().records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
  #[instrument(name = "MemoryOrderStore::insert", skip_all, fields(order_id = %order.order_id), err(Display))]
  async fn insert(&self, order: Order) -> Result<Order, StoreError> {
    let mut inner = self.inner.write();
    if inner.by_order_id.contains_key(&order.order_id) {
      return Err(StoreError::DuplicateOrderId(order.order_id));
    }
    let seq = inner.next_seq;
    inner.next_seq += 1;
    inner.by_order_id.insert(order.order_id.clone(), order.id);
    inner.by_user.entry(order.user_id.clone()).or_default().push(order.id);
    inner.records.insert(order.id, (order.clone(), seq));
    debug!(record_id = %order.id, "Order inserted.");
    Ok(order)
  }

  async fn find(&self, order_ref: &OrderRef) -> Result<Option<Order>, StoreError> {
    let inner = self.inner.read();
    Ok(
      inner
        .resolve(order_ref)
        .and_then(|id| inner.records.get(&id))
        .map(|(order, _)| order.clone()),
    )
  }

  async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
    let inner = self.inner.read();
    Ok(match inner.by_user.get(user_id) {
      Some(ids) => inner.newest_first(ids.iter()),
      None => Vec::new(),
    })
  }

  async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
    let inner = self.inner.read();
    let mut orders = inner.newest_first(inner.records.keys());
    if let Some(status) = status {
      orders.retain(|o| o.status == status);
    }
    Ok(orders)
  }

  #[instrument(name = "MemoryOrderStore::transition", skip(self, entry), fields(to = %entry.status), err(Display))]
  async fn transition(&self, id: Uuid, expected: OrderStatus, entry: StatusEntry) -> Result<Order, StoreError> {
    let mut inner = self.inner.write();
    let (order, _) = inner
      .records
      .get_mut(&id)
      .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    if order.status != expected {
      return Err(StoreError::Conflict {
        expected,
        actual: order.status,
      });
    }
    order.apply_status(entry);
    Ok(order.clone())
  }
}
