// storefront_server/src/db/pg_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use storefront::{
  Order, OrderItem, OrderRef, OrderStatus, OrderStore, PaymentInfo, ShippingAddress, StatusEntry, StoreError,
};
use tracing::{debug, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, order_id, user_id, items, total_cents, payment, shipping_address, status, \
                             status_history, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  order_id: String,
  user_id: String,
  items: Json<Vec<OrderItem>>,
  total_cents: i64,
  payment: Json<PaymentInfo>,
  shipping_address: Json<ShippingAddress>,
  status: String,
  status_history: Json<Vec<StatusEntry>>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let status = row
      .status
      .parse::<OrderStatus>()
      .map_err(|e| StoreError::Corrupt(format!("order {}: {}", row.order_id, e)))?;
    Ok(Order {
      id: row.id,
      order_id: row.order_id,
      user_id: row.user_id,
      items: row.items.0,
      total_cents: row.total_cents,
      payment: row.payment.0,
      shipping_address: row.shipping_address.0,
      status,
      status_history: row.status_history.0,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

fn unavailable(err: sqlx::Error) -> StoreError {
  StoreError::Unavailable(err.to_string())
}

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
  rows.into_iter().map(Order::try_from).collect()
}

/// Order documents in the `orders` table, with items, payment, address and
/// history kept as JSONB columns.
#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "PgOrderStore::insert", skip_all, fields(order_id = %order.order_id), err(Display))]
  async fn insert(&self, order: Order) -> Result<Order, StoreError> {
    let row: OrderRow = sqlx::query_as(&format!(
      "INSERT INTO orders (id, order_id, user_id, items, total_cents, payment, shipping_address, status, \
       status_history, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(order.id)
    .bind(&order.order_id)
    .bind(&order.user_id)
    .bind(Json(&order.items))
    .bind(order.total_cents)
    .bind(Json(&order.payment))
    .bind(Json(&order.shipping_address))
    .bind(order.status.as_str())
    .bind(Json(&order.status_history))
    .bind(order.created_at)
    .bind(order.updated_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| match e {
      sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::DuplicateOrderId(order.order_id.clone()),
      other => unavailable(other),
    })?;
    debug!(record_id = %row.id, "Order inserted.");
    Order::try_from(row)
  }

  #[instrument(name = "PgOrderStore::find", skip(self), fields(order_ref = %order_ref), err(Display))]
  async fn find(&self, order_ref: &OrderRef) -> Result<Option<Order>, StoreError> {
    let query = match order_ref {
      OrderRef::Record(id) => sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
        .bind(*id)
        .fetch_optional(&self.pool)
        .await,
      OrderRef::Public(order_id) => {
        sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders WHERE order_id = $1", ORDER_COLUMNS))
          .bind(order_id)
          .fetch_optional(&self.pool)
          .await
      }
    };
    query.map_err(unavailable)?.map(Order::try_from).transpose()
  }

  #[instrument(name = "PgOrderStore::list_by_user", skip(self), err(Display))]
  async fn list_by_user(&self, user_id: &str) -> Result<Vec<Order>, StoreError> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, seq DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await
    .map_err(unavailable)?;
    into_orders(rows)
  }

  #[instrument(name = "PgOrderStore::list_all", skip(self), err(Display))]
  async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {} FROM orders WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC, seq DESC",
      ORDER_COLUMNS
    ))
    .bind(status.map(|s| s.as_str()))
    .fetch_all(&self.pool)
    .await
    .map_err(unavailable)?;
    into_orders(rows)
  }

  /// Conditional on the status the caller read: the `WHERE status = $2` guard
  /// makes a concurrent change surface as `Conflict` instead of a lost update.
  #[instrument(name = "PgOrderStore::transition", skip(self, entry), fields(to = %entry.status), err(Display))]
  async fn transition(&self, id: Uuid, expected: OrderStatus, entry: StatusEntry) -> Result<Order, StoreError> {
    let updated: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET status = $3, \
       payment = jsonb_set(payment, '{{status}}', to_jsonb($3::text)), \
       status_history = status_history || jsonb_build_array($4::jsonb), \
       updated_at = $5 \
       WHERE id = $1 AND status = $2 RETURNING {}",
      ORDER_COLUMNS
    ))
    .bind(id)
    .bind(expected.as_str())
    .bind(entry.status.as_str())
    .bind(Json(&entry))
    .bind(entry.timestamp)
    .fetch_optional(&self.pool)
    .await
    .map_err(unavailable)?;

    if let Some(row) = updated {
      return Order::try_from(row);
    }

    let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(unavailable)?;
    match current {
      None => Err(StoreError::NotFound(id.to_string())),
      Some(raw) => {
        let actual = raw
          .parse::<OrderStatus>()
          .map_err(|e| StoreError::Corrupt(format!("order {}: {}", id, e)))?;
        Err(StoreError::Conflict { expected, actual })
      }
    }
  }
}
