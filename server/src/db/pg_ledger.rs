// storefront_server/src/db/pg_ledger.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use storefront::{InventoryLedger, LedgerError, Reservation};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct ReservedRow {
  id: Uuid,
  title: String,
  image: Option<String>,
  price_cents: i64,
  stock: i64,
}

/// Stock counters in the `products` table. Each reservation is one guarded
/// `UPDATE`, so concurrent requests for the last unit cannot both succeed.
#[derive(Clone)]
pub struct PgLedger {
  pool: PgPool,
}

impl PgLedger {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

fn unavailable(err: sqlx::Error) -> LedgerError {
  LedgerError::Unavailable(err.to_string())
}

fn clamp_stock(stock: i64) -> u32 {
  u32::try_from(stock.max(0)).unwrap_or(u32::MAX)
}

#[async_trait]
impl InventoryLedger for PgLedger {
  #[instrument(name = "PgLedger::reserve", skip(self), err(Display))]
  async fn reserve(&self, product_id: Uuid, quantity: u32) -> Result<Reservation, LedgerError> {
    let reserved: Option<ReservedRow> = sqlx::query_as(
      "UPDATE products SET stock = stock - $2, updated_at = now() \
       WHERE id = $1 AND stock >= $2 \
       RETURNING id, title, image, price_cents, stock",
    )
    .bind(product_id)
    .bind(i64::from(quantity))
    .fetch_optional(&self.pool)
    .await
    .map_err(unavailable)?;

    if let Some(row) = reserved {
      debug!(remaining = row.stock, "Stock reserved.");
      return Ok(Reservation {
        product_id: row.id,
        product_title: row.title,
        product_image: row.image,
        quantity,
        unit_price_cents: row.price_cents,
        remaining_stock: clamp_stock(row.stock),
      });
    }

    // The guarded update matched nothing: tell a missing product from a short one.
    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(unavailable)?;
    match available {
      None => Err(LedgerError::ProductNotFound(product_id)),
      Some(stock) => {
        warn!(available = stock, "Not enough stock to reserve.");
        Err(LedgerError::InsufficientStock {
          product_id,
          requested: quantity,
          available: clamp_stock(stock),
        })
      }
    }
  }

  #[instrument(name = "PgLedger::release", skip(self), err(Display))]
  async fn release(&self, product_id: Uuid, quantity: u32) -> Result<u32, LedgerError> {
    let remaining: Option<i64> =
      sqlx::query_scalar("UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1 RETURNING stock")
        .bind(product_id)
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;
    remaining
      .map(clamp_stock)
      .ok_or(LedgerError::ProductNotFound(product_id))
  }
}
