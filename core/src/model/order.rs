// storefront/src/model/order.rs

use super::payment::PaymentInfo;
use super::status::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One line of an order. Title, image and price are copied from the catalog at
/// reservation time so later catalog edits never touch existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub product_id: Uuid,
  pub product_title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub product_image: Option<String>,
  pub qty: u32,
  pub unit_price_cents: i64,
}

impl OrderItem {
  pub fn line_total_cents(&self) -> i64 {
    i64::from(self.qty) * self.unit_price_cents
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub customer_name: String,
  pub email: String,
  pub phone: String,
  pub physical_address: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub map_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
  pub status: OrderStatus,
  pub timestamp: DateTime<Utc>,
}

/// The order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  /// Internal record id.
  pub id: Uuid,
  /// Public, human-readable id (`ORD-…`).
  pub order_id: String,
  pub user_id: String,
  pub items: Vec<OrderItem>,
  pub total_cents: i64,
  pub payment: PaymentInfo,
  pub shipping_address: ShippingAddress,
  pub status: OrderStatus,
  pub status_history: Vec<StatusEntry>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// Assembles a new order in the payment method's initial status, with the
  /// first history entry already appended and the total computed from `items`.
  pub fn new(
    order_id: String,
    user_id: String,
    items: Vec<OrderItem>,
    payment: PaymentInfo,
    shipping_address: ShippingAddress,
    now: DateTime<Utc>,
  ) -> Self {
    let status = payment.method.initial_status();
    let total_cents = total_of(&items);
    Self {
      id: Uuid::new_v4(),
      order_id,
      user_id,
      items,
      total_cents,
      payment: PaymentInfo { status, ..payment },
      shipping_address,
      status,
      status_history: vec![StatusEntry { status, timestamp: now }],
      created_at: now,
      updated_at: now,
    }
  }

  /// Moves the order to `entry.status`. History is only ever appended to.
  pub fn apply_status(&mut self, entry: StatusEntry) {
    self.status = entry.status;
    self.payment.status = entry.status;
    self.updated_at = entry.timestamp;
    self.status_history.push(entry);
  }

  pub fn is_owned_by(&self, user_id: &str) -> bool {
    self.user_id == user_id
  }
}

pub fn total_of(items: &[OrderItem]) -> i64 {
  items.iter().map(OrderItem::line_total_cents).sum()
}

/// Generates a public order id: `<prefix>-` followed by ten upper-case hex digits.
/// Uniqueness is guaranteed by the store's unique index, not by this function.
pub fn generate_order_id(prefix: &str) -> String {
  let raw = Uuid::new_v4().simple().to_string();
  format!("{}-{}", prefix, raw[..10].to_ascii_uppercase())
}

/// Addresses an order either by internal record id or by public order id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderRef {
  Record(Uuid),
  Public(String),
}

impl OrderRef {
  /// A UUID is taken as the internal id, anything else as a public order id.
  pub fn parse(raw: &str) -> Self {
    let raw = raw.trim();
    match Uuid::parse_str(raw) {
      Ok(id) => OrderRef::Record(id),
      Err(_) => OrderRef::Public(raw.to_string()),
    }
  }

  pub fn matches(&self, order: &Order) -> bool {
    match self {
      OrderRef::Record(id) => order.id == *id,
      OrderRef::Public(order_id) => order.order_id == *order_id,
    }
  }
}

impl fmt::Display for OrderRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OrderRef::Record(id) => write!(f, "{}", id),
      OrderRef::Public(order_id) => f.write_str(order_id),
    }
  }
}
