// storefront/src/model/status.rs

//! The order status enum shared by `Order::status` and `PaymentInfo::status`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an order.
///
/// Serialized with the human-readable names used on the wire and in storage
/// (`"Payment Pending"`, `"Pending"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
  #[serde(rename = "Payment Pending")]
  PaymentPending,
  Pending,
  Processing,
  Delivered,
  Cancelled,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::PaymentPending,
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::PaymentPending => "Payment Pending",
      OrderStatus::Pending => "Pending",
      OrderStatus::Processing => "Processing",
      OrderStatus::Delivered => "Delivered",
      OrderStatus::Cancelled => "Cancelled",
    }
  }

  /// No operation moves an order out of a terminal state.
  pub fn is_terminal(&self) -> bool {
    matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
  }

  /// States from which the owner may cancel their own order.
  pub fn is_cancelable_by_owner(&self) -> bool {
    matches!(self, OrderStatus::PaymentPending | OrderStatus::Pending)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Returned when a string is not a member of [`OrderStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid order status")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    // Identifier-style spellings ("PaymentPending") are accepted alongside the display names.
    match s.trim() {
      "Payment Pending" | "PaymentPending" => Ok(OrderStatus::PaymentPending),
      "Pending" => Ok(OrderStatus::Pending),
      "Processing" => Ok(OrderStatus::Processing),
      "Delivered" => Ok(OrderStatus::Delivered),
      "Cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(UnknownStatus(other.to_string())),
    }
  }
}
