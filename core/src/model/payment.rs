// storefront/src/model/payment.rs

use super::status::OrderStatus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the customer pays. Only metadata is recorded; no gateway is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
  #[serde(rename = "Cash on Delivery")]
  CashOnDelivery,
  /// Mobile wallet, settled by the customer sending money and quoting the transaction id.
  #[serde(rename = "bKash")]
  Bkash,
  /// Mobile wallet, same settlement flow as bKash.
  Nagad,
  /// Card payment through an external gateway intent.
  Stripe,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::CashOnDelivery => "Cash on Delivery",
      PaymentMethod::Bkash => "bKash",
      PaymentMethod::Nagad => "Nagad",
      PaymentMethod::Stripe => "Stripe",
    }
  }

  pub fn is_mobile_wallet(&self) -> bool {
    matches!(self, PaymentMethod::Bkash | PaymentMethod::Nagad)
  }

  /// Methods whose money arrives outside the order flow and must be confirmed
  /// before fulfilment starts.
  pub fn requires_settlement(&self) -> bool {
    !matches!(self, PaymentMethod::CashOnDelivery)
  }

  /// Status a freshly created order starts in when paid with this method.
  pub fn initial_status(&self) -> OrderStatus {
    if self.requires_settlement() {
      OrderStatus::PaymentPending
    } else {
      OrderStatus::Pending
    }
  }
}

impl fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a supported payment method")]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
  type Err = UnknownPaymentMethod;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "Cash on Delivery" | "CashOnDelivery" => Ok(PaymentMethod::CashOnDelivery),
      "bKash" | "Bkash" => Ok(PaymentMethod::Bkash),
      "Nagad" => Ok(PaymentMethod::Nagad),
      "Stripe" => Ok(PaymentMethod::Stripe),
      other => Err(UnknownPaymentMethod(other.to_string())),
    }
  }
}

/// Payment sub-document of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
  pub method: PaymentMethod,
  pub status: OrderStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub transaction_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sender_number: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gateway_intent_id: Option<String>,
}

impl PaymentInfo {
  /// Builds the payment record, dropping every reference field that does not
  /// belong to `method`. Wallet references never survive on a cash or card order.
  pub fn record(
    method: PaymentMethod,
    transaction_id: Option<String>,
    sender_number: Option<String>,
    gateway_intent_id: Option<String>,
  ) -> Self {
    let wallet = method.is_mobile_wallet();
    Self {
      method,
      status: method.initial_status(),
      transaction_id: transaction_id.filter(|_| wallet),
      sender_number: sender_number.filter(|_| wallet),
      gateway_intent_id: gateway_intent_id.filter(|_| method == PaymentMethod::Stripe),
    }
  }
}
