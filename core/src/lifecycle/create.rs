// storefront/src/lifecycle/create.rs

//! Order creation: request validation and the reserve -> record saga.

use super::LifecycleConfig;
use crate::error::{OrderError, StoreError};
use crate::inventory::{InventoryLedger, Reservation};
use crate::model::{
  generate_order_id, total_of, Order, OrderItem, PaymentInfo, PaymentMethod, Principal, ShippingAddress,
};
use crate::saga::{Saga, SagaContext};
use crate::store::OrderStore;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub(crate) const STEP_RESERVE_STOCK: &str = "reserve_stock";
pub(crate) const STEP_RECORD_ORDER: &str = "record_order";

/// A purchase intent as submitted by the client. Every field is optional at
/// this level so that missing fields are reported together by [`validate`](CreateOrderRequest::validate).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  pub product_id: Option<String>,
  pub qty: Option<i64>,
  pub payment_method: Option<String>,
  pub customer_name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
  pub physical_address: Option<String>,
  pub map_link: Option<String>,
  pub transaction_id: Option<String>,
  pub sender_number: Option<String>,
  pub gateway_intent_id: Option<String>,
  /// Whatever total the client computed, in any JSON shape. Never trusted;
  /// only compared against the server total and logged.
  #[serde(rename = "total", default)]
  pub client_total: Option<serde_json::Value>,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub(crate) struct ValidatedOrder {
  pub(crate) product_id: Uuid,
  pub(crate) quantity: u32,
  pub(crate) payment: PaymentInfo,
  pub(crate) shipping: ShippingAddress,
  pub(crate) client_total: Option<serde_json::Value>,
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CreateOrderRequest {
  pub(crate) fn validate(self, principal: &Principal, config: &LifecycleConfig) -> Result<ValidatedOrder, OrderError> {
    let product_id = non_blank(self.product_id);
    let payment_method = non_blank(self.payment_method);
    let customer_name = non_blank(self.customer_name);
    let email = non_blank(self.email).or_else(|| non_blank(principal.email.clone()));
    let phone = non_blank(self.phone);
    let physical_address = non_blank(self.physical_address);

    let missing: Vec<&str> = [
      ("productId", product_id.is_none()),
      ("paymentMethod", payment_method.is_none()),
      ("customerName", customer_name.is_none()),
      ("email", email.is_none()),
      ("phone", phone.is_none()),
      ("physicalAddress", physical_address.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (
      Some(product_id),
      Some(payment_method),
      Some(customer_name),
      Some(email),
      Some(phone),
      Some(physical_address),
    ) = (product_id, payment_method, customer_name, email, phone, physical_address)
    else {
      return Err(OrderError::InvalidRequest(format!(
        "missing required field(s): {}",
        missing.join(", ")
      )));
    };

    let product_id = Uuid::parse_str(&product_id)
      .map_err(|_| OrderError::InvalidRequest(format!("productId '{}' is not a valid identifier", product_id)))?;

    let qty = self.qty.unwrap_or(1);
    let max = i64::from(config.max_quantity_per_order);
    if qty < 1 || qty > max {
      return Err(OrderError::InvalidRequest(format!(
        "qty must be between 1 and {}, got {}",
        max, qty
      )));
    }
    let quantity = u32::try_from(qty).map_err(|_| OrderError::InvalidRequest(format!("qty {} is out of range", qty)))?;

    let method: PaymentMethod = payment_method
      .parse()
      .map_err(|e: crate::model::UnknownPaymentMethod| OrderError::InvalidRequest(e.to_string()))?;

    if !email.contains('@') || email.contains(char::is_whitespace) {
      return Err(OrderError::InvalidRequest(format!("email '{}' is not a valid address", email)));
    }

    let transaction_id = non_blank(self.transaction_id);
    let sender_number = non_blank(self.sender_number);
    if method.is_mobile_wallet() && (transaction_id.is_none() || sender_number.is_none()) {
      return Err(OrderError::InvalidRequest(format!(
        "{} payments require transactionId and senderNumber",
        method
      )));
    }

    Ok(ValidatedOrder {
      product_id,
      quantity,
      payment: PaymentInfo::record(method, transaction_id, sender_number, non_blank(self.gateway_intent_id)),
      shipping: ShippingAddress {
        customer_name,
        email,
        phone,
        physical_address,
        map_link: non_blank(self.map_link),
      },
      client_total: self.client_total,
    })
  }
}

/// State carried through the creation saga.
pub(crate) struct CreateOrderCtx {
  pub(crate) ledger: Arc<dyn InventoryLedger>,
  pub(crate) store: Arc<dyn OrderStore>,
  pub(crate) config: Arc<LifecycleConfig>,
  pub(crate) principal: Principal,
  pub(crate) request: ValidatedOrder,
  pub(crate) reservation: Option<Reservation>,
  pub(crate) created: Option<Order>,
}

/// Reserve stock first, then record the order. A failed record releases the
/// reservation again.
pub(crate) fn build_create_saga(config: &LifecycleConfig) -> Saga<CreateOrderCtx, OrderError> {
  let mut saga = Saga::<CreateOrderCtx, OrderError>::new("create_order", &[STEP_RESERVE_STOCK, STEP_RECORD_ORDER])
    .with_compensation_retry(config.compensation_retry);

  saga.on_action(STEP_RESERVE_STOCK, |ctx: SagaContext<CreateOrderCtx>| async move {
    let (ledger, product_id, quantity) = {
      let guard = ctx.read();
      (guard.ledger.clone(), guard.request.product_id, guard.request.quantity)
    };
    let reservation = ledger.reserve(product_id, quantity).await?;
    info!(
      %product_id,
      quantity,
      remaining_stock = reservation.remaining_stock,
      "Stock reserved for new order."
    );
    ctx.write().reservation = Some(reservation);
    Ok::<(), OrderError>(())
  });

  saga.on_compensate(STEP_RESERVE_STOCK, |ctx: SagaContext<CreateOrderCtx>| async move {
    let (ledger, reservation) = {
      let guard = ctx.read();
      (guard.ledger.clone(), guard.reservation.clone())
    };
    if let Some(reservation) = reservation {
      let remaining = ledger.release(reservation.product_id, reservation.quantity).await?;
      warn!(
        product_id = %reservation.product_id,
        quantity = reservation.quantity,
        remaining_stock = remaining,
        "Reservation released after failed order creation."
      );
    }
    Ok::<(), OrderError>(())
  });

  saga.on_action(STEP_RECORD_ORDER, |ctx: SagaContext<CreateOrderCtx>| async move {
    let (store, config, user_id, request, reservation) = {
      let guard = ctx.read();
      (
        guard.store.clone(),
        guard.config.clone(),
        guard.principal.id.clone(),
        guard.request.clone(),
        guard.reservation.clone(),
      )
    };
    let reservation =
      reservation.ok_or_else(|| OrderError::Internal("record_order ran without a stock reservation".to_string()))?;

    let items = vec![OrderItem {
      product_id: reservation.product_id,
      product_title: reservation.product_title,
      product_image: reservation.product_image,
      qty: reservation.quantity,
      unit_price_cents: reservation.unit_price_cents,
    }];
    if let Some(client_total) = request.client_total.as_ref().filter(|v| !v.is_null()) {
      let server_total = total_of(&items);
      if client_total.as_i64() != Some(server_total) {
        warn!(%client_total, server_total, "Ignoring client-supplied total.");
      }
    }

    let attempts = config.order_id_attempts.max(1);
    for attempt in 1..=attempts {
      let order = Order::new(
        generate_order_id(&config.order_id_prefix),
        user_id.clone(),
        items.clone(),
        request.payment.clone(),
        request.shipping.clone(),
        Utc::now(),
      );
      match store.insert(order).await {
        Ok(saved) => {
          ctx.write().created = Some(saved);
          return Ok(());
        }
        Err(StoreError::DuplicateOrderId(order_id)) => {
          warn!(attempt, %order_id, "Order id already taken, generating another.");
        }
        Err(e) => return Err(OrderError::from(e)),
      }
    }
    Err(OrderError::Internal(format!(
      "could not allocate a unique order id in {} attempt(s)",
      attempts
    )))
  });

  saga
}
