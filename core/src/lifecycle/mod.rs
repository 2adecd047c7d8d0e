// storefront/src/lifecycle/mod.rs

//! The order lifecycle controller: creation, listings, status changes and
//! owner cancellation, each behind the access policy gate.

mod create;
pub mod transitions;

pub use create::CreateOrderRequest;
pub use transitions::{StatusPolicy, UnknownStatusPolicy};

use crate::error::{OrderError, StoreError};
use crate::inventory::InventoryLedger;
use crate::model::{Order, OrderRef, OrderStatus, Principal, StatusEntry, UnknownStatus};
use crate::policy::{authorize, Action, Decision, DenyReason};
use crate::saga::{RetryPolicy, Saga, SagaContext};
use crate::store::OrderStore;
use chrono::Utc;
use create::{build_create_saga, CreateOrderCtx};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Tunables of the lifecycle controller.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
  pub status_policy: StatusPolicy,
  /// Put stock back when an order is cancelled. Off by default: cancelled
  /// orders keep their units out of stock.
  pub restock_on_cancel: bool,
  pub max_quantity_per_order: u32,
  /// Retry applied when releasing stock (saga compensation and restocking).
  pub compensation_retry: RetryPolicy,
  pub order_id_prefix: String,
  /// How many public ids to try before giving up on a collision streak.
  pub order_id_attempts: u32,
}

impl Default for LifecycleConfig {
  fn default() -> Self {
    Self {
      status_policy: StatusPolicy::Strict,
      restock_on_cancel: false,
      max_quantity_per_order: 10,
      compensation_retry: RetryPolicy::default(),
      order_id_prefix: "ORD".to_string(),
      order_id_attempts: 3,
    }
  }
}

pub struct OrderLifecycle {
  ledger: Arc<dyn InventoryLedger>,
  store: Arc<dyn OrderStore>,
  config: Arc<LifecycleConfig>,
  create_saga: Saga<CreateOrderCtx, OrderError>,
}

impl OrderLifecycle {
  pub fn new(ledger: Arc<dyn InventoryLedger>, store: Arc<dyn OrderStore>, config: LifecycleConfig) -> Self {
    let create_saga = build_create_saga(&config);
    Self {
      ledger,
      store,
      config: Arc::new(config),
      create_saga,
    }
  }

  pub fn config(&self) -> &LifecycleConfig {
    &self.config
  }

  /// Validates the request, reserves stock and records the order for the
  /// calling principal. If recording fails the reservation is released.
  #[instrument(
    name = "OrderLifecycle::create_order",
    skip_all,
    fields(principal = principal.map(|p| p.id.as_str())),
    err(Display)
  )]
  pub async fn create_order(
    &self,
    principal: Option<&Principal>,
    request: CreateOrderRequest,
  ) -> Result<Order, OrderError> {
    let principal = self.guard(principal, Action::CreateOrder, None)?;
    let validated = request.validate(principal, &self.config)?;

    let ctx = SagaContext::new(CreateOrderCtx {
      ledger: self.ledger.clone(),
      store: self.store.clone(),
      config: self.config.clone(),
      principal: principal.clone(),
      request: validated,
      reservation: None,
      created: None,
    });
    self.create_saga.run(ctx.clone()).await?;

    let order = ctx
      .write()
      .created
      .take()
      .ok_or_else(|| OrderError::Internal("order creation finished without a record".to_string()))?;
    info!(
      order_id = %order.order_id,
      status = %order.status,
      total_cents = order.total_cents,
      "Order created."
    );
    Ok(order)
  }

  /// Orders of `target_user_id`, newest first. Self or admin only.
  #[instrument(name = "OrderLifecycle::list_orders_for_user", skip(self, principal), err(Display))]
  pub async fn list_orders_for_user(
    &self,
    principal: Option<&Principal>,
    target_user_id: &str,
  ) -> Result<Vec<Order>, OrderError> {
    self.guard(principal, Action::ReadOrders, Some(target_user_id))?;
    Ok(self.store.list_by_user(target_user_id).await?)
  }

  /// Every order, newest first, optionally narrowed to one status. Admin only.
  ///
  /// The raw `status` filter is only parsed once the caller has passed the
  /// gate; a blank filter means no filter.
  #[instrument(name = "OrderLifecycle::list_all_orders", skip(self, principal), err(Display))]
  pub async fn list_all_orders(
    &self,
    principal: Option<&Principal>,
    status: Option<&str>,
  ) -> Result<Vec<Order>, OrderError> {
    self.guard(principal, Action::ListAllOrders, None)?;
    let status = status
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::parse::<OrderStatus>)
      .transpose()
      .map_err(|e: UnknownStatus| OrderError::InvalidStatus(e.to_string()))?;
    Ok(self.store.list_all(status).await?)
  }

  /// A single order, visible to its owner and to admins.
  #[instrument(name = "OrderLifecycle::get_order", skip(self, principal), fields(order_ref = %order_ref), err(Display))]
  pub async fn get_order(&self, principal: Option<&Principal>, order_ref: &OrderRef) -> Result<Order, OrderError> {
    let principal = self.require_principal(principal, Action::ReadOrders)?;
    self.load_owned(principal, Action::ReadOrders, order_ref).await
  }

  /// Administrative status change. `new_status` must name a member of
  /// [`OrderStatus`] and the move must be allowed by the configured policy.
  #[instrument(name = "OrderLifecycle::update_status", skip(self, principal), fields(order_ref = %order_ref), err(Display))]
  pub async fn update_status(
    &self,
    principal: Option<&Principal>,
    order_ref: &OrderRef,
    new_status: &str,
  ) -> Result<Order, OrderError> {
    self.guard(principal, Action::UpdateStatus, None)?;
    let target: OrderStatus = new_status
      .parse()
      .map_err(|e: UnknownStatus| OrderError::InvalidStatus(e.to_string()))?;

    let order = self.load(order_ref).await?;
    if !self.config.status_policy.allows(order.status, target) {
      return Err(OrderError::InvalidTransition {
        order_id: order.order_id,
        from: order.status,
        to: target,
      });
    }

    let updated = self.commit_transition(&order, target).await?;
    info!(order_id = %updated.order_id, from = %order.status, to = %target, "Order status updated.");
    if target == OrderStatus::Cancelled {
      self.restock_if_configured(&updated).await?;
    }
    Ok(updated)
  }

  /// The owner cancels their own order while it is still awaiting payment or
  /// fulfilment.
  #[instrument(name = "OrderLifecycle::cancel_own_order", skip(self, principal), fields(order_ref = %order_ref), err(Display))]
  pub async fn cancel_own_order(
    &self,
    principal: Option<&Principal>,
    order_ref: &OrderRef,
  ) -> Result<Order, OrderError> {
    let principal = self.require_principal(principal, Action::CancelOrder)?;
    let order = self.load_owned(principal, Action::CancelOrder, order_ref).await?;

    if !order.status.is_cancelable_by_owner() {
      return Err(OrderError::InvalidTransition {
        order_id: order.order_id,
        from: order.status,
        to: OrderStatus::Cancelled,
      });
    }

    let updated = self.commit_transition(&order, OrderStatus::Cancelled).await?;
    info!(order_id = %updated.order_id, from = %order.status, "Order cancelled by owner.");
    self.restock_if_configured(&updated).await?;
    Ok(updated)
  }

  async fn load(&self, order_ref: &OrderRef) -> Result<Order, OrderError> {
    self
      .store
      .find(order_ref)
      .await?
      .ok_or_else(|| OrderError::NotFound(order_ref.to_string()))
  }

  /// Loads an order for an owner-scoped action. A caller who may only touch
  /// their own orders gets the same denial for an unknown id as for someone
  /// else's order, so ids cannot be enumerated.
  async fn load_owned(&self, principal: &Principal, action: Action, order_ref: &OrderRef) -> Result<Order, OrderError> {
    match self.store.find(order_ref).await? {
      Some(order) => {
        self.guard(Some(principal), action, Some(&order.user_id))?;
        Ok(order)
      }
      None => match authorize(Some(principal), action, None) {
        Decision::Allow => Err(OrderError::NotFound(order_ref.to_string())),
        Decision::Deny(_) => Err(denied(Some(principal), action, None, DenyReason::NotOwner)),
      },
    }
  }

  async fn commit_transition(&self, order: &Order, target: OrderStatus) -> Result<Order, OrderError> {
    let entry = StatusEntry {
      status: target,
      timestamp: Utc::now(),
    };
    match self.store.transition(order.id, order.status, entry).await {
      Ok(updated) => Ok(updated),
      Err(StoreError::Conflict { actual, .. }) => {
        warn!(order_id = %order.order_id, %actual, "Status changed underneath the update.");
        Err(OrderError::InvalidTransition {
          order_id: order.order_id.clone(),
          from: actual,
          to: target,
        })
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn restock_if_configured(&self, order: &Order) -> Result<(), OrderError> {
    if !self.config.restock_on_cancel {
      return Ok(());
    }
    let retry = self.config.compensation_retry;
    for item in &order.items {
      let mut attempt = 0;
      loop {
        attempt += 1;
        match self.ledger.release(item.product_id, item.qty).await {
          Ok(remaining) => {
            info!(order_id = %order.order_id, product_id = %item.product_id, qty = item.qty, remaining, "Stock restored.");
            break;
          }
          Err(e) if attempt < retry.attempts() => {
            warn!(order_id = %order.order_id, attempt, error = %e, "Restock failed, retrying.");
            tokio::time::sleep(retry.delay_after(attempt)).await;
          }
          Err(e) => {
            error!(
              order_id = %order.order_id,
              product_id = %item.product_id,
              qty = item.qty,
              error = %e,
              "Order cancelled but stock could not be restored."
            );
            return Err(OrderError::Inconsistent(format!(
              "order {} cancelled but {} unit(s) of product {} were not restocked: {}",
              order.order_id, item.qty, item.product_id, e
            )));
          }
        }
      }
    }
    Ok(())
  }

  fn require_principal<'p>(
    &self,
    principal: Option<&'p Principal>,
    action: Action,
  ) -> Result<&'p Principal, OrderError> {
    principal.ok_or_else(|| denied(None, action, None, DenyReason::Unauthenticated))
  }

  fn guard<'p>(
    &self,
    principal: Option<&'p Principal>,
    action: Action,
    owner: Option<&str>,
  ) -> Result<&'p Principal, OrderError> {
    match (authorize(principal, action, owner), principal) {
      (Decision::Allow, Some(principal)) => Ok(principal),
      (Decision::Deny(reason), _) => Err(denied(principal, action, owner, reason)),
      (Decision::Allow, None) => Err(denied(None, action, owner, DenyReason::Unauthenticated)),
    }
  }
}

/// Records the denial on the audit target and turns it into the caller-facing error.
fn denied(principal: Option<&Principal>, action: Action, owner: Option<&str>, reason: DenyReason) -> OrderError {
  warn!(
    target: "audit",
    principal = principal.map(|p| p.id.as_str()),
    role = ?principal.map(|p| p.role),
    %action,
    owner,
    ?reason,
    "Access denied."
  );
  match reason {
    DenyReason::Unauthenticated => OrderError::Unauthenticated,
    DenyReason::AdminOnly => OrderError::Forbidden(format!("{} requires the admin role", action)),
    DenyReason::NotOwner => OrderError::Forbidden(format!("{} is limited to the order owner", action)),
    DenyReason::MissingOwner => OrderError::Forbidden(format!("{} needs a resource owner", action)),
  }
}
