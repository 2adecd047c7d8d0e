// storefront/src/error.rs
use crate::model::OrderStatus;
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Failures of the order lifecycle, as seen by callers.
///
/// Every variant maps to a stable machine-readable [`kind`](OrderError::kind).
#[derive(Debug, Error)]
pub enum OrderError {
  #[error("Invalid request: {0}")]
  InvalidRequest(String),

  #[error("Product not found: {0}")]
  ProductNotFound(Uuid),

  #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    requested: u32,
    available: u32,
  },

  #[error("Authentication required")]
  Unauthenticated,

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Invalid status: {0}")]
  InvalidStatus(String),

  #[error("Order {order_id} cannot move from '{from}' to '{to}'")]
  InvalidTransition {
    order_id: String,
    from: OrderStatus,
    to: OrderStatus,
  },

  #[error("Order not found: {0}")]
  NotFound(String),

  #[error("Internal error: {0}")]
  Internal(String),

  /// Stock and order records disagree and could not be reconciled automatically.
  #[error("Inconsistent state requires operator follow-up: {0}")]
  Inconsistent(String),
}

impl OrderError {
  pub fn kind(&self) -> &'static str {
    match self {
      OrderError::InvalidRequest(_) => "InvalidRequest",
      OrderError::ProductNotFound(_) => "ProductNotFound",
      OrderError::InsufficientStock { .. } => "InsufficientStock",
      OrderError::Unauthenticated => "Unauthenticated",
      OrderError::Forbidden(_) => "Forbidden",
      OrderError::InvalidStatus(_) => "InvalidStatus",
      OrderError::InvalidTransition { .. } => "InvalidTransition",
      OrderError::NotFound(_) => "NotFound",
      OrderError::Internal(_) | OrderError::Inconsistent(_) => "Internal",
    }
  }
}

/// Failures of the inventory ledger.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
  #[error("Product not found: {0}")]
  ProductNotFound(Uuid),

  #[error("Insufficient stock: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    requested: u32,
    available: u32,
  },

  #[error("Inventory ledger unavailable: {0}")]
  Unavailable(String),
}

impl From<LedgerError> for OrderError {
  fn from(err: LedgerError) -> Self {
    match err {
      LedgerError::ProductNotFound(id) => OrderError::ProductNotFound(id),
      LedgerError::InsufficientStock {
        product_id,
        requested,
        available,
      } => OrderError::InsufficientStock {
        product_id,
        requested,
        available,
      },
      LedgerError::Unavailable(msg) => OrderError::Internal(msg),
    }
  }
}

/// Failures of the order record store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
  #[error("Order id already taken: {0}")]
  DuplicateOrderId(String),

  #[error("Order not found: {0}")]
  NotFound(String),

  /// A conditional status write found a different status than expected.
  #[error("Order status changed concurrently: expected '{expected}', found '{actual}'")]
  Conflict {
    expected: OrderStatus,
    actual: OrderStatus,
  },

  #[error("Stored order is malformed: {0}")]
  Corrupt(String),

  #[error("Order store unavailable: {0}")]
  Unavailable(String),
}

impl From<StoreError> for OrderError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::NotFound(order_ref) => OrderError::NotFound(order_ref),
      other => OrderError::Internal(other.to_string()),
    }
  }
}

/// Failures of the saga engine itself, as opposed to failures of step handlers.
#[derive(Debug, Error)]
pub enum SagaError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Action handler missing for step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Compensation for step '{step_name}' of saga '{saga}' failed after {attempts} attempt(s). Source: {source}")]
  CompensationFailed {
    saga: String,
    step_name: String,
    attempts: u32,
    #[source]
    source: AnyhowError,
  },
}

impl From<SagaError> for OrderError {
  fn from(err: SagaError) -> Self {
    match err {
      SagaError::CompensationFailed { .. } => OrderError::Inconsistent(err.to_string()),
      other => OrderError::Internal(other.to_string()),
    }
  }
}

pub type OrderResult<T, E = OrderError> = std::result::Result<T, E>;
