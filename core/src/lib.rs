// storefront/src/lib.rs

//! Storefront order core: inventory reservation and the order lifecycle.
//!
//!  - [`inventory`]: the ledger guarding per-product stock counters.
//!  - [`store`]: order documents with their public-id and owner indexes.
//!  - [`lifecycle`]: the controller that creates orders (reserve, then record,
//!    compensating on failure) and moves them through their statuses.
//!  - [`policy`]: the access gate every controller call goes through.
//!  - [`saga`]: the step/compensation engine behind order creation.

pub mod error;
pub mod inventory;
pub mod lifecycle;
pub mod model;
pub mod policy;
pub mod saga;
pub mod store;

pub use crate::error::{LedgerError, OrderError, OrderResult, SagaError, StoreError};
pub use crate::inventory::{CatalogProduct, InventoryLedger, MemoryLedger, Reservation};
pub use crate::lifecycle::{CreateOrderRequest, LifecycleConfig, OrderLifecycle, StatusPolicy};
pub use crate::model::{
  Order, OrderItem, OrderRef, OrderStatus, PaymentInfo, PaymentMethod, Principal, Role, ShippingAddress,
  StatusEntry, UnknownPaymentMethod, UnknownRole, UnknownStatus,
};
pub use crate::policy::{authorize, Action, Decision, DenyReason};
pub use crate::saga::{RetryPolicy, Saga, SagaContext};
pub use crate::store::{MemoryOrderStore, OrderStore};
