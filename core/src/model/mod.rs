// storefront/src/model/mod.rs

//! Order aggregate and the value types around it.

pub mod order;
pub mod payment;
pub mod principal;
pub mod status;

pub use order::{generate_order_id, total_of, Order, OrderItem, OrderRef, ShippingAddress, StatusEntry};
pub use payment::{PaymentInfo, PaymentMethod, UnknownPaymentMethod};
pub use principal::{Principal, Role, UnknownRole};
pub use status::{OrderStatus, UnknownStatus};
