// storefront/src/saga/mod.rs

//! A small saga engine: named steps with forward actions and compensations,
//! run over a shared [`SagaContext`].

pub mod context;
pub mod definition;
mod execution;

pub use context::SagaContext;
pub use definition::{RetryPolicy, Saga, StepHandler};
