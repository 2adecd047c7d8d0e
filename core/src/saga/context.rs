// storefront/src/saga/context.rs
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable state threaded through every step of a saga run.
///
/// Guards are blocking and must be dropped before any `.await`.
#[derive(Debug)]
pub struct SagaContext<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> SagaContext<T> {
  pub fn new(data: T) -> Self {
    SagaContext(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }
}

impl<T: Send + Sync + 'static> Clone for SagaContext<T> {
  fn clone(&self) -> Self {
    SagaContext(Arc::clone(&self.0))
  }
}
