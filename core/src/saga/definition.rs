// storefront/src/saga/definition.rs

//! The `Saga<TData, Err>` definition: an ordered list of named steps, each with
//! a forward action and an optional compensation.

use super::context::SagaContext;
use crate::error::SagaError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed async step handler operating on the shared saga context.
pub type StepHandler<TData, Err> =
  Box<dyn Fn(SagaContext<TData>) -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>> + Send + Sync>;

pub(crate) struct StepDef<TData, Err>
where
  TData: 'static + Send + Sync,
{
  pub(crate) name: String,
  pub(crate) action: Option<StepHandler<TData, Err>>,
  pub(crate) compensation: Option<StepHandler<TData, Err>>,
}

/// Bounded retry applied to compensations. Actions are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one. Treated as at least 1.
  pub max_attempts: u32,
  /// Delay before the second attempt; grows linearly with each further attempt.
  pub backoff: Duration,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, backoff: Duration) -> Self {
    Self { max_attempts, backoff }
  }

  pub(crate) fn attempts(&self) -> u32 {
    self.max_attempts.max(1)
  }

  pub(crate) fn delay_after(&self, attempt: u32) -> Duration {
    self.backoff.saturating_mul(attempt)
  }
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      backoff: Duration::from_millis(50),
    }
  }
}

/// A multi-step operation across resources with explicit compensation.
///
/// When a step's action fails, the compensations of all previously completed
/// steps run in reverse order, then the action's error is returned. If a
/// compensation keeps failing after its retries, the run ends with
/// [`SagaError::CompensationFailed`] converted into `Err`.
pub struct Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData, Err>>,
  pub(crate) compensation_retry: RetryPolicy,
  /// Handlers registered against names that are not steps; reported by `run`.
  pub(crate) unknown_steps: Vec<String>,
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>, step_names: &[&str]) -> Self {
    Self {
      name: name.into(),
      steps: step_names
        .iter()
        .map(|name| StepDef {
          name: (*name).to_string(),
          action: None,
          compensation: None,
        })
        .collect(),
      compensation_retry: RetryPolicy::default(),
      unknown_steps: Vec::new(),
    }
  }

  pub fn with_compensation_retry(mut self, policy: RetryPolicy) -> Self {
    self.compensation_retry = policy;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Sets the forward action of `step_name`, replacing any previous one.
  pub fn on_action<F, Fut>(&mut self, step_name: &str, handler: F) -> &mut Self
  where
    F: Fn(SagaContext<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    let boxed = box_handler(handler);
    match self.step_mut(step_name) {
      Some(step) => step.action = Some(boxed),
      None => self.unknown_steps.push(step_name.to_string()),
    }
    self
  }

  /// Sets the compensation of `step_name`. It runs only if the step's action
  /// succeeded and a later step failed.
  pub fn on_compensate<F, Fut>(&mut self, step_name: &str, handler: F) -> &mut Self
  where
    F: Fn(SagaContext<TData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Err>> + Send + 'static,
  {
    let boxed = box_handler(handler);
    match self.step_mut(step_name) {
      Some(step) => step.compensation = Some(boxed),
      None => self.unknown_steps.push(step_name.to_string()),
    }
    self
  }

  fn step_mut(&mut self, step_name: &str) -> Option<&mut StepDef<TData, Err>> {
    self.steps.iter_mut().find(|s| s.name == step_name)
  }
}

fn box_handler<TData, Err, F, Fut>(handler: F) -> StepHandler<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: 'static,
  F: Fn(SagaContext<TData>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<(), Err>> + Send + 'static,
{
  Box::new(move |ctx: SagaContext<TData>| -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>> {
    Box::pin(handler(ctx))
  })
}
