// storefront/src/saga/execution.rs

//! `Saga::run()`: forward actions in order, compensations in reverse on failure.

use super::context::SagaContext;
use super::definition::Saga;
use crate::error::SagaError;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Executes the saga against `ctx`.
  ///
  /// The definition is checked before any action runs, so a misconfigured saga
  /// never leaves half-applied effects behind.
  #[instrument(
    name = "Saga::run",
    skip_all,
    fields(saga = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: SagaContext<TData>) -> Result<(), Err> {
    if let Some(step_name) = self.unknown_steps.first() {
      return Err(Err::from(SagaError::StepNotFound {
        step_name: step_name.clone(),
      }));
    }
    if let Some(step) = self.steps.iter().find(|s| s.action.is_none()) {
      return Err(Err::from(SagaError::HandlerMissing {
        step_name: step.name.clone(),
      }));
    }

    let mut completed: Vec<usize> = Vec::with_capacity(self.steps.len());
    for (step_idx, step) in self.steps.iter().enumerate() {
      let Some(action) = step.action.as_ref() else {
        continue;
      };
      let span = info_span!("saga_step", step_name = %step.name, step_index = step_idx);
      match action(ctx.clone()).instrument(span).await {
        Ok(()) => {
          event!(Level::DEBUG, step_name = %step.name, "Step completed.");
          completed.push(step_idx);
        }
        Err(e) => {
          event!(Level::WARN, step_name = %step.name, error = %e, "Step failed, compensating completed steps.");
          self.compensate(&ctx, &completed).await?;
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Saga completed.");
    Ok(())
  }

  /// Undoes `completed` in reverse. A compensation that exhausts its retries
  /// does not stop the others; the first such failure is reported once every
  /// step has been tried.
  async fn compensate(&self, ctx: &SagaContext<TData>, completed: &[usize]) -> Result<(), Err> {
    let max_attempts = self.compensation_retry.attempts();
    let mut first_failure: Option<SagaError> = None;

    for &step_idx in completed.iter().rev() {
      let step = &self.steps[step_idx];
      let Some(compensation) = step.compensation.as_ref() else {
        continue;
      };

      let mut attempt = 0;
      loop {
        attempt += 1;
        let span = info_span!("saga_compensation", step_name = %step.name, attempt);
        match compensation(ctx.clone()).instrument(span).await {
          Ok(()) => {
            event!(Level::INFO, step_name = %step.name, attempt, "Compensation applied.");
            break;
          }
          Err(e) if attempt < max_attempts => {
            event!(Level::WARN, step_name = %step.name, attempt, error = %e, "Compensation failed, retrying.");
            tokio::time::sleep(self.compensation_retry.delay_after(attempt)).await;
          }
          Err(e) => {
            event!(Level::ERROR, step_name = %step.name, attempts = attempt, error = %e, "Compensation exhausted its retries.");
            first_failure.get_or_insert(SagaError::CompensationFailed {
              saga: self.name.clone(),
              step_name: step.name.clone(),
              attempts: attempt,
              source: anyhow::Error::new(e),
            });
            break;
          }
        }
      }
    }

    match first_failure {
      Some(failure) => Err(Err::from(failure)),
      None => Ok(()),
    }
  }
}
