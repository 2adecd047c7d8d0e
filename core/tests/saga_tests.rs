// tests/saga_tests.rs
mod common;

use common::setup_tracing;
use serial_test::serial;
use std::time::Duration;
use storefront::{RetryPolicy, Saga, SagaContext, SagaError};

#[derive(Debug, Default)]
struct Journal {
  entries: Vec<String>,
  compensation_failures_left: u32,
}

#[derive(Debug, thiserror::Error)]
enum JournalError {
  #[error("step failed: {0}")]
  Step(String),
  #[error("saga error: {0}")]
  Saga(#[from] SagaError),
}

fn record(ctx: &SagaContext<Journal>, entry: &str) {
  ctx.write().entries.push(entry.to_string());
}

fn three_step_saga() -> Saga<Journal, JournalError> {
  let mut saga = Saga::<Journal, JournalError>::new("journal", &["a", "b", "c"])
    .with_compensation_retry(RetryPolicy::new(3, Duration::from_millis(1)));
  for step in ["a", "b"] {
    saga.on_action(step, move |ctx: SagaContext<Journal>| async move {
      record(&ctx, &format!("do {step}"));
      Ok::<(), JournalError>(())
    });
    saga.on_compensate(step, move |ctx: SagaContext<Journal>| async move {
      record(&ctx, &format!("undo {step}"));
      Ok::<(), JournalError>(())
    });
  }
  saga
}

#[tokio::test]
#[serial]
async fn test_all_steps_run_in_order_without_compensation() {
  setup_tracing();
  let mut saga = three_step_saga();
  saga.on_action("c", |ctx: SagaContext<Journal>| async move {
    record(&ctx, "do c");
    Ok::<(), JournalError>(())
  });

  let ctx = SagaContext::new(Journal::default());
  saga.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().entries, vec!["do a", "do b", "do c"]);
  assert_eq!(saga.step_names(), vec!["a", "b", "c"]);
}

#[tokio::test]
#[serial]
async fn test_failure_compensates_completed_steps_in_reverse() {
  setup_tracing();
  let mut saga = three_step_saga();
  saga.on_action("c", |ctx: SagaContext<Journal>| async move {
    record(&ctx, "do c");
    Err::<(), JournalError>(JournalError::Step("c".to_string()))
  });
  saga.on_compensate("c", |ctx: SagaContext<Journal>| async move {
    record(&ctx, "undo c");
    Ok::<(), JournalError>(())
  });

  let ctx = SagaContext::new(Journal::default());
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert!(matches!(err, JournalError::Step(ref s) if s == "c"));
  assert_eq!(ctx.read().entries, vec!["do a", "do b", "do c", "undo b", "undo a"]);
}

#[tokio::test]
#[serial]
async fn test_compensation_is_retried() {
  setup_tracing();
  let mut saga = Saga::<Journal, JournalError>::new("retrying", &["a", "b"])
    .with_compensation_retry(RetryPolicy::new(3, Duration::from_millis(1)));
  saga.on_action("a", |_ctx: SagaContext<Journal>| async move { Ok::<(), JournalError>(()) });
  saga.on_compensate("a", |ctx: SagaContext<Journal>| async move {
    let mut guard = ctx.write();
    if guard.compensation_failures_left > 0 {
      guard.compensation_failures_left -= 1;
      guard.entries.push("undo a failed".to_string());
      return Err(JournalError::Step("undo a".to_string()));
    }
    guard.entries.push("undo a".to_string());
    Ok(())
  });
  saga.on_action("b", |_ctx: SagaContext<Journal>| async move {
    Err::<(), JournalError>(JournalError::Step("b".to_string()))
  });

  let ctx = SagaContext::new(Journal {
    compensation_failures_left: 2,
    ..Journal::default()
  });
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert!(matches!(err, JournalError::Step(ref s) if s == "b"));
  assert_eq!(ctx.read().entries, vec!["undo a failed", "undo a failed", "undo a"]);
}

#[tokio::test]
#[serial]
async fn test_exhausted_compensation_reports_the_step() {
  setup_tracing();
  let mut saga = Saga::<Journal, JournalError>::new("stuck", &["a", "b"])
    .with_compensation_retry(RetryPolicy::new(2, Duration::from_millis(1)));
  saga.on_action("a", |_ctx: SagaContext<Journal>| async move { Ok::<(), JournalError>(()) });
  saga.on_compensate("a", |_ctx: SagaContext<Journal>| async move {
    Err::<(), JournalError>(JournalError::Step("undo a".to_string()))
  });
  saga.on_action("b", |_ctx: SagaContext<Journal>| async move {
    Err::<(), JournalError>(JournalError::Step("b".to_string()))
  });

  let err = saga.run(SagaContext::new(Journal::default())).await.unwrap_err();

  match err {
    JournalError::Saga(SagaError::CompensationFailed {
      saga,
      step_name,
      attempts,
      ..
    }) => {
      assert_eq!(saga, "stuck");
      assert_eq!(step_name, "a");
      assert_eq!(attempts, 2);
    }
    other => panic!("expected CompensationFailed, got {other:?}"),
  }
}

#[tokio::test]
#[serial]
async fn test_exhausted_compensation_does_not_skip_earlier_steps() {
  setup_tracing();
  let mut saga = three_step_saga();
  saga.on_compensate("b", |ctx: SagaContext<Journal>| async move {
    record(&ctx, "undo b failed");
    Err::<(), JournalError>(JournalError::Step("undo b".to_string()))
  });
  saga.on_action("c", |_ctx: SagaContext<Journal>| async move {
    Err::<(), JournalError>(JournalError::Step("c".to_string()))
  });

  let ctx = SagaContext::new(Journal::default());
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert!(
    matches!(err, JournalError::Saga(SagaError::CompensationFailed { ref step_name, attempts: 3, .. }) if step_name == "b"),
    "got {err:?}"
  );
  assert_eq!(
    ctx.read().entries,
    vec!["do a", "do b", "undo b failed", "undo b failed", "undo b failed", "undo a"]
  );
}

#[tokio::test]
#[serial]
async fn test_missing_action_is_rejected_before_any_step_runs() {
  setup_tracing();
  let saga = three_step_saga();

  let ctx = SagaContext::new(Journal::default());
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert!(matches!(err, JournalError::Saga(SagaError::HandlerMissing { ref step_name }) if step_name == "c"));
  assert!(ctx.read().entries.is_empty());
}

#[tokio::test]
#[serial]
async fn test_handler_for_unknown_step_is_reported() {
  setup_tracing();
  let mut saga = three_step_saga();
  saga.on_action("c", |_ctx: SagaContext<Journal>| async move { Ok::<(), JournalError>(()) });
  saga.on_compensate("z", |_ctx: SagaContext<Journal>| async move { Ok::<(), JournalError>(()) });

  let ctx = SagaContext::new(Journal::default());
  let err = saga.run(ctx.clone()).await.unwrap_err();

  assert!(matches!(err, JournalError::Saga(SagaError::StepNotFound { ref step_name }) if step_name == "z"));
  assert!(ctx.read().entries.is_empty());
}
