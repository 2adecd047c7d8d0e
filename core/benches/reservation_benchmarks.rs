use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use storefront::{
  CatalogProduct, CreateOrderRequest, InventoryLedger, LifecycleConfig, MemoryLedger, MemoryOrderStore,
  OrderLifecycle, Principal, RetryPolicy, Saga, SagaContext, SagaError,
};
use tokio::runtime::Runtime;
use uuid::Uuid;

// Large enough that no benchmark iteration runs out.
const BENCH_STOCK: u32 = u32::MAX;

fn bench_product() -> CatalogProduct {
  CatalogProduct {
    id: Uuid::new_v4(),
    title: "Bench Tea".to_string(),
    image: None,
    price_cents: 1_00,
    stock: BENCH_STOCK,
  }
}

fn bench_request(product_id: Uuid) -> CreateOrderRequest {
  CreateOrderRequest {
    product_id: Some(product_id.to_string()),
    qty: Some(1),
    payment_method: Some("Cash on Delivery".to_string()),
    customer_name: Some("Bench".to_string()),
    email: Some("bench@example.com".to_string()),
    phone: Some("01700000000".to_string()),
    physical_address: Some("1 Bench Street".to_string()),
    ..Default::default()
  }
}

fn bench_reserve_release(c: &mut Criterion) {
  let mut group = c.benchmark_group("LedgerReserveRelease");
  let rt = Runtime::new().unwrap();
  let product = bench_product();
  let ledger = Arc::new(MemoryLedger::with_products(vec![product.clone()]));

  group.throughput(Throughput::Elements(1));
  group.bench_function("single_task", |b| {
    b.to_async(&rt).iter(|| {
      let ledger = ledger.clone();
      async move {
        ledger.reserve(product.id, 1).await.unwrap();
        ledger.release(product.id, 1).await.unwrap();
      }
    });
  });
  group.finish();
}

fn bench_contended_reserve(c: &mut Criterion) {
  let mut group = c.benchmark_group("LedgerContendedReserve");
  let rt = Runtime::new().unwrap();

  for tasks in [1usize, 4, 16].iter() {
    let product = bench_product();
    let ledger = Arc::new(MemoryLedger::with_products(vec![product.clone()]));

    group.throughput(Throughput::Elements(*tasks as u64));
    group.bench_with_input(BenchmarkId::new("tasks", tasks), tasks, |b, &tasks| {
      b.to_async(&rt).iter(|| {
        let ledger = ledger.clone();
        async move {
          let handles: Vec<_> = (0..tasks)
            .map(|_| {
              let ledger = ledger.clone();
              tokio::spawn(async move { ledger.reserve(product.id, 1).await.unwrap() })
            })
            .collect();
          for handle in handles {
            handle.await.unwrap();
          }
        }
      });
    });
  }
  group.finish();
}

fn bench_create_order(c: &mut Criterion) {
  let mut group = c.benchmark_group("CreateOrder");
  let rt = Runtime::new().unwrap();
  let product = bench_product();
  let ledger = Arc::new(MemoryLedger::with_products(vec![product.clone()]));
  let lifecycle = Arc::new(OrderLifecycle::new(
    ledger,
    Arc::new(MemoryOrderStore::new()),
    LifecycleConfig::default(),
  ));
  let buyer = Principal::user("bench-user");

  group.bench_function("cash_on_delivery", |b| {
    b.to_async(&rt).iter_batched(
      || bench_request(product.id),
      |request| {
        let lifecycle = lifecycle.clone();
        let buyer = buyer.clone();
        async move { lifecycle.create_order(Some(&buyer), request).await.unwrap() }
      },
      criterion::BatchSize::SmallInput,
    );
  });
  group.finish();
}

fn bench_saga_compensation(c: &mut Criterion) {
  let mut group = c.benchmark_group("SagaCompensation");
  let rt = Runtime::new().unwrap();

  for steps in [2usize, 8].iter() {
    let names: Vec<String> = (0..*steps).map(|i| format!("step_{}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut saga = Saga::<u64, SagaError>::new("bench", &name_refs)
      .with_compensation_retry(RetryPolicy::new(1, Duration::ZERO));
    for (i, name) in names.iter().enumerate() {
      let fail = i + 1 == *steps;
      saga.on_action(name, move |ctx: SagaContext<u64>| async move {
        *ctx.write() += 1;
        if fail {
          return Err(SagaError::StepNotFound {
            step_name: "forced".to_string(),
          });
        }
        Ok(())
      });
      saga.on_compensate(name, |ctx: SagaContext<u64>| async move {
        *ctx.write() -= 1;
        Ok::<(), SagaError>(())
      });
    }
    let saga = Arc::new(saga);

    group.bench_with_input(BenchmarkId::new("steps", steps), steps, |b, _| {
      b.to_async(&rt).iter_batched(
        || SagaContext::new(0u64),
        |ctx| {
          let saga = saga.clone();
          async move { saga.run(ctx).await.unwrap_err() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_reserve_release,
  bench_contended_reserve,
  bench_create_order,
  bench_saga_compensation
);
criterion_main!(benches);
