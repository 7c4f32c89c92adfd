use criterion::{black_box, criterion_group, criterion_main, Criterion};
use optracker_core::models::{ExecutionRef, NewOperation, ResolutionChannel, TerminalTransition};
use optracker_core::registry::{InMemoryOperationRegistry, OperationRegistry};
use optracker_core::state_machine::{decide_transition, OperationStatus, TerminalStatus};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn transition(channel: ResolutionChannel) -> TerminalTransition {
    TerminalTransition::new(
        TerminalStatus::Succeeded,
        "available",
        json!({"ImageId": "ami-bench", "State": "available"}),
        channel,
    )
}

fn benchmark_decide_transition(c: &mut Criterion) {
    c.bench_function("decide_transition", |b| {
        b.iter(|| {
            decide_transition(
                black_box(OperationStatus::InProgress),
                black_box(OperationStatus::Succeeded),
            )
        })
    });
}

fn benchmark_register_and_apply(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let registry = Arc::new(InMemoryOperationRegistry::new());
    let sequence = AtomicU64::new(0);

    c.bench_function("register_then_apply_terminal", |b| {
        b.to_async(&runtime).iter(|| {
            let registry = registry.clone();
            let key = format!("ami-{}", sequence.fetch_add(1, Ordering::Relaxed));
            async move {
                registry
                    .register(NewOperation::new(&key, "image", ExecutionRef::new("exec")))
                    .await
                    .expect("register");
                registry
                    .try_apply_terminal(&key, &transition(ResolutionChannel::Poll))
                    .await
                    .expect("apply")
            }
        })
    });
}

fn benchmark_contended_apply(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let registry = Arc::new(InMemoryOperationRegistry::new());
    let sequence = AtomicU64::new(0);

    c.bench_function("push_poll_race_8_way", |b| {
        b.to_async(&runtime).iter(|| {
            let registry = registry.clone();
            let key = format!("ami-race-{}", sequence.fetch_add(1, Ordering::Relaxed));
            async move {
                registry
                    .register(NewOperation::new(&key, "image", ExecutionRef::new("exec")))
                    .await
                    .expect("register");

                let attempts = (0..8).map(|i| {
                    let registry = registry.clone();
                    let key = key.clone();
                    let channel = if i % 2 == 0 {
                        ResolutionChannel::Push
                    } else {
                        ResolutionChannel::Poll
                    };
                    tokio::spawn(async move {
                        registry
                            .try_apply_terminal(&key, &transition(channel))
                            .await
                            .expect("apply")
                    })
                });
                futures::future::join_all(attempts).await
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_decide_transition,
    benchmark_register_and_apply,
    benchmark_contended_apply
);
criterion_main!(benches);
