//! Benchmarks for error admission and handler fan-out.
//!
//! Run with: cargo bench --bench dispatch

use std::{
    hint::black_box,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use catchlight::{
    CaptureState, ErrorEnricher, HydrationErrorState, HydrationStateStore, JsError, Subscription,
    state::handler,
};

const HYDRATION_MESSAGE: &str =
    "Hydration failed because the initial UI does not match what was rendered on the server.";

fn new_state(consumers: usize) -> (CaptureState, Vec<Subscription>, Arc<AtomicUsize>) {
    let store = HydrationStateStore::new();
    store.set(HydrationErrorState {
        warning: Some(vec!["Warning: Text content did not match.".to_string()]),
        server_content: Some("server".to_string()),
        client_content: Some("client".to_string()),
        ..HydrationErrorState::default()
    });
    let state = CaptureState::new(ErrorEnricher::new(Arc::new(store)));

    let delivered = Arc::new(AtomicUsize::new(0));
    let subscriptions = (0..consumers)
        .map(|_| {
            let errors = Arc::clone(&delivered);
            let rejections = Arc::clone(&delivered);
            state.subscribe(
                handler(move |_| {
                    errors.fetch_add(1, Ordering::Relaxed);
                }),
                handler(move |_| {
                    rejections.fetch_add(1, Ordering::Relaxed);
                }),
            )
        })
        .collect();
    (state, subscriptions, delivered)
}

fn bench_handle_error(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_error");

    for consumers in [1, 4, 16] {
        group.bench_with_input(
            BenchmarkId::new("ordinary", consumers),
            &consumers,
            |b, &consumers| {
                b.iter_batched(
                    || new_state(consumers),
                    |(state, subscriptions, delivered)| {
                        state.handle_error(black_box(JsError::new("boom").into()));
                        black_box((subscriptions, delivered.load(Ordering::Relaxed)))
                    },
                    BatchSize::SmallInput,
                );
            },
        );

        group.bench_with_input(
            BenchmarkId::new("hydration", consumers),
            &consumers,
            |b, &consumers| {
                b.iter_batched(
                    || new_state(consumers),
                    |(state, subscriptions, delivered)| {
                        state.handle_error(black_box(JsError::new(HYDRATION_MESSAGE).into()));
                        black_box((subscriptions, delivered.load(Ordering::Relaxed)))
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_subscribe_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("subscribe_replay");

    for history in [16, 256] {
        let (state, _subscriptions, _) = new_state(0);
        for index in 0..history {
            state.handle_error(JsError::new(format!("error {index}")).into());
            state.handle_rejection(JsError::new(format!("rejection {index}")).into());
        }

        group.bench_with_input(BenchmarkId::from_parameter(history), &state, |b, state| {
            b.iter(|| {
                let seen = Arc::new(AtomicUsize::new(0));
                let errors = Arc::clone(&seen);
                let rejections = Arc::clone(&seen);
                let subscription = state.subscribe(
                    handler(move |_| {
                        errors.fetch_add(1, Ordering::Relaxed);
                    }),
                    handler(move |_| {
                        rejections.fetch_add(1, Ordering::Relaxed);
                    }),
                );
                subscription.unsubscribe();
                black_box(seen.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_handle_error, bench_subscribe_replay);
criterion_main!(benches);
