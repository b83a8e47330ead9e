//! Concurrency tests for admission control.
//!
//! Concurrent requests from one client must never be admitted beyond the
//! limit, and clients must never share counters.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Integration tests can use unwrap/expect

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use ticketgate_admission::stores::MemoryRateLimitStore;
use ticketgate_admission::{AdmissionController, RatePolicy};
use ticketgate_core::environment::SystemClock;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_hits_admit_exactly_limit() {
    let controller = Arc::new(AdmissionController::new(
        MemoryRateLimitStore::new(),
        SystemClock,
    ));
    let policy = RatePolicy::new("orders", 5, Duration::from_secs(60)).unwrap();

    let tasks = (0..200).map(|_| {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.check("1.2.3.4", &policy).await.is_allowed() })
    });

    let admitted = join_all(tasks)
        .await
        .into_iter()
        .map(|result| result.expect("task should not panic"))
        .filter(|allowed| *allowed)
        .count();

    assert_eq!(admitted, 5);
    assert_eq!(
        controller.store().record("orders:1.2.3.4").unwrap().count,
        200
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_clients_do_not_share_state() {
    let controller = Arc::new(AdmissionController::new(
        MemoryRateLimitStore::new(),
        SystemClock,
    ));
    let policy = RatePolicy::general();

    let tasks = (0..50).flat_map(|client| {
        (0..policy.limit()).map(move |_| (client, policy))
    });
    let tasks = tasks.map(|(client, policy)| {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .check(&format!("10.0.0.{client}"), &policy)
                .await
                .is_allowed()
        })
    });

    let results = join_all(tasks).await;

    assert!(results.into_iter().all(|result| result.unwrap()));
    assert_eq!(controller.store().len(), 50);

    // Exhausting one client leaves the others untouched.
    assert!(!controller.check("10.0.0.1", &policy).await.is_allowed());
    assert!(controller.check("10.0.0.99", &policy).await.is_allowed());
}
