//! Integration tests for the latest-wins execution layer.
//!
//! These tests verify the complete worker workflow including:
//! - Overlapping submissions superseding each other
//! - Cooperative cancellation reaching the running task
//! - Output publication to early and late subscribers
//! - Recovery after an explicit cancel

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::Notify;

use arbora::executor::Worker;

// ============================================================================
// Test Helpers
// ============================================================================

/// Worker that multiplies by ten after a short simulated fetch, counting
/// every invocation. It ignores its cancellation token, like a task that
/// never yields control to it.
fn slow_worker(counter: Arc<AtomicUsize>, delay: Duration) -> Worker<u64, u64> {
    Worker::new(move |input, _token| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            input * 10
        }
        .boxed()
    })
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_overlapping_submissions_keep_only_the_latest() {
    let counter = Arc::new(AtomicUsize::new(0));
    let worker = slow_worker(counter.clone(), Duration::from_millis(5));
    let mut rx = worker.output().subscribe();

    let (first, second, third) =
        tokio::join!(worker.submit(1), worker.submit(2), worker.submit(3));

    assert_eq!(first, None);
    assert_eq!(second, None);
    assert_eq!(third, Some(30));
    // Every submission ran; the superseded ones just went unreported.
    assert_eq!(counter.load(Ordering::SeqCst), 3);

    assert_eq!(rx.recv().await.unwrap(), 30);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_cancellation_reaches_the_running_task() {
    let observed_cancel = Arc::new(AtomicBool::new(false));
    let started = Arc::new(Notify::new());

    let worker: Arc<Worker<&'static str, String>> = Arc::new(Worker::new({
        let observed_cancel = observed_cancel.clone();
        let started = started.clone();
        move |input: &'static str, token| {
            let observed_cancel = observed_cancel.clone();
            let started = started.clone();
            async move {
                started.notify_one();
                tokio::select! {
                    _ = token.cancelled() => {
                        observed_cancel.store(true, Ordering::SeqCst);
                        format!("{input}: cancelled")
                    }
                    _ = tokio::time::sleep(Duration::from_secs(30)) => {
                        format!("{input}: finished")
                    }
                }
            }
            .boxed()
        }
    }));

    let in_flight = {
        let worker = worker.clone();
        tokio::spawn(async move { worker.submit("slow-fetch").await })
    };
    started.notified().await;

    worker.cancel();

    let output = tokio::select! {
        result = in_flight => result.unwrap(),
        _ = tokio::time::sleep(Duration::from_secs(2)) => {
            panic!("cancelled task did not finish");
        }
    };

    // The task saw the cancel, but its output was discarded.
    assert!(observed_cancel.load(Ordering::SeqCst));
    assert_eq!(output, None);
}

#[tokio::test]
async fn test_new_submission_after_cancel_publishes() {
    let counter = Arc::new(AtomicUsize::new(0));
    let worker = slow_worker(counter, Duration::from_millis(1));

    worker.cancel();

    let mut rx = worker.output().subscribe();
    assert_eq!(worker.submit(4).await, Some(40));
    assert_eq!(rx.recv().await.unwrap(), 40);
}

#[tokio::test]
async fn test_next_value_observes_a_concurrent_submission() {
    let counter = Arc::new(AtomicUsize::new(0));
    let worker = Arc::new(slow_worker(counter, Duration::from_millis(5)));

    let waiter = {
        let worker = worker.clone();
        tokio::spawn(async move { worker.output().next_value().await })
    };
    // Give the waiter time to subscribe before anything is published.
    tokio::time::sleep(Duration::from_millis(20)).await;

    worker.submit(7).await;

    let value = tokio::select! {
        result = waiter => result.unwrap(),
        _ = tokio::time::sleep(Duration::from_secs(2)) => {
            panic!("next_value never resolved");
        }
    };
    assert_eq!(value, Some(70));
}
