//! Unit tests for thread_pool.rs

use crate::error::Error;
use crate::thread_pool::{ThreadPool, ThreadPoolState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
fn test_new_pool_is_unstarted() {
    let pool = ThreadPool::new();
    assert_eq!(pool.state(), ThreadPoolState::Unstarted);
    assert_eq!(pool.thread_count(), 0);
    assert!(matches!(pool.add_job(|| {}), Err(Error::InvalidState(_))));
}

#[test]
fn test_set_thread_count_spawns_workers() {
    let mut pool = ThreadPool::new();
    pool.set_thread_count(3).unwrap();
    assert_eq!(pool.state(), ThreadPoolState::Running);
    assert_eq!(pool.thread_count(), 3);
}

#[test]
fn test_set_thread_count_zero_is_rejected() {
    let mut pool = ThreadPool::new();
    assert!(matches!(pool.set_thread_count(0), Err(Error::InvalidConfiguration(_))));
    assert_eq!(pool.state(), ThreadPoolState::Unstarted);
}

#[test]
fn test_set_thread_count_twice_is_rejected() {
    let mut pool = ThreadPool::with_threads(2).unwrap();
    assert!(matches!(pool.set_thread_count(4), Err(Error::InvalidState(_))));
    assert_eq!(pool.thread_count(), 2);
}

#[test]
fn test_shutdown_is_idempotent() {
    let mut pool = ThreadPool::with_threads(2).unwrap();
    pool.shutdown();
    pool.shutdown();
    assert_eq!(pool.state(), ThreadPoolState::Shutdown);
    assert_eq!(pool.thread_count(), 0);
    assert!(pool.add_job(|| {}).is_err());
}

#[test]
fn test_shutdown_runs_already_queued_jobs() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut pool = ThreadPool::with_threads(1).unwrap();
    for _ in 0..5 {
        let counter = Arc::clone(&counter);
        pool.add_job(move || {
            thread::sleep(Duration::from_millis(2));
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    pool.shutdown();
    assert_eq!(counter.load(Ordering::SeqCst), 5);
}

// ============================================================================
// BATCH WAIT
// ============================================================================

#[test]
fn test_wait_returns_only_after_every_job_finished() {
    let pool = ThreadPool::with_threads(4).unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    for i in 0..16 {
        let finished = Arc::clone(&finished);
        pool.add_job(move || {
            thread::sleep(Duration::from_millis((i % 4) as u64 * 3));
            // Final instruction of the job
            finished.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    pool.wait().unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 16);
    assert_eq!(pool.pending_jobs(), 0);
}

#[test]
fn test_wait_is_reusable_across_batches() {
    let pool = ThreadPool::with_threads(4).unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    for frame in 1..=10 {
        for _ in 0..4 {
            let finished = Arc::clone(&finished);
            pool.add_job(move || {
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.wait().unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), frame * 4);
    }
}

#[test]
fn test_wait_with_no_jobs_returns_immediately() {
    let pool = ThreadPool::with_threads(2).unwrap();
    pool.wait().unwrap();
}

#[test]
fn test_jobs_on_one_worker_run_in_fifo_order() {
    let pool = ThreadPool::with_threads(3).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..20 {
        let order = Arc::clone(&order);
        pool.add_job_on(1, move || {
            order.lock().unwrap().push(i);
        })
        .unwrap();
    }
    pool.wait().unwrap();

    assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
}

#[test]
fn test_add_job_on_runs_on_the_named_worker() {
    let pool = ThreadPool::with_threads(3).unwrap();
    let name = Arc::new(Mutex::new(String::new()));

    let captured = Arc::clone(&name);
    pool.add_job_on(2, move || {
        *captured.lock().unwrap() = thread::current().name().unwrap_or_default().to_string();
    })
    .unwrap();
    pool.wait().unwrap();

    assert_eq!(*name.lock().unwrap(), "strata-worker-2");
}

#[test]
fn test_round_robin_spreads_jobs_across_workers() {
    let pool = ThreadPool::with_threads(4).unwrap();
    let names = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..4 {
        let names = Arc::clone(&names);
        pool.add_job(move || {
            names.lock().unwrap().push(thread::current().name().unwrap_or_default().to_string());
        })
        .unwrap();
    }
    pool.wait().unwrap();

    let mut names = names.lock().unwrap().clone();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 4);
}

#[test]
#[should_panic(expected = "worker index 5 out of range")]
fn test_add_job_on_out_of_range_panics() {
    let pool = ThreadPool::with_threads(2).unwrap();
    let _ = pool.add_job_on(5, || {});
}

#[test]
fn test_producers_on_several_threads() {
    let pool = Arc::new(ThreadPool::with_threads(4).unwrap());
    let finished = Arc::new(AtomicUsize::new(0));

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                for _ in 0..25 {
                    let finished = Arc::clone(&finished);
                    pool.add_job(move || {
                        finished.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    pool.wait().unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 100);
}

// ============================================================================
// PANICS
// ============================================================================

#[test]
fn test_panicking_job_surfaces_in_wait() {
    let pool = ThreadPool::with_threads(2).unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    pool.add_job_on(0, || panic!("recording failed")).unwrap();
    for _ in 0..3 {
        let finished = Arc::clone(&finished);
        pool.add_job_on(1, move || {
            finished.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }

    assert_eq!(pool.wait(), Err(Error::JobPanicked(1)));
    assert_eq!(finished.load(Ordering::SeqCst), 3);
}

#[test]
fn test_worker_survives_a_panicking_job() {
    let pool = ThreadPool::with_threads(1).unwrap();
    pool.add_job(|| panic!("first job fails")).unwrap();
    assert!(pool.wait().is_err());

    let finished = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&finished);
    pool.add_job(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    // Panic counter was cleared by the previous wait
    pool.wait().unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}
