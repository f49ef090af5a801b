//! End-to-end pool behavior: submission, result handles, stealing,
//! overflow, nested submission, and the parallel drivers.

use quarry::{
    parallel_for, parallel_map_reduce, parallel_reduce, ErrorKind, PoolConfig, StealPolicy,
    ThreadPool,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn pool_with(threads: usize) -> ThreadPool {
    init_test_logging();
    ThreadPool::with_config(PoolConfig {
        threads,
        ..PoolConfig::default()
    })
    .expect("pool construction")
}

#[test]
fn basic_ten_tasks_all_execute() {
    let pool = pool_with(4);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..10 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .expect("submit");
    }
    pool.wait();

    assert_eq!(counter.load(Ordering::Relaxed), 10);
    let stats = pool.stats();
    assert_eq!(stats.tasks_submitted, 10);
    assert_eq!(stats.tasks_executed, 10);
}

#[test]
fn future_arithmetic() {
    let pool = pool_with(2);

    let (a, b) = (10, 20);
    let sum = pool
        .submit_task(move || a + b)
        .expect("submit_task")
        .join()
        .expect("join");
    assert_eq!(sum, 30);

    let answer = pool
        .submit_task(|| 42)
        .expect("submit_task")
        .join()
        .expect("join");
    assert_eq!(answer, 42);
}

#[test]
fn handle_polling_and_timed_wait() {
    let pool = pool_with(2);
    let (release, gate) = mpsc::channel::<()>();

    let handle = pool
        .submit_task(move || {
            gate.recv().expect("gate open");
            "released"
        })
        .expect("submit_task");

    assert!(!handle.is_finished());
    assert!(
        !handle.wait_timeout(Duration::from_millis(10)),
        "timed wait must expire while the task is gated"
    );

    release.send(()).expect("release task");
    assert!(
        handle.wait_timeout(Duration::from_secs(5)),
        "task should finish once released"
    );
    assert_eq!(handle.join().expect("join"), "released");
}

#[test]
fn failing_tasks_leave_siblings_and_quiescence_intact() {
    let pool = pool_with(4);
    let successful = Arc::new(AtomicUsize::new(0));

    for i in 0..20 {
        let successful = Arc::clone(&successful);
        pool.submit(move || {
            assert!(i % 5 != 0, "task {i} failing on purpose");
            successful.fetch_add(1, Ordering::Relaxed);
        })
        .expect("submit");
    }
    pool.wait();

    // Indices 0, 5, 10, 15 panic; the other 16 complete.
    assert_eq!(successful.load(Ordering::Relaxed), 16);
    let stats = pool.stats();
    assert_eq!(stats.tasks_submitted, 20);
    assert_eq!(
        stats.tasks_executed, 20,
        "panicking tasks still count as executed"
    );
}

#[test]
fn handle_surfaces_task_panic() {
    let pool = pool_with(2);
    let handle = pool
        .submit_task(|| -> i32 { panic!("something went wrong") })
        .expect("submit_task");

    let err = handle.join().expect_err("panic must surface");
    assert_eq!(err.kind(), ErrorKind::TaskPanicked);
    assert_eq!(err.message(), Some("something went wrong"));
}

#[test]
fn nested_submission_from_inside_tasks() {
    let pool = Arc::new(pool_with(4));
    let outer = Arc::new(AtomicUsize::new(0));
    let inner = Arc::new(AtomicUsize::new(0));

    for _ in 0..10 {
        let pool_ref = Arc::clone(&pool);
        let outer = Arc::clone(&outer);
        let inner = Arc::clone(&inner);
        pool.submit(move || {
            outer.fetch_add(1, Ordering::Relaxed);
            for _ in 0..5 {
                let inner = Arc::clone(&inner);
                pool_ref
                    .submit(move || {
                        inner.fetch_add(1, Ordering::Relaxed);
                    })
                    .expect("nested submit");
            }
        })
        .expect("submit");
    }
    pool.wait();

    assert_eq!(outer.load(Ordering::Relaxed), 10);
    assert_eq!(inner.load(Ordering::Relaxed), 50);
}

#[test]
fn overflow_spills_into_global_queue() {
    init_test_logging();
    let pool = ThreadPool::with_config(PoolConfig {
        threads: 2,
        max_queue_tasks: 10,
        ..PoolConfig::default()
    })
    .expect("pool construction");

    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..100 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            std::thread::sleep(Duration::from_millis(10));
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .expect("submit");
    }
    pool.wait();

    // Two deques of capacity 10 cannot hold 100 sleeping tasks, so the
    // global queue must have carried the spillover without losing any.
    assert_eq!(counter.load(Ordering::Relaxed), 100);
    assert_eq!(pool.stats().tasks_executed, 100);
}

#[test]
fn both_steal_policies_complete_all_work() {
    for policy in [StealPolicy::Random, StealPolicy::RoundRobin] {
        init_test_logging();
        let pool = ThreadPool::with_config(PoolConfig {
            threads: 4,
            steal_policy: policy,
            ..PoolConfig::default()
        })
        .expect("pool construction");

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..200 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .expect("submit");
        }
        pool.wait();

        assert_eq!(
            counter.load(Ordering::Relaxed),
            200,
            "policy {policy:?} lost work"
        );
    }
}

#[test]
fn steal_counters_are_consistent() {
    init_test_logging();
    // A long idle park keeps workers from probing peers after the work is
    // done, so the counters settle to an exact snapshot.
    let pool = ThreadPool::with_config(PoolConfig {
        threads: 4,
        idle_sleep: Duration::from_secs(600),
        ..PoolConfig::default()
    })
    .expect("pool construction");

    for _ in 0..500 {
        pool.submit(|| {
            std::thread::sleep(Duration::from_micros(100));
        })
        .expect("submit");
    }
    pool.wait();
    // Let the final in-flight passes finish before reading.
    std::thread::sleep(Duration::from_millis(200));

    let stats = pool.stats();
    assert_eq!(stats.tasks_submitted, 500);
    assert_eq!(stats.tasks_executed, 500);
    assert!(
        stats.tasks_stolen <= stats.steal_attempts,
        "stolen {} must not exceed attempts {}",
        stats.tasks_stolen,
        stats.steal_attempts
    );
    assert_eq!(
        stats.failed_steals,
        stats.steal_attempts - stats.tasks_stolen,
        "every attempt either succeeds or fails"
    );
}

#[test]
fn single_thread_pool_runs_everything_locally() {
    let pool = pool_with(1);
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..50 {
        let counter = Arc::clone(&counter);
        pool.submit(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .expect("submit");
    }
    pool.wait();

    assert_eq!(counter.load(Ordering::Relaxed), 50);
    let stats = pool.stats();
    assert_eq!(stats.tasks_submitted, 50);
    assert_eq!(stats.tasks_executed, 50);
}

#[test]
fn invalid_configurations_are_rejected() {
    init_test_logging();
    let err = ThreadPool::with_config(PoolConfig {
        threads: 0,
        ..PoolConfig::default()
    })
    .expect_err("zero threads must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);

    let err = ThreadPool::with_config(PoolConfig {
        steal_attempts: 0,
        ..PoolConfig::default()
    })
    .expect_err("zero steal attempts must be rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn parallel_for_visits_every_index_once() {
    let pool = pool_with(4);
    let cells: Arc<Vec<AtomicUsize>> = Arc::new((0..10_000).map(|_| AtomicUsize::new(0)).collect());

    let body_cells = Arc::clone(&cells);
    parallel_for(
        &pool,
        0,
        10_000,
        move |i| {
            body_cells[i].fetch_add(1, Ordering::Relaxed);
        },
        256,
    )
    .expect("parallel_for");

    for (i, cell) in cells.iter().enumerate() {
        assert_eq!(cell.load(Ordering::Relaxed), 1, "index {i} visit count");
    }
}

#[test]
fn parallel_for_small_range_runs_inline() {
    let pool = pool_with(2);
    let counter = Arc::new(AtomicUsize::new(0));

    let body_counter = Arc::clone(&counter);
    parallel_for(
        &pool,
        0,
        8,
        move |_| {
            body_counter.fetch_add(1, Ordering::Relaxed);
        },
        64,
    )
    .expect("parallel_for");

    assert_eq!(counter.load(Ordering::Relaxed), 8);
    assert_eq!(
        pool.stats().tasks_submitted,
        0,
        "a range within one chunk must not touch the pool"
    );
}

#[test]
fn parallel_for_empty_range_is_a_no_op() {
    let pool = pool_with(2);
    parallel_for(&pool, 5, 5, |_| unreachable!("empty range"), 16).expect("parallel_for");
}

#[test]
fn parallel_for_propagates_chunk_panic() {
    let pool = pool_with(2);
    let err = parallel_for(
        &pool,
        0,
        1000,
        |i| assert!(i != 7, "index 7 failing on purpose"),
        10,
    )
    .expect_err("chunk panic must propagate");
    assert_eq!(err.kind(), ErrorKind::TaskPanicked);
    pool.wait();
}

#[test]
fn parallel_reduce_sums_range() {
    let pool = pool_with(4);
    let total = parallel_reduce(
        &pool,
        0,
        1000,
        0_u64,
        |i| i as u64,
        |acc, value| acc + value,
        64,
    )
    .expect("parallel_reduce");
    assert_eq!(total, 499_500);
}

#[test]
fn parallel_reduce_small_range_runs_inline() {
    let pool = pool_with(2);
    let total = parallel_reduce(
        &pool,
        1,
        5,
        1_u64,
        |i| i as u64,
        |acc, value| acc * value,
        1024,
    )
    .expect("parallel_reduce");
    assert_eq!(total, 24, "1 * 1 * 2 * 3 * 4");
    assert_eq!(pool.stats().tasks_submitted, 0);
}

#[test]
fn parallel_map_reduce_matches_sequential_sum() {
    let pool = pool_with(4);
    let total = parallel_map_reduce(&pool, 0, 4096, 0_u64, |i| (i * i) as u64, 128)
        .expect("parallel_map_reduce");

    let expected: u64 = (0..4096_u64).map(|i| i * i).sum();
    assert_eq!(total, expected);
}
