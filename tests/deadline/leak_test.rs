/*!
 * Resource Leak Tests
 * Registry and worker threads return to baseline after mixed load
 */

use deadline_guard::{DeadlineConfig, DeadlineExecutor};
use serial_test::serial;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

const CALLERS: usize = 64;

fn wait_for_workers(executor: &DeadlineExecutor, baseline: usize, grace: Duration) -> usize {
    let start = Instant::now();
    while executor.live_workers() > baseline && start.elapsed() < grace {
        thread::sleep(Duration::from_millis(5));
    }
    executor.live_workers()
}

#[test]
#[serial]
fn test_registry_empty_after_mixed_calls() {
    let executor = DeadlineExecutor::new(DeadlineConfig::low_latency()).unwrap();
    let baseline = executor.live_workers();

    let callers: Vec<_> = (0..CALLERS)
        .map(|i| {
            let executor = executor.clone();
            thread::spawn(move || match i % 4 {
                0 => executor
                    .run_with_deadline(move || Ok::<_, io::Error>(i), Duration::from_secs(1))
                    .is_ok(),
                1 => executor
                    .run_with_deadline(
                        || Err::<usize, _>(io::Error::other("failed")),
                        Duration::from_secs(1),
                    )
                    .is_err(),
                2 => executor
                    .run_interruptible(
                        |token| {
                            token.sleep(Duration::from_secs(5))?;
                            Ok::<_, io::Error>(0)
                        },
                        Duration::from_millis(20),
                    )
                    .unwrap_err()
                    .is_timeout(),
                _ => executor
                    .run_with_deadline(
                        || {
                            thread::sleep(Duration::from_millis(60));
                            Ok::<_, io::Error>(0)
                        },
                        Duration::from_millis(10),
                    )
                    .unwrap_err()
                    .is_timeout(),
            })
        })
        .collect();

    for caller in callers {
        assert!(caller.join().unwrap());
    }

    assert_eq!(executor.in_flight(), 0);
    assert_eq!(wait_for_workers(&executor, baseline, Duration::from_secs(2)), baseline);

    let stats = executor.stats();
    assert_eq!(stats.registered, CALLERS as u64);
    assert_eq!(stats.resolved(), CALLERS as u64);
    assert_eq!(stats.late_completions, (CALLERS / 2) as u64);
}

#[test]
#[serial]
fn test_dropping_executor_stops_watchdog() {
    for _ in 0..16 {
        let executor = DeadlineExecutor::new(DeadlineConfig::new()).unwrap();
        executor
            .run_with_deadline(|| Ok::<_, io::Error>(()), Duration::from_millis(100))
            .unwrap();
        // Dropping joins the watchdog thread; a hang here fails the test run
    }
}
