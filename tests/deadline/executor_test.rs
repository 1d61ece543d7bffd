/*!
 * Executor Tests
 * End-to-end behavior of run_with_deadline, submit and cancellation
 */

use deadline_guard::{
    interrupt, timeout_from_millis, ConfigError, DeadlineConfig, DeadlineError, DeadlineExecutor,
    WatchdogMode,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

fn executor() -> DeadlineExecutor {
    DeadlineExecutor::new(DeadlineConfig::low_latency()).unwrap()
}

#[test]
#[serial]
fn test_fast_operation_returns_value() {
    let executor = executor();
    let start = Instant::now();

    let result = executor.run_with_deadline(
        || {
            thread::sleep(Duration::from_millis(10));
            Ok::<_, io::Error>(42)
        },
        Duration::from_millis(50),
    );

    assert_eq!(result.unwrap(), 42);
    assert!(start.elapsed() < Duration::from_millis(200));
}

#[test]
#[serial]
fn test_slow_operation_times_out() {
    let executor = executor();
    let start = Instant::now();

    let result = executor.run_with_deadline(
        || {
            thread::sleep(Duration::from_millis(500));
            Ok::<_, io::Error>(42)
        },
        Duration::from_millis(50),
    );
    let elapsed = start.elapsed();

    match result {
        Err(DeadlineError::Timeout { timeout_ms, .. }) => assert_eq!(timeout_ms, 50),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(300), "caller waited {:?}", elapsed);
}

#[test]
#[serial]
fn test_never_returning_operation_releases_caller() {
    let executor = executor();
    let (_keep_open, blocked) = std::sync::mpsc::channel::<()>();

    let start = Instant::now();
    let result = executor.run_with_deadline(
        move || {
            let _ = blocked.recv();
            Ok::<_, io::Error>(())
        },
        Duration::from_millis(30),
    );

    assert!(result.unwrap_err().is_timeout());
    assert!(start.elapsed() < Duration::from_millis(300));
    assert_eq!(executor.in_flight(), 0);
}

#[test]
fn test_operation_error_forwarded() {
    let executor = executor();

    let result = executor.run_with_deadline(
        || Err::<(), _>(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
        Duration::from_secs(1),
    );

    let err = result.unwrap_err();
    assert!(err.is_operation_error());
    assert_eq!(err.into_operation_error().unwrap().kind(), io::ErrorKind::ConnectionRefused);
    assert_eq!(executor.stats().failed, 1);
}

#[test]
fn test_panic_is_contained() {
    let executor = executor();

    let result = executor.run_with_deadline(
        || -> Result<(), io::Error> { panic!("boom") },
        Duration::from_secs(1),
    );

    match result {
        Err(DeadlineError::Panicked { message, .. }) => assert!(message.contains("boom")),
        other => panic!("expected panic error, got {:?}", other),
    }
    assert_eq!(executor.stats().panicked, 1);
}

#[test]
fn test_zero_and_negative_timeouts_rejected() {
    let executor = executor();

    let zero = executor.run_with_deadline(|| Ok::<_, io::Error>(()), Duration::ZERO);
    assert!(matches!(
        zero,
        Err(DeadlineError::InvalidConfiguration(ConfigError::NonPositiveTimeout { millis: 0 }))
    ));

    assert_eq!(
        timeout_from_millis(-5).unwrap_err(),
        ConfigError::NonPositiveTimeout { millis: -5 }
    );
    assert_eq!(executor.live_workers(), 0);
    assert_eq!(executor.stats().registered, 0);
}

#[test]
fn test_overflowing_timeout_rejected() {
    let executor = executor();
    let result = executor.run_with_deadline(|| Ok::<_, io::Error>(()), Duration::MAX);
    assert!(matches!(
        result,
        Err(DeadlineError::InvalidConfiguration(ConfigError::TimeoutOverflow))
    ));
}

#[test]
fn test_submit_and_wait() {
    let executor = executor();

    let task = executor
        .submit(|_| Ok::<_, io::Error>("done"), Duration::from_secs(1))
        .unwrap();
    let id = task.id();

    assert!(task.deadline() > Instant::now());
    assert_eq!(task.wait().unwrap(), "done");
    assert!(!executor.cancel(id));
}

#[test]
fn test_cancel_reports_cancelled() {
    let executor = executor();

    let task = executor
        .submit(
            |token| {
                token.sleep(Duration::from_secs(5))?;
                Ok::<_, io::Error>(())
            },
            Duration::from_secs(10),
        )
        .unwrap();

    assert!(task.cancel());
    assert!(!task.cancel());
    assert!(task.is_finished());

    let id = task.id();
    match task.wait() {
        Err(DeadlineError::Cancelled { id: cancelled }) => assert_eq!(cancelled, id),
        other => panic!("expected cancellation, got {:?}", other),
    }
    assert_eq!(executor.stats().cancelled, 1);
}

#[test]
fn test_dropped_task_cancels_operation() {
    let executor = executor();
    let (tx, rx) = std::sync::mpsc::channel();

    let task = executor
        .submit(
            move |token| {
                let outcome = token.sleep(Duration::from_secs(5));
                let _ = tx.send(outcome.is_err());
                Ok::<_, io::Error>(())
            },
            Duration::from_secs(10),
        )
        .unwrap();
    drop(task);

    assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(true));
    assert_eq!(executor.in_flight(), 0);
    assert_eq!(executor.stats().cancelled, 1);
}

#[test]
fn test_shutdown_cancels_pending_and_rejects_new() {
    let executor = executor();

    let task = executor
        .submit(
            |token| {
                token.sleep(Duration::from_secs(5))?;
                Ok::<_, io::Error>(())
            },
            Duration::from_secs(10),
        )
        .unwrap();

    assert_eq!(executor.shutdown(), 1);
    assert!(matches!(task.wait(), Err(DeadlineError::Cancelled { .. })));
    assert!(matches!(
        executor.run_with_deadline(|| Ok::<_, io::Error>(()), Duration::from_secs(1)),
        Err(DeadlineError::Shutdown)
    ));
}

#[test]
#[serial]
fn test_poll_mode_times_out() {
    let config = DeadlineConfig::new()
        .with_watchdog(WatchdogMode::Poll)
        .with_poll_interval(Duration::from_millis(2));
    let executor = DeadlineExecutor::new(config).unwrap();

    let start = Instant::now();
    let result = executor.run_with_deadline(
        || {
            thread::sleep(Duration::from_millis(300));
            Ok::<_, io::Error>(())
        },
        Duration::from_millis(40),
    );

    assert!(result.unwrap_err().is_timeout());
    assert!(start.elapsed() < Duration::from_millis(250));
}

#[test]
#[serial]
fn test_caller_fallback_when_watchdog_is_late() {
    // The watchdog scans once at startup and then sleeps for 30s
    let config = DeadlineConfig::new()
        .with_watchdog(WatchdogMode::Poll)
        .with_poll_interval(Duration::from_secs(30))
        .with_caller_grace(Duration::from_millis(20));
    let executor = DeadlineExecutor::new(config).unwrap();

    // Let the watchdog finish its first scan and go to sleep
    thread::sleep(Duration::from_millis(20));

    let start = Instant::now();
    let result = executor.run_interruptible(
        |token| {
            token.sleep(Duration::from_secs(5))?;
            Ok::<_, io::Error>(())
        },
        Duration::from_millis(30),
    );

    assert!(result.unwrap_err().is_timeout());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(executor.stats().caller_fallbacks, 1);
    assert_eq!(executor.stats().timed_out, 1);
}

#[test]
fn test_zero_argument_operation_sees_ambient_token() {
    let executor = executor();

    let result = executor.run_with_deadline(
        || {
            let token = interrupt::current().ok_or_else(|| io::Error::other("no token"))?;
            Ok::<_, io::Error>(token.is_interrupted())
        },
        Duration::from_secs(1),
    );

    assert!(!result.unwrap());
    assert!(interrupt::current().is_none());
}

#[test]
fn test_stats_track_outcomes() {
    let executor = executor();

    executor
        .run_with_deadline(|| Ok::<_, io::Error>(()), Duration::from_secs(1))
        .unwrap();
    let _ = executor.run_interruptible(
        |token| {
            token.sleep(Duration::from_secs(5))?;
            Ok::<_, io::Error>(())
        },
        Duration::from_millis(20),
    );

    let stats = executor.stats();
    assert_eq!(stats.registered, 2);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.timed_out, 1);
    assert_eq!(stats.resolved(), 2);
}

#[test]
fn test_shared_executor_is_reused() {
    let first = DeadlineExecutor::shared().unwrap();
    let second = DeadlineExecutor::shared().unwrap();

    let before = second.stats().registered;
    first
        .submit(|_| Ok::<_, io::Error>(()), Duration::from_secs(1))
        .unwrap()
        .wait()
        .unwrap();
    assert!(second.stats().registered > before);
    assert!(!second.is_shutdown());
}
