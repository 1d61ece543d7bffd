/*!
 * Timing Property Tests
 */

use deadline_guard::{timeout_from_millis, ConfigError, DeadlineConfig, DeadlineExecutor};
use proptest::prelude::*;
use serial_test::serial;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

/// Detection latency allowed on top of the deadline
const SLACK: Duration = Duration::from_millis(150);

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    #[serial]
    fn prop_fast_operations_never_time_out(timeout_ms in 60u64..120, work_pct in 0u64..25) {
        let executor = DeadlineExecutor::new(DeadlineConfig::low_latency()).unwrap();
        let work = Duration::from_millis(timeout_ms * work_pct / 100);

        let result = executor.run_with_deadline(
            move || {
                thread::sleep(work);
                Ok::<_, io::Error>(timeout_ms)
            },
            Duration::from_millis(timeout_ms),
        );

        prop_assert_eq!(result.unwrap(), timeout_ms);
    }

    #[test]
    #[serial]
    fn prop_slow_operations_time_out_promptly(timeout_ms in 10u64..60, overrun in 4u64..8) {
        let executor = DeadlineExecutor::new(DeadlineConfig::low_latency()).unwrap();
        let timeout = Duration::from_millis(timeout_ms);
        let work = timeout * overrun as u32;

        let start = Instant::now();
        let result = executor.run_with_deadline(
            move || {
                thread::sleep(work);
                Ok::<_, io::Error>(())
            },
            timeout,
        );
        let elapsed = start.elapsed();

        prop_assert!(result.unwrap_err().is_timeout());
        prop_assert!(elapsed >= timeout);
        prop_assert!(elapsed < timeout + SLACK, "released after {:?}", elapsed);
    }

    #[test]
    fn prop_non_positive_millis_rejected(millis in i64::MIN..=0) {
        prop_assert_eq!(
            timeout_from_millis(millis).unwrap_err(),
            ConfigError::NonPositiveTimeout { millis }
        );
    }

    #[test]
    fn prop_positive_millis_accepted(millis in 1i64..=86_400_000) {
        prop_assert_eq!(timeout_from_millis(millis).unwrap(), Duration::from_millis(millis as u64));
    }
}
