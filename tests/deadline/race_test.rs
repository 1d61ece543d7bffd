/*!
 * Resolution Race Tests
 * Exactly one resolver wins each record, under real contention
 */

use deadline_guard::{
    DeadlineConfig, DeadlineError, DeadlineExecutor, DeadlineRecord, ExecutionRegistry, OutcomeKind,
    WorkerHandle,
};
use std::io;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const RACES: usize = 10_000;
const TIMEOUT: Duration = Duration::from_secs(60);

#[test]
fn test_completion_racing_expiry_has_single_winner() {
    let registry = Arc::new(ExecutionRegistry::new());
    let ids: Arc<Vec<_>> = Arc::new(
        (0..RACES)
            .map(|_| {
                let id = registry.next_id();
                let record = DeadlineRecord::new(id, TIMEOUT, WorkerHandle::new(id)).unwrap();
                registry.register(Arc::new(record))
            })
            .collect(),
    );
    let barrier = Arc::new(Barrier::new(2));

    let racer = |outcome: OutcomeKind| {
        let registry = Arc::clone(&registry);
        let ids = Arc::clone(&ids);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            ids.iter()
                .map(|&id| registry.resolve(id, outcome))
                .collect::<Vec<bool>>()
        })
    };

    let worker = racer(OutcomeKind::Completed);
    let watchdog = racer(OutcomeKind::TimedOut);
    let worker_wins = worker.join().unwrap();
    let watchdog_wins = watchdog.join().unwrap();

    for (i, (w, t)) in worker_wins.iter().zip(&watchdog_wins).enumerate() {
        assert!(w ^ t, "race {} had {} winners", i, (*w as u8) + (*t as u8));
    }
    assert!(registry.is_empty());

    let stats = registry.stats().snapshot();
    assert_eq!(stats.registered, RACES as u64);
    assert_eq!(stats.completed + stats.timed_out, RACES as u64);
}

#[test]
fn test_record_outcome_matches_winner() {
    let registry = Arc::new(ExecutionRegistry::new());

    for _ in 0..1_000 {
        let id = registry.next_id();
        let record = DeadlineRecord::new(id, TIMEOUT, WorkerHandle::new(id)).unwrap();
        let record = Arc::new(record);
        registry.register(Arc::clone(&record));

        let completer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.resolve(id, OutcomeKind::Completed))
        };
        let cancelled = registry.resolve(id, OutcomeKind::Cancelled);
        let completed = completer.join().unwrap();

        assert!(completed ^ cancelled);
        let expected = if completed { OutcomeKind::Completed } else { OutcomeKind::Cancelled };
        assert_eq!(record.outcome(), expected);
    }
}

#[test]
fn test_operations_finishing_at_deadline_resolve_once() {
    let executor = DeadlineExecutor::new(DeadlineConfig::low_latency()).unwrap();
    let timeout = Duration::from_millis(20);

    let mut completed = 0;
    let mut timed_out = 0;
    for _ in 0..200 {
        match executor.run_with_deadline(
            move || {
                thread::sleep(timeout);
                Ok::<_, io::Error>(())
            },
            timeout,
        ) {
            Ok(()) => completed += 1,
            Err(DeadlineError::Timeout { .. }) => timed_out += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    let stats = executor.stats();
    assert_eq!(completed + timed_out, 200);
    assert_eq!(stats.completed, completed);
    assert_eq!(stats.timed_out, timed_out);
    assert_eq!(executor.in_flight(), 0);
}
