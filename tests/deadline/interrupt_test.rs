/*!
 * Interruption Tests
 * Cooperative flags, hooks and wake-up signals on timed-out workers
 */

use deadline_guard::{interrupt, DeadlineConfig, DeadlineExecutor, Interrupted};
use serial_test::serial;
use std::io::{self, Read};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

fn executor() -> DeadlineExecutor {
    DeadlineExecutor::new(DeadlineConfig::low_latency()).unwrap()
}

#[test]
#[serial]
fn test_timed_out_worker_wakes_from_sleep() {
    let executor = executor();
    let (tx, rx) = mpsc::channel();

    let result = executor.run_interruptible(
        move |token| {
            let start = Instant::now();
            let slept = token.sleep(Duration::from_secs(10));
            let _ = tx.send((slept, start.elapsed()));
            slept.map_err(io::Error::from)
        },
        Duration::from_millis(30),
    );

    assert!(result.unwrap_err().is_timeout());
    let (slept, elapsed) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(slept, Err(Interrupted));
    assert!(elapsed < Duration::from_secs(1));
    assert!(executor.stats().interrupts_sent >= 1);
}

#[test]
#[serial]
fn test_ambient_sleep_is_interrupted() {
    let executor = executor();
    let (tx, rx) = mpsc::channel();

    let result = executor.run_with_deadline(
        move || {
            let slept = interrupt::sleep(Duration::from_secs(10));
            let _ = tx.send(interrupt::is_interrupted());
            slept.map_err(io::Error::from)
        },
        Duration::from_millis(30),
    );

    assert!(result.unwrap_err().is_timeout());
    assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(true));
}

#[test]
#[serial]
fn test_hook_unblocks_socket_read() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let _server = thread::spawn(move || {
        let (conn, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_secs(3));
        drop(conn);
    });

    let executor = executor();
    let (tx, rx) = mpsc::channel();

    let result = executor.run_interruptible(
        move |token| {
            let mut stream = TcpStream::connect(addr)?;
            let hook_stream = stream.try_clone()?;
            token.on_interrupt(move || {
                let _ = hook_stream.shutdown(Shutdown::Both);
            });

            let mut buf = [0u8; 16];
            let read = stream.read(&mut buf);
            let _ = tx.send(token.is_interrupted());
            read.map(|_| ())
        },
        Duration::from_millis(50),
    );

    assert!(result.unwrap_err().is_timeout());
    assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(true));
}

#[test]
#[serial]
fn test_uncooperative_worker_result_discarded() {
    let executor = executor();
    let baseline = executor.live_workers();

    let start = Instant::now();
    let result = executor.run_with_deadline(
        || {
            thread::sleep(Duration::from_millis(150));
            Ok::<_, io::Error>("too late")
        },
        Duration::from_millis(20),
    );
    assert!(result.unwrap_err().is_timeout());
    assert!(start.elapsed() < Duration::from_millis(120));

    let deadline = Instant::now() + Duration::from_secs(2);
    while executor.live_workers() > baseline && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    let stats = executor.stats();
    assert_eq!(stats.late_completions, 1);
    assert_eq!(stats.completed, 0);
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_wakeup_signal_interrupts_blocking_read() {
    use std::os::unix::net::UnixStream;

    let config = DeadlineConfig::low_latency().with_wakeup_signal("SIGUSR2");
    let executor = DeadlineExecutor::new(config).unwrap();
    let (ours, theirs) = UnixStream::pair().unwrap();
    let (tx, rx) = mpsc::channel();

    let result = executor.run_interruptible(
        move |token| {
            let mut theirs = theirs;
            let mut buf = [0u8; 8];
            let read = theirs.read(&mut buf);
            let _ = tx.send(read.as_ref().map_err(|e| e.kind()).err());
            token.check()?;
            read.map(|_| ())
        },
        Duration::from_millis(50),
    );

    assert!(result.unwrap_err().is_timeout());
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(1)),
        Ok(Some(io::ErrorKind::Interrupted))
    );
    drop(ours);
}
