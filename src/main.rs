/*!
 * Deadline Probe - Demo Entry Point
 *
 * Runs a handful of operations under deadlines and logs how each one ended:
 * - a fast operation that completes
 * - a slow interruptible operation that times out
 * - an operation that fails on its own
 * - an operation slowed down by an injected delay
 */

use anyhow::{Context, Result};
use deadline_guard::disruption::{AlwaysTrigger, Disruptor};
use deadline_guard::{
    init_tracing, interrupt, DeadlineConfig, DeadlineError, DeadlineExecutor, DisruptionError,
    TimeoutTable,
};
use std::io;
use std::time::Duration;
use tracing::{info, warn};

fn report<T: std::fmt::Debug>(name: &str, result: Result<T, DeadlineError<io::Error>>) {
    match result {
        Ok(value) => info!(operation = name, ?value, "completed"),
        Err(e) if e.is_timeout() => warn!(operation = name, error = %e, "timed out"),
        Err(e) => warn!(operation = name, error = %e, "failed"),
    }
}

fn main() -> Result<()> {
    init_tracing();

    let config = DeadlineConfig::from_env().context("loading deadline configuration")?;
    let executor = DeadlineExecutor::new(config).context("starting deadline executor")?;

    let timeouts = TimeoutTable::new()
        .with_default(Duration::from_millis(100))?
        .with_route("fast", Duration::from_millis(50))?
        .with_route("slow", Duration::from_millis(50))?;

    info!("Deadline probe starting");

    let fast = executor.run_with_deadline(
        || {
            interrupt::sleep(Duration::from_millis(10))?;
            Ok::<_, io::Error>(42)
        },
        timeouts.timeout_for("fast")?,
    );
    report("fast", fast);

    let slow = executor.run_interruptible(
        |token| {
            token.sleep(Duration::from_millis(500))?;
            Ok::<_, io::Error>("finished")
        },
        timeouts.timeout_for("slow")?,
    );
    report("slow", slow);

    let failing = executor.run_with_deadline(
        || Err::<(), _>(io::Error::new(io::ErrorKind::ConnectionRefused, "upstream refused")),
        timeouts.timeout_for("failing")?,
    );
    report("failing", failing);

    let disruptor = Disruptor::builder()
        .with_group("disrupted", |group| {
            group.with_config(|config| {
                config.trigger(AlwaysTrigger).delay(Duration::from_millis(400))
            })
        })
        .build();
    let disrupted = executor.run_with_deadline(
        move || {
            disruptor
                .disrupt("disrupted", || Ok::<_, DisruptionError>(7))
                .map_err(io::Error::from)
        },
        timeouts.timeout_for("disrupted")?,
    );
    report("disrupted", disrupted);

    let stats = executor.stats();
    info!(stats = %serde_json::to_string(&stats)?, "Deadline probe finished");

    executor.shutdown();
    Ok(())
}
