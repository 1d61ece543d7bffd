/*!
 * Structured Tracing
 * Subscriber setup and per-operation spans using the tracing crate
 *
 * Features:
 * - JSON-formatted logs for structured parsing
 * - One span per dispatched operation, carrying its deadline id
 * - Outcome and duration recorded when the worker finishes
 */

use crate::core::types::{DeadlineId, OutcomeKind};
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level, Span};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - DEADLINE_TRACE_JSON: Enable JSON output (default: false)
///
/// Calling it again after a subscriber is installed is a no-op.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("DEADLINE_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok();
        if installed {
            info!("Structured tracing initialized with JSON output");
        }
    } else {
        let installed = registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_line_number(true)
                    .with_file(true)
                    .compact(),
            )
            .try_init()
            .is_ok();
        if installed {
            info!("Structured tracing initialized");
        }
    }
}

/// Span covering one operation on its worker thread
pub struct DeadlineSpan {
    span: Span,
    id: DeadlineId,
    timeout: Duration,
    start: Instant,
}

impl DeadlineSpan {
    pub fn new(id: DeadlineId, timeout: Duration) -> Self {
        let span = span!(
            Level::DEBUG,
            "deadline_operation",
            id = %id,
            timeout_ms = timeout.as_millis() as u64,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        Self {
            span,
            id,
            timeout,
            start: Instant::now(),
        }
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record how the worker's own attempt to resolve the record went
    pub fn finish(self, outcome: OutcomeKind, won: bool) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_ms", duration.as_millis() as u64);
        self.span.record("outcome", outcome.as_str());

        if won {
            debug!(
                id = %self.id,
                outcome = %outcome,
                duration_ms = duration.as_millis() as u64,
                "operation resolved by worker"
            );
        } else {
            // Result discarded: the record was already timed out or cancelled
            debug!(
                id = %self.id,
                outcome = %outcome,
                duration_ms = duration.as_millis() as u64,
                overrun_ms = duration.saturating_sub(self.timeout).as_millis() as u64,
                "late completion discarded"
            );
        }
    }

    /// Emit a warning for an operation that exceeded its deadline
    pub fn timed_out(id: DeadlineId, elapsed: Duration, timeout: Duration, source: &'static str) {
        warn!(
            id = %id,
            elapsed_ms = elapsed.as_millis() as u64,
            timeout_ms = timeout.as_millis() as u64,
            source,
            "operation deadline exceeded"
        );
    }
}
