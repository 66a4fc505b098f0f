//! Prometheus metrics for the seating allocator.
//!
//! Reducers record through [`SeatingMetrics`]; the store records reducer
//! latency and the retry helper records retry attempts. Nothing is exported
//! until a [`MetricsRecorder`] is installed, after which [`MetricsRecorder::render`]
//! returns the Prometheus text format.
//!
//! # Example
//!
//! ```rust,no_run
//! use seatplan_runtime::metrics::{MetricsRecorder, SeatingMetrics};
//!
//! let mut recorder = MetricsRecorder::new();
//! recorder.install()?;
//! SeatingMetrics::record_command("assign_guest");
//! println!("{}", recorder.render().unwrap_or_default());
//! # Ok::<(), seatplan_runtime::metrics::MetricsError>(())
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installs the global Prometheus recorder and renders its output.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe all seating metrics and install the global recorder.
    ///
    /// Installing twice in one process is tolerated: the second call logs a
    /// warning and leaves this recorder without a handle.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the exporter cannot be built or installed.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_1, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                register_metrics();
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let message = e.to_string();
                if message.contains("already") {
                    tracing::warn!("Metrics recorder already installed, skipping");
                    Ok(())
                } else {
                    Err(MetricsError::Install(message))
                }
            },
        }
    }

    /// Whether this recorder owns the installed exporter.
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.handle.is_some()
    }

    /// Render current metrics in Prometheus format, if installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

fn register_metrics() {
    describe_counter!(
        "seating_commands_total",
        "Seating commands received, by command"
    );
    describe_counter!(
        "seating_rejections_total",
        "Seating commands rejected before any mutation, by reason"
    );
    describe_counter!(
        "seating_persist_failures_total",
        "Record store writes that failed after an optimistic update"
    );
    describe_counter!(
        "seating_rollbacks_total",
        "Optimistic updates rolled back after a failed write"
    );
    describe_counter!(
        "seating_generated_tables_total",
        "Tables created by auto-generate"
    );
    describe_counter!(
        "record_store_capacity_conflicts_total",
        "Guest writes refused by the record store because the table was full"
    );
    describe_counter!(
        "store_retry_attempts_total",
        "Record store operations retried after a transient failure"
    );
    describe_histogram!(
        "store_reduce_duration_seconds",
        "Time spent inside the reducer per action"
    );
}

/// Counters recorded by the seating reducer.
pub struct SeatingMetrics;

impl SeatingMetrics {
    /// A command was received.
    pub fn record_command(command: &'static str) {
        counter!("seating_commands_total", "command" => command).increment(1);
    }

    /// A command was rejected.
    pub fn record_rejection(reason: &'static str) {
        counter!("seating_rejections_total", "reason" => reason).increment(1);
    }

    /// A write failed after the in-memory state was updated.
    pub fn record_persist_failure() {
        counter!("seating_persist_failures_total").increment(1);
    }

    /// An optimistic update was undone.
    pub fn record_rollback() {
        counter!("seating_rollbacks_total").increment(1);
    }

    /// Auto-generate created `count` tables.
    pub fn record_generated_tables(count: usize) {
        counter!("seating_generated_tables_total").increment(count as u64);
    }
}
