//! Prometheus metrics for observability and monitoring.
//!
//! This module installs the Prometheus recorder and describes the metrics the
//! [`Store`](crate::Store) emits:
//! - Action dispatch
//! - Reducer execution
//! - Effect handling
//! - Shutdown
//!
//! Feature crates describe their own metrics and record them through the
//! re-exported macros.
//!
//! # Example
//!
//! ```rust,no_run
//! use cartflow_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("127.0.0.1:9090".parse()?);
//! server.start()?;
//!
//! if let Some(text) = server.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

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

/// Prometheus metrics server.
///
/// Owns the recorder handle used to render the Prometheus text exposition.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address the exposition is advertised on (e.g., `127.0.0.1:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Describe the store metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), this logs a warning
    /// and succeeds without a handle.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[
                    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0,
                ],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(addr = %self.addr, "Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Address the exposition is advertised on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register the store metric descriptions.
fn register_metrics() {
    describe_counter!(
        "store.commands.total",
        "Total number of actions sent to a store"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run the reducer for one action"
    );
    describe_counter!(
        "store.effects.executed",
        "Total number of effects executed, by effect type"
    );
    describe_histogram!(
        "effect_duration_seconds",
        "Time taken by effect-backed operations, by operation"
    );
    describe_counter!(
        "store.shutdown.initiated",
        "Total number of graceful shutdowns started"
    );
    describe_counter!(
        "store.shutdown.timeout",
        "Total number of shutdowns that timed out with effects still running"
    );
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Total number of actions rejected during shutdown"
    );
}

/// Effect metrics recorder.
pub struct EffectMetrics;

impl EffectMetrics {
    /// Record how long an effect-backed operation took.
    ///
    /// `operation` becomes the `operation` label on `effect_duration_seconds`.
    pub fn record_duration(operation: &'static str, duration: Duration) {
        histogram!("effect_duration_seconds", "operation" => operation)
            .record(duration.as_secs_f64());
    }
}
