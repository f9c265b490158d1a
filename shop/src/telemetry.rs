//! Tracing and metrics setup.

use crate::checkout::CheckoutStatus;
use crate::config::ShopConfig;
use metrics::{counter, describe_counter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.telemetry.log_filter`. Output goes to
/// stderr so it never interleaves with the shell's stdout.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &ShopConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
}

/// Describe the shop metrics for the Prometheus exposition.
pub fn describe_metrics() {
    describe_counter!(
        "checkout_attempts_total",
        "Total number of checkout attempts started"
    );
    describe_counter!(
        "checkout_outcomes_total",
        "Total number of resolved checkout attempts, by outcome"
    );
    describe_counter!(
        "cart_mutations_total",
        "Total number of cart mutations, by operation"
    );
    describe_counter!(
        "suggestion_requests_total",
        "Total number of resolved suggestion requests, by outcome"
    );
}

/// Checkout metrics recorder.
pub struct CheckoutMetrics;

impl CheckoutMetrics {
    /// Record a started attempt.
    pub fn record_attempt() {
        counter!("checkout_attempts_total").increment(1);
    }

    /// Record the terminal status of an attempt.
    pub fn record_outcome(status: CheckoutStatus) {
        counter!("checkout_outcomes_total", "outcome" => status.as_str()).increment(1);
    }
}

/// Cart metrics recorder.
pub struct CartMetrics;

impl CartMetrics {
    /// Record a cart mutation.
    pub fn record_mutation(op: &'static str) {
        counter!("cart_mutations_total", "op" => op).increment(1);
    }
}

/// Suggestion metrics recorder.
pub struct SuggestionMetrics;

impl SuggestionMetrics {
    /// Record a resolved suggestion request; `outcome` is `ok` or `error`.
    pub fn record_outcome(outcome: &'static str) {
        counter!("suggestion_requests_total", "outcome" => outcome).increment(1);
    }
}
