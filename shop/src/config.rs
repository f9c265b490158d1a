//! Configuration management for the shop.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable values fall back to the default; [`ShopConfig::validate`]
//! rejects values that parse but make no sense.

use crate::gemini::{DEFAULT_API_URL, DEFAULT_MODEL};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "cartflow_shop=info,cartflow_runtime=info";

/// Largest accepted `CHECKOUT_TIMEOUT_SECS` (one hour)
pub const MAX_CHECKOUT_TIMEOUT_SECS: u64 = 3600;

/// Invalid configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Success rate outside `[0, 1]`
    #[error("CHECKOUT_SUCCESS_RATE must be between 0 and 1, got {0}")]
    SuccessRateOutOfRange(f64),

    /// Delay bounds reversed
    #[error("CHECKOUT_MIN_DELAY_MS ({min}) must not exceed CHECKOUT_MAX_DELAY_MS ({max})")]
    DelayBoundsReversed {
        /// Lower bound in milliseconds
        min: u64,
        /// Upper bound in milliseconds
        max: u64,
    },

    /// Zero checkout timeout
    #[error("CHECKOUT_TIMEOUT_SECS must be greater than zero")]
    ZeroTimeout,

    /// Checkout timeout above [`MAX_CHECKOUT_TIMEOUT_SECS`]
    #[error("CHECKOUT_TIMEOUT_SECS must be at most {max}, got {secs}")]
    TimeoutTooLong {
        /// Configured value
        secs: u64,
        /// Accepted maximum
        max: u64,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Gemini API access
    pub gemini: GeminiConfig,
    /// Order simulator and checkout behavior
    pub checkout: CheckoutConfig,
    /// Logging and metrics
    pub telemetry: TelemetryConfig,
}

/// Gemini configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; AI features are disabled without one
    pub api_key: Option<String>,
    /// API base URL
    pub api_url: String,
    /// Text model used for suggestions
    pub model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Checkout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Probability a simulated order succeeds (default: 0.8)
    pub success_rate: f64,
    /// Lower latency bound in milliseconds (default: 1500)
    pub min_delay_ms: u64,
    /// Upper latency bound in milliseconds (default: 2500)
    pub max_delay_ms: u64,
    /// Caller-side timeout in seconds (default: 10)
    pub timeout_secs: u64,
    /// Seed for reproducible outcomes
    pub seed: Option<u64>,
}

impl CheckoutConfig {
    /// Lower latency bound
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    /// Upper latency bound
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Caller-side timeout for one attempt
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// How long a caller should wait for an attempt to resolve: the timeout
    /// plus `slack`, saturating instead of overflowing.
    #[must_use]
    pub const fn response_wait(&self, slack: Duration) -> Duration {
        self.timeout().saturating_add(slack)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Install the Prometheus recorder
    pub metrics_enabled: bool,
    /// Address the metrics exposition is advertised on
    pub metrics_addr: SocketAddr,
}

impl ShopConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            gemini: GeminiConfig {
                api_key: lookup("GEMINI_API_KEY")
                    .or_else(|| lookup("API_KEY"))
                    .filter(|key| !key.trim().is_empty()),
                api_url: lookup("GEMINI_API_URL")
                    .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
                model: lookup("GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            checkout: CheckoutConfig {
                success_rate: parsed(&lookup, "CHECKOUT_SUCCESS_RATE").unwrap_or(0.8),
                min_delay_ms: parsed(&lookup, "CHECKOUT_MIN_DELAY_MS").unwrap_or(1500),
                max_delay_ms: parsed(&lookup, "CHECKOUT_MAX_DELAY_MS").unwrap_or(2500),
                timeout_secs: parsed(&lookup, "CHECKOUT_TIMEOUT_SECS").unwrap_or(10),
                seed: parsed(&lookup, "CHECKOUT_SEED"),
            },
            telemetry: TelemetryConfig {
                log_filter: lookup("CARTFLOW_LOG")
                    .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
                metrics_enabled: parsed(&lookup, "CARTFLOW_METRICS_ENABLED").unwrap_or(false),
                metrics_addr: parsed(&lookup, "CARTFLOW_METRICS_ADDR")
                    .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 9090))),
            },
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checkout = &self.checkout;

        if !(0.0..=1.0).contains(&checkout.success_rate) {
            return Err(ConfigError::SuccessRateOutOfRange(checkout.success_rate));
        }

        if checkout.min_delay_ms > checkout.max_delay_ms {
            return Err(ConfigError::DelayBoundsReversed {
                min: checkout.min_delay_ms,
                max: checkout.max_delay_ms,
            });
        }

        if checkout.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        if checkout.timeout_secs > MAX_CHECKOUT_TIMEOUT_SECS {
            return Err(ConfigError::TimeoutTooLong {
                secs: checkout.timeout_secs,
                max: MAX_CHECKOUT_TIMEOUT_SECS,
            });
        }

        Ok(())
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
