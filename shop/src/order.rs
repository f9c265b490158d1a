//! Order submission.
//!
//! [`OrderSimulator`] is the boundary the checkout workflow depends on.
//! [`SimulatedOrderService`] stands in for a payment backend: it waits a
//! while, then succeeds or fails according to a pluggable [`OutcomeStrategy`].

use crate::cart::CartLedger;
use crate::types::{CartLine, ProductId, User, format_money};
use cartflow_core::environment::Clock;
use futures::future::BoxFuture;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Message for a successful order
pub const SUCCESS_MESSAGE: &str = "Your order has been placed successfully!";

/// Message for an attempt that exceeded the checkout timeout
pub const TIMEOUT_MESSAGE: &str = "The checkout request timed out. Please try again.";

/// User-facing reasons a simulated order can be declined
pub const FAILURE_REASONS: [&str; 5] = [
    "Credit card service is down. Please try again later.",
    "Unable to connect to the payment gateway. Please try again later.",
    "An unexpected error occurred. Please contact support.",
    "Payment processing failed.",
    "Some items in your cart are out of stock.",
];

const ORDER_TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// One line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Item id
    pub id: ProductId,
    /// Item name at order time
    pub name: String,
    /// Units ordered
    pub quantity: u32,
    /// Unit price
    pub price: f64,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.item.id.clone(),
            name: line.item.name.clone(),
            quantity: line.quantity,
            price: line.item.price,
        }
    }
}

/// What gets submitted for one checkout attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Who is ordering
    pub user_email: String,
    /// Lines in cart order
    pub lines: Vec<OrderLine>,
    /// Cart total at submission
    pub total: f64,
}

impl OrderRequest {
    /// Snapshot the cart for `user`
    #[must_use]
    pub fn from_cart(user: &User, cart: &CartLedger) -> Self {
        Self {
            user_email: user.email.clone(),
            lines: cart.lines().iter().map(OrderLine::from).collect(),
            total: cart.total(),
        }
    }

    /// `Name (ID: 1), Qty: 2, Price: $3.99` per line, comma separated
    #[must_use]
    pub fn describe_items(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                format!(
                    "{} (ID: {}), Qty: {}, Price: {}",
                    line.name,
                    line.id,
                    line.quantity,
                    format_money(line.price)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Resolved outcome of a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderOutcome {
    /// Whether the order was placed
    pub success: bool,
    /// User-facing message
    pub message: String,
    /// Present on success
    pub order_id: Option<String>,
}

impl OrderOutcome {
    /// A placed order with the standard success message
    #[must_use]
    pub fn placed(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            order_id: Some(order_id.into()),
        }
    }

    /// A declined order
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            order_id: None,
        }
    }
}

/// Raised (rather than resolved) submission failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The service could not be reached or broke mid-request
    #[error("{0}")]
    Transport(String),

    /// No answer within the checkout timeout
    #[error("The checkout request timed out. Please try again.")]
    TimedOut,

    /// Failed without any message
    #[error("order service failed without a message")]
    Unknown,
}

impl OrderError {
    /// Text to show the user, if the error carries any
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Transport(message) => Some(message.as_str()),
            Self::TimedOut => Some(TIMEOUT_MESSAGE),
            Self::Unknown => None,
        }
    }
}

/// Order backend boundary
pub trait OrderSimulator: Send + Sync {
    /// Submit an order. Resolves once, with an outcome or a raised error.
    fn submit(&self, request: OrderRequest) -> BoxFuture<'_, Result<OrderOutcome, OrderError>>;
}

/// How a simulated submission ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Place the order
    Succeed,
    /// Resolve with `success: false` and this reason
    Fail(String),
    /// Raise instead of resolving
    Raise(OrderError),
}

/// Source of the simulator's latency and outcome
pub trait OutcomeStrategy: Send + Sync {
    /// Latency before the outcome is known
    fn delay(&self) -> Duration;

    /// Outcome of the next submission
    fn decide(&self) -> Decision;

    /// Five uppercase alphanumerics for the order id suffix
    fn token(&self) -> String;
}

/// Randomized outcomes: success with probability `success_rate`, latency
/// uniform in `[min_delay, max_delay]`.
#[derive(Debug)]
pub struct RandomOutcome {
    rng: Mutex<StdRng>,
    success_rate: f64,
    min_delay: Duration,
    max_delay: Duration,
}

impl RandomOutcome {
    /// Default probability of success
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.8;
    /// Default lower latency bound
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(1500);
    /// Default upper latency bound
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(2500);

    /// Entropy-seeded strategy
    #[must_use]
    pub fn new(success_rate: f64, min_delay: Duration, max_delay: Duration) -> Self {
        Self::with_rng(StdRng::from_entropy(), success_rate, min_delay, max_delay)
    }

    /// Reproducible strategy
    #[must_use]
    pub fn seeded(seed: u64, success_rate: f64, min_delay: Duration, max_delay: Duration) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), success_rate, min_delay, max_delay)
    }

    fn with_rng(rng: StdRng, success_rate: f64, min_delay: Duration, max_delay: Duration) -> Self {
        let (min_delay, max_delay) = if min_delay <= max_delay {
            (min_delay, max_delay)
        } else {
            (max_delay, min_delay)
        };

        Self {
            rng: Mutex::new(rng),
            success_rate: if success_rate.is_nan() {
                Self::DEFAULT_SUCCESS_RATE
            } else {
                success_rate.clamp(0.0, 1.0)
            },
            min_delay,
            max_delay,
        }
    }

    fn with_rng_locked<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for RandomOutcome {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_SUCCESS_RATE,
            Self::DEFAULT_MIN_DELAY,
            Self::DEFAULT_MAX_DELAY,
        )
    }
}

impl OutcomeStrategy for RandomOutcome {
    fn delay(&self) -> Duration {
        let min = u64::try_from(self.min_delay.as_millis()).unwrap_or(u64::MAX);
        let max = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.with_rng_locked(|rng| rng.gen_range(min..=max)))
    }

    fn decide(&self) -> Decision {
        self.with_rng_locked(|rng| {
            if rng.gen_bool(self.success_rate) {
                Decision::Succeed
            } else {
                let reason = FAILURE_REASONS[rng.gen_range(0..FAILURE_REASONS.len())];
                Decision::Fail(reason.to_string())
            }
        })
    }

    fn token(&self) -> String {
        self.with_rng_locked(|rng| {
            (0..5)
                .map(|_| {
                    char::from(ORDER_TOKEN_ALPHABET[rng.gen_range(0..ORDER_TOKEN_ALPHABET.len())])
                })
                .collect()
        })
    }
}

/// Scripted outcomes for deterministic tests.
///
/// Decisions are consumed in order; once the script runs out every
/// submission uses the fallback. Tokens count up from `00001`.
#[derive(Debug)]
pub struct ScriptedOutcome {
    script: Mutex<VecDeque<Decision>>,
    fallback: Decision,
    delay: Duration,
    tokens: AtomicU64,
}

impl ScriptedOutcome {
    /// Play `decisions` in order, then succeed
    #[must_use]
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            script: Mutex::new(decisions.into_iter().collect()),
            fallback: Decision::Succeed,
            delay: Duration::ZERO,
            tokens: AtomicU64::new(0),
        }
    }

    /// Always decide `decision`
    #[must_use]
    pub fn always(decision: Decision) -> Self {
        Self {
            fallback: decision,
            ..Self::new([])
        }
    }

    /// Wait `delay` before each outcome
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl OutcomeStrategy for ScriptedOutcome {
    fn delay(&self) -> Duration {
        self.delay
    }

    fn decide(&self) -> Decision {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn token(&self) -> String {
        let n = self.tokens.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{:05}", n % 100_000)
    }
}

/// In-process stand-in for the order backend.
///
/// Never retries; retry is driven by the checkout workflow.
pub struct SimulatedOrderService<S, C> {
    strategy: S,
    clock: C,
}

impl<S, C> SimulatedOrderService<S, C>
where
    S: OutcomeStrategy,
    C: Clock,
{
    /// Create a service over a strategy and clock
    #[must_use]
    pub const fn new(strategy: S, clock: C) -> Self {
        Self { strategy, clock }
    }

    /// `ORD-<unix millis>-<token>`
    fn next_order_id(&self) -> String {
        format!(
            "ORD-{}-{}",
            self.clock.now().timestamp_millis(),
            self.strategy.token()
        )
    }
}

impl<S, C> OrderSimulator for SimulatedOrderService<S, C>
where
    S: OutcomeStrategy,
    C: Clock,
{
    fn submit(&self, request: OrderRequest) -> BoxFuture<'_, Result<OrderOutcome, OrderError>> {
        Box::pin(async move {
            let delay = self.strategy.delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let order_id = self.next_order_id();
            let timestamp = self.clock.now().to_rfc3339();

            match self.strategy.decide() {
                Decision::Succeed => {
                    tracing::info!(
                        user = %request.user_email,
                        order_id = %order_id,
                        timestamp = %timestamp,
                        total = %format_money(request.total),
                        items = %request.describe_items(),
                        "Order placed"
                    );
                    Ok(OrderOutcome::placed(order_id))
                },
                Decision::Fail(reason) => {
                    tracing::error!(
                        user = %request.user_email,
                        order_id = %order_id,
                        reason = %reason,
                        "Checkout failed"
                    );
                    Ok(OrderOutcome::failed(reason))
                },
                Decision::Raise(error) => {
                    tracing::error!(
                        user = %request.user_email,
                        order_id = %order_id,
                        error = %error,
                        "Order service raised an error"
                    );
                    Err(error)
                },
            }
        })
    }
}
