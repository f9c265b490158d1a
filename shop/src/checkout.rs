//! Checkout Workflow
//!
//! ```text
//!            confirm
//!   Idle ─────────────► Loading ──► Success   (cart cleared)
//!    ▲                    │  ▲
//!    │ navigate           ▼  │ retry
//!    └──────────────── Error ┘               (cart preserved)
//! ```
//!
//! Only one attempt may be in flight. Every attempt carries an [`AttemptId`];
//! a result for any attempt other than the in-flight one is ignored.

use crate::order::{OrderError, OrderOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message used when a failure carries no text of its own
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred during checkout.";

/// Identifies one checkout attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Wrap a raw attempt number
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The following attempt id
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a checkout attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CheckoutStatus {
    /// No attempt in flight
    #[default]
    Idle,
    /// Waiting on the order service
    Loading,
    /// Order placed
    Success,
    /// Order failed; the cart is intact and the attempt may be retried
    Error,
}

impl CheckoutStatus {
    /// Lowercase label, used as a metrics label and in the CLI
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Result delivered by the order service for one attempt
pub type CheckoutResult = Result<OrderOutcome, OrderError>;

/// State of the checkout workflow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutState {
    status: CheckoutStatus,
    message: Option<String>,
    order_id: Option<String>,
    attempt: Option<AttemptId>,
    updated_at: Option<DateTime<Utc>>,
}

impl CheckoutState {
    /// Current status
    #[must_use]
    pub const fn status(&self) -> CheckoutStatus {
        self.status
    }

    /// User-facing message for the last terminal transition
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Order id, present only after success
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        self.order_id.as_deref()
    }

    /// Attempt currently in flight or last resolved
    #[must_use]
    pub const fn attempt(&self) -> Option<AttemptId> {
        self.attempt
    }

    /// When the status last changed
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Whether an attempt is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, CheckoutStatus::Loading)
    }

    /// Back to idle with message and order id cleared.
    ///
    /// Any in-flight attempt becomes detached.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start `attempt`. Returns `false`, changing nothing, while loading.
    pub fn begin(&mut self, attempt: AttemptId, now: DateTime<Utc>) -> bool {
        if self.is_loading() {
            return false;
        }

        *self = Self {
            status: CheckoutStatus::Loading,
            message: None,
            order_id: None,
            attempt: Some(attempt),
            updated_at: Some(now),
        };
        true
    }

    /// Apply the result of `attempt`.
    ///
    /// Returns the terminal status entered, or `None` if the result was for a
    /// detached attempt and was ignored.
    pub fn resolve(
        &mut self,
        attempt: AttemptId,
        result: &CheckoutResult,
        now: DateTime<Utc>,
    ) -> Option<CheckoutStatus> {
        if !self.is_loading() || self.attempt != Some(attempt) {
            return None;
        }

        match result {
            Ok(outcome) if outcome.success => {
                self.status = CheckoutStatus::Success;
                self.message = Some(success_message(outcome));
                self.order_id.clone_from(&outcome.order_id);
            },
            Ok(outcome) => {
                self.status = CheckoutStatus::Error;
                self.message = Some(non_empty(&outcome.message).to_string());
                self.order_id = None;
            },
            Err(error) => {
                self.status = CheckoutStatus::Error;
                self.message = Some(
                    error
                        .user_message()
                        .map_or(GENERIC_FAILURE_MESSAGE, non_empty)
                        .to_string(),
                );
                self.order_id = None;
            },
        }

        self.updated_at = Some(now);
        Some(self.status)
    }
}

fn success_message(outcome: &OrderOutcome) -> String {
    match &outcome.order_id {
        Some(id) if outcome.message.trim().is_empty() => format!("Order ID: {id}"),
        Some(id) => format!("{} Order ID: {id}", outcome.message),
        None => outcome.message.clone(),
    }
}

fn non_empty(message: &str) -> &str {
    if message.trim().is_empty() {
        GENERIC_FAILURE_MESSAGE
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartflow_core::environment::Clock;
    use cartflow_testing::test_clock;

    fn loading(attempt: u64) -> CheckoutState {
        let mut state = CheckoutState::default();
        assert!(state.begin(AttemptId::new(attempt), test_clock().now()));
        state
    }

    #[test]
    fn test_begin_is_inert_while_loading() {
        let mut state = loading(1);
        assert!(!state.begin(AttemptId::new(2), test_clock().now()));
        assert_eq!(state.attempt(), Some(AttemptId::new(1)));
    }

    #[test]
    fn test_success_appends_order_id() {
        let mut state = loading(1);
        let result = Ok(OrderOutcome::placed("ORD-1"));

        let status = state.resolve(AttemptId::new(1), &result, test_clock().now());

        assert_eq!(status, Some(CheckoutStatus::Success));
        assert_eq!(
            state.message(),
            Some("Your order has been placed successfully! Order ID: ORD-1")
        );
        assert_eq!(state.order_id(), Some("ORD-1"));
    }

    #[test]
    fn test_failure_outcome_keeps_message() {
        let mut state = loading(1);
        let result = Ok(OrderOutcome::failed("Payment processing failed."));

        state.resolve(AttemptId::new(1), &result, test_clock().now());

        assert_eq!(state.status(), CheckoutStatus::Error);
        assert_eq!(state.message(), Some("Payment processing failed."));
        assert!(state.order_id().is_none());
    }

    #[test]
    fn test_raised_error_without_text_falls_back() {
        let mut state = loading(1);
        let result = Err(OrderError::Unknown);

        state.resolve(AttemptId::new(1), &result, test_clock().now());

        assert_eq!(state.status(), CheckoutStatus::Error);
        assert_eq!(state.message(), Some(GENERIC_FAILURE_MESSAGE));
    }

    #[test]
    fn test_empty_failure_message_falls_back() {
        let mut state = loading(1);
        let result = Ok(OrderOutcome::failed("  "));

        state.resolve(AttemptId::new(1), &result, test_clock().now());
        assert_eq!(state.message(), Some(GENERIC_FAILURE_MESSAGE));
    }

    #[test]
    fn test_stale_attempt_is_ignored() {
        let mut state = loading(2);
        let result = Ok(OrderOutcome::placed("ORD-OLD"));

        assert_eq!(state.resolve(AttemptId::new(1), &result, test_clock().now()), None);
        assert!(state.is_loading());
    }

    #[test]
    fn test_result_after_reset_is_ignored() {
        let mut state = loading(1);
        state.reset();

        let result = Ok(OrderOutcome::placed("ORD-1"));
        assert_eq!(state.resolve(AttemptId::new(1), &result, test_clock().now()), None);
        assert_eq!(state, CheckoutState::default());
    }

    #[test]
    fn test_retry_from_error() {
        let mut state = loading(1);
        state.resolve(
            AttemptId::new(1),
            &Err(OrderError::TimedOut),
            test_clock().now(),
        );
        assert_eq!(state.status(), CheckoutStatus::Error);

        assert!(state.begin(AttemptId::new(2), test_clock().now()));
        assert!(state.is_loading());
        assert!(state.message().is_none());
    }
}
