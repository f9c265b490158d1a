//! # Cartflow Testing
//!
//! Testing utilities and helpers for the Cartflow architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then harness for reducers
//! - Helpers for driving effects without a Store
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use cartflow_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(ShopReducer::new())
//!     .with_env(test_environment(test_clock()))
//!     .given_state(logged_in_state())
//!     .when_action(ShopAction::Cart(CartAction::AddItem { item }))
//!     .then_state(|state| assert_eq!(state.cart_item_count(), 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use cartflow_core::environment::Clock;

/// Given-When-Then harness for reducers
pub mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use cartflow_testing::mocks::FixedClock;
    /// use cartflow_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Helpers for running effects in tests without a Store.
pub mod helpers {
    use cartflow_core::effect::Effect;

    /// Run effects to completion and collect the actions they produce.
    ///
    /// Effects run one at a time in declaration order. Feedback is not
    /// applied: produced actions are returned, not reduced.
    ///
    /// ```
    /// use cartflow_core::effect::Effect;
    /// use cartflow_testing::helpers::collect_actions;
    ///
    /// # tokio_test::block_on(async {
    /// let effects: Vec<Effect<i32>> = vec![Effect::Future(Box::pin(async { Some(1) })), Effect::None];
    /// assert_eq!(collect_actions(effects).await, vec![1]);
    /// # });
    /// ```
    pub async fn collect_actions<A, I>(effects: I) -> Vec<A>
    where
        I: IntoIterator<Item = Effect<A>>,
    {
        let mut actions = Vec::new();

        for effect in effects {
            if let Effect::Future(fut) = effect {
                actions.extend(fut.await);
            }
        }

        actions
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
