//! # Cartflow Core
//!
//! Core traits and types for the Cartflow reducer architecture.
//!
//! A feature is described by four things:
//!
//! - **State**: Owned domain data (cart lines, checkout status, ...)
//! - **Action**: Every input the feature reacts to, whether it comes from the user
//!   or from a completed side effect
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: A description of work for the runtime to perform
//!
//! The Environment carries injected collaborators (clock, order backend, AI
//! services) so that reducers stay deterministic under test.
//!
//! ## Example
//!
//! ```
//! use cartflow_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct BasketState {
//!     items: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum BasketAction {
//!     Add,
//!     Empty,
//! }
//!
//! struct BasketReducer;
//!
//! impl Reducer for BasketReducer {
//!     type State = BasketState;
//!     type Action = BasketAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BasketState,
//!         action: BasketAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<BasketAction>; 4]> {
//!         match action {
//!             BasketAction::Add => state.items += 1,
//!             BasketAction::Empty => state.items = 0,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = BasketState::default();
//! BasketReducer.reduce(&mut state, BasketAction::Add, &());
//! assert_eq!(state.items, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Reducer composition utilities
pub mod composition;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// All I/O is pushed into the returned effects.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce zero or one effect, hence the inline capacity.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values, not execution. They are returned from reducers and run by
/// the Store, which feeds any action they produce back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Returns `true` for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Transform the actions this effect produces
        ///
        /// Used to lift a child feature's effects into its parent's action type.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: FnOnce(Action) -> B + Send + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(f) }))
                },
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use cartflow_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let _now = clock.now();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::effect::Effect;

    #[derive(Clone, Debug, PartialEq)]
    enum Child {
        Done(u32),
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[test]
    fn map_keeps_none() {
        assert!(Effect::<Child>::None.map(Parent::Child).is_none());
    }

    #[tokio::test]
    async fn map_wraps_future_output() {
        let effect: Effect<Child> = Effect::Future(Box::pin(async { Some(Child::Done(7)) }));

        let Effect::Future(fut) = effect.map(Parent::Child) else {
            panic!("expected a future effect");
        };
        assert_eq!(fut.await, Some(Parent::Child(Child::Done(7))));
    }

    #[tokio::test]
    async fn map_passes_through_empty_output() {
        let effect: Effect<Child> = Effect::Future(Box::pin(async { None }));

        let Effect::Future(fut) = effect.map(Parent::Child) else {
            panic!("expected a future effect");
        };
        assert_eq!(fut.await, None);
    }
}
