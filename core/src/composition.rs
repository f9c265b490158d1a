//! Reducer composition utilities
//!
//! [`scope_reducer`] embeds a child feature (its own state, action and
//! environment types) inside a parent feature. The parent reducer owns the
//! routing: it decides when a child action is allowed through, then hands it to
//! the scoped reducer, which
//!
//! 1. focuses the parent state down to the child state,
//! 2. projects the parent environment down to the child environment,
//! 3. lifts the child's effects back into the parent action type.
//!
//! # Example
//!
//! ```
//! use cartflow_core::composition::scope_reducer;
//! use cartflow_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Default)]
//! struct Tally {
//!     count: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum TallyAction {
//!     Bump,
//! }
//!
//! struct TallyReducer;
//!
//! impl Reducer for TallyReducer {
//!     type State = Tally;
//!     type Action = TallyAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Tally, _action: TallyAction, _env: &()) -> SmallVec<[Effect<TallyAction>; 4]> {
//!         state.count += 1;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Default)]
//! struct App {
//!     tally: Tally,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum AppAction {
//!     Tally(TallyAction),
//! }
//!
//! let scoped = scope_reducer(
//!     TallyReducer,
//!     |app: &mut App| &mut app.tally,
//!     |_env: &()| &(),
//!     AppAction::Tally,
//! );
//!
//! let mut app = App::default();
//! scoped.reduce_child(&mut app, TallyAction::Bump, &());
//! assert_eq!(app.tally.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Scopes a child reducer into a parent feature.
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `A`: The parent action type
/// - `E`: The parent environment type
/// - `R`: The child reducer
///
/// The lens, environment projection and action embedding are plain function
/// pointers so the scoped reducer stays `Copy`-cheap and `Send + Sync`.
#[must_use]
pub const fn scope_reducer<S, A, E, R>(
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    environment: fn(&E) -> &R::Environment,
    embed: fn(R::Action) -> A,
) -> ScopedReducer<S, A, E, R>
where
    R: Reducer,
{
    ScopedReducer {
        reducer,
        state,
        environment,
        embed,
    }
}

/// A child reducer focused onto part of a parent feature.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, A, E, R>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    environment: fn(&E) -> &R::Environment,
    embed: fn(R::Action) -> A,
}

impl<S, A, E, R> ScopedReducer<S, A, E, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    /// Run the child reducer against its slice of the parent state.
    ///
    /// Child effects are returned already lifted into the parent action type.
    pub fn reduce_child(
        &self,
        parent: &mut S,
        action: R::Action,
        env: &E,
    ) -> SmallVec<[Effect<A>; 4]> {
        let child_state = (self.state)(parent);
        let child_env = (self.environment)(env);

        self.reducer
            .reduce(child_state, action, child_env)
            .into_iter()
            .filter(|effect| !effect.is_none())
            .map(|effect| effect.map(self.embed))
            .collect()
    }

    /// Access the wrapped child reducer
    #[must_use]
    pub const fn inner(&self) -> &R {
        &self.reducer
    }
}

impl<S, A, E, R> Clone for ScopedReducer<S, A, E, R>
where
    R: Reducer + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            state: self.state,
            environment: self.environment,
            embed: self.embed,
        }
    }
}

impl<S, A, E, R> std::fmt::Debug for ScopedReducer<S, A, E, R>
where
    R: Reducer + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedReducer")
            .field("reducer", &self.reducer)
            .finish_non_exhaustive()
    }
}
