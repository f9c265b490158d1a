//! Given-When-Then harness for reducers.
//!
//! A test starts from a state, reduces one or more actions in order, then
//! checks the final state and the effects returned by the last action.
//! Effects are only inspected, never run; use
//! [`collect_actions`](crate::helpers::collect_actions) for that.

#![allow(clippy::module_name_repetitions)]

use cartflow_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Scripted reducer test
///
/// ```ignore
/// use cartflow_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(ShopReducer::new())
///     .with_env(env())
///     .given_state(on_checkout_page())
///     .when_action(ShopAction::NavigateToCatalog)
///     .when_action(ShopAction::NavigateToCheckout)
///     .when_action(ShopAction::ConfirmCheckout)
///     .then_state(|state| assert_eq!(state.next_attempt, AttemptId::new(2)))
///     .then_effects(|effects| assertions::assert_future_count(effects, 1))
///     .run();
/// ```
pub struct ReducerTest<R: Reducer> {
    reducer: R,
    env: Option<R::Environment>,
    given: Option<R::State>,
    script: Vec<R::Action>,
    state_checks: Vec<StateCheck<R::State>>,
    effect_checks: Vec<EffectCheck<R::Action>>,
}

impl<R: Reducer> ReducerTest<R> {
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            env: None,
            given: None,
            script: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment handed to every reduction
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Starting state
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.given = Some(state);
        self
    }

    /// Append an action to the script. Actions are reduced in the order given.
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.script.push(action);
        self
    }

    /// Check the state after the whole script has been reduced
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Check the effects returned by the last action of the script
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce the script, run every check and hand back the final state.
    ///
    /// # Panics
    ///
    /// Panics when the environment, the starting state or the script is
    /// missing, and whenever a check fails.
    #[allow(clippy::panic)]
    pub fn run(self) -> R::State {
        let Some(env) = self.env else {
            panic!("ReducerTest needs an environment: call with_env()");
        };
        let Some(mut state) = self.given else {
            panic!("ReducerTest needs a starting state: call given_state()");
        };
        assert!(
            !self.script.is_empty(),
            "ReducerTest needs at least one action: call when_action()"
        );

        let mut last = Vec::new();
        for action in self.script {
            last = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for check in self.state_checks {
            check(&state);
        }
        for check in self.effect_checks {
            check(&last);
        }

        state
    }
}

/// Effect checks for [`ReducerTest::then_effects`]
pub mod assertions {
    use cartflow_core::effect::Effect;

    fn future_count<A>(effects: &[Effect<A>]) -> usize {
        effects.iter().filter(|e| matches!(e, Effect::Future(_))).count()
    }

    /// Nothing for the runtime to do: every effect is `Effect::None`.
    ///
    /// # Panics
    ///
    /// Panics if any effect would run.
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "expected only Effect::None, got {effects:?}"
        );
    }

    /// Exactly `expected` async effects, ignoring `Effect::None` padding.
    ///
    /// # Panics
    ///
    /// Panics on any other number of futures.
    pub fn assert_future_count<A>(effects: &[Effect<A>], expected: usize) {
        let found = future_count(effects);
        assert_eq!(found, expected, "expected {expected} future effect(s), found {found}");
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use cartflow_core::{SmallVec, smallvec};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Tally {
        total: u32,
        pending: bool,
    }

    #[derive(Clone, Debug)]
    enum TallyAction {
        Bump(u32),
        Fetch,
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = Tally;
        type Action = TallyAction;
        type Environment = ();

        fn reduce(&self, state: &mut Tally, action: TallyAction, _env: &()) -> SmallVec<[Effect<TallyAction>; 4]> {
            match action {
                TallyAction::Bump(by) => {
                    state.total += by;
                    state.pending = false;
                    smallvec![Effect::None]
                },
                TallyAction::Fetch if state.pending => smallvec![Effect::None],
                TallyAction::Fetch => {
                    state.pending = true;
                    smallvec![Effect::Future(Box::pin(async { Some(TallyAction::Bump(10)) }))]
                },
            }
        }
    }

    #[test]
    fn test_script_is_reduced_in_order() {
        let state = ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(Tally::default())
            .when_action(TallyAction::Bump(2))
            .when_action(TallyAction::Fetch)
            .then_state(|s| assert_eq!(s.total, 2))
            .then_effects(|effects| assertions::assert_future_count(effects, 1))
            .run();

        assert!(state.pending);
    }

    #[test]
    fn test_effects_come_from_last_action_only() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(Tally::default())
            .when_action(TallyAction::Fetch)
            .when_action(TallyAction::Fetch)
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_no_effects_accepts_padding() {
        assertions::assert_no_effects::<TallyAction>(&[]);
        assertions::assert_no_effects::<TallyAction>(&[Effect::None, Effect::None]);
    }

    #[test]
    #[should_panic(expected = "expected only Effect::None")]
    fn test_no_effects_rejects_future() {
        assertions::assert_no_effects(&[Effect::Future(Box::pin(async { Some(TallyAction::Bump(1)) }))]);
    }

    #[test]
    #[should_panic(expected = "at least one action")]
    fn test_empty_script_is_rejected() {
        let _ = ReducerTest::new(TallyReducer).with_env(()).given_state(Tally::default()).run();
    }
}
