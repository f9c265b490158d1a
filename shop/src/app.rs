//! The shop feature: one state, one action type, one reducer.
//!
//! [`ShopReducer`] owns the routing between the session, the cart ledger,
//! the checkout workflow and the two AI collaborators. Cart and assistant
//! logic live in their own reducers and are embedded with
//! [`scope_reducer`]; checkout and session rules are applied inline because
//! they guard each other.
//!
//! Collaborator completions come back as actions tagged with the request
//! they answer (`AttemptId` for orders, a catalog generation for images), so
//! anything that arrives after the user has moved on is dropped instead of
//! being applied to a state it no longer belongs to.

use crate::cart::{CartAction, CartLedger, CartReducer};
use crate::catalog::Catalog;
use crate::checkout::{AttemptId, CheckoutResult, CheckoutState, CheckoutStatus};
use crate::images::{ImageGenerator, ImageReport, generate_catalog_images};
use crate::order::{OrderError, OrderRequest, OrderSimulator};
use crate::session::Session;
use crate::suggestions::{AssistantAction, AssistantEnvironment, AssistantReducer, AssistantState};
use crate::telemetry::{CartMetrics, CheckoutMetrics};
use crate::types::Page;
use cartflow_core::composition::{ScopedReducer, scope_reducer};
use cartflow_core::environment::Clock;
use cartflow_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use cartflow_runtime::metrics::EffectMetrics;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything the shop shows
#[derive(Debug, Clone, PartialEq)]
pub struct ShopState {
    /// Products on offer, possibly with generated images
    pub catalog: Catalog,
    /// Cart ledger
    pub cart: CartLedger,
    /// Checkout workflow
    pub checkout: CheckoutState,
    /// Who is logged in and which page is shown
    pub session: Session,
    /// Suggestion panel
    pub assistant: AssistantState,
    /// Id for the next checkout attempt
    pub next_attempt: AttemptId,
    /// Attempt whose order has been submitted but not answered yet.
    ///
    /// Survives navigation and logout, which only detach the attempt from
    /// the checkout display.
    pub in_flight: Option<AttemptId>,
    /// Bumped whenever the catalog is restored to its baseline
    pub catalog_generation: u64,
    /// Per-item image failures from the latest generation pass
    pub image_errors: Vec<String>,
}

impl ShopState {
    /// Fresh state: baseline catalog, empty cart, login page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: Catalog::baseline(),
            cart: CartLedger::new(),
            checkout: CheckoutState::default(),
            session: Session::default(),
            assistant: AssistantState::default(),
            next_attempt: AttemptId::new(1),
            in_flight: None,
            catalog_generation: 0,
            image_errors: Vec::new(),
        }
    }

    /// Sum of price times quantity over the cart
    #[must_use]
    pub fn cart_total(&self) -> f64 {
        self.cart.total()
    }

    /// Sum of quantities over the cart
    #[must_use]
    pub fn cart_item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Whether the checkout page may be opened
    #[must_use]
    pub fn can_open_checkout(&self) -> bool {
        self.session.is_authenticated()
            && self.session.page() == Page::Catalog
            && !self.cart.is_empty()
    }

    /// Whether `ConfirmCheckout` would submit an order right now
    #[must_use]
    pub fn can_checkout(&self) -> bool {
        self.session.is_authenticated()
            && self.session.page() == Page::Checkout
            && !self.cart.is_empty()
            && !self.checkout.is_loading()
            && self.in_flight.is_none()
    }
}

impl Default for ShopState {
    fn default() -> Self {
        Self::new()
    }
}

/// Shop actions
#[derive(Debug, Clone, PartialEq)]
pub enum ShopAction {
    /// Identify the user
    Login {
        /// Email as typed
        identity: String,
    },
    /// End the session, dropping cart and catalog changes
    Logout,
    /// Cart ledger mutation
    Cart(CartAction),
    /// Catalog page to checkout page
    NavigateToCheckout,
    /// Back to the catalog page
    NavigateToCatalog,
    /// Place the order (also used to retry after an error)
    ConfirmCheckout,
    /// Order simulator answered
    CheckoutResolved {
        /// Attempt this result belongs to
        attempt: AttemptId,
        /// Outcome or raised error
        result: CheckoutResult,
    },
    /// Image generation pass finished
    ImagesGenerated {
        /// Catalog generation the pass started from
        generation: u64,
        /// What was generated
        report: ImageReport,
    },
    /// Ask the assistant about the current cart
    OpenAssistant,
    /// Assistant panel action
    Assistant(AssistantAction),
}

/// Shop dependencies
#[derive(Clone)]
pub struct ShopEnvironment<C> {
    /// Time source for checkout timestamps
    pub clock: C,
    /// Order backend
    pub orders: Arc<dyn OrderSimulator>,
    /// Product image source
    pub images: Arc<dyn ImageGenerator>,
    /// Suggestion source
    pub assistant: AssistantEnvironment,
    /// Upper bound on one order submission
    pub checkout_timeout: Duration,
}

impl<C: Clock> ShopEnvironment<C> {
    /// Bundle the shop's collaborators
    #[must_use]
    pub const fn new(
        clock: C,
        orders: Arc<dyn OrderSimulator>,
        images: Arc<dyn ImageGenerator>,
        assistant: AssistantEnvironment,
        checkout_timeout: Duration,
    ) -> Self {
        Self {
            clock,
            orders,
            images,
            assistant,
            checkout_timeout,
        }
    }
}

type CartScope<C> = ScopedReducer<ShopState, ShopAction, ShopEnvironment<C>, CartReducer>;
type AssistantScope<C> = ScopedReducer<ShopState, ShopAction, ShopEnvironment<C>, AssistantReducer>;

fn cart_state(state: &mut ShopState) -> &mut CartLedger {
    &mut state.cart
}

fn cart_env<C>(_env: &ShopEnvironment<C>) -> &() {
    &()
}

fn assistant_state(state: &mut ShopState) -> &mut AssistantState {
    &mut state.assistant
}

fn assistant_env<C>(env: &ShopEnvironment<C>) -> &AssistantEnvironment {
    &env.assistant
}

/// Reducer for the whole shop
pub struct ShopReducer<C> {
    cart: CartScope<C>,
    assistant: AssistantScope<C>,
}

impl<C: Clock> ShopReducer<C> {
    /// Create the reducer with the cart and assistant features embedded
    #[must_use]
    pub fn new() -> Self {
        Self {
            cart: scope_reducer(CartReducer, cart_state, cart_env::<C>, ShopAction::Cart),
            assistant: scope_reducer(
                AssistantReducer,
                assistant_state,
                assistant_env::<C>,
                ShopAction::Assistant,
            ),
        }
    }

    fn login(
        state: &mut ShopState,
        identity: &str,
        env: &ShopEnvironment<C>,
    ) -> SmallVec<[Effect<ShopAction>; 4]> {
        if state.session.is_authenticated() {
            tracing::debug!("Login ignored, a user is already logged in");
            return smallvec![Effect::None];
        }

        if !state.session.login(identity) {
            tracing::warn!("Login rejected: empty identity");
            return smallvec![Effect::None];
        }

        if let Some(user) = state.session.user() {
            tracing::info!(user = %user.email, "User logged in");
        }

        let generation = state.catalog_generation;
        let catalog = state.catalog.clone();
        let images = Arc::clone(&env.images);

        smallvec![Effect::Future(Box::pin(async move {
            let started = Instant::now();
            let report = generate_catalog_images(&catalog, images.as_ref()).await;
            EffectMetrics::record_duration("images", started.elapsed());
            Some(ShopAction::ImagesGenerated { generation, report })
        }))]
    }

    fn logout(
        &self,
        state: &mut ShopState,
        env: &ShopEnvironment<C>,
    ) -> SmallVec<[Effect<ShopAction>; 4]> {
        if let Some(user) = state.session.user() {
            tracing::info!(user = %user.email, "User logged out");
        }

        state.session.logout();
        state.cart.clear();
        state.checkout.reset();
        state.catalog = Catalog::baseline();
        state.catalog_generation = state.catalog_generation.wrapping_add(1);
        state.image_errors.clear();

        self.assistant
            .reduce_child(state, AssistantAction::Dismiss, env)
    }

    fn confirm_checkout(
        state: &mut ShopState,
        env: &ShopEnvironment<C>,
    ) -> SmallVec<[Effect<ShopAction>; 4]> {
        if !state.can_checkout() {
            tracing::debug!(
                status = state.checkout.status().as_str(),
                page = ?state.session.page(),
                lines = state.cart.len(),
                in_flight = ?state.in_flight,
                "Checkout not allowed"
            );
            return smallvec![Effect::None];
        }

        let Some(user) = state.session.user() else {
            return smallvec![Effect::None];
        };
        let request = OrderRequest::from_cart(user, &state.cart);

        let attempt = state.next_attempt;
        if !state.checkout.begin(attempt, env.clock.now()) {
            return smallvec![Effect::None];
        }
        state.next_attempt = attempt.next();
        state.in_flight = Some(attempt);

        CheckoutMetrics::record_attempt();
        tracing::info!(
            attempt = %attempt,
            user = %request.user_email,
            total = request.total,
            items = %request.describe_items(),
            "Submitting order"
        );

        let orders = Arc::clone(&env.orders);
        let timeout = env.checkout_timeout;

        smallvec![Effect::Future(Box::pin(async move {
            let started = Instant::now();
            let result = tokio::time::timeout(timeout, orders.submit(request))
                .await
                .unwrap_or(Err(OrderError::TimedOut));
            EffectMetrics::record_duration("checkout", started.elapsed());
            Some(ShopAction::CheckoutResolved { attempt, result })
        }))]
    }

    fn checkout_resolved(
        state: &mut ShopState,
        attempt: AttemptId,
        result: &CheckoutResult,
        env: &ShopEnvironment<C>,
    ) {
        if state.in_flight == Some(attempt) {
            state.in_flight = None;
        }

        match state.checkout.resolve(attempt, result, env.clock.now()) {
            Some(CheckoutStatus::Success) => {
                state.cart.clear();
                CheckoutMetrics::record_outcome(CheckoutStatus::Success);
                tracing::info!(
                    attempt = %attempt,
                    order_id = state.checkout.order_id().unwrap_or_default(),
                    "Checkout succeeded"
                );
            },
            Some(status) => {
                CheckoutMetrics::record_outcome(status);
                tracing::warn!(
                    attempt = %attempt,
                    message = state.checkout.message().unwrap_or_default(),
                    "Checkout failed"
                );
            },
            None => {
                tracing::debug!(attempt = %attempt, "Ignoring result of detached checkout attempt");
            },
        }
    }

    fn images_generated(state: &mut ShopState, generation: u64, report: &ImageReport) {
        if generation != state.catalog_generation || !state.session.is_authenticated() {
            tracing::debug!(generation, current = state.catalog_generation, "Discarding stale images");
            return;
        }

        tracing::info!(
            generated = report.images.len(),
            failed = report.failures.len(),
            "Applying generated product images"
        );
        state.catalog = state.catalog.with_images(&report.images);
        state.image_errors.clone_from(&report.failures);
    }
}

impl<C: Clock> Default for ShopReducer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for ShopReducer<C> {
    fn clone(&self) -> Self {
        Self {
            cart: self.cart.clone(),
            assistant: self.assistant.clone(),
        }
    }
}

impl<C: Clock> Reducer for ShopReducer<C> {
    type State = ShopState;
    type Action = ShopAction;
    type Environment = ShopEnvironment<C>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ShopAction::Login { identity } => Self::login(state, &identity, env),
            ShopAction::Logout => self.logout(state, env),
            ShopAction::Cart(action) => {
                // The cart is frozen while an order for it is in flight
                if !state.session.is_authenticated() || state.checkout.is_loading() {
                    tracing::debug!(op = action.op(), "Cart action ignored");
                    return smallvec![Effect::None];
                }

                CartMetrics::record_mutation(action.op());
                self.cart.reduce_child(state, action, env)
            },
            ShopAction::NavigateToCheckout => {
                if !state.can_open_checkout() {
                    return smallvec![Effect::None];
                }

                state.checkout.reset();
                state.session.navigate(Page::Checkout);
                smallvec![Effect::None]
            },
            ShopAction::NavigateToCatalog => {
                if !state.session.is_authenticated() {
                    return smallvec![Effect::None];
                }

                state.checkout.reset();
                state.session.navigate(Page::Catalog);
                smallvec![Effect::None]
            },
            ShopAction::ConfirmCheckout => Self::confirm_checkout(state, env),
            ShopAction::CheckoutResolved { attempt, result } => {
                Self::checkout_resolved(state, attempt, &result, env);
                smallvec![Effect::None]
            },
            ShopAction::ImagesGenerated { generation, report } => {
                Self::images_generated(state, generation, &report);
                smallvec![Effect::None]
            },
            ShopAction::OpenAssistant => {
                if !state.session.is_authenticated() {
                    return smallvec![Effect::None];
                }

                let lines = state.cart.lines().to_vec();
                self.assistant
                    .reduce_child(state, AssistantAction::Request { lines }, env)
            },
            ShopAction::Assistant(action) => {
                if matches!(action, AssistantAction::Request { .. })
                    && !state.session.is_authenticated()
                {
                    return smallvec![Effect::None];
                }

                self.assistant.reduce_child(state, action, env)
            },
        }
    }
}
