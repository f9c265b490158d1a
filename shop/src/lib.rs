//! Cartflow shop - an in-memory grocery cart with a simulated checkout
//!
//! The shop is a single [`Store`](cartflow_runtime::Store) around one
//! [`ShopState`](app::ShopState). User input and collaborator completions
//! are both [`ShopAction`](app::ShopAction)s, reduced one at a time:
//!
//! ```text
//!  shell line ──► Command ──► ShopAction ──► ShopReducer ──► ShopState
//!                                               │
//!                                            Effects
//!                     ┌─────────────────────────┼──────────────────────┐
//!                     ▼                         ▼                      ▼
//!              OrderSimulator            ImageGenerator        SuggestionService
//!           (CheckoutResolved)         (ImagesGenerated)      (Assistant(Received))
//! ```
//!
//! # Features
//!
//! - **Cart ledger**: merge on add, clamped quantity edits, derived totals
//! - **Checkout workflow**: `idle → loading → success | error`, retry from
//!   error, no double submission, late results of abandoned attempts dropped
//! - **Session**: login, logout (restores the baseline catalog and empties
//!   the cart), page guards
//! - **Collaborators**: simulated order backend with pluggable randomness,
//!   per-item image generation, Gemini-backed shopping suggestions

pub mod app;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod command;
pub mod config;
pub mod gemini;
pub mod images;
pub mod order;
pub mod session;
pub mod suggestions;
pub mod telemetry;
pub mod types;

pub use app::{ShopAction, ShopEnvironment, ShopReducer, ShopState};
pub use config::ShopConfig;
