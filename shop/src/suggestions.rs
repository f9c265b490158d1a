//! AI shopping assistant.
//!
//! Builds a cart-aware prompt, asks a [`SuggestionService`] for tips, and
//! validates the reply before anything is shown. Assistant failures stay
//! inside [`AssistantState`]; they never touch the cart or checkout.

use crate::gemini::{GeminiClient, GeminiError};
use crate::telemetry::SuggestionMetrics;
use crate::types::{CartLine, Suggestion};
use cartflow_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use cartflow_runtime::metrics::EffectMetrics;
use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Shown when the reply does not have the expected shape
pub const MALFORMED_MESSAGE: &str = "Received malformed suggestions from AI.";

const RESPONSE_FORMAT: &str = "Format your response as a JSON array of objects, where each object has a \
'title' (string, short and catchy) and a 'suggestion' (string, 1-2 sentences).";

/// Suggestion failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestionError {
    /// No API key configured
    #[error("Gemini API Key (GEMINI_API_KEY environment variable) is not configured. AI features are disabled.")]
    NotConfigured,

    /// Reply was not a JSON array of `{title, suggestion}`
    #[error("Received malformed suggestions from AI.")]
    Malformed,

    /// Reply was not JSON at all
    #[error("Invalid JSON in suggestions: {0}")]
    InvalidJson(String),

    /// The model call failed
    #[error(transparent)]
    Gemini(#[from] GeminiError),
}

/// Prompt for the current cart contents
#[must_use]
pub fn build_prompt(lines: &[CartLine]) -> String {
    let mut prompt = String::from("You are a helpful shopping assistant. ");

    if lines.is_empty() {
        prompt.push_str("Provide 2-3 general smart shopping tips for groceries. ");
        prompt.push_str(RESPONSE_FORMAT);
    } else {
        let items = lines
            .iter()
            .map(|line| format!("{} (Quantity: {})", line.item.name, line.quantity))
            .collect::<Vec<_>>()
            .join(", ");

        prompt.push_str(&format!(
            "Based on the following items in the shopping cart: {items}. "
        ));
        prompt.push_str("Provide 2-3 concise and actionable shopping tips or healthy meal ideas. ");
        prompt.push_str(RESPONSE_FORMAT);
        prompt.push_str(
            " Example: [{'title': 'Smart Snacking', 'suggestion': 'Apples are great for snacks. \
             Pair them with almond butter for a protein boost.'}]",
        );
    }

    prompt
}

/// Strip a surrounding Markdown code fence, with or without a language tag.
fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return text;
    };

    let body = inner
        .trim_start_matches(|c: char| c.is_alphanumeric() || c == '_')
        .trim();

    if body.is_empty() { text } else { body }
}

/// Validate a model reply into suggestions.
///
/// Accepts a JSON array (optionally fenced) whose every element has
/// non-empty string `title` and `suggestion` fields. An empty array is a
/// valid "no suggestions" reply.
///
/// # Errors
///
/// `InvalidJson` if the text is not JSON, `Malformed` if the shape is wrong.
pub fn parse_suggestions(text: &str) -> Result<Vec<Suggestion>, SuggestionError> {
    let json = strip_code_fence(text.trim());

    let value: Value =
        serde_json::from_str(json).map_err(|e| SuggestionError::InvalidJson(e.to_string()))?;

    let Value::Array(entries) = value else {
        return Err(SuggestionError::Malformed);
    };

    entries
        .iter()
        .map(|entry| {
            let field = |name: &str| {
                entry
                    .get(name)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            };

            match (field("title"), field("suggestion")) {
                (Some(title), Some(suggestion)) => Ok(Suggestion { title, suggestion }),
                _ => Err(SuggestionError::Malformed),
            }
        })
        .collect()
}

/// Source of shopping suggestions
pub trait SuggestionService: Send + Sync {
    /// Suggestions for the given cart lines
    fn suggest<'a>(
        &'a self,
        lines: &'a [CartLine],
    ) -> BoxFuture<'a, Result<Vec<Suggestion>, SuggestionError>>;
}

/// Suggestions from a Gemini model
#[derive(Debug, Clone)]
pub struct GeminiSuggestionService {
    client: GeminiClient,
}

impl GeminiSuggestionService {
    /// Wrap a configured client
    #[must_use]
    pub const fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

impl SuggestionService for GeminiSuggestionService {
    fn suggest<'a>(
        &'a self,
        lines: &'a [CartLine],
    ) -> BoxFuture<'a, Result<Vec<Suggestion>, SuggestionError>> {
        Box::pin(async move {
            let prompt = build_prompt(lines);
            let text = self.client.generate_content(&prompt).await?;
            parse_suggestions(&text)
        })
    }
}

/// Used when no API key is configured; every request fails with
/// [`SuggestionError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredSuggestions;

impl SuggestionService for UnconfiguredSuggestions {
    fn suggest<'a>(
        &'a self,
        _lines: &'a [CartLine],
    ) -> BoxFuture<'a, Result<Vec<Suggestion>, SuggestionError>> {
        Box::pin(async { Err(SuggestionError::NotConfigured) })
    }
}

/// What the assistant panel shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssistantStatus {
    /// Closed or not yet asked
    #[default]
    Idle,
    /// Waiting for the service
    Loading,
    /// Validated suggestions, possibly none
    Ready(Vec<Suggestion>),
    /// `Failed to get suggestions. <reason>`
    Failed(String),
}

/// Assistant state; `request` identifies the latest request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantState {
    /// Current panel contents
    pub status: AssistantStatus,
    /// Id of the latest request; older replies are dropped
    pub request: u64,
}

/// Assistant actions
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantAction {
    /// Ask for suggestions about these lines
    Request {
        /// Cart snapshot
        lines: Vec<CartLine>,
    },
    /// Service replied
    Received {
        /// Request this reply answers
        request: u64,
        /// Reply
        result: Result<Vec<Suggestion>, SuggestionError>,
    },
    /// Close the panel, dropping any in-flight reply
    Dismiss,
}

/// Dependencies of the assistant
#[derive(Clone)]
pub struct AssistantEnvironment {
    /// Suggestion source
    pub service: Arc<dyn SuggestionService>,
}

impl AssistantEnvironment {
    /// Wrap a suggestion service
    #[must_use]
    pub fn new(service: Arc<dyn SuggestionService>) -> Self {
        Self { service }
    }
}

/// Drives [`AssistantState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AssistantReducer;

impl Reducer for AssistantReducer {
    type State = AssistantState;
    type Action = AssistantAction;
    type Environment = AssistantEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AssistantAction::Request { lines } => {
                if state.status == AssistantStatus::Loading {
                    return smallvec![Effect::None];
                }

                state.request = state.request.wrapping_add(1);
                state.status = AssistantStatus::Loading;

                let request = state.request;
                let service = Arc::clone(&env.service);

                smallvec![Effect::Future(Box::pin(async move {
                    let started = Instant::now();
                    let result = service.suggest(&lines).await;
                    EffectMetrics::record_duration("suggestions", started.elapsed());
                    Some(AssistantAction::Received { request, result })
                }))]
            },
            AssistantAction::Received { request, result } => {
                if request != state.request || state.status != AssistantStatus::Loading {
                    tracing::debug!(request, "Dropping stale suggestions");
                    return smallvec![Effect::None];
                }

                state.status = match result {
                    Ok(suggestions) => {
                        SuggestionMetrics::record_outcome("ok");
                        AssistantStatus::Ready(suggestions)
                    },
                    Err(error) => {
                        tracing::warn!(error = %error, "Suggestion request failed");
                        SuggestionMetrics::record_outcome("error");
                        AssistantStatus::Failed(format!("Failed to get suggestions. {error}"))
                    },
                };

                smallvec![Effect::None]
            },
            AssistantAction::Dismiss => {
                state.request = state.request.wrapping_add(1);
                state.status = AssistantStatus::Idle;
                smallvec![Effect::None]
            },
        }
    }
}
