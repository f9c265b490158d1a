//! Gemini `generateContent` client

use serde::{Deserialize, Serialize};
use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Default API base URL
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default text model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-04-17";

/// Errors that can occur when calling the Gemini API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeminiError {
    /// No API key configured
    #[error("Gemini API Key (GEMINI_API_KEY environment variable) is not configured. AI features are disabled.")]
    MissingApiKey,

    /// HTTP request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Rate limited - too many requests
    #[error("Rate limited - too many requests")]
    RateLimited,

    /// Unauthorized - invalid API key
    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    /// API returned an error
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },

    /// The response had no candidate text
    #[error("Gemini returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client against an explicit endpoint and model
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::MissingApiKey` if `api_key` is blank
    pub fn new(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GeminiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Model this client calls
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate JSON text for `prompt`
    ///
    /// Returns the concatenated text parts of the first candidate.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn generate_content(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.7,
            },
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini");

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.api_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<GenerateContentResponse>()
                    .await
                    .map_err(|e| GeminiError::ResponseParseFailed(e.to_string()))?;
                first_candidate_text(body)
            },
            StatusCode::TOO_MANY_REQUESTS => Err(GeminiError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GeminiError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorEnvelope>(&body)
                    .map_or(body, |envelope| envelope.error.message);
                Err(GeminiError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            },
        }
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

fn first_candidate_text(response: GenerateContentResponse) -> Result<String, GeminiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        Err(GeminiError::EmptyResponse)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/models/test-model:generateContent";

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key", server.uri(), "test-model").unwrap()
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let result = GeminiClient::new("  ", DEFAULT_API_URL, DEFAULT_MODEL);
        assert_eq!(result.err(), Some(GeminiError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_generate_content_returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [{ "text": "hello" }] }],
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "[{\"title\":" }, { "text": "\"t\"}]" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).generate_content("hello").await.unwrap();
        assert_eq!(text, "[{\"title\":\"t\"}]");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let result = client(&server).generate_content("hello").await;
        assert_eq!(result, Err(GeminiError::RateLimited));
    }

    #[tokio::test]
    async fn test_api_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
            })))
            .mount(&server)
            .await;

        let result = client(&server).generate_content("hello").await;
        assert_eq!(
            result,
            Err(GeminiError::ApiError {
                status: 400,
                message: "API key not valid.".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let result = client(&server).generate_content("hello").await;
        assert_eq!(result, Err(GeminiError::EmptyResponse));
    }
}
