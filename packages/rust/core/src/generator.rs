//! Text generation service client.
//!
//! [`TextGenerator`] is the seam between annotation and the remote model;
//! [`OpenAiClient`] speaks the chat completions protocol over `reqwest`.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use leetscribe_shared::{ApiKey, LeetscribeError, LlmConfig, Result};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("Leetscribe/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body carried into an error message.
const ERROR_EXCERPT_CHARS: usize = 200;

/// One prompt pair sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
}

/// Produces text for a prompt pair.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// Chat completions client.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
}

impl OpenAiClient {
    /// Client for `<api_base>/chat/completions`.
    pub fn new(api_base: &str, api_key: ApiKey, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| LeetscribeError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key,
        })
    }

    pub fn from_config(config: &LlmConfig, api_key: ApiKey) -> Result<Self> {
        Self::new(
            &config.api_base,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextGenerator for OpenAiClient {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| LeetscribeError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LeetscribeError::Network(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(LeetscribeError::Enrichment(format!(
                "HTTP {status}: {}",
                excerpt(&text)
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            LeetscribeError::Enrichment(format!("malformed response: {e}: {}", excerpt(&text)))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LeetscribeError::Enrichment("response had no message content".into()))?;

        debug!(chars = content.len(), "generation complete");
        Ok(content)
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "gpt-3.5-turbo".into(),
            system_prompt: "You are terse.".into(),
            user_prompt: "int main() {}".into(),
            temperature: 0.0,
        }
    }

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(&server.uri(), ApiKey::new("sk-test"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "You are terse."},
                    {"role": "user", "content": "int main() {}"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "O(1) time, O(1) space"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).generate(&request()).await.unwrap();
        assert_eq!(text, "O(1) time, O(1) space");
    }

    #[tokio::test]
    async fn http_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
            .mount(&server)
            .await;

        let err = client(&server).generate(&request()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"), "{msg}");
        assert!(msg.contains("rate limit exceeded"), "{msg}");
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).generate(&request()).await.unwrap_err();
        assert!(matches!(err, LeetscribeError::Enrichment(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        assert!(client(&server).generate(&request()).await.is_err());
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let client = OpenAiClient::new(
            "https://api.openai.com/v1/",
            ApiKey::new("k"),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn excerpt_is_char_safe() {
        let long = "é".repeat(500);
        let cut = excerpt(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), ERROR_EXCERPT_CHARS + 3);
    }
}
