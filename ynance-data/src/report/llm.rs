use crate::{config::LlmConfig, error::DataError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Generation requests take far longer than market-data calls.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are a markets analyst writing concise commentary for retail \
    investors. Answer in Markdown using exactly the requested section headings.";

/// Prompt-in, text-out generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, DataError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the first choice's content from a chat completions response body.
pub fn parse_completion(body: &str) -> Result<String, DataError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| DataError::Generation("response contained no choices".to_string()))
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint, authenticated with a bearer key.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    config: LlmConfig,
    api_key: String,
}

// Keys never reach the logs.
impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl ChatCompletionsClient {
    pub fn new(config: LlmConfig, api_key: &str) -> Result<Self, DataError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_LLM_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            config,
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String, DataError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.4,
        };

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| DataError::Generation(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| DataError::Generation(error.to_string()))?;

        if !status.is_success() {
            return Err(DataError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        debug!(model = %self.config.model, bytes = body.len(), "completion received");
        parse_completion(&body)
    }
}
