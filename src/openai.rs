use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ChatError, ChatResult};
use crate::state::ChatMessage;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Body of `POST /chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Success body. A missing or null `choices` reads as no choices.
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    choices: Option<Vec<CompletionChoice>>,
}

impl CompletionResponse {
    /// Content of the first choice, if the provider sent any text.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .as_deref()
            .and_then(|choices| choices.first())
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

/// Pull `error.message` out of an error body, tolerating anything else.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
}

/// The two remote calls the widget makes.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Read-only credential check against the model listing.
    async fn verify_key(&self) -> ChatResult<()>;

    /// Returns the raw first-choice content; `None` when the provider sent none.
    async fn complete(&self, request: &CompletionRequest) -> ChatResult<Option<String>>;
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check_status(response: Response) -> ChatResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "OpenAI API returned an error");
        Err(ChatError::api(status.as_u16(), error_message(&text)))
    }
}

#[async_trait]
impl CompletionApi for OpenAIClient {
    async fn verify_key(&self) -> ChatResult<()> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Self::check_status(response).await?;
        info!("API key verified");
        Ok(())
    }

    async fn complete(&self, request: &CompletionRequest) -> ChatResult<Option<String>> {
        info!(
            model = %request.model,
            messages = request.messages.len(),
            "requesting chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let text = response.text().await?;
        let completion: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| ChatError::malformed(e.to_string()))?;

        Ok(completion.first_content().map(str::to_string))
    }
}
