use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::ModelAdapter;
use super::transport::ensure_success;
use super::types::{ChatMessage, MessageRole, ModelId};
use crate::app::ProviderSettings;
use crate::constants::UNSUPPORTED_RESPONSE;
use crate::utils::AdapterError;

/// Adapter for the OpenAI chat completions API
pub struct OpenAiAdapter {
    client: Client,
    settings: ProviderSettings,
}

impl OpenAiAdapter {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    fn model(&self) -> ModelId {
        ModelId::OpenAi
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, AdapterError> {
        let api_key = self
            .settings
            .api_key()
            .ok_or_else(|| AdapterError::MissingApiKey(self.settings.api_key_env.clone()))?;

        let body = build_request(&self.settings, messages);
        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.settings.model, messages = messages.len(), "Calling OpenAI");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
        extract_reply(parsed)
    }
}

fn build_request<'a>(settings: &'a ProviderSettings, messages: &'a [ChatMessage]) -> CompletionRequest<'a> {
    CompletionRequest {
        model: &settings.model,
        messages: messages
            .iter()
            .map(|msg| WireMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                },
                content: &msg.content,
            })
            .collect(),
        max_tokens: settings.max_tokens,
    }
}

fn extract_reply(response: CompletionResponse) -> Result<String, AdapterError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::MalformedResponse("no choices in completion".to_string()))?;

    Ok(choice
        .message
        .content
        .unwrap_or_else(|| UNSUPPORTED_RESPONSE.to_string()))
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}
