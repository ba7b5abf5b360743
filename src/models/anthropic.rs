//! Anthropic Messages API adapter.
//!
//! The Messages API has no `system` role: every system message is folded
//! into the top-level `system` field, in order.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::ModelAdapter;
use super::transport::ensure_success;
use super::types::{ChatMessage, MessageRole, ModelId};
use crate::app::ProviderSettings;
use crate::constants::{ANTHROPIC_API_VERSION, ANTHROPIC_DEFAULT_MAX_TOKENS, UNSUPPORTED_RESPONSE};
use crate::utils::AdapterError;

pub struct AnthropicAdapter {
    client: Client,
    settings: ProviderSettings,
}

impl AnthropicAdapter {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn model(&self) -> ModelId {
        ModelId::Anthropic
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, AdapterError> {
        let api_key = self
            .settings
            .api_key()
            .ok_or_else(|| AdapterError::MissingApiKey(self.settings.api_key_env.clone()))?;

        let body = build_request(&self.settings, messages);
        let url = format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.settings.model, messages = body.messages.len(), "Calling Anthropic");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
        extract_reply(parsed)
    }
}

fn build_request<'a>(settings: &'a ProviderSettings, messages: &'a [ChatMessage]) -> MessagesRequest<'a> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|msg| msg.role == MessageRole::System)
        .map(|msg| msg.content.as_str())
        .collect();

    let turns = messages
        .iter()
        .filter_map(|msg| {
            let role = match msg.role {
                MessageRole::System => return None,
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            Some(WireMessage {
                role,
                content: &msg.content,
            })
        })
        .collect();

    MessagesRequest {
        model: &settings.model,
        max_tokens: settings.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
        system: (!system.is_empty()).then(|| system.join("\n\n")),
        messages: turns,
    }
}

fn extract_reply(response: MessagesResponse) -> Result<String, AdapterError> {
    match response.content.into_iter().next() {
        Some(ContentBlock::Text { text }) => Ok(text),
        Some(ContentBlock::Other) => Ok(UNSUPPORTED_RESPONSE.to_string()),
        None => Err(AdapterError::MalformedResponse("empty content in message".to_string())),
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
