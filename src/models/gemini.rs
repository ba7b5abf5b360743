use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::ModelAdapter;
use super::transport::ensure_success;
use super::types::{ChatMessage, MessageRole, ModelId};
use crate::app::ProviderSettings;
use crate::constants::UNSUPPORTED_RESPONSE;
use crate::utils::AdapterError;

/// Adapter for the Gemini `generateContent` REST endpoint
pub struct GeminiAdapter {
    client: Client,
    settings: ProviderSettings,
}

impl GeminiAdapter {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    fn model(&self) -> ModelId {
        ModelId::Gemini
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, AdapterError> {
        let api_key = self
            .settings
            .api_key()
            .ok_or_else(|| AdapterError::MissingApiKey(self.settings.api_key_env.clone()))?;

        let body = build_request(&self.settings, messages);
        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );
        tracing::debug!(model = %self.settings.model, messages = body.contents.len(), "Calling Gemini");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::MalformedResponse(e.to_string()))?;
        extract_reply(parsed)
    }
}

fn build_request<'a>(settings: &ProviderSettings, messages: &'a [ChatMessage]) -> GenerateContentRequest<'a> {
    let system_parts: Vec<Part<'a>> = messages
        .iter()
        .filter(|msg| msg.role == MessageRole::System)
        .map(|msg| Part { text: &msg.content })
        .collect();

    let contents = messages
        .iter()
        .filter_map(|msg| {
            let role = match msg.role {
                MessageRole::System => return None,
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            Some(Content {
                role: Some(role),
                parts: vec![Part { text: &msg.content }],
            })
        })
        .collect();

    GenerateContentRequest {
        contents,
        system_instruction: (!system_parts.is_empty()).then(|| Content {
            role: None,
            parts: system_parts,
        }),
        generation_config: settings.max_tokens.map(|max| GenerationConfig {
            max_output_tokens: max,
        }),
    }
}

fn extract_reply(response: GenerateContentResponse) -> Result<String, AdapterError> {
    let part = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .ok_or_else(|| AdapterError::MalformedResponse("no candidates in response".to_string()))?;

    Ok(part.text.unwrap_or_else(|| UNSUPPORTED_RESPONSE.to_string()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_and_system_instruction() {
        let settings = ProviderSettings::gemini();
        let messages = vec![
            ChatMessage::system("persona"),
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ];

        let body = serde_json::to_value(build_request(&settings, &messages)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "hello"}]}
                ],
                "systemInstruction": {"parts": [{"text": "persona"}]}
            })
        );
    }

    #[test]
    fn test_max_tokens_becomes_generation_config() {
        let mut settings = ProviderSettings::gemini();
        settings.max_tokens = Some(256);
        let messages = vec![ChatMessage::user("hi")];

        let body = serde_json::to_value(build_request(&settings, &messages)).unwrap();
        assert_eq!(body["generationConfig"], json!({"maxOutputTokens": 256}));
    }

    #[test]
    fn test_first_part_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Bonjour"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_reply(response).unwrap(), "Bonjour");
    }

    #[test]
    fn test_non_text_part_is_unsupported() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": ""}}]}}]
        }))
        .unwrap();
        assert_eq!(extract_reply(response).unwrap(), "Unsupported response type");
    }

    #[test]
    fn test_blocked_prompt_is_malformed() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert!(matches!(extract_reply(response), Err(AdapterError::MalformedResponse(_))));
    }
}
