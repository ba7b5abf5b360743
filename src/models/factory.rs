use std::collections::BTreeMap;
use std::sync::Arc;

use super::anthropic::AnthropicAdapter;
use super::gemini::GeminiAdapter;
use super::openai::OpenAiAdapter;
use super::traits::ModelAdapter;
use super::transport::build_client;
use super::types::ModelId;
use crate::app::Config;
use crate::utils::AdapterError;

/// Factory for creating provider adapters from configuration
pub struct ModelFactory;

impl ModelFactory {
    /// Create the adapter for one model
    pub fn create(model: ModelId, config: &Config) -> Result<Arc<dyn ModelAdapter>, AdapterError> {
        let client = build_client(config.http.timeout_secs)?;
        Ok(Self::create_with_client(model, config, client))
    }

    fn create_with_client(model: ModelId, config: &Config, client: reqwest::Client) -> Arc<dyn ModelAdapter> {
        let settings = config.provider(model).clone();
        match model {
            ModelId::OpenAi => Arc::new(OpenAiAdapter::new(client, settings)),
            ModelId::Anthropic => Arc::new(AnthropicAdapter::new(client, settings)),
            ModelId::Gemini => Arc::new(GeminiAdapter::new(client, settings)),
        }
    }

    /// Build a registry holding an adapter for every known model.
    ///
    /// Adapters are created even when their API key is missing; the key is
    /// checked per call so the failure shows up in the conversation.
    pub fn registry(config: &Config) -> Result<AdapterRegistry, AdapterError> {
        let client = build_client(config.http.timeout_secs)?;
        let mut registry = AdapterRegistry::new();
        for model in ModelId::ALL {
            registry.insert(Self::create_with_client(model, config, client.clone()));
        }
        Ok(registry)
    }

    /// Which models currently have an API key available
    pub fn key_status(config: &Config) -> Vec<(ModelId, String, bool)> {
        ModelId::ALL
            .into_iter()
            .map(|model| {
                let settings = config.provider(model);
                (model, settings.api_key_env.clone(), settings.api_key().is_some())
            })
            .collect()
    }
}

/// Adapters keyed by the model they serve
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<ModelId, Arc<dyn ModelAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the model it reports
    pub fn insert(&mut self, adapter: Arc<dyn ModelAdapter>) {
        self.adapters.insert(adapter.model(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn ModelAdapter>) -> Self {
        self.insert(adapter);
        self
    }

    pub fn get(&self, model: ModelId) -> Option<Arc<dyn ModelAdapter>> {
        self.adapters.get(&model).cloned()
    }

    pub fn models(&self) -> Vec<ModelId> {
        self.adapters.keys().copied().collect()
    }
}
