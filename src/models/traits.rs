use async_trait::async_trait;

use super::types::{ChatMessage, ModelId};
use crate::utils::AdapterError;

/// Core trait that all provider backends must implement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Which model this adapter speaks for
    fn model(&self) -> ModelId;

    /// Send the conversation and return the first textual reply.
    ///
    /// A reply that carries no text is returned as the
    /// "Unsupported response type" marker rather than an error.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, AdapterError>;
}
