// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod anthropic;
mod factory;
mod gemini;
mod openai;
mod traits;
mod transport;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use anthropic::AnthropicAdapter;
pub use factory::{AdapterRegistry, ModelFactory};
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use traits::ModelAdapter;
pub use types::{ChatMessage, MessageRole, ModelId, ModelSelection};

#[cfg(test)]
pub use traits::MockModelAdapter;
