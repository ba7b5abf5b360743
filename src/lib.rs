pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod prompt;
pub mod routing;
pub mod runtime;
pub mod session;
pub mod utils;

pub use app::{load_config, Config};
pub use models::{ModelAdapter, ModelFactory, ModelId, ModelSelection};
pub use routing::route;
pub use runtime::ChatOrchestrator;
pub use session::ConversationStore;
pub use utils::{AdapterError, ChorusError};
