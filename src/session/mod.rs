/// Session management module - Gateway

mod persistence;
mod store;
mod types;

pub use persistence::{InMemoryRepository, JsonFileRepository, SessionRepository};
pub use store::ConversationStore;
pub use types::{ConversationSession, Turn, TurnRole};
