use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::types::ConversationSession;
use crate::utils::ChorusError;

/// Durable home for the session list.
///
/// The store hands over the complete list on every mutation; there is no
/// incremental update.
pub trait SessionRepository: Send {
    fn save(&self, sessions: &[ConversationSession]) -> Result<(), ChorusError>;

    /// Empty when nothing has been saved yet
    fn load(&self) -> Result<Vec<ConversationSession>, ChorusError>;
}

/// Keeps all sessions in a single JSON file
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionRepository for JsonFileRepository {
    fn save(&self, sessions: &[ConversationSession]) -> Result<(), ChorusError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(sessions)?;
        // Replace atomically through a sibling temp file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(sessions = sessions.len(), path = %self.path.display(), "Saved sessions");
        Ok(())
    }

    fn load(&self) -> Result<Vec<ConversationSession>, ChorusError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&json)?)
    }
}

/// Session list held in memory; clones share the same list
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<Vec<ConversationSession>>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing list
    pub fn with_sessions(sessions: Vec<ConversationSession>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(sessions)),
            saves: Arc::default(),
        }
    }

    /// Last saved list
    pub fn snapshot(&self) -> Vec<ConversationSession> {
        self.sessions.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// How many times `save` has run
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|count| *count).unwrap_or_default()
    }
}

impl SessionRepository for InMemoryRepository {
    fn save(&self, sessions: &[ConversationSession]) -> Result<(), ChorusError> {
        if let Ok(mut stored) = self.sessions.lock() {
            *stored = sessions.to_vec();
        }
        if let Ok(mut count) = self.saves.lock() {
            *count += 1;
        }
        Ok(())
    }

    fn load(&self) -> Result<Vec<ConversationSession>, ChorusError> {
        Ok(self.snapshot())
    }
}
