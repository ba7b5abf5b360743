use chrono::Utc;

use super::persistence::SessionRepository;
use super::types::{ConversationSession, Turn};
use crate::constants::DEFAULT_SESSION_NAME;
use crate::models::ModelSelection;
use crate::utils::ChorusError;

/// Owns the canonical session list and the active session.
///
/// Every mutation is mirrored to the repository in full before returning.
pub struct ConversationStore {
    repository: Box<dyn SessionRepository>,
    sessions: Vec<ConversationSession>,
    active: usize,
    default_selection: ModelSelection,
}

impl ConversationStore {
    /// Load sessions, creating the initial session when none exist
    pub fn init(
        repository: Box<dyn SessionRepository>,
        default_selection: ModelSelection,
    ) -> Result<Self, ChorusError> {
        let sessions = repository.load()?;
        let mut store = Self {
            repository,
            sessions,
            active: 0,
            default_selection,
        };

        if store.sessions.is_empty() {
            tracing::info!("No saved sessions, creating the default session");
            store
                .sessions
                .push(ConversationSession::initial(store.default_selection.clone()));
            store.persist()?;
        }

        Ok(store)
    }

    pub fn sessions(&self) -> &[ConversationSession] {
        &self.sessions
    }

    pub fn active(&self) -> &ConversationSession {
        &self.sessions[self.active]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.active().turns
    }

    pub fn selection(&self) -> &ModelSelection {
        &self.active().selection
    }

    /// Append a turn to the active session
    pub fn append_turn(&mut self, turn: Turn) -> Result<(), ChorusError> {
        self.sessions[self.active].push_turn(turn);
        self.persist()
    }

    /// Change which models receive unmentioned messages
    pub fn replace_selection(&mut self, selection: ModelSelection) -> Result<(), ChorusError> {
        let session = &mut self.sessions[self.active];
        session.selection = selection;
        session.touch();
        self.persist()
    }

    /// Create an empty session that inherits the active selection and
    /// becomes active. Returns its id.
    pub fn new_session(&mut self) -> Result<String, ChorusError> {
        let id = self.fresh_id();
        let name = format!("Chat {}", self.sessions.len() + 1);
        let selection = self.selection().clone();

        self.sessions.push(ConversationSession::new(id.clone(), name, selection));
        self.active = self.sessions.len() - 1;
        tracing::debug!(session = %id, "Created session");
        self.persist()?;
        Ok(id)
    }

    /// Remove a session. Deleting the active one activates the first
    /// remaining session, or a fresh default one if none remain.
    pub fn delete_session(&mut self, id: &str) -> Result<(), ChorusError> {
        let index = self.index_of(id)?;
        let active_id = self.active().id.clone();
        self.sessions.remove(index);

        if active_id == id {
            if self.sessions.is_empty() {
                let fresh = ConversationSession::new(
                    self.fresh_id(),
                    DEFAULT_SESSION_NAME,
                    self.default_selection.clone(),
                );
                self.sessions.push(fresh);
            }
            self.active = 0;
        } else {
            self.active = self.index_of(&active_id)?;
        }

        tracing::debug!(session = %id, "Deleted session");
        self.persist()
    }

    /// Rename a session; blank names are ignored
    pub fn rename_session(&mut self, id: &str, name: &str) -> Result<(), ChorusError> {
        let index = self.index_of(id)?;
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let session = &mut self.sessions[index];
        session.name = name.to_string();
        session.touch();
        self.persist()
    }

    /// Make another session active
    pub fn switch_session(&mut self, id: &str) -> Result<(), ChorusError> {
        self.active = self.index_of(id)?;
        self.persist()
    }

    /// Drop every turn of the active session
    pub fn clear_active_session(&mut self) -> Result<(), ChorusError> {
        let session = &mut self.sessions[self.active];
        session.turns.clear();
        session.touch();
        self.persist()
    }

    fn index_of(&self, id: &str) -> Result<usize, ChorusError> {
        self.sessions
            .iter()
            .position(|session| session.id == id)
            .ok_or_else(|| ChorusError::SessionNotFound(id.to_string()))
    }

    /// Millisecond timestamp, suffixed if another session already uses it
    fn fresh_id(&self) -> String {
        let base = Utc::now().timestamp_millis().to_string();
        let mut id = base.clone();
        let mut suffix = 1;
        while self.sessions.iter().any(|session| session.id == id) {
            id = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        id
    }

    fn persist(&self) -> Result<(), ChorusError> {
        self.repository.save(&self.sessions)
    }
}
