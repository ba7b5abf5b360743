use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_SESSION_ID, DEFAULT_SESSION_NAME};
use crate::models::{ChatMessage, ModelId, ModelSelection};
use crate::utils::ChorusError;

/// Who wrote a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the conversation log.
///
/// Only assistant turns carry a model; the constructors and the
/// deserializer both enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TurnRecord")]
pub struct Turn {
    role: TurnRole,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<ModelId>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            model: None,
        }
    }

    pub fn assistant(content: impl Into<String>, model: ModelId) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            model: Some(model),
        }
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn model(&self) -> Option<ModelId> {
        self.model
    }

    /// `USER` or the uppercased model id
    pub fn speaker_label(&self) -> String {
        self.model
            .map(|model| model.label())
            .unwrap_or_else(|| "USER".to_string())
    }

    /// Provider-neutral message for this turn
    pub fn to_chat_message(&self) -> ChatMessage {
        match self.role {
            TurnRole::User => ChatMessage::user(self.content.clone()),
            TurnRole::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

#[derive(Deserialize)]
struct TurnRecord {
    role: TurnRole,
    content: String,
    #[serde(default)]
    model: Option<ModelId>,
}

impl TryFrom<TurnRecord> for Turn {
    type Error = ChorusError;

    fn try_from(record: TurnRecord) -> Result<Self, Self::Error> {
        match (record.role, record.model) {
            (TurnRole::User, Some(model)) => Err(ChorusError::InvalidTurn(format!(
                "user turn attributed to {}",
                model
            ))),
            (TurnRole::User, None) => Ok(Turn::user(record.content)),
            // Older logs may hold assistant turns without attribution
            (TurnRole::Assistant, model) => Ok(Turn {
                role: TurnRole::Assistant,
                content: record.content,
                model,
            }),
        }
    }
}

/// A named conversation thread with its own log and model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub selection: ModelSelection,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    /// Create an empty session
    pub fn new(id: impl Into<String>, name: impl Into<String>, selection: ModelSelection) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            turns: Vec::new(),
            selection,
            created_at: now,
            updated_at: now,
        }
    }

    /// The session created on first start
    pub fn initial(selection: ModelSelection) -> Self {
        Self::new(DEFAULT_SESSION_ID, DEFAULT_SESSION_NAME, selection)
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Get a summary for display
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {} turns | {}",
            self.id,
            self.updated_at.format("%Y-%m-%d %H:%M"),
            self.turns.len(),
            self.name
        )
    }
}
