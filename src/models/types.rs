use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::utils::ChorusError;

/// Identifier of one supported LLM provider.
///
/// Variant order is the roster order used wherever models are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ModelId {
    /// Every known model in roster order
    pub const ALL: [ModelId; 3] = [ModelId::OpenAi, ModelId::Anthropic, ModelId::Gemini];

    /// Fallback whenever a single model is needed and nothing else applies
    pub const DEFAULT: ModelId = ModelId::OpenAi;

    /// Lowercase identifier, also the `@` mention token
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::OpenAi => "openai",
            ModelId::Anthropic => "anthropic",
            ModelId::Gemini => "gemini",
        }
    }

    /// Speaker label used in prompts and notices
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// One-line persona shown to the other participants
    pub fn persona(&self) -> &'static str {
        match self {
            ModelId::OpenAi => "GPT-4, known for comprehensive and detailed responses",
            ModelId::Anthropic => "Claude, known for analytical and nuanced responses",
            ModelId::Gemini => "Gemini, known for creative and technical responses",
        }
    }

    /// Human-facing name for menus
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelId::OpenAi => "OpenAI (GPT-4)",
            ModelId::Anthropic => "Anthropic (Claude)",
            ModelId::Gemini => "Google (Gemini)",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = ChorusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ModelId::ALL
            .into_iter()
            .find(|model| model.as_str() == wanted)
            .ok_or_else(|| ChorusError::UnknownModel(s.to_string()))
    }
}

/// Which model(s) receive messages that mention nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SelectionRepr", into = "SelectionRepr")]
pub enum ModelSelection {
    Single(ModelId),
    All,
    /// Never empty; build it through [`ModelSelection::subset`]
    Subset(BTreeSet<ModelId>),
}

impl Default for ModelSelection {
    fn default() -> Self {
        ModelSelection::Single(ModelId::DEFAULT)
    }
}

impl ModelSelection {
    /// Build a subset selection, falling back to the default model when empty
    pub fn subset(models: impl IntoIterator<Item = ModelId>) -> Self {
        let set: BTreeSet<ModelId> = models.into_iter().collect();
        if set.is_empty() {
            Self::default()
        } else {
            ModelSelection::Subset(set)
        }
    }

    /// Normalize a raw multi-select choice list.
    ///
    /// `all` anywhere wins; unknown entries are dropped; nothing left means
    /// the default model.
    pub fn from_choices<S: AsRef<str>>(choices: &[S]) -> Self {
        if choices
            .iter()
            .any(|choice| choice.as_ref().trim().eq_ignore_ascii_case("all"))
        {
            return ModelSelection::All;
        }

        let models = choices.iter().filter_map(|choice| {
            let choice = choice.as_ref();
            match choice.parse::<ModelId>() {
                Ok(model) => Some(model),
                Err(_) => {
                    tracing::warn!("Ignoring unknown model choice '{}'", choice);
                    None
                }
            }
        });
        Self::subset(models)
    }

    /// Parse a comma separated selection such as `openai,gemini` or `all`.
    /// A single model yields [`ModelSelection::Single`].
    pub fn parse(input: &str) -> Self {
        let choices: Vec<&str> = input
            .split(',')
            .map(str::trim)
            .filter(|choice| !choice.is_empty())
            .collect();

        match choices.as_slice() {
            [only] if !only.eq_ignore_ascii_case("all") => only
                .parse::<ModelId>()
                .map(ModelSelection::Single)
                .unwrap_or_default(),
            _ => Self::from_choices(&choices),
        }
    }

    /// Models addressed by this selection, in roster order
    pub fn members(&self) -> Vec<ModelId> {
        match self {
            ModelSelection::Single(model) => vec![*model],
            ModelSelection::All => ModelId::ALL.to_vec(),
            ModelSelection::Subset(set) => set.iter().copied().collect(),
        }
    }

    /// The lone model used for plain chat and for attributing notices
    pub fn default_target(&self) -> ModelId {
        match self {
            ModelSelection::Single(model) => *model,
            ModelSelection::All => ModelId::DEFAULT,
            ModelSelection::Subset(set) => set.iter().next().copied().unwrap_or(ModelId::DEFAULT),
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelection::Single(model) => write!(f, "{}", model),
            ModelSelection::All => f.write_str("all"),
            ModelSelection::Subset(set) => {
                let names: Vec<&str> = set.iter().map(ModelId::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

/// Persisted shape: `"openai"`, `"all"` or `["openai", "gemini"]`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectionRepr {
    One(String),
    Many(Vec<String>),
}

impl From<SelectionRepr> for ModelSelection {
    fn from(repr: SelectionRepr) -> Self {
        match repr {
            SelectionRepr::One(value) if value.eq_ignore_ascii_case("all") => ModelSelection::All,
            SelectionRepr::One(value) => value
                .parse::<ModelId>()
                .map(ModelSelection::Single)
                .unwrap_or_default(),
            SelectionRepr::Many(values) => ModelSelection::from_choices(&values),
        }
    }
}

impl From<ModelSelection> for SelectionRepr {
    fn from(selection: ModelSelection) -> Self {
        match selection {
            ModelSelection::Single(model) => SelectionRepr::One(model.as_str().to_string()),
            ModelSelection::All => SelectionRepr::One("all".to_string()),
            ModelSelection::Subset(set) => {
                SelectionRepr::Many(set.iter().map(|m| m.as_str().to_string()).collect())
            }
        }
    }
}

/// Role of a message sent to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Provider-neutral request message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}
