use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::SELF_MENTION_TOKEN;
use crate::models::{ModelId, ModelSelection};

/// `@token` for every known model plus the reserved self-reference token.
/// No trailing word boundary: `@openaiX` still addresses openai.
static MENTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let tokens: Vec<&str> = ModelId::ALL
        .iter()
        .map(ModelId::as_str)
        .chain(std::iter::once(SELF_MENTION_TOKEN))
        .collect();
    Regex::new(&format!("(?i)@({})", tokens.join("|"))).expect("mention pattern is valid")
});

/// Where one user message goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    targets: Vec<ModelId>,
    explicit: bool,
}

impl Route {
    /// Target models in dispatch order; never empty
    pub fn targets(&self) -> &[ModelId] {
        &self.targets
    }

    /// Whether the targets came from `@` mentions rather than the selection
    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn into_targets(self) -> Vec<ModelId> {
        self.targets
    }
}

/// Distinct models mentioned in `message`, in first-occurrence order.
/// `@user` is recognised and dropped.
pub fn mentions(message: &str) -> Vec<ModelId> {
    let mut found = Vec::new();
    for capture in MENTION_PATTERN.captures_iter(message) {
        let Ok(model) = capture[1].parse::<ModelId>() else {
            continue; // the self-reference token
        };
        if !found.contains(&model) {
            found.push(model);
        }
    }
    found
}

/// Decide which models receive `message`
pub fn route(message: &str, selection: &ModelSelection) -> Route {
    let mentioned = mentions(message);
    if !mentioned.is_empty() {
        return Route {
            targets: mentioned,
            explicit: true,
        };
    }

    let mut targets = selection.members();
    if targets.is_empty() {
        targets.push(ModelId::DEFAULT);
    }
    Route {
        targets,
        explicit: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_in_first_occurrence_order() {
        let route = route("@gemini what do you think @openai?", &ModelSelection::default());
        assert!(route.is_explicit());
        assert_eq!(route.targets(), &[ModelId::Gemini, ModelId::OpenAi]);
    }

    #[test]
    fn test_mentions_are_case_insensitive_and_deduplicated() {
        assert_eq!(
            mentions("@Anthropic and @GEMINI, then @anthropic again"),
            vec![ModelId::Anthropic, ModelId::Gemini]
        );
    }

    #[test]
    fn test_user_token_is_discarded() {
        let route = route("@user asked @anthropic", &ModelSelection::All);
        assert!(route.is_explicit());
        assert_eq!(route.targets(), &[ModelId::Anthropic]);
    }

    #[test]
    fn test_only_user_mention_falls_back_to_selection() {
        let route = route("hey @user", &ModelSelection::Single(ModelId::Gemini));
        assert!(!route.is_explicit());
        assert_eq!(route.targets(), &[ModelId::Gemini]);
    }

    #[test]
    fn test_unknown_mentions_are_ignored() {
        assert!(mentions("@llama @mistral hello").is_empty());
        assert!(mentions("mail me at someone@example.com").is_empty());
    }

    #[test]
    fn test_mention_without_word_boundary() {
        assert_eq!(mentions("@openaifan here"), vec![ModelId::OpenAi]);
    }

    #[test]
    fn test_no_mention_uses_selection() {
        assert_eq!(
            route("Hello", &ModelSelection::Single(ModelId::OpenAi)).targets(),
            &[ModelId::OpenAi]
        );
        assert_eq!(
            route("Hello", &ModelSelection::All).targets(),
            &[ModelId::OpenAi, ModelId::Anthropic, ModelId::Gemini]
        );
        assert_eq!(
            route("Hello", &ModelSelection::parse("gemini,anthropic")).into_targets(),
            vec![ModelId::Anthropic, ModelId::Gemini]
        );
    }

    #[test]
    fn test_route_is_never_empty() {
        for selection in [
            ModelSelection::default(),
            ModelSelection::All,
            ModelSelection::subset([]),
            ModelSelection::parse(""),
        ] {
            assert!(!route("", &selection).targets().is_empty());
        }
    }
}
