use std::fmt::Write as _;

use crate::constants::RECENT_CONTEXT_TURNS;
use crate::models::{ChatMessage, ModelId};
use crate::session::Turn;

const INTERACTION_RULES: [&str; 5] = [
    "Stay aware of the conversation context",
    "Reference previous relevant points made by others",
    "Maintain conversation continuity",
    "Be direct when responding to @ mentions",
    "Acknowledge other AIs' perspectives when relevant",
];

const CONTEXT_GUIDELINES: [&str; 5] = [
    "You can reference and build upon other models' responses",
    "Maintain awareness of the ongoing discussion",
    "Acknowledge relevant points made by others",
    "Stay focused on parts specifically mentioning you",
    "Provide your unique perspective while being collaborative",
];

const REFLECTION_POINTS: [&str; 5] = [
    "The specific context of why you were mentioned",
    "Your previous interactions in this conversation",
    "Relevant points made by other models",
    "The current topic and its evolution",
    "Your unique perspective while acknowledging others' contributions",
];

/// Composes the prompts each model receives.
///
/// Relevance checks are plain case-insensitive substring tests, so a model
/// name buried inside a longer word still counts.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    recent_window: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(RECENT_CONTEXT_TURNS)
    }
}

impl PromptBuilder {
    pub fn new(recent_window: usize) -> Self {
        Self { recent_window }
    }

    /// Persona, roster and ground rules for `target`. Depends only on the
    /// target and the fixed roster.
    pub fn system_prompt(&self, target: ModelId) -> String {
        let mut prompt = String::from(
            "You are part of an interactive multi-AI conversation system where multiple AI models \
             can communicate with each other and the user.\n\n",
        );

        let _ = writeln!(prompt, "Your Identity: You are {} ({})\n", target.label(), target.persona());

        prompt.push_str("Other participants in this system:\n");
        prompt.push_str("- User (Human): The person you're interacting with\n");
        for other in ModelId::ALL.into_iter().filter(|model| *model != target) {
            let _ = writeln!(prompt, "- {} ({})", other.label(), other.persona());
        }

        let tags: Vec<String> = ModelId::ALL.iter().map(|model| format!("@{}", model)).collect();
        prompt.push_str("\nInteraction Capabilities:\n");
        let _ = writeln!(
            prompt,
            "- Users can mention any AI using @ (e.g., @{}, {})",
            target,
            tags.join(", ")
        );
        prompt.push_str("- When mentioned, you should respond directly to the mention and reference relevant context\n");
        prompt.push_str("- You can acknowledge and reference other AIs' responses\n");
        prompt.push_str("- You should maintain your unique characteristics while being aware of the conversation flow\n");

        prompt.push_str("\nPlease:\n");
        push_numbered(&mut prompt, &INTERACTION_RULES);
        prompt.truncate(prompt.trim_end().len());
        prompt
    }

    /// Digest of the conversation from `target`'s point of view.
    ///
    /// Recent turns come from the configured window; relevant discussions
    /// and the list of other models scan the whole history.
    pub fn context_prompt(&self, history: &[Turn], target: ModelId) -> String {
        let start = history.len().saturating_sub(self.recent_window);
        let recent: Vec<String> = history[start..]
            .iter()
            .map(|turn| {
                let relevant = turn.model() == Some(target) || mentions_model(turn.content(), target);
                format!(
                    "{}{}: \"{}\"",
                    turn.speaker_label(),
                    if relevant { " (Relevant to you)" } else { "" },
                    turn.content()
                )
            })
            .collect();

        let related: Vec<String> = history
            .iter()
            .filter(|turn| mentions_model(turn.content(), target))
            .map(|turn| format!("{}: \"{}\"", turn.speaker_label(), turn.content()))
            .collect();

        let mut others: Vec<ModelId> = Vec::new();
        for model in history.iter().filter_map(Turn::model) {
            if model != target && !others.contains(&model) {
                others.push(model);
            }
        }
        let others: Vec<String> = others.iter().map(ModelId::label).collect();

        let mut prompt = String::from(
            "You are participating in a multi-model AI conversation. Here's the relevant context:\n\n",
        );

        prompt.push_str("CONVERSATION PARTICIPANTS:\n");
        let _ = writeln!(prompt, "- You ({})", target.label());
        let _ = writeln!(prompt, "- Other AI Models Present: {}", others.join(", "));
        prompt.push_str("- Human User\n\n");

        prompt.push_str("RECENT CONVERSATION HISTORY:\n");
        let _ = writeln!(prompt, "{}\n", recent.join("\n\n"));

        if !related.is_empty() {
            prompt.push_str("PREVIOUS RELEVANT DISCUSSIONS:\n");
            let _ = writeln!(prompt, "{}\n", related.join("\n"));
        }

        prompt.push_str("INTERACTION GUIDELINES:\n");
        push_numbered(&mut prompt, &CONTEXT_GUIDELINES);
        prompt.push_str("\nCurrent message where you were mentioned:");
        prompt
    }

    /// The user's message followed by the fixed reflection checklist
    pub fn reflection_prompt(&self, user_text: &str) -> String {
        let mut prompt = format!("{}\n\nPlease respond considering:\n", user_text);
        push_numbered(&mut prompt, &REFLECTION_POINTS);
        prompt.truncate(prompt.trim_end().len());
        prompt
    }

    /// Request for a model addressed by an `@` mention.
    /// `history` is the conversation before the new message was added.
    pub fn mention_request(&self, history: &[Turn], target: ModelId, user_text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_prompt(target)),
            ChatMessage::user(self.context_prompt(history, target)),
            ChatMessage::user(self.reflection_prompt(user_text)),
        ]
    }

    /// Request for a plain continuation: system prompt plus the raw history
    pub fn continuation_request(&self, history: &[Turn], target: ModelId) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(self.system_prompt(target)))
            .chain(history.iter().map(Turn::to_chat_message))
            .collect()
    }
}

/// Substring test for the model name or its `@` tag
fn mentions_model(content: &str, model: ModelId) -> bool {
    let content = content.to_lowercase();
    content.contains(&format!("@{}", model)) || content.contains(model.as_str())
}

fn push_numbered(prompt: &mut String, items: &[&str]) {
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", index + 1, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;
    use pretty_assertions::assert_eq;

    fn history(len: usize) -> Vec<Turn> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("question {}", i))
                } else {
                    Turn::assistant(format!("answer {}", i), ModelId::OpenAi)
                }
            })
            .collect()
    }

    fn recent_section(prompt: &str) -> &str {
        let start = prompt.find("RECENT CONVERSATION HISTORY:").unwrap();
        let end = prompt
            .find("PREVIOUS RELEVANT DISCUSSIONS:")
            .or_else(|| prompt.find("INTERACTION GUIDELINES:"))
            .unwrap();
        &prompt[start..end]
    }

    #[test]
    fn test_system_prompt_is_stable() {
        let builder = PromptBuilder::default();
        assert_eq!(
            builder.system_prompt(ModelId::Gemini),
            builder.system_prompt(ModelId::Gemini)
        );
    }

    #[test]
    fn test_system_prompt_roster() {
        let prompt = PromptBuilder::default().system_prompt(ModelId::Anthropic);

        assert!(prompt.contains(
            "Your Identity: You are ANTHROPIC (Claude, known for analytical and nuanced responses)"
        ));
        assert!(prompt.contains("- User (Human): The person you're interacting with"));
        assert!(prompt.contains("- OPENAI (GPT-4, known for comprehensive and detailed responses)"));
        assert!(prompt.contains("- GEMINI (Gemini, known for creative and technical responses)"));
        assert!(!prompt.contains("- ANTHROPIC ("));
        assert!(prompt.contains("(e.g., @anthropic, @openai, @anthropic, @gemini)"));
        assert!(prompt.ends_with("5. Acknowledge other AIs' perspectives when relevant"));
    }

    #[test]
    fn test_short_history_is_fully_included() {
        let prompt = PromptBuilder::default().context_prompt(&history(3), ModelId::Gemini);
        let recent = recent_section(&prompt);
        assert!(recent.contains("USER: \"question 0\""));
        assert!(recent.contains("OPENAI: \"answer 1\""));
        assert!(recent.contains("USER: \"question 2\""));
    }

    #[test]
    fn test_long_history_keeps_last_five() {
        let prompt = PromptBuilder::default().context_prompt(&history(8), ModelId::Gemini);
        let recent = recent_section(&prompt);
        for i in 0..3 {
            assert!(!recent.contains(&format!(" {}\"", i)), "turn {} leaked", i);
        }
        for i in 3..8 {
            assert!(recent.contains(&format!(" {}\"", i)), "turn {} missing", i);
        }
    }

    #[test]
    fn test_relevant_discussions_scan_full_history() {
        let mut turns = vec![Turn::user("what would @gemini say?")];
        turns.extend(history(6));

        let prompt = PromptBuilder::default().context_prompt(&turns, ModelId::Gemini);
        assert!(!recent_section(&prompt).contains("what would @gemini say?"));
        assert!(prompt.contains("PREVIOUS RELEVANT DISCUSSIONS:\nUSER: \"what would @gemini say?\"\n"));
    }

    #[test]
    fn test_relevant_section_omitted_when_empty() {
        let prompt = PromptBuilder::default().context_prompt(&history(2), ModelId::Gemini);
        assert!(!prompt.contains("PREVIOUS RELEVANT DISCUSSIONS"));
    }

    #[test]
    fn test_relevance_flags() {
        let turns = vec![
            Turn::user("Ask GEMINI please"),
            Turn::assistant("Sure", ModelId::Gemini),
            Turn::assistant("Not me", ModelId::OpenAi),
        ];
        let prompt = PromptBuilder::default().context_prompt(&turns, ModelId::Gemini);

        assert!(prompt.contains("USER (Relevant to you): \"Ask GEMINI please\""));
        assert!(prompt.contains("GEMINI (Relevant to you): \"Sure\""));
        assert!(prompt.contains("OPENAI: \"Not me\""));
    }

    #[test]
    fn test_substring_match_counts_as_relevant() {
        let turns = vec![Turn::user("the geminids meteor shower")];
        let prompt = PromptBuilder::default().context_prompt(&turns, ModelId::Gemini);
        assert!(prompt.contains("USER (Relevant to you): \"the geminids meteor shower\""));
    }

    #[test]
    fn test_other_models_exclude_target_and_dedupe() {
        let turns = vec![
            Turn::assistant("a", ModelId::Anthropic),
            Turn::assistant("b", ModelId::Gemini),
            Turn::assistant("c", ModelId::Anthropic),
            Turn::assistant("d", ModelId::OpenAi),
        ];
        let prompt = PromptBuilder::default().context_prompt(&turns, ModelId::Gemini);
        assert!(prompt.contains("- Other AI Models Present: ANTHROPIC, OPENAI\n"));
    }

    #[test]
    fn test_context_prompt_layout() {
        let turns = vec![Turn::user("hi"), Turn::assistant("hello", ModelId::OpenAi)];
        let prompt = PromptBuilder::default().context_prompt(&turns, ModelId::Anthropic);

        let expected = "You are participating in a multi-model AI conversation. Here's the relevant context:\n\
\n\
CONVERSATION PARTICIPANTS:\n\
- You (ANTHROPIC)\n\
- Other AI Models Present: OPENAI\n\
- Human User\n\
\n\
RECENT CONVERSATION HISTORY:\n\
USER: \"hi\"\n\
\n\
OPENAI: \"hello\"\n\
\n\
INTERACTION GUIDELINES:\n\
1. You can reference and build upon other models' responses\n\
2. Maintain awareness of the ongoing discussion\n\
3. Acknowledge relevant points made by others\n\
4. Stay focused on parts specifically mentioning you\n\
5. Provide your unique perspective while being collaborative\n\
\n\
Current message where you were mentioned:";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_custom_window() {
        let prompt = PromptBuilder::new(2).context_prompt(&history(4), ModelId::Gemini);
        let recent = recent_section(&prompt);
        assert!(!recent.contains("question 0"));
        assert!(!recent.contains("answer 1"));
        assert!(recent.contains("question 2"));
        assert!(recent.contains("answer 3"));
    }

    #[test]
    fn test_mention_request_shape() {
        let builder = PromptBuilder::default();
        let request = builder.mention_request(&history(2), ModelId::Gemini, "@gemini hi");

        assert_eq!(request.len(), 3);
        assert_eq!(request[0].role, MessageRole::System);
        assert_eq!(request[1].role, MessageRole::User);
        assert!(request[1].content.ends_with("Current message where you were mentioned:"));
        assert!(request[2].content.starts_with("@gemini hi\n\nPlease respond considering:\n1. "));
        assert!(request[2].content.ends_with(
            "5. Your unique perspective while acknowledging others' contributions"
        ));
    }

    #[test]
    fn test_continuation_request_keeps_history() {
        let builder = PromptBuilder::default();
        let turns = vec![Turn::user("Hello"), Turn::assistant("Hi", ModelId::OpenAi), Turn::user("More")];
        let request = builder.continuation_request(&turns, ModelId::OpenAi);

        assert_eq!(request.len(), 4);
        assert_eq!(request[0], ChatMessage::system(builder.system_prompt(ModelId::OpenAi)));
        assert_eq!(request[1], ChatMessage::user("Hello"));
        assert_eq!(request[2], ChatMessage::assistant("Hi"));
        assert_eq!(request[3], ChatMessage::user("More"));
    }
}
