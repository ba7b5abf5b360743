use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::app::DispatchMode;
use crate::constants::GENERIC_ERROR_NOTICE;
use crate::models::{AdapterRegistry, ChatMessage, ModelAdapter, ModelId, ModelSelection};
use crate::prompt::PromptBuilder;
use crate::routing::route;
use crate::session::{ConversationSession, ConversationStore, Turn};
use crate::utils::{AdapterError, ChorusError};

/// What the UI needs to redraw
pub struct ChatUpdate<'a> {
    pub turns: &'a [Turn],
    pub busy: bool,
    pub selection: &'a ModelSelection,
}

/// Called after every state change
pub type UpdateCallback = Arc<dyn Fn(&ChatUpdate<'_>) + Send + Sync>;

/// Result of one model call within a submission
#[derive(Debug, Clone, Serialize)]
pub struct ReplyOutcome {
    /// Model that was asked
    pub target: ModelId,
    /// Turn appended for it (a notice when the call failed)
    pub turn: Turn,
    /// Adapter error, if any
    pub error: Option<String>,
}

impl ReplyOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of one submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    pub targets: Vec<ModelId>,
    pub explicit: bool,
    pub outcomes: Vec<ReplyOutcome>,
}

/// Runs user submissions against the conversation store.
///
/// `submit` takes `&mut self`, so one orchestrator never has two submissions
/// in flight. Front ends that share it across tasks put it behind a
/// `tokio::sync::Mutex`, which queues submissions in arrival order.
pub struct ChatOrchestrator {
    store: ConversationStore,
    adapters: AdapterRegistry,
    prompts: PromptBuilder,
    dispatch: DispatchMode,
    listener: Option<UpdateCallback>,
    busy: bool,
}

impl ChatOrchestrator {
    pub fn new(store: ConversationStore, adapters: AdapterRegistry) -> Self {
        Self {
            store,
            adapters,
            prompts: PromptBuilder::default(),
            dispatch: DispatchMode::default(),
            listener: None,
            busy: false,
        }
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn on_update(mut self, listener: UpdateCallback) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn turns(&self) -> &[Turn] {
        self.store.turns()
    }

    pub fn selection(&self) -> &ModelSelection {
        self.store.selection()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Handle one user message end to end.
    ///
    /// Adapter failures become notice turns; only storage errors are
    /// returned, and the busy flag is cleared either way.
    pub async fn submit(&mut self, user_text: &str) -> Result<SubmitReport, ChorusError> {
        self.set_busy(true);
        let result = self.run_submission(user_text).await;
        self.set_busy(false);
        result
    }

    async fn run_submission(&mut self, user_text: &str) -> Result<SubmitReport, ChorusError> {
        let history: Vec<Turn> = self.store.turns().to_vec();
        let selection = self.store.selection().clone();

        self.store.append_turn(Turn::user(user_text))?;
        self.notify();

        let route = route(user_text, &selection);
        let explicit = route.is_explicit();
        info!(
            targets = ?route.targets(),
            explicit,
            session = %self.store.active().id,
            "Dispatching message"
        );

        let outcomes = if explicit {
            self.answer_mentions(&history, route.targets(), user_text, &selection)
                .await?
        } else {
            vec![self.continue_chat(&selection).await?]
        };

        Ok(SubmitReport {
            targets: route.into_targets(),
            explicit,
            outcomes,
        })
    }

    /// Ask every mentioned model, appending replies in mention order
    async fn answer_mentions(
        &mut self,
        history: &[Turn],
        targets: &[ModelId],
        user_text: &str,
        selection: &ModelSelection,
    ) -> Result<Vec<ReplyOutcome>, ChorusError> {
        let mut outcomes = Vec::with_capacity(targets.len());

        match self.dispatch {
            DispatchMode::Sequential => {
                for &target in targets {
                    let messages = self.prompts.mention_request(history, target, user_text);
                    let result = call_model(self.adapters.get(target), target, messages).await;
                    outcomes.push(self.record_mention(target, result, selection)?);
                }
            }
            DispatchMode::Concurrent => {
                let calls = targets.iter().map(|&target| {
                    let messages = self.prompts.mention_request(history, target, user_text);
                    call_model(self.adapters.get(target), target, messages)
                });
                // join_all yields results in input order
                let results = join_all(calls).await;
                for (&target, result) in targets.iter().zip(results) {
                    outcomes.push(self.record_mention(target, result, selection)?);
                }
            }
        }

        Ok(outcomes)
    }

    fn record_mention(
        &mut self,
        target: ModelId,
        result: Result<String, AdapterError>,
        selection: &ModelSelection,
    ) -> Result<ReplyOutcome, ChorusError> {
        let (turn, error) = match result {
            Ok(content) => (Turn::assistant(content, target), None),
            Err(e) => {
                warn!(model = %target, error = %e, "Mentioned model unavailable");
                let notice = format!("Note: {} was mentioned but is unavailable.", target.label());
                (Turn::assistant(notice, selection.default_target()), Some(e.to_string()))
            }
        };

        self.store.append_turn(turn.clone())?;
        self.notify();
        Ok(ReplyOutcome { target, turn, error })
    }

    /// Plain chat: the default model sees the whole conversation
    async fn continue_chat(&mut self, selection: &ModelSelection) -> Result<ReplyOutcome, ChorusError> {
        let target = selection.default_target();
        let messages = self.prompts.continuation_request(self.store.turns(), target);

        let (turn, error) = match call_model(self.adapters.get(target), target, messages).await {
            Ok(content) => (Turn::assistant(content, target), None),
            Err(e) => {
                warn!(model = %target, error = %e, "Chat request failed");
                (Turn::assistant(GENERIC_ERROR_NOTICE, target), Some(e.to_string()))
            }
        };

        self.store.append_turn(turn.clone())?;
        self.notify();
        Ok(ReplyOutcome { target, turn, error })
    }

    pub fn new_session(&mut self) -> Result<String, ChorusError> {
        let id = self.store.new_session()?;
        self.notify();
        Ok(id)
    }

    pub fn delete_session(&mut self, id: &str) -> Result<(), ChorusError> {
        self.store.delete_session(id)?;
        self.notify();
        Ok(())
    }

    pub fn rename_session(&mut self, id: &str, name: &str) -> Result<(), ChorusError> {
        self.store.rename_session(id, name)?;
        self.notify();
        Ok(())
    }

    pub fn switch_session(&mut self, id: &str) -> Result<(), ChorusError> {
        self.store.switch_session(id)?;
        self.notify();
        Ok(())
    }

    pub fn set_selection(&mut self, selection: ModelSelection) -> Result<(), ChorusError> {
        self.store.replace_selection(selection)?;
        self.notify();
        Ok(())
    }

    pub fn clear_active_session(&mut self) -> Result<(), ChorusError> {
        self.store.clear_active_session()?;
        self.notify();
        Ok(())
    }

    pub fn sessions(&self) -> &[ConversationSession] {
        self.store.sessions()
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.notify();
    }

    fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener(&ChatUpdate {
                turns: self.store.turns(),
                busy: self.busy,
                selection: self.store.selection(),
            });
        }
    }
}

async fn call_model(
    adapter: Option<Arc<dyn ModelAdapter>>,
    target: ModelId,
    messages: Vec<ChatMessage>,
) -> Result<String, AdapterError> {
    let adapter = adapter.ok_or_else(|| AdapterError::NotConfigured(target.to_string()))?;
    debug!(model = %target, messages = messages.len(), "Invoking adapter");
    adapter.invoke(&messages).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageRole, MockModelAdapter};
    use crate::session::InMemoryRepository;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn mock(model: ModelId) -> MockModelAdapter {
        let mut adapter = MockModelAdapter::new();
        adapter.expect_model().return_const(model);
        adapter
    }

    fn orchestrator(
        adapters: Vec<MockModelAdapter>,
        selection: ModelSelection,
    ) -> (ChatOrchestrator, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let mut store = ConversationStore::init(Box::new(repo.clone()), ModelSelection::default()).unwrap();
        store.replace_selection(selection).unwrap();

        let mut registry = AdapterRegistry::new();
        for adapter in adapters {
            registry.insert(Arc::new(adapter));
        }
        (ChatOrchestrator::new(store, registry), repo)
    }

    fn upstream_error() -> AdapterError {
        AdapterError::Upstream {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn test_plain_message_goes_to_selected_model() {
        let mut openai = mock(ModelId::OpenAi);
        openai
            .expect_invoke()
            .times(1)
            .withf(|messages| {
                messages.len() == 2
                    && messages[0].role == MessageRole::System
                    && messages[1] == ChatMessage::user("Hello")
            })
            .returning(|_| Ok("Hi there".to_string()));

        let (mut chat, repo) = orchestrator(vec![openai], ModelSelection::Single(ModelId::OpenAi));
        let report = chat.submit("Hello").await.unwrap();

        assert!(!report.explicit);
        assert_eq!(report.targets, vec![ModelId::OpenAi]);
        assert_eq!(
            chat.turns(),
            &[Turn::user("Hello"), Turn::assistant("Hi there", ModelId::OpenAi)]
        );
        assert_eq!(repo.snapshot()[0].turns.len(), 2);
    }

    #[tokio::test]
    async fn test_plain_message_sends_full_history() {
        let mut gemini = mock(ModelId::Gemini);
        gemini
            .expect_invoke()
            .times(2)
            .returning(|messages| Ok(format!("reply to {} messages", messages.len())));

        let (mut chat, _) = orchestrator(vec![gemini], ModelSelection::Single(ModelId::Gemini));
        chat.submit("first").await.unwrap();
        chat.submit("second").await.unwrap();

        // system + user + assistant + user
        assert_eq!(chat.turns()[3].content(), "reply to 4 messages");
    }

    #[tokio::test]
    async fn test_all_selection_without_mention_calls_default_only() {
        let mut openai = mock(ModelId::OpenAi);
        openai.expect_invoke().times(1).returning(|_| Ok("only me".to_string()));
        let mut anthropic = mock(ModelId::Anthropic);
        anthropic.expect_invoke().never();

        let (mut chat, _) = orchestrator(vec![openai, anthropic], ModelSelection::All);
        let report = chat.submit("anyone there?").await.unwrap();

        assert_eq!(report.targets, ModelId::ALL.to_vec());
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].target, ModelId::OpenAi);
    }

    #[tokio::test]
    async fn test_mentions_are_answered_in_order() {
        let mut seq = Sequence::new();
        let mut gemini = mock(ModelId::Gemini);
        gemini
            .expect_invoke()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|messages| {
                messages.len() == 3
                    && messages[0].content.contains("Your Identity: You are GEMINI")
                    && messages[2].content.starts_with("@gemini what do you think @openai?")
            })
            .returning(|_| Ok("gemini says".to_string()));
        let mut openai = mock(ModelId::OpenAi);
        openai
            .expect_invoke()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|messages| messages[0].content.contains("Your Identity: You are OPENAI"))
            .returning(|_| Ok("openai says".to_string()));

        let (mut chat, _) = orchestrator(vec![gemini, openai], ModelSelection::default());
        let report = chat.submit("@gemini what do you think @openai?").await.unwrap();

        assert!(report.explicit);
        assert_eq!(report.targets, vec![ModelId::Gemini, ModelId::OpenAi]);
        assert_eq!(
            chat.turns(),
            &[
                Turn::user("@gemini what do you think @openai?"),
                Turn::assistant("gemini says", ModelId::Gemini),
                Turn::assistant("openai says", ModelId::OpenAi),
            ]
        );
    }

    #[tokio::test]
    async fn test_mention_context_excludes_new_message() {
        let mut anthropic = mock(ModelId::Anthropic);
        anthropic
            .expect_invoke()
            .times(1)
            .withf(|messages| {
                messages[1].content.contains("USER: \"earlier\"")
                    && !messages[1].content.contains("@anthropic now")
            })
            .returning(|_| Ok("ok".to_string()));
        let mut openai = mock(ModelId::OpenAi);
        openai.expect_invoke().times(1).returning(|_| Ok("first".to_string()));

        let (mut chat, _) = orchestrator(vec![anthropic, openai], ModelSelection::default());
        chat.submit("earlier").await.unwrap();
        chat.submit("@anthropic now").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_mention_is_isolated() {
        let mut anthropic = mock(ModelId::Anthropic);
        anthropic
            .expect_invoke()
            .times(1)
            .returning(|_| Err(upstream_error()));
        let mut openai = mock(ModelId::OpenAi);
        openai.expect_invoke().times(1).returning(|_| Ok("still here".to_string()));

        let (mut chat, _) = orchestrator(vec![anthropic, openai], ModelSelection::Single(ModelId::Gemini));
        let report = chat.submit("@anthropic and @openai weigh in").await.unwrap();

        assert!(!report.outcomes[0].succeeded());
        assert!(report.outcomes[1].succeeded());
        assert_eq!(
            &chat.turns()[1..],
            &[
                Turn::assistant("Note: ANTHROPIC was mentioned but is unavailable.", ModelId::Gemini),
                Turn::assistant("still here", ModelId::OpenAi),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_adapter_counts_as_unavailable() {
        let (mut chat, _) = orchestrator(vec![], ModelSelection::All);
        let report = chat.submit("@gemini hello").await.unwrap();

        assert_eq!(report.outcomes[0].error.as_deref(), Some("No adapter configured for gemini"));
        assert_eq!(
            chat.turns()[1],
            Turn::assistant("Note: GEMINI was mentioned but is unavailable.", ModelId::OpenAi)
        );
    }

    #[tokio::test]
    async fn test_plain_failure_appends_generic_notice() {
        let mut openai = mock(ModelId::OpenAi);
        openai
            .expect_invoke()
            .times(1)
            .returning(|_| Err(AdapterError::MissingApiKey("OPENAI_API_KEY".to_string())));

        let (mut chat, repo) = orchestrator(vec![openai], ModelSelection::default());
        chat.submit("Hello").await.unwrap();

        assert_eq!(
            chat.turns(),
            &[
                Turn::user("Hello"),
                Turn::assistant("Sorry, there was an error processing your request.", ModelId::OpenAi),
            ]
        );
        assert_eq!(repo.snapshot()[0].turns.len(), 2);
        assert!(!chat.is_busy());
    }

    #[tokio::test]
    async fn test_user_mention_only_uses_plain_path() {
        let mut anthropic = mock(ModelId::Anthropic);
        anthropic.expect_invoke().times(1).returning(|_| Ok("plain".to_string()));

        let (mut chat, _) = orchestrator(vec![anthropic], ModelSelection::Single(ModelId::Anthropic));
        let report = chat.submit("note to @user").await.unwrap();
        assert!(!report.explicit);
        assert_eq!(chat.turns()[1].model(), Some(ModelId::Anthropic));
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_keeps_mention_order() {
        let mut gemini = mock(ModelId::Gemini);
        gemini.expect_invoke().times(1).returning(|_| Err(upstream_error()));
        let mut anthropic = mock(ModelId::Anthropic);
        anthropic.expect_invoke().times(1).returning(|_| Ok("claude".to_string()));
        let mut openai = mock(ModelId::OpenAi);
        openai.expect_invoke().times(1).returning(|_| Ok("gpt".to_string()));

        let (chat, _) = orchestrator(vec![gemini, anthropic, openai], ModelSelection::default());
        let mut chat = chat.with_dispatch(DispatchMode::Concurrent);
        chat.submit("@openai @gemini @anthropic go").await.unwrap();

        assert_eq!(
            &chat.turns()[1..],
            &[
                Turn::assistant("gpt", ModelId::OpenAi),
                Turn::assistant("Note: GEMINI was mentioned but is unavailable.", ModelId::OpenAi),
                Turn::assistant("claude", ModelId::Anthropic),
            ]
        );
    }

    #[tokio::test]
    async fn test_busy_flag_brackets_submission() {
        let mut openai = mock(ModelId::OpenAi);
        openai.expect_invoke().times(1).returning(|_| Err(upstream_error()));

        let seen: Arc<Mutex<Vec<(bool, usize)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let (chat, _) = orchestrator(vec![openai], ModelSelection::default());
        let mut chat = chat.on_update(Arc::new(move |update: &ChatUpdate<'_>| {
            sink.lock().unwrap().push((update.busy, update.turns.len()));
        }));

        chat.submit("Hello").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&(true, 0)));
        assert_eq!(seen.last(), Some(&(false, 2)));
        assert!(seen[1..seen.len() - 1].iter().all(|(busy, _)| *busy));
    }

    #[tokio::test]
    async fn test_session_operations_pass_through() {
        let (mut chat, repo) = orchestrator(vec![], ModelSelection::default());

        let id = chat.new_session().unwrap();
        chat.set_selection(ModelSelection::All).unwrap();
        chat.rename_session(&id, "Side quest").unwrap();
        chat.switch_session("default").unwrap();
        chat.delete_session(&id).unwrap();

        let saved = repo.snapshot();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, "default");
        assert_eq!(chat.selection(), &ModelSelection::Single(ModelId::OpenAi));
        assert!(!chat.is_busy());
    }
}
