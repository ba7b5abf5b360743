use anyhow::{Context, Result};
use colored::Colorize;

use super::non_interactive::NonInteractiveRunner;
use super::orchestrator::ChatOrchestrator;
use super::repl::{busy_indicator, run_repl};
use crate::{
    app::{load_config, load_config_from, Config},
    cli::{handle_command, Cli},
    models::{ModelFactory, ModelSelection},
    prompt::PromptBuilder,
    session::{ConversationStore, InMemoryRepository, JsonFileRepository, SessionRepository},
};

/// Wires configuration, storage and adapters together for one process
pub struct Runtime {
    cli: Cli,
    config: Config,
}

impl Runtime {
    /// Create a runtime from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => match load_config() {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("{} Failed to load config: {}. Using defaults.", "warning:".yellow(), e);
                    Config::default()
                }
            },
        };

        Ok(Self { cli, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a subcommand, a one-shot prompt, or the interactive loop.
    /// Returns the process exit code.
    pub async fn run(self) -> Result<i32> {
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config)? {
                return Ok(0);
            }
        }

        let mut orchestrator = self.build_orchestrator()?;
        self.apply_overrides(&mut orchestrator)?;

        match self.cli.prompt.clone() {
            Some(prompt) => {
                let mut runner = NonInteractiveRunner::new(orchestrator);
                let result = runner.execute(prompt).await?;
                println!("{}", runner.format_result(&result, self.cli.output_format));
                Ok(if result.errors.is_empty() { 0 } else { 1 })
            }
            None => {
                run_repl(orchestrator.on_update(busy_indicator())).await?;
                Ok(0)
            }
        }
    }

    fn build_orchestrator(&self) -> Result<ChatOrchestrator> {
        let repository: Box<dyn SessionRepository> = if self.cli.ephemeral {
            tracing::info!("Using in-memory session storage");
            Box::new(InMemoryRepository::new())
        } else {
            let path = self.config.storage.sessions_file()?;
            tracing::info!(path = %path.display(), "Using session file");
            Box::new(JsonFileRepository::new(path))
        };

        let store = ConversationStore::init(repository, self.config.chat.default_selection())
            .context("Failed to load sessions")?;
        let adapters =
            ModelFactory::registry(&self.config).context("Failed to initialize model adapters")?;

        Ok(ChatOrchestrator::new(store, adapters)
            .with_prompt_builder(PromptBuilder::new(self.config.chat.context_window))
            .with_dispatch(self.config.chat.dispatch))
    }

    /// `--session` picks the active session, `--model` replaces its selection
    fn apply_overrides(&self, orchestrator: &mut ChatOrchestrator) -> Result<()> {
        if let Some(session) = &self.cli.session {
            orchestrator
                .switch_session(session)
                .with_context(|| format!("Cannot open session {}", session))?;
        }
        if let Some(models) = &self.cli.model {
            orchestrator.set_selection(ModelSelection::parse(models))?;
        }
        Ok(())
    }
}
