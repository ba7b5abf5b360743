/// Runtime orchestration module - Gateway

mod app;
mod non_interactive;
mod orchestrator;
mod repl;

pub use app::Runtime;
pub use non_interactive::{format_result, ExecutionMetadata, NonInteractiveResult, NonInteractiveRunner};
pub use orchestrator::{ChatOrchestrator, ChatUpdate, ReplyOutcome, SubmitReport, UpdateCallback};
pub use repl::{busy_indicator, parse_command, render_turn, run_repl, ReplCommand};
