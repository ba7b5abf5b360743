use serde::Serialize;
use std::time::Instant;

use super::orchestrator::{ChatOrchestrator, ReplyOutcome};
use crate::cli::OutputFormat;
use crate::models::ModelId;
use crate::utils::ChorusError;

/// Result of a non-interactive run
#[derive(Debug, Serialize)]
pub struct NonInteractiveResult {
    /// The prompt that was submitted
    pub prompt: String,
    /// One entry per model that was asked
    pub replies: Vec<ReplyOutcome>,
    /// Adapter errors behind any notices
    pub errors: Vec<String>,
    /// Metadata about the execution
    pub metadata: ExecutionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ExecutionMetadata {
    /// Session the exchange was appended to
    pub session: String,
    /// Selection in effect
    pub selection: String,
    /// Whether the targets came from @ mentions
    pub explicit_mentions: bool,
    /// Models routed to
    pub targets: Vec<ModelId>,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

/// Non-interactive runner for submitting a single prompt
pub struct NonInteractiveRunner {
    orchestrator: ChatOrchestrator,
}

impl NonInteractiveRunner {
    pub fn new(orchestrator: ChatOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Submit one prompt and collect what was appended
    pub async fn execute(&mut self, prompt: String) -> Result<NonInteractiveResult, ChorusError> {
        let start_time = Instant::now();
        let report = self.orchestrator.submit(&prompt).await?;

        let errors = report
            .outcomes
            .iter()
            .filter_map(|outcome| {
                outcome
                    .error
                    .as_ref()
                    .map(|error| format!("{}: {}", outcome.target, error))
            })
            .collect();

        Ok(NonInteractiveResult {
            prompt,
            errors,
            metadata: ExecutionMetadata {
                session: self.orchestrator.store().active().id.clone(),
                selection: self.orchestrator.selection().to_string(),
                explicit_mentions: report.explicit,
                targets: report.targets,
                duration_ms: start_time.elapsed().as_millis(),
            },
            replies: report.outcomes,
        })
    }

    /// Format the result according to the output format
    pub fn format_result(&self, result: &NonInteractiveResult, format: OutputFormat) -> String {
        format_result(result, format)
    }
}

pub fn format_result(result: &NonInteractiveResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_else(|e| {
            format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)
        }),
        OutputFormat::Text => {
            let mut output = String::new();
            for reply in &result.replies {
                output.push_str(&format!(
                    "[{}] {}\n\n",
                    reply.turn.speaker_label(),
                    reply.turn.content()
                ));
            }

            if !result.errors.is_empty() {
                output.push_str("--- Errors ---\n");
                for error in &result.errors {
                    output.push_str(&format!("- {}\n", error));
                }
            }

            output.trim_end().to_string()
        }
        OutputFormat::Markdown => {
            let mut output = String::new();

            for reply in &result.replies {
                output.push_str(&format!("## {}\n\n", reply.turn.speaker_label()));
                output.push_str(reply.turn.content());
                output.push_str("\n\n");
            }

            if !result.errors.is_empty() {
                output.push_str("## Errors\n\n");
                for error in &result.errors {
                    output.push_str(&format!("- {}\n", error));
                }
                output.push('\n');
            }

            output.push_str("---\n");
            output.push_str(&format!(
                "*Session: {} | Selection: {} | Duration: {}ms*\n",
                result.metadata.session, result.metadata.selection, result.metadata.duration_ms
            ));

            output
        }
    }
}
