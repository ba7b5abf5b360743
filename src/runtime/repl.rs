use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::orchestrator::{ChatOrchestrator, ChatUpdate, UpdateCallback};
use crate::models::{ModelId, ModelSelection};
use crate::session::{Turn, TurnRole};

/// A line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Submit(String),
    NewSession,
    ListSessions,
    Switch(String),
    Rename(String),
    /// Delete the given session, or the active one
    Delete(Option<String>),
    Clear,
    Select(ModelSelection),
    ShowSelection,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Interpret one input line
pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    if !line.starts_with('/') {
        return ReplCommand::Submit(line.to_string());
    }

    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match (command, arg) {
        ("/new", _) => ReplCommand::NewSession,
        ("/sessions", _) => ReplCommand::ListSessions,
        ("/switch", id) if !id.is_empty() => ReplCommand::Switch(id.to_string()),
        ("/rename", name) if !name.is_empty() => ReplCommand::Rename(name.to_string()),
        ("/delete", "") => ReplCommand::Delete(None),
        ("/delete", id) => ReplCommand::Delete(Some(id.to_string())),
        ("/clear", _) => ReplCommand::Clear,
        ("/model", "") => ReplCommand::ShowSelection,
        ("/model", choices) => ReplCommand::Select(ModelSelection::parse(choices)),
        ("/help", _) => ReplCommand::Help,
        ("/quit", _) | ("/exit", _) => ReplCommand::Quit,
        _ => ReplCommand::Unknown(line.to_string()),
    }
}

/// Render one turn for the terminal
pub fn render_turn(turn: &Turn) -> String {
    match turn.role() {
        TurnRole::User => format!("{} {}", "you>".bold().cyan(), turn.content()),
        TurnRole::Assistant => {
            let label = format!("{}>", turn.speaker_label().to_lowercase());
            let label = match turn.model() {
                Some(ModelId::OpenAi) => label.green(),
                Some(ModelId::Anthropic) => label.yellow(),
                Some(ModelId::Gemini) => label.magenta(),
                None => label.normal(),
            };
            format!("{} {}", label.bold(), turn.content())
        }
    }
}

/// Listener that shows a waiting line while a submission is in flight
pub fn busy_indicator() -> UpdateCallback {
    let was_busy = Arc::new(AtomicBool::new(false));
    Arc::new(move |update: &ChatUpdate<'_>| {
        if was_busy.swap(update.busy, Ordering::SeqCst) == update.busy {
            return;
        }
        let mut stderr = std::io::stderr();
        if update.busy {
            let _ = write!(stderr, "{}", "waiting for models...".dimmed());
        } else {
            let _ = write!(stderr, "\r\x1b[2K");
        }
        let _ = stderr.flush();
    })
}

fn print_help() {
    println!("Type a message to chat. Mention models with @openai, @anthropic or @gemini.");
    println!("  /new                 start a new session");
    println!("  /sessions            list sessions");
    println!("  /switch <id>         switch session");
    println!("  /rename <name>       rename the active session");
    println!("  /delete [id]         delete a session (default: active)");
    println!("  /clear               clear the active session");
    println!("  /model [choices]     show or set the selection (openai | all | openai,gemini)");
    println!("  /quit                leave");
}

fn print_transcript(orchestrator: &ChatOrchestrator) {
    let session = orchestrator.store().active();
    println!(
        "{} {} [{}]",
        "session".dimmed(),
        session.name.bold(),
        orchestrator.selection()
    );
    for turn in orchestrator.turns() {
        println!("{}", render_turn(turn));
    }
}

/// Run the interactive loop until `/quit` or end of input
pub async fn run_repl(mut orchestrator: ChatOrchestrator) -> Result<()> {
    print_help();
    print_transcript(&orchestrator);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let result = match parse_command(&line) {
            ReplCommand::Empty => Ok(()),
            ReplCommand::Quit => break,
            ReplCommand::Help => {
                print_help();
                Ok(())
            }
            ReplCommand::Submit(text) => {
                let before = orchestrator.turns().len();
                let outcome = orchestrator.submit(&text).await;
                // the user turn was echoed as it was typed
                for turn in orchestrator.turns().iter().skip(before + 1) {
                    println!("{}", render_turn(turn));
                }
                outcome.map(|_| ())
            }
            ReplCommand::NewSession => orchestrator.new_session().map(|_| print_transcript(&orchestrator)),
            ReplCommand::ListSessions => {
                let active = orchestrator.store().active().id.clone();
                for session in orchestrator.sessions() {
                    let marker = if session.id == active { "*" } else { " " };
                    println!("{} {}", marker, session.summary());
                }
                Ok(())
            }
            ReplCommand::Switch(id) => orchestrator
                .switch_session(&id)
                .map(|_| print_transcript(&orchestrator)),
            ReplCommand::Rename(name) => {
                let id = orchestrator.store().active().id.clone();
                orchestrator.rename_session(&id, &name)
            }
            ReplCommand::Delete(id) => {
                let id = id.unwrap_or_else(|| orchestrator.store().active().id.clone());
                orchestrator
                    .delete_session(&id)
                    .map(|_| print_transcript(&orchestrator))
            }
            ReplCommand::Clear => orchestrator.clear_active_session(),
            ReplCommand::ShowSelection => {
                println!("selection: {}", orchestrator.selection());
                Ok(())
            }
            ReplCommand::Select(selection) => orchestrator.set_selection(selection).map(|_| {
                println!("selection: {}", orchestrator.selection());
            }),
            ReplCommand::Unknown(line) => {
                println!("{} {} (try /help)", "unknown command:".red(), line);
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("{} {}", "error:".red().bold(), e);
        }
    }

    Ok(())
}
