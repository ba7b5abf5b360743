use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chorus")]
#[command(version)]
#[command(about = "Chat with several language models at once and let them talk to each other", long_about = None)]
pub struct Cli {
    /// Models to answer unaddressed messages (openai, anthropic, gemini, all, or a comma list)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Session to open instead of the first one
    #[arg(short, long)]
    pub session: Option<String>,

    /// Keep sessions in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Non-interactive prompt to submit
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// List the models that can take part
    Models,
    /// List saved sessions
    Sessions,
    /// Start a chat session (default)
    Chat,
    /// Show version information
    Version,
    /// Show configuration and API key status
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
    /// Markdown formatted output
    Markdown,
}
