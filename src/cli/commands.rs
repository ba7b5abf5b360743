use anyhow::Result;
use colored::Colorize;

use crate::{
    app::{get_config_dir, init_config, Config},
    models::{ModelFactory, ModelId},
    session::{JsonFileRepository, SessionRepository},
};

use super::Commands;

/// Handle CLI subcommands; `false` means continue into the chat
pub fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing Chorus configuration...");
            let path = init_config()?;
            println!("Configuration ready at {}", path.display());
            Ok(true)
        }
        Commands::Models => {
            list_models(config);
            Ok(true)
        }
        Commands::Sessions => {
            list_sessions(config)?;
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Status => {
            show_status(config)?;
            Ok(true)
        }
        Commands::Chat => Ok(false),
    }
}

/// List the participating models
pub fn list_models(config: &Config) {
    println!("Available models:");
    for model in ModelId::ALL {
        println!(
            "  • {} ({}, {}): {}",
            model.as_str().green(),
            model.display_name(),
            config.provider(model).model,
            model.persona()
        );
    }
}

/// List saved sessions from the configured file
pub fn list_sessions(config: &Config) -> Result<()> {
    let path = config.storage.sessions_file()?;
    let sessions = JsonFileRepository::new(&path).load()?;
    if sessions.is_empty() {
        println!("No saved sessions in {}", path.display());
        return Ok(());
    }

    println!("Sessions in {}:", path.display());
    for session in &sessions {
        println!("  • {}", session.summary());
    }
    Ok(())
}

/// Show version information
pub fn show_version() {
    println!("Chorus v{}", env!("CARGO_PKG_VERSION"));
    println!("   Group chat with OpenAI, Anthropic and Gemini");
}

fn show_status(config: &Config) -> Result<()> {
    println!("Chorus Status:");
    println!();

    let config_path = get_config_dir()?.join("config.toml");
    if config_path.exists() {
        println!("  [OK] Configuration: {}", config_path.display());
    } else {
        println!("  [WARNING] Configuration: Not found (using defaults)");
    }
    println!("  [OK] Sessions file: {}", config.storage.sessions_file()?.display());
    println!(
        "  [OK] Dispatch: {:?}, context window {} turns",
        config.chat.dispatch, config.chat.context_window
    );

    println!("\n  API keys:");
    for (model, env_var, present) in ModelFactory::key_status(config) {
        if present {
            println!("    • {} ({}): Set", model.label(), env_var);
        } else {
            println!("    • {} ({}): {}", model.label(), env_var, "Missing".red());
        }
    }

    println!();
    Ok(())
}
