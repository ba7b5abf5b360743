use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    ANTHROPIC_API_KEY_ENV, ANTHROPIC_DEFAULT_BASE_URL, ANTHROPIC_DEFAULT_MAX_TOKENS,
    ANTHROPIC_DEFAULT_MODEL, GEMINI_API_KEY_ENV, GEMINI_DEFAULT_BASE_URL, GEMINI_DEFAULT_MODEL,
    HTTP_REQUEST_TIMEOUT_SECS, OPENAI_API_KEY_ENV, OPENAI_DEFAULT_BASE_URL, OPENAI_DEFAULT_MODEL,
    RECENT_CONTEXT_TURNS, SESSIONS_FILE_NAME,
};
use crate::models::{ModelId, ModelSelection};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAI provider settings
    #[serde(default = "ProviderSettings::openai")]
    pub openai: ProviderSettings,

    /// Anthropic provider settings
    #[serde(default = "ProviderSettings::anthropic")]
    pub anthropic: ProviderSettings,

    /// Google Gemini provider settings
    #[serde(default = "ProviderSettings::gemini")]
    pub gemini: ProviderSettings,

    /// Conversation behaviour
    #[serde(default)]
    pub chat: ChatConfig,

    /// Where sessions are kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai: ProviderSettings::openai(),
            anthropic: ProviderSettings::anthropic(),
            gemini: ProviderSettings::gemini(),
            chat: ChatConfig::default(),
            storage: StorageConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Provider settings for one model
    pub fn provider(&self, model: ModelId) -> &ProviderSettings {
        match model {
            ModelId::OpenAi => &self.openai,
            ModelId::Anthropic => &self.anthropic,
            ModelId::Gemini => &self.gemini,
        }
    }
}

/// Settings for one upstream provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider-side model name
    pub model: String,
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// API base URL
    pub base_url: String,
    /// Maximum tokens to generate (provider default when unset)
    pub max_tokens: Option<u32>,
}

impl ProviderSettings {
    pub fn openai() -> Self {
        Self {
            model: OPENAI_DEFAULT_MODEL.to_string(),
            api_key_env: OPENAI_API_KEY_ENV.to_string(),
            base_url: OPENAI_DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
        }
    }

    pub fn anthropic() -> Self {
        Self {
            model: ANTHROPIC_DEFAULT_MODEL.to_string(),
            api_key_env: ANTHROPIC_API_KEY_ENV.to_string(),
            base_url: ANTHROPIC_DEFAULT_BASE_URL.to_string(),
            max_tokens: Some(ANTHROPIC_DEFAULT_MAX_TOKENS),
        }
    }

    pub fn gemini() -> Self {
        Self {
            model: GEMINI_DEFAULT_MODEL.to_string(),
            api_key_env: GEMINI_API_KEY_ENV.to_string(),
            base_url: GEMINI_DEFAULT_BASE_URL.to_string(),
            max_tokens: None,
        }
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// How explicitly mentioned models are called
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One call at a time, in mention order
    #[default]
    Sequential,
    /// All calls at once; replies are still appended in mention order
    Concurrent,
}

/// Conversation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Dispatch strategy for `@` mentions
    pub dispatch: DispatchMode,
    /// Number of recent turns summarised for a mentioned model
    pub context_window: usize,
    /// Selection for freshly created default sessions (`openai`, `all`, `openai,gemini`)
    pub default_selection: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Sequential,
            context_window: RECENT_CONTEXT_TURNS,
            default_selection: ModelId::DEFAULT.as_str().to_string(),
        }
    }
}

impl ChatConfig {
    pub fn default_selection(&self) -> ModelSelection {
        ModelSelection::parse(&self.default_selection)
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit sessions file; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the sessions file location
    pub fn sessions_file(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_data_dir()?.join(SESSIONS_FILE_NAME)),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(".chorus/config.toml");

    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    if global_config.exists() {
        figment = figment.merge(Toml::file(&global_config));
    }

    if local_config.exists() {
        figment = figment.merge(Toml::file(&local_config));
    }

    // Environment variables (CHORUS_ prefix, CHORUS_CHAT__DISPATCH=concurrent)
    figment = figment.merge(Env::prefixed("CHORUS_").split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Load configuration from an explicit file, still honouring the environment
pub fn load_config_from(path: &Path) -> Result<Config> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CHORUS_").split("__"))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "chorus")
}

fn home_fallback(subdir: &str) -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("Could not determine home directory")?;
    Ok(PathBuf::from(home).join(subdir).join("chorus"))
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match project_dirs() {
        Some(dirs) => dirs.config_dir().to_path_buf(),
        None => home_fallback(".config")?,
    };
    std::fs::create_dir_all(&config_dir)?;
    Ok(config_dir)
}

/// Get the data directory that holds the sessions file
pub fn get_data_dir() -> Result<PathBuf> {
    match project_dirs() {
        Some(dirs) => Ok(dirs.data_dir().to_path_buf()),
        None => home_fallback(".local/share"),
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => get_config_dir()?.join("config.toml"),
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_file = get_config_dir()?.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        tracing::info!("Created default configuration at {}", config_file.display());
    }

    Ok(config_file)
}
