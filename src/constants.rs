/// Constants module to avoid magic numbers in the codebase

// Provider endpoints
pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

// Provider models
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";

// API key environment variables
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GOOGLE_API_KEY";

// Timeouts
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 120;

// Generation
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1000;

// Conversation
pub const RECENT_CONTEXT_TURNS: usize = 5;
pub const DEFAULT_SESSION_ID: &str = "default";
pub const DEFAULT_SESSION_NAME: &str = "New Chat";
pub const SESSIONS_FILE_NAME: &str = "sessions.json";

// Reserved mention token that never routes to a model
pub const SELF_MENTION_TOKEN: &str = "user";

// Synthetic notices
pub const GENERIC_ERROR_NOTICE: &str = "Sorry, there was an error processing your request.";
pub const UNSUPPORTED_RESPONSE: &str = "Unsupported response type";
