// Constants, loaded from the environment with sensible defaults.

use std::env;

lazy_static::lazy_static! {
    pub static ref GEMINI_API_URL: String = env::var("GEMINI_API_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    pub static ref GEMINI_MODEL: String = env::var("GEMINI_MODEL")
        .unwrap_or_else(|_| "gemini-2.0-flash".to_string());
    pub static ref GEMINI_API_KEY: String = env::var("GEMINI_API_KEY").unwrap_or_default();

    // Append-only CSV of (timestamp, prompt) rows feeding the dashboard.
    pub static ref USER_INPUT_LOG: String = env::var("SOULTALK_INPUT_LOG")
        .unwrap_or_else(|_| "user_input_log.csv".to_string());

    // Dashboard login. Placeholder credentials until a real identity
    // provider is wired behind the Authenticator trait.
    pub static ref DASHBOARD_USERNAME: String = env::var("SOULTALK_DASHBOARD_USER")
        .unwrap_or_else(|_| "localhost".to_string());
    pub static ref DASHBOARD_PASSWORD: String = env::var("SOULTALK_DASHBOARD_PASS")
        .unwrap_or_else(|_| "Demo1234".to_string());
}

/// Timestamp format used for every row written to the prompt log.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// System prompt sent to the model ahead of the user's message.
pub const SYSTEM_PROMPT: &str = "You are a kind and empathetic mental health support assistant. \
    Respond gently, and give short encouraging advice when needed.";

/// Greeting shown as the first assistant message of every session.
pub const GREETING: &str = "Hello, I'm here for you. How are you feeling today?";
