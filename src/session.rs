//! Per-session interactive state.
//!
//! Everything the UI remembers between requests lives in one explicit
//! context object owned by the web server state, instead of scattered
//! process globals: the chat transcript, the one-time disclaimer flag,
//! and the dashboard login flag. The deployment model is one interactive
//! session per process.

use serde::Serialize;

use crate::constants::GREETING;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// State for one interactive session.
#[derive(Debug)]
pub struct SessionContext {
    pub seen_disclaimer: bool,
    pub authenticated: bool,
    pub chat_history: Vec<ChatMessage>,
}

impl SessionContext {
    /// Fresh session: disclaimer not yet acknowledged, logged out,
    /// transcript seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            seen_disclaimer: false,
            authenticated: false,
            chat_history: vec![ChatMessage {
                role: Role::Assistant,
                content: GREETING.to_string(),
            }],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.chat_history.push(ChatMessage {
            role: Role::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.chat_history.push(ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        });
    }

    /// Reset the transcript back to the greeting.
    pub fn clear_chat(&mut self) {
        self.chat_history = vec![ChatMessage {
            role: Role::Assistant,
            content: GREETING.to_string(),
        }];
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
