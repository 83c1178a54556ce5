//! Conversation types shared between the relay and its HTTP front end
//!
//! History arrives from the browser as untrusted JSON. Each element is
//! decoded independently so one malformed turn never poisons the rest.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chat message in the visitor conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            "system" => Some(ChatRole::System),
            _ => None,
        }
    }
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Decode one history element, returning `None` unless it is an object
    /// with string `role` and `content` fields and a known role.
    pub fn from_value(value: &Value) -> Option<Self> {
        let role = value.get("role")?.as_str()?;
        let content = value.get("content")?.as_str()?;
        Some(Self::new(ChatRole::from_str(role)?, content))
    }
}
