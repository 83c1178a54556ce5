//! The `{success, data}` JSON envelope the widget script expects

use chatbot_core::{RelayError, RelayReply};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct Failure {
    pub message: String,
}

impl Envelope<RelayReply> {
    pub fn ok(reply: RelayReply) -> Self {
        Self {
            success: true,
            data: reply,
        }
    }
}

impl Envelope<Failure> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Failure {
                message: message.into(),
            },
        }
    }
}

impl From<RelayError> for Envelope<Failure> {
    fn from(err: RelayError) -> Self {
        Self::error(err.to_string())
    }
}
