use thiserror::Error;

pub const UNKNOWN_API_ERROR: &str = "An unknown API error occurred.";

/// Why a relay request failed. The display text is shown to visitors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("Invalid message history.")]
    InvalidInput,
    #[error("Invalid JSON in message history.")]
    MalformedJson,
    #[error("API key is not configured.")]
    NotConfigured,
    #[error("No message provided.")]
    EmptyMessage,
    #[error("Failed to connect to API.")]
    ProviderUnreachable,
    #[error("{0}")]
    ProviderError(String),
}

impl RelayError {
    /// A provider failure carrying the provider's own message when it sent one.
    pub fn provider(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => RelayError::ProviderError(m),
            _ => RelayError::ProviderError(UNKNOWN_API_ERROR.to_string()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::InvalidInput => "invalid_input",
            RelayError::MalformedJson => "malformed_json",
            RelayError::NotConfigured => "not_configured",
            RelayError::EmptyMessage => "empty_message",
            RelayError::ProviderUnreachable => "provider_unreachable",
            RelayError::ProviderError(_) => "provider_error",
        }
    }
}
