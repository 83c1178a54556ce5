use chatbot_core::{RelayService, SettingsStore};

/// Everything a request handler needs, composed once at startup
pub struct AppState {
    pub store: SettingsStore,
    pub relay: RelayService,
    /// Anti-forgery token embedded in the widget and required on `/chat`.
    pub token: String,
    /// Prefix for URLs written into the widget markup; empty means
    /// same-origin relative paths.
    pub public_url: String,
}

impl AppState {
    pub fn new(store: SettingsStore, relay: RelayService, token: impl Into<String>) -> Self {
        Self {
            store,
            relay,
            token: token.into(),
            public_url: String::new(),
        }
    }

    pub fn with_public_url(mut self, url: &str) -> Self {
        self.public_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }

    pub fn token_matches(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| !self.token.is_empty() && c == self.token)
    }
}
