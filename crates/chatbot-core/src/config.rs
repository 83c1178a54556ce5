//! The persisted settings record
//!
//! A single JSON document holds everything the site owner configures. Fields
//! are stored as given; documented defaults are applied by the accessors at
//! read time, and [`SettingsUpdate`] validates values before they are written.

use crate::provider::ChatModel;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant.";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_PRIMARY_COLOR: &str = "#0073aa";
pub const DEFAULT_TITLE_COLOR: &str = "#ffffff";
pub const DEFAULT_TITLE: &str = "Chat with us!";

/// Rejected settings writes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unknown model '{0}'. Allowed models: gpt-3.5-turbo, gpt-4, gpt-4-turbo, gpt-4o")]
    UnknownModel(String),
    #[error("Invalid color '{0}'. Use #rgb or #rrggbb")]
    InvalidColor(String),
    #[error("Invalid position '{0}'. Use 'left' or 'right'")]
    InvalidPosition(String),
}

/// Which corner of the page the widget docks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetPosition {
    #[default]
    Right,
    Left,
}

impl WidgetPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetPosition::Right => "right",
            WidgetPosition::Left => "left",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "right" => Some(WidgetPosition::Right),
            "left" => Some(WidgetPosition::Left),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub chatbot_instructions: Option<String>,
    pub important_urls: Option<String>,
    pub enable_products: bool,
    pub max_tokens: Option<i64>,
    pub primary_color: Option<String>,
    pub title_color: Option<String>,
    pub chatbot_title: Option<String>,
    pub chatbot_position: Option<String>,
    pub show_on_pages: Vec<u64>,
}

// Hand-written so the API key never reaches a log line.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("openai_api_key", &self.api_key().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("chatbot_instructions", &self.chatbot_instructions)
            .field("important_urls", &self.important_urls)
            .field("enable_products", &self.enable_products)
            .field("max_tokens", &self.max_tokens)
            .field("primary_color", &self.primary_color)
            .field("title_color", &self.title_color)
            .field("chatbot_title", &self.chatbot_title)
            .field("chatbot_position", &self.chatbot_position)
            .field("show_on_pages", &self.show_on_pages)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    pub fn api_key(&self) -> Option<&str> {
        non_empty(&self.openai_api_key)
    }

    pub fn model(&self) -> ChatModel {
        self.model
            .as_deref()
            .and_then(ChatModel::from_str)
            .unwrap_or_default()
    }

    pub fn instructions(&self) -> &str {
        match self.chatbot_instructions.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => DEFAULT_INSTRUCTIONS,
        }
    }

    pub fn important_urls(&self) -> Option<&str> {
        match self.important_urls.as_deref() {
            Some(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    pub fn products_enabled(&self) -> bool {
        self.enable_products
    }

    /// Response-length limit; unset or non-positive values fall back to 150.
    pub fn max_tokens(&self) -> u32 {
        match self.max_tokens {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => DEFAULT_MAX_TOKENS,
        }
    }

    /// Colors that fail validation (a hand-edited file) read as the default,
    /// since they are interpolated into CSS.
    pub fn primary_color(&self) -> &str {
        non_empty(&self.primary_color)
            .filter(|c| is_hex_color(c))
            .unwrap_or(DEFAULT_PRIMARY_COLOR)
    }

    pub fn title_color(&self) -> &str {
        non_empty(&self.title_color)
            .filter(|c| is_hex_color(c))
            .unwrap_or(DEFAULT_TITLE_COLOR)
    }

    pub fn title(&self) -> &str {
        non_empty(&self.chatbot_title).unwrap_or(DEFAULT_TITLE)
    }

    pub fn position(&self) -> WidgetPosition {
        self.chatbot_position
            .as_deref()
            .and_then(WidgetPosition::from_str)
            .unwrap_or_default()
    }

    /// Whether the widget renders on the given page. An empty page list
    /// means every page; a view that is not a page only matches that case.
    pub fn shows_on(&self, page: Option<u64>) -> bool {
        if self.show_on_pages.is_empty() {
            return true;
        }
        page.is_some_and(|id| self.show_on_pages.contains(&id))
    }
}

/// A partial, validated change to the settings record
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub chatbot_instructions: Option<String>,
    pub important_urls: Option<String>,
    pub enable_products: Option<bool>,
    pub max_tokens: Option<i64>,
    pub primary_color: Option<String>,
    pub title_color: Option<String>,
    pub chatbot_title: Option<String>,
    pub chatbot_position: Option<String>,
    pub show_on_pages: Option<Vec<u64>>,
}

/// `#rgb` or `#rrggbb`
pub fn is_hex_color(value: &str) -> bool {
    let hex = value.strip_prefix('#').unwrap_or("");
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn validate_color(value: &str) -> Result<String, SettingsError> {
    let value = value.trim();
    if is_hex_color(value) {
        Ok(value.to_lowercase())
    } else {
        Err(SettingsError::InvalidColor(value.to_string()))
    }
}

impl SettingsUpdate {
    /// Validate every field first, then apply them all; a rejected update
    /// leaves `settings` untouched.
    pub fn apply(self, settings: &mut Settings) -> Result<(), SettingsError> {
        let model = self
            .model
            .map(|m| {
                ChatModel::from_str(&m)
                    .map(|model| model.as_str().to_string())
                    .ok_or(SettingsError::UnknownModel(m))
            })
            .transpose()?;
        let primary_color = self.primary_color.as_deref().map(validate_color).transpose()?;
        let title_color = self.title_color.as_deref().map(validate_color).transpose()?;
        let position = self
            .chatbot_position
            .map(|p| {
                WidgetPosition::from_str(&p)
                    .map(|pos| pos.as_str().to_string())
                    .ok_or(SettingsError::InvalidPosition(p))
            })
            .transpose()?;

        if let Some(key) = self.openai_api_key {
            settings.openai_api_key = Some(key.trim().to_string());
        }
        if model.is_some() {
            settings.model = model;
        }
        if let Some(text) = self.chatbot_instructions {
            settings.chatbot_instructions = Some(text.trim_end().to_string());
        }
        if let Some(text) = self.important_urls {
            settings.important_urls = Some(text);
        }
        if let Some(enabled) = self.enable_products {
            settings.enable_products = enabled;
        }
        if let Some(limit) = self.max_tokens {
            settings.max_tokens = Some(limit);
        }
        if primary_color.is_some() {
            settings.primary_color = primary_color;
        }
        if title_color.is_some() {
            settings.title_color = title_color;
        }
        if let Some(title) = self.chatbot_title {
            settings.chatbot_title = Some(title.trim().to_string());
        }
        if position.is_some() {
            settings.chatbot_position = position;
        }
        if let Some(mut pages) = self.show_on_pages {
            pages.sort_unstable();
            pages.dedup();
            settings.show_on_pages = pages;
        }
        Ok(())
    }
}

/// File-backed storage for the single settings record
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("ai-chatbot").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record; a missing file yields all defaults.
    pub async fn load(&self) -> Result<Settings> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read settings from {}", self.path.display())),
        }
    }

    pub async fn save(&self, settings: &Settings) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        Ok(())
    }

    pub async fn update(&self, update: SettingsUpdate) -> Result<Settings> {
        let mut settings = self.load().await?;
        update.apply(&mut settings)?;
        self.save(&settings).await?;
        Ok(settings)
    }

    /// Remove the record entirely. Returns whether anything was deleted.
    pub async fn delete(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to delete settings at {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_at_read_time() {
        let settings = Settings::default();
        assert_eq!(settings.api_key(), None);
        assert_eq!(settings.model(), ChatModel::Gpt35Turbo);
        assert_eq!(settings.instructions(), DEFAULT_INSTRUCTIONS);
        assert_eq!(settings.important_urls(), None);
        assert_eq!(settings.max_tokens(), 150);
        assert_eq!(settings.primary_color(), "#0073aa");
        assert_eq!(settings.title_color(), "#ffffff");
        assert_eq!(settings.title(), "Chat with us!");
        assert_eq!(settings.position(), WidgetPosition::Right);
    }

    #[test]
    fn test_max_tokens_non_positive_falls_back() {
        let mut settings = Settings::default();
        settings.max_tokens = Some(0);
        assert_eq!(settings.max_tokens(), 150);
        settings.max_tokens = Some(-20);
        assert_eq!(settings.max_tokens(), 150);
        settings.max_tokens = Some(400);
        assert_eq!(settings.max_tokens(), 400);
    }

    #[test]
    fn test_blank_values_fall_back() {
        let settings = Settings {
            openai_api_key: Some("   ".to_string()),
            chatbot_instructions: Some("\n".to_string()),
            important_urls: Some("  ".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.api_key(), None);
        assert_eq!(settings.instructions(), DEFAULT_INSTRUCTIONS);
        assert_eq!(settings.important_urls(), None);
    }

    #[test]
    fn test_shows_on_pages() {
        let mut settings = Settings::default();
        assert!(settings.shows_on(None));
        assert!(settings.shows_on(Some(7)));

        settings.show_on_pages = vec![3, 7];
        assert!(settings.shows_on(Some(7)));
        assert!(!settings.shows_on(Some(8)));
        assert!(!settings.shows_on(None));
    }

    #[test]
    fn test_update_rejects_unknown_model() {
        let mut settings = Settings::default();
        let update = SettingsUpdate {
            model: Some("gpt-5".to_string()),
            chatbot_title: Some("Helper".to_string()),
            ..SettingsUpdate::default()
        };
        assert_eq!(
            update.apply(&mut settings),
            Err(SettingsError::UnknownModel("gpt-5".to_string()))
        );
        // nothing from a rejected update is applied
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_update_validates_colors_and_position() {
        let mut settings = Settings::default();
        let bad_color = SettingsUpdate {
            primary_color: Some("blue".to_string()),
            ..SettingsUpdate::default()
        };
        assert!(matches!(
            bad_color.apply(&mut settings),
            Err(SettingsError::InvalidColor(_))
        ));

        let bad_position = SettingsUpdate {
            chatbot_position: Some("top".to_string()),
            ..SettingsUpdate::default()
        };
        assert!(matches!(
            bad_position.apply(&mut settings),
            Err(SettingsError::InvalidPosition(_))
        ));

        let good = SettingsUpdate {
            primary_color: Some("#ABC".to_string()),
            chatbot_position: Some("Left".to_string()),
            show_on_pages: Some(vec![9, 2, 9]),
            ..SettingsUpdate::default()
        };
        good.apply(&mut settings).unwrap();
        assert_eq!(settings.primary_color(), "#abc");
        assert_eq!(settings.position(), WidgetPosition::Left);
        assert_eq!(settings.show_on_pages, vec![2, 9]);
    }

    #[test]
    fn test_invalid_stored_color_reads_as_default() {
        let settings = Settings {
            primary_color: Some("red; } body { display:none".to_string()),
            title_color: Some("#FFF".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.primary_color(), DEFAULT_PRIMARY_COLOR);
        assert_eq!(settings.title_color(), "#FFF");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = Settings {
            openai_api_key: Some("sk-secret".to_string()),
            ..Settings::default()
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_store_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_store_update_persists_and_delete_removes() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));

        let update = SettingsUpdate {
            openai_api_key: Some(" sk-test ".to_string()),
            model: Some("gpt-4o".to_string()),
            max_tokens: Some(300),
            ..SettingsUpdate::default()
        };
        store.update(update).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.api_key(), Some("sk-test"));
        assert_eq!(loaded.model(), ChatModel::Gpt4o);
        assert_eq!(loaded.max_tokens(), 300);

        assert!(store.delete().await.unwrap());
        assert!(!store.delete().await.unwrap());
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_store_rejected_update_is_not_persisted() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let update = SettingsUpdate {
            model: Some("davinci".to_string()),
            ..SettingsUpdate::default()
        };
        assert!(store.update(update).await.is_err());
        assert!(!store.path().exists());
    }
}
