pub mod ai;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod provider;
pub mod relay;
pub mod state;
pub mod text;

// Re-export main types for convenience
pub use ai::OpenAIClient;
pub use catalog::{JsonFileCatalog, Product, ProductCatalog, StaticCatalog};
pub use config::{Settings, SettingsError, SettingsStore, SettingsUpdate, WidgetPosition};
pub use context::{ContextAssembler, ProductContextEntry};
pub use error::RelayError;
pub use provider::ChatModel;
pub use relay::{parse_history, RelayReply, RelayService};
pub use state::{ChatMessage, ChatRole};
