use anyhow::{Context, Result};
use chatbot_core::ai::DEFAULT_API_BASE;
use chatbot_core::{
    ChatModel, JsonFileCatalog, OpenAIClient, ProductCatalog, RelayService, Settings,
    SettingsStore, SettingsUpdate,
};
use chatbot_server::logging::{self, LogFormat};
use chatbot_server::{router, AppState};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "chatbot-server")]
#[command(about = "Website chat widget backed by an OpenAI-compatible API")]
struct Cli {
    /// Settings file (defaults to <config dir>/ai-chatbot/settings.json)
    #[arg(long, global = true, env = "CHATBOT_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the widget and the chat endpoint
    Serve(ServeArgs),
    /// Inspect or change the chatbot settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// List the models the chatbot may be configured with
    Models,
    /// Delete the stored settings
    Uninstall,
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "CHATBOT_BIND", default_value = "127.0.0.1:8787")]
    bind: SocketAddr,

    /// JSON file exported from the shop's catalog
    #[arg(long, env = "CHATBOT_CATALOG")]
    catalog: Option<PathBuf>,

    /// Base URL of the chat-completion API
    #[arg(long, env = "CHATBOT_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Fixed anti-forgery token (a random one is generated per process otherwise)
    #[arg(long, env = "CHATBOT_TOKEN")]
    token: Option<String>,

    /// Public URL prefix written into widget markup
    #[arg(long, env = "CHATBOT_PUBLIC_URL", default_value = "")]
    public_url: String,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the effective settings
    Show,
    /// Change one or more settings
    Set(SetArgs),
}

#[derive(Args)]
struct SetArgs {
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// Persona instructions sent as the system message
    #[arg(long)]
    instructions: Option<String>,
    /// Important pages the assistant may link to
    #[arg(long)]
    important_urls: Option<String>,
    #[arg(long)]
    enable_products: Option<bool>,
    /// Response length limit in tokens
    #[arg(long)]
    max_tokens: Option<i64>,
    #[arg(long)]
    primary_color: Option<String>,
    #[arg(long)]
    title_color: Option<String>,
    #[arg(long)]
    title: Option<String>,
    /// left or right
    #[arg(long)]
    position: Option<String>,
    /// Page ids to show the widget on; pass an empty value for all pages
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pages: Option<Vec<u64>>,
}

impl From<SetArgs> for SettingsUpdate {
    fn from(args: SetArgs) -> Self {
        SettingsUpdate {
            openai_api_key: args.api_key,
            model: args.model,
            chatbot_instructions: args.instructions,
            important_urls: args.important_urls,
            enable_products: args.enable_products,
            max_tokens: args.max_tokens,
            primary_color: args.primary_color,
            title_color: args.title_color,
            chatbot_title: args.title,
            chatbot_position: args.position,
            show_on_pages: args.pages,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_format)?;

    let settings_path = match cli.settings {
        Some(path) => path,
        None => SettingsStore::default_path()?,
    };
    let store = SettingsStore::new(settings_path);

    match cli.command {
        Commands::Serve(args) => serve(store, args).await?,
        Commands::Settings(SettingsCommand::Show) => show_settings(&store.load().await?),
        Commands::Settings(SettingsCommand::Set(args)) => {
            let settings = store.update(args.into()).await?;
            println!("Saved settings to {}", store.path().display());
            show_settings(&settings);
        }
        Commands::Models => {
            for model in ChatModel::all() {
                println!("{:<14} {}", model.as_str(), model.display_name());
            }
        }
        Commands::Uninstall => {
            if store.delete().await? {
                println!("Removed {}", store.path().display());
            } else {
                println!("No settings found at {}", store.path().display());
            }
        }
    }

    Ok(())
}

async fn serve(store: SettingsStore, args: ServeArgs) -> Result<()> {
    let catalog: Option<Arc<dyn ProductCatalog>> = args
        .catalog
        .map(|path| Arc::new(JsonFileCatalog::new(path)) as Arc<dyn ProductCatalog>);
    let client = OpenAIClient::new(&args.api_base).context("Failed to build HTTP client")?;
    let relay = RelayService::new(client, catalog);

    let token = args
        .token
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let state = AppState::new(store, relay, token).with_public_url(&args.public_url);

    info!(
        settings = %state.store.path().display(),
        api_base = %args.api_base,
        "Starting chatbot server"
    );

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "Listening");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

fn show_settings(settings: &Settings) {
    let key = match settings.api_key() {
        Some(key) => {
            let hidden = key.chars().count().saturating_sub(4).max(4);
            format!("****{}", key.chars().skip(hidden).collect::<String>())
        }
        None => "(not set)".to_string(),
    };
    let pages = if settings.show_on_pages.is_empty() {
        "all pages".to_string()
    } else {
        settings
            .show_on_pages
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("API key:         {}", key);
    println!("Model:           {}", settings.model());
    println!("Max tokens:      {}", settings.max_tokens());
    println!("Products:        {}", if settings.products_enabled() { "enabled" } else { "disabled" });
    println!("Title:           {}", settings.title());
    println!("Colors:          {} / {}", settings.primary_color(), settings.title_color());
    println!("Position:        {}", settings.position().as_str());
    println!("Show on:         {}", pages);
    println!("Instructions:\n{}", settings.instructions());
    if let Some(urls) = settings.important_urls() {
        println!("Important pages:\n{}", urls);
    }
}
