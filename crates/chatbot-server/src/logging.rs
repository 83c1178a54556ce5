//! Tracing subscriber setup for the server binary

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn directive(filter: EnvFilter, spec: &str) -> EnvFilter {
    match spec.parse() {
        Ok(d) => filter.add_directive(d),
        Err(_) => filter,
    }
}

/// Build the filter: `RUST_LOG` when set, otherwise `level`, with HTTP
/// plumbing always kept quiet.
pub fn env_filter(level: &str) -> EnvFilter {
    let base = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    let filter = EnvFilter::try_new(&base).unwrap_or_else(|_| EnvFilter::new("info"));
    ["hyper=warn", "reqwest=warn", "tower_http=info"]
        .iter()
        .fold(filter, |f, spec| directive(f, spec))
}

pub fn init(level: &str, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let result = match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(false)).try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
    };
    result.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}
