//! The visitor-to-provider relay pipeline
//!
//! Each call is stateless: it reads the settings it is given and the
//! optional catalog, builds `[system, ...history]`, makes one provider call
//! and normalizes the outcome.

use crate::ai::OpenAIClient;
use crate::catalog::ProductCatalog;
use crate::config::Settings;
use crate::context::ContextAssembler;
use crate::error::RelayError;
use crate::state::ChatMessage;
use crate::text::neutralize;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// A successful relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayReply {
    pub reply: String,
}

/// Decode the raw history payload into neutralized turns.
///
/// Missing payload and undecodable payload are distinct failures. Elements
/// that are not well-formed turns are dropped; if nothing survives the
/// request is treated as carrying no message.
pub fn parse_history(raw: Option<&str>) -> Result<Vec<ChatMessage>, RelayError> {
    let raw = raw.ok_or(RelayError::InvalidInput)?;
    let value: Value = serde_json::from_str(raw).map_err(|_| RelayError::MalformedJson)?;
    let entries = value.as_array().ok_or(RelayError::MalformedJson)?;

    let history: Vec<ChatMessage> = entries
        .iter()
        .filter_map(ChatMessage::from_value)
        .map(|msg| ChatMessage::new(msg.role, neutralize(&msg.content)))
        .collect();

    if history.len() < entries.len() {
        warn!(
            dropped = entries.len() - history.len(),
            "Dropped malformed history entries"
        );
    }
    if history.is_empty() {
        return Err(RelayError::EmptyMessage);
    }
    Ok(history)
}

#[derive(Clone)]
pub struct RelayService {
    client: OpenAIClient,
    catalog: Option<Arc<dyn ProductCatalog>>,
}

impl RelayService {
    pub fn new(client: OpenAIClient, catalog: Option<Arc<dyn ProductCatalog>>) -> Self {
        Self { client, catalog }
    }

    fn assembler(&self) -> ContextAssembler<'_> {
        ContextAssembler::new(self.catalog.as_deref())
    }

    /// Full provider message list: the system instructions followed by the
    /// history in its original order.
    pub async fn build_messages(
        &self,
        settings: &Settings,
        history: Vec<ChatMessage>,
    ) -> Vec<ChatMessage> {
        let system = self.assembler().system_instructions(settings).await;
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend(history);
        messages
    }

    pub async fn relay(
        &self,
        raw_history: Option<&str>,
        settings: &Settings,
    ) -> Result<RelayReply, RelayError> {
        let result = self.run(raw_history, settings).await;
        match &result {
            Ok(reply) => info!(
                model = %settings.model(),
                reply_chars = reply.reply.chars().count(),
                "Relayed chat message"
            ),
            Err(e) => info!(kind = e.kind(), error = %e, "Chat relay failed"),
        }
        result
    }

    async fn run(
        &self,
        raw_history: Option<&str>,
        settings: &Settings,
    ) -> Result<RelayReply, RelayError> {
        let history = parse_history(raw_history)?;
        let api_key = settings.api_key().ok_or(RelayError::NotConfigured)?;

        let turns = history.len();
        let messages = self.build_messages(settings, history).await;
        info!(turns, model = %settings.model(), "Forwarding conversation to provider");

        let content = self
            .client
            .chat(api_key, settings.model(), &messages, settings.max_tokens())
            .await?;

        Ok(RelayReply {
            reply: neutralize(&content),
        })
    }
}
