//! Builds the system instructions sent ahead of every conversation.
//!
//! The configured persona is used as-is unless there is grounding context:
//! the site's important pages and, when enabled, the product catalog. With
//! context present the persona is wrapped in a preamble that asks the model
//! to surface a matching link, followed by the context blocks.

use crate::catalog::{Product, ProductCatalog};
use crate::config::Settings;
use crate::text::{strip_markup, truncate_chars};
use tracing::{debug, warn};

/// Longest product description forwarded to the model, in characters.
pub const DESCRIPTION_LIMIT: usize = 250;

const LINK_PREAMBLE: &str = "You are a helpful assistant for this website. When a visitor asks about something covered by the context below, include the most relevant link from that context in your answer.";

/// One catalog line as presented to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductContextEntry {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl ProductContextEntry {
    pub fn from_product(product: &Product) -> Self {
        let plain = strip_markup(&product.short_description);
        Self {
            url: product.url.clone(),
            title: product.title.clone(),
            description: truncate_chars(&plain, DESCRIPTION_LIMIT).to_string(),
        }
    }

    fn render(&self) -> String {
        format!("{} - {} - Description: {}", self.url, self.title, self.description)
    }
}

/// Assembles the system message from settings and the optional catalog
#[derive(Clone, Copy)]
pub struct ContextAssembler<'a> {
    catalog: Option<&'a dyn ProductCatalog>,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(catalog: Option<&'a dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn system_instructions(&self, settings: &Settings) -> String {
        let persona = settings.instructions();
        let mut blocks = Vec::new();

        if let Some(urls) = settings.important_urls() {
            blocks.push(format!("IMPORTANT PAGES:\n{}", urls));
        }

        if settings.products_enabled() {
            if let Some(block) = self.product_block().await {
                blocks.push(block);
            }
        }

        if blocks.is_empty() {
            return persona.to_string();
        }

        format!(
            "{}\n\n{}\n\nINSTRUCTIONS:\n{}",
            LINK_PREAMBLE,
            blocks.join("\n\n"),
            persona
        )
    }

    async fn product_block(&self) -> Option<String> {
        let catalog = self.catalog.filter(|c| c.is_active())?;

        let products = match catalog.published_products().await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Product catalog unavailable, omitting product context");
                return None;
            }
        };
        if products.is_empty() {
            return None;
        }

        debug!(count = products.len(), "Adding product context");
        let lines: Vec<String> = products
            .iter()
            .map(|p| ProductContextEntry::from_product(p).render())
            .collect();
        Some(format!("AVAILABLE PRODUCTS:\n{}", lines.join("\n")))
    }
}
