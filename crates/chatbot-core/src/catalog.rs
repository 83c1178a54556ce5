//! Product catalog sources used to ground answers in the shop's inventory

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One catalog item as exposed by the e-commerce backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

/// Read access to the shop's catalog
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Whether the e-commerce backend is present at all.
    fn is_active(&self) -> bool;

    /// All items currently published.
    async fn published_products(&self) -> Result<Vec<Product>>;
}

/// A fixed, in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    fn is_active(&self) -> bool {
        true
    }

    async fn published_products(&self) -> Result<Vec<Product>> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.published)
            .cloned()
            .collect())
    }
}

/// A catalog exported as a JSON array, re-read on every call so edits to the
/// export show up without a restart
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ProductCatalog for JsonFileCatalog {
    fn is_active(&self) -> bool {
        self.path.is_file()
    }

    async fn published_products(&self) -> Result<Vec<Product>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read catalog {}", self.path.display()))?;
        let products: Vec<Product> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid catalog file {}", self.path.display()))?;
        Ok(products.into_iter().filter(|p| p.published).collect())
    }
}
