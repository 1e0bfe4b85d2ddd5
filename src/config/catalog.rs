//! Seed catalog loading from catalog.toml
//!
//! The catalog file lists categories and products that should exist when the
//! store starts. Seeding only creates what is missing, so the file can stay in
//! place between restarts.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default catalog file, relative to the working directory
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Deserialize, Default)]
pub struct CatalogConfig {
    /// Category names to ensure exist
    #[serde(default)]
    pub categories: Vec<String>,
    /// Products to create if no active product with the same name exists
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Configuration for a single seeded product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Product name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Initial units on hand
    #[serde(default)]
    pub stock: i64,
    /// Category name; created on demand when not listed under `categories`
    pub category: Option<String>,
}

/// Path of the catalog file, from `CATALOG_CONFIG` or the default.
#[must_use]
pub fn catalog_path() -> PathBuf {
    std::env::var("CATALOG_CONFIG").map_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH), PathBuf::from)
}

/// Loads the seed catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;

    parse_catalog(&contents)
}

/// Parses catalog TOML text.
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog.toml: {e}"),
    })
}
