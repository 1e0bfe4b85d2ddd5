/// Database configuration and connection management
pub mod database;

/// Seed catalog loading from catalog.toml
pub mod catalog;

/// Store display settings from environment variables
pub mod store;
