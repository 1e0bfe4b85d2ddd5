//! Store settings loaded from environment variables.
//!
//! These only affect how figures are presented in logs and summaries. Both are
//! optional and fall back to defaults when not set in the `.env` file.

/// Currency symbol used when none is configured (Peruvian sol)
pub const DEFAULT_CURRENCY_SYMBOL: &str = "S/";

/// Store name used when none is configured
pub const DEFAULT_STORE_NAME: &str = "Point of Sale";

/// Display settings for the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Name shown in summaries
    pub name: String,
    /// Prefix for formatted amounts
    pub currency_symbol: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_STORE_NAME.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

impl StoreSettings {
    /// Reads `STORE_NAME` and `CURRENCY_SYMBOL`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            name: non_blank(lookup("STORE_NAME")).unwrap_or(defaults.name),
            currency_symbol: non_blank(lookup("CURRENCY_SYMBOL")).unwrap_or(defaults.currency_symbol),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
