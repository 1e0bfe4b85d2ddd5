//! Unified error type for the crate.
//!
//! Every fallible operation returns [`Result`]. Domain failures of the sale
//! writer (`EmptyCart`, `ProductNotFound`, `InsufficientStock`) are terminal for
//! the cart as submitted; `Database` is the storage failure class and is the
//! only variant a caller may reasonably retry.

use thiserror::Error;

/// All errors produced by the ledger, catalog and reporting layers.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or invalid user-supplied text (empty names etc.)
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Storage failure: the query or the unit of work could not complete
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A price or amount that is negative or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A cart line with a non-positive quantity
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity {
        /// Product referenced by the line
        product_id: i64,
        /// The rejected quantity
        quantity: i64,
    },

    /// A negative stock count on a catalog edit
    #[error("Invalid stock: {stock}")]
    InvalidStock {
        /// The rejected stock count
        stock: i64,
    },

    /// A sale was requested with no cart lines
    #[error("Cannot record a sale with an empty cart")]
    EmptyCart,

    /// The product does not exist or has been deleted
    #[error("Product not found: {id}")]
    ProductNotFound {
        /// Requested product id
        id: i64,
    },

    /// The category does not exist or has been deleted
    #[error("Category not found: {id}")]
    CategoryNotFound {
        /// Requested category id
        id: i64,
    },

    /// The cart asks for more units than the product has on hand
    #[error(
        "Insufficient stock for product {product_id} ({name}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        /// Offending product id
        product_id: i64,
        /// Product name at the time of the check
        name: String,
        /// Units requested by the whole cart
        requested: i64,
        /// Units on hand
        available: i64,
    },

    /// Integer conversion failed (page sizes, limits)
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Whether the failure is transient infrastructure trouble worth retrying.
    ///
    /// Recording a sale is not idempotent, so a retry must be deduplicated by the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
