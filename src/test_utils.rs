//! Shared test utilities for the point-of-sale ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        category,
        ledger::{LedgerStore, LedgerUnit},
        product::{self, NewProduct},
        sale::{CartLine, SaleWithItems},
    },
    entities::{self, Sale, SaleItem},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use tempfile::TempDir;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database served by several pooled connections,
/// for tests where units of work must really overlap.
/// The database lives as long as the returned directory.
pub async fn setup_file_test_db() -> Result<(TempDir, DatabaseConnection)> {
    let dir = tempfile::tempdir()?;
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.sqlite").display());

    let mut options = ConnectOptions::new(url);
    options.max_connections(4).min_connections(2).sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((dir, db))
}

/// Creates a test category.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(db, name).await
}

/// Creates an uncategorized test product.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    stock: i64,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        NewProduct {
            name: name.to_string(),
            price,
            stock,
            category_id: None,
        },
    )
    .await
}

/// Sets up a test environment with two products.
/// Returns (db, coffee, bread): Coffee at 4.50 with 10 in stock, Bread at 2.00 with 5.
pub async fn setup_with_products() -> Result<(
    DatabaseConnection,
    entities::product::Model,
    entities::product::Model,
)> {
    let db = setup_test_db().await?;
    let coffee = create_test_product(&db, "Coffee", 4.5, 10).await?;
    let bread = create_test_product(&db, "Bread", 2.0, 5).await?;
    Ok((db, coffee, bread))
}

/// A cart line for `quantity` units of `product` at its catalog price.
#[must_use]
pub fn line(product: &entities::product::Model, quantity: i64) -> CartLine {
    CartLine {
        product_id: product.id,
        quantity,
        unit_price: product.price,
    }
}

/// Writes a sale with a fixed timestamp, bypassing stock checks.
/// Used by history and report tests that need sales on specific days.
pub async fn insert_sale_at(
    db: &DatabaseConnection,
    created_at: DateTime<Utc>,
    lines: &[(&entities::product::Model, i64)],
) -> Result<SaleWithItems> {
    let cart: Vec<CartLine> = lines.iter().map(|(p, qty)| line(p, *qty)).collect();
    let total = crate::core::sale::cart_total(&cart);

    let unit = LedgerStore::begin(db).await?;
    let sale = unit.insert_sale(total, created_at).await?;
    let mut items = Vec::with_capacity(cart.len());
    for ((product, _), cart_line) in lines.iter().zip(&cart) {
        items.push(unit.insert_line_item(sale.id, cart_line, &product.name).await?);
    }
    LedgerUnit::commit(unit).await?;

    Ok(SaleWithItems { sale, items })
}

/// Number of sale headers stored.
pub async fn count_sales(db: &DatabaseConnection) -> Result<u64> {
    Ok(Sale::find().count(db).await?)
}

/// Number of sale line items stored.
pub async fn count_sale_items(db: &DatabaseConnection) -> Result<u64> {
    Ok(SaleItem::find().count(db).await?)
}

/// A UTC timestamp; panics on an invalid date.
#[allow(clippy::unwrap_used)]
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .unwrap()
}
