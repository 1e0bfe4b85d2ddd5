//! Product business logic - Handles all catalog operations.
//!
//! This module provides functions for creating, retrieving, updating, searching and
//! soft-deleting products, plus seeding the catalog from configuration. Price and
//! stock validation happens here, before any query is issued. Stock is otherwise
//! only changed by the sale writer in [`crate::core::sale`].

use crate::{
    config::catalog::CatalogConfig,
    core::category::find_or_create_category,
    entities::{Category, Product, product},
    errors::{Error, Result},
};
use sea_orm::{
    PaginatorTrait, QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func, SimpleExpr},
};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Product name; surrounding whitespace is trimmed
    pub name: String,
    /// Unit price, finite and non-negative
    pub price: f64,
    /// Initial units on hand, non-negative
    pub stock: i64,
    /// Optional category
    pub category_id: Option<i64>,
}

/// Partial update for [`update_product`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    /// New name
    pub name: Option<String>,
    /// New unit price. Already recorded sales keep their own price.
    pub price: Option<f64>,
    /// New units on hand
    pub stock: Option<i64>,
    /// New category; `Some(None)` clears it
    pub category_id: Option<Option<i64>>,
}

/// A product together with the name of its category, for catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductListing {
    /// The product
    pub product: product::Model,
    /// Name of the linked category, if any
    pub category_name: Option<String>,
}

/// One page of a catalog search.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    /// Products on the requested page
    pub products: Vec<ProductListing>,
    /// Number of matching products across all pages
    pub total_count: u64,
}

/// Retrieves all active (non-deleted) products, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_active_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Searches active products by name and returns one page of results.
///
/// The search term is matched case-insensitively anywhere in the name. `page` is
/// 1-based; a `page` or `limit` of zero is treated as one.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(
    db: &DatabaseConnection,
    search: Option<&str>,
    page: u64,
    limit: u64,
) -> Result<ProductPage> {
    let mut query = Product::find()
        .find_also_related(Category)
        .filter(product::Column::IsDeleted.eq(false));

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        query = query.filter(name_contains(term));
    }

    let paginator = query
        .order_by_asc(product::Column::Name)
        .paginate(db, limit.max(1));
    let total_count = paginator.num_items().await?;
    let rows = paginator.fetch_page(page.max(1) - 1).await?;

    let products = rows
        .into_iter()
        .map(|(product, category)| ProductListing {
            product,
            category_name: category.filter(|c| !c.is_deleted).map(|c| c.name),
        })
        .collect();

    Ok(ProductPage {
        products,
        total_count,
    })
}

fn name_contains(term: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((Product, product::Column::Name))))
        .like(format!("%{}%", term.to_lowercase()))
}

/// Finds an active product by its name, returning None if not found or deleted.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_name<C>(db: &C, name: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Name.eq(name.trim()))
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID, including soft-deleted ones.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative or not finite (NaN, infinity)
/// - The stock is negative
/// - The database insert operation fails
pub async fn create_product<C>(db: &C, new_product: NewProduct) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let name = validate_name(&new_product.name)?;
    validate_price(new_product.price)?;
    validate_stock(new_product.stock)?;

    let now = chrono::Utc::now().naive_utc();

    let product = product::ActiveModel {
        name: Set(name.to_string()),
        price: Set(new_product.price),
        stock: Set(new_product.stock),
        category_id: Set(new_product.category_id),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Applies a partial update to an existing product.
///
/// # Errors
/// Returns an error if:
/// - A provided name is empty, price invalid or stock negative
/// - The product does not exist or is already deleted
/// - The database update operation fails
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    changes: ProductUpdate,
) -> Result<product::Model> {
    if let Some(name) = &changes.name {
        validate_name(name)?;
    }
    if let Some(price) = changes.price {
        validate_price(price)?;
    }
    if let Some(stock) = changes.stock {
        validate_stock(stock)?;
    }

    let mut product: product::ActiveModel = find_active(db, product_id).await?.into();

    if let Some(name) = changes.name {
        product.name = Set(name.trim().to_string());
    }
    if let Some(price) = changes.price {
        product.price = Set(price);
    }
    if let Some(stock) = changes.stock {
        product.stock = Set(stock);
    }
    if let Some(category_id) = changes.category_id {
        product.category_id = Set(category_id);
    }
    product.updated_at = Set(chrono::Utc::now().naive_utc());

    product.update(db).await.map_err(Into::into)
}

/// Soft deletes a product by marking it as deleted, preserving sales history.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist or is already deleted
/// - The database update operation fails
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let mut product: product::ActiveModel = find_active(db, product_id).await?.into();

    product.is_deleted = Set(true);
    product.updated_at = Set(chrono::Utc::now().naive_utc());

    product.update(db).await.map_err(Into::into)
}

/// Creates the categories and products listed in the seed catalog.
///
/// Products are matched by name against the active catalog; existing ones are left
/// untouched, so seeding the same catalog twice is harmless. Everything is written
/// in one transaction.
///
/// # Returns
/// The number of products created.
///
/// # Errors
/// Returns an error if any catalog entry is invalid or a database operation fails.
/// Nothing is written in that case.
#[instrument(skip_all, fields(products = catalog.products.len()))]
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<usize> {
    let txn = db.begin().await?;

    for name in &catalog.categories {
        find_or_create_category(&txn, name).await?;
    }

    let mut created = 0;
    for entry in &catalog.products {
        if get_product_by_name(&txn, &entry.name).await?.is_some() {
            debug!("Product '{}' already in catalog, skipping", entry.name);
            continue;
        }

        let category_id = match &entry.category {
            Some(category) => Some(find_or_create_category(&txn, category).await?.id),
            None => None,
        };

        create_product(
            &txn,
            NewProduct {
                name: entry.name.clone(),
                price: entry.price,
                stock: entry.stock,
                category_id,
            },
        )
        .await?;
        created += 1;
    }

    txn.commit().await?;
    info!("Seeded {} new products into the catalog", created);
    Ok(created)
}

async fn find_active(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or(Error::ProductNotFound { id: product_id })
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }
    Ok(trimmed)
}

fn validate_price(price: f64) -> Result<()> {
    if price < 0.0 || !price.is_finite() {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(())
}

const fn validate_stock(stock: i64) -> Result<()> {
    if stock < 0 {
        return Err(Error::InvalidStock { stock });
    }
    Ok(())
}
