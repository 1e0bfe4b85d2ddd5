//! Sale business logic - Recording sales and reading them back.
//!
//! [`record_sale`] is the only code path that creates sales. It writes the sale
//! header, one line item per cart line and the stock decrements inside a single
//! unit of work, and leaves the store untouched on any failure. The remaining
//! functions are read-only queries used by reporting.
//!
//! Recording is not idempotent: submitting the same cart twice records two sales.

use crate::{
    core::ledger::{LedgerStore, LedgerUnit},
    entities::{Sale, SaleItem, sale, sale_item},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    PaginatorTrait, QueryOrder,
    prelude::*,
    sea_query::{Expr, Func, Query},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info, instrument, warn};

/// One line of a cart submitted for checkout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product being sold
    pub product_id: i64,
    /// Units sold, must be positive
    pub quantity: i64,
    /// Price per unit charged on this sale
    pub unit_price: f64,
}

impl CartLine {
    /// `quantity * unit_price`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn subtotal(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// A sale header with its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleWithItems {
    /// The sale header
    pub sale: sale::Model,
    /// Line items, in the order they were recorded
    pub items: Vec<sale_item::Model>,
}

/// Filters for [`find_sales_by_date_range`].
#[derive(Debug, Clone)]
pub struct SaleQuery {
    /// First day included (UTC)
    pub start: NaiveDate,
    /// Last day included (UTC)
    pub end: NaiveDate,
    /// Only sales with a line whose product name contains this term
    pub search: Option<String>,
    /// 1-based page number; pagination applies only when `limit` is set too
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
}

/// Result page of [`find_sales_by_date_range`].
#[derive(Debug, Clone, Serialize)]
pub struct SalePage {
    /// Sales on the requested page, newest first
    pub sales: Vec<SaleWithItems>,
    /// Number of matching sales across all pages
    pub total_count: u64,
}

/// Sum of all line subtotals of a cart.
#[must_use]
pub fn cart_total(cart: &[CartLine]) -> f64 {
    cart.iter().map(CartLine::subtotal).sum()
}

/// Records a sale and takes its units out of stock, all or nothing.
///
/// Stock is checked against the total quantity each product appears with in the
/// cart, so splitting a product over several lines changes nothing. Products are
/// visited in ascending id order. One line item is stored per cart line.
///
/// # Errors
/// - `EmptyCart` if the cart has no lines
/// - `InvalidQuantity` / `InvalidAmount` for a non-positive quantity or a bad price
/// - `ProductNotFound` if a product does not exist or was deleted
/// - `InsufficientStock` if the cart asks for more units than are on hand
/// - `Database` if the store fails; the unit of work is rolled back
///
/// No write is visible after any of these.
#[instrument(skip_all, fields(lines = cart.len()))]
pub async fn record_sale<S>(store: &S, cart: &[CartLine]) -> Result<SaleWithItems>
where
    S: LedgerStore,
{
    validate_cart(cart)?;
    let total = cart_total(cart);
    let demand = demand_per_product(cart);

    let unit = store.begin().await?;
    match write_sale(&unit, cart, &demand, total).await {
        Ok(recorded) => {
            unit.commit().await?;
            info!(
                "Recorded sale {} with {} lines, total {:.2}",
                recorded.sale.id,
                recorded.items.len(),
                recorded.sale.total
            );
            Ok(recorded)
        }
        Err(err) => {
            warn!("Sale not recorded, rolling back: {}", err);
            if let Err(rollback_err) = unit.rollback().await {
                error!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

async fn write_sale<U>(
    unit: &U,
    cart: &[CartLine],
    demand: &BTreeMap<i64, i64>,
    total: f64,
) -> Result<SaleWithItems>
where
    U: LedgerUnit,
{
    let mut names = HashMap::with_capacity(demand.len());
    for (&product_id, &requested) in demand {
        let level = unit
            .product_stock(product_id)
            .await?
            .ok_or(Error::ProductNotFound { id: product_id })?;
        if level.stock < requested {
            return Err(Error::InsufficientStock {
                product_id,
                name: level.name,
                requested,
                available: level.stock,
            });
        }
        names.insert(product_id, level.name);
    }

    let sale = unit.insert_sale(total, Utc::now()).await?;

    let mut items = Vec::with_capacity(cart.len());
    for line in cart {
        let name = names.get(&line.product_id).map_or("", String::as_str);
        items.push(unit.insert_line_item(sale.id, line, name).await?);
    }

    for (&product_id, &requested) in demand {
        if !unit.take_stock(product_id, requested).await? {
            // Stock moved between the check and the update
            let level = unit.product_stock(product_id).await?;
            return Err(Error::InsufficientStock {
                product_id,
                name: names.remove(&product_id).unwrap_or_default(),
                requested,
                available: level.map_or(0, |l| l.stock),
            });
        }
    }

    Ok(SaleWithItems { sale, items })
}

fn validate_cart(cart: &[CartLine]) -> Result<()> {
    if cart.is_empty() {
        return Err(Error::EmptyCart);
    }

    for line in cart {
        if line.quantity <= 0 {
            return Err(Error::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
        if line.unit_price < 0.0 || !line.unit_price.is_finite() {
            return Err(Error::InvalidAmount {
                amount: line.unit_price,
            });
        }
    }
    Ok(())
}

fn demand_per_product(cart: &[CartLine]) -> BTreeMap<i64, i64> {
    let mut demand = BTreeMap::new();
    for line in cart {
        let entry = demand.entry(line.product_id).or_insert(0_i64);
        *entry = entry.saturating_add(line.quantity);
    }
    demand
}

/// Retrieves one sale with its line items.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_sale_by_id(db: &DatabaseConnection, sale_id: i64) -> Result<Option<SaleWithItems>> {
    let Some(sale) = Sale::find_by_id(sale_id).one(db).await? else {
        return Ok(None);
    };

    let items = sale
        .find_related(SaleItem)
        .order_by_asc(sale_item::Column::Id)
        .all(db)
        .await?;

    Ok(Some(SaleWithItems { sale, items }))
}

/// Retrieves every sale with its line items, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_sales(db: &DatabaseConnection) -> Result<Vec<SaleWithItems>> {
    let sales = Sale::find()
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id)
        .all(db)
        .await?;

    attach_items(db, sales).await
}

/// Finds sales recorded between two calendar days (both included), newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn find_sales_by_date_range(
    db: &DatabaseConnection,
    query: &SaleQuery,
) -> Result<SalePage> {
    let from = start_of_day(query.start);
    let until = start_of_day(query.end.succ_opt().unwrap_or(NaiveDate::MAX));

    let mut select = Sale::find()
        .filter(sale::Column::CreatedAt.gte(from))
        .filter(sale::Column::CreatedAt.lt(until));

    if let Some(term) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let matching_sales = Query::select()
            .column(sale_item::Column::SaleId)
            .from(SaleItem)
            .and_where(
                Expr::expr(Func::lower(Expr::col(sale_item::Column::ProductName)))
                    .like(format!("%{}%", term.to_lowercase())),
            )
            .to_owned();
        select = select.filter(sale::Column::Id.in_subquery(matching_sales));
    }

    let select = select
        .order_by_desc(sale::Column::CreatedAt)
        .order_by_desc(sale::Column::Id);
    let total_count = select.clone().count(db).await?;

    let sales = match (query.page, query.limit) {
        (Some(page), Some(limit)) => {
            select
                .paginate(db, limit.max(1))
                .fetch_page(page.max(1) - 1)
                .await?
        }
        _ => select.all(db).await?,
    };

    Ok(SalePage {
        sales: attach_items(db, sales).await?,
        total_count,
    })
}

/// Sale headers with `from <= created_at < until`.
pub(crate) async fn sales_between(
    db: &DatabaseConnection,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<sale::Model>> {
    Sale::find()
        .filter(sale::Column::CreatedAt.gte(from))
        .filter(sale::Column::CreatedAt.lt(until))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Midnight UTC at the start of `date`.
pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

async fn attach_items(
    db: &DatabaseConnection,
    sales: Vec<sale::Model>,
) -> Result<Vec<SaleWithItems>> {
    if sales.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = sales.iter().map(|s| s.id).collect();
    let items = SaleItem::find()
        .filter(sale_item::Column::SaleId.is_in(ids))
        .order_by_asc(sale_item::Column::Id)
        .all(db)
        .await?;

    let mut by_sale: HashMap<i64, Vec<sale_item::Model>> = HashMap::new();
    for item in items {
        by_sale.entry(item.sale_id).or_default().push(item);
    }

    Ok(sales
        .into_iter()
        .map(|sale| {
            let items = by_sale.remove(&sale.id).unwrap_or_default();
            SaleWithItems { sale, items }
        })
        .collect())
}
