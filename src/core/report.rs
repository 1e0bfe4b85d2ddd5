//! Sales report business logic.
//!
//! This module provides the sales summary shown on the dashboard, per-day totals and
//! best-selling products. Aggregations work on already loaded sales so they can be
//! fed from any query in [`crate::core::sale`]; formatting helpers return plain text.

use crate::{
    core::sale::{SaleWithItems, sales_between, start_of_day},
    errors::Result,
};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Number of products returned by [`top_products`] when the caller has no preference.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

/// Sales totals for the current day and month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalesSummary {
    /// Sum of sale totals since midnight UTC
    pub today: f64,
    /// Sum of sale totals since the first of the month (UTC)
    pub month: f64,
}

/// Sales of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    /// UTC date
    pub date: NaiveDate,
    /// Number of sales
    pub sale_count: usize,
    /// Sum of sale totals
    pub total: f64,
}

/// Units and revenue of one product across a set of sales.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductQuantity {
    /// Product id
    pub product_id: i64,
    /// Product name as recorded on the sale
    pub name: String,
    /// Units sold
    pub quantity: i64,
    /// Sum of line subtotals
    pub revenue: f64,
}

/// Computes today's and this month's sales relative to `now`.
///
/// Both windows start at midnight UTC and end (exclusive) at the start of the
/// next day / month, so sales recorded later than `now` within the window count.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_sales_summary(db: &DatabaseConnection, now: DateTime<Utc>) -> Result<SalesSummary> {
    let today = now.date_naive();
    let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);
    let month_start = today.with_day(1).unwrap_or(today);
    let next_month = month_start
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX);

    let today_sales = sales_between(db, start_of_day(today), start_of_day(tomorrow)).await?;
    let month_sales = sales_between(db, start_of_day(month_start), start_of_day(next_month)).await?;

    Ok(SalesSummary {
        today: today_sales.iter().map(|s| s.total).sum(),
        month: month_sales.iter().map(|s| s.total).sum(),
    })
}

/// Groups sales by UTC day, oldest day first.
#[must_use]
pub fn daily_totals(sales: &[SaleWithItems]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for recorded in sales {
        let day = days
            .entry(recorded.sale.created_at.date_naive())
            .or_insert((0, 0.0));
        day.0 += 1;
        day.1 += recorded.sale.total;
    }

    days.into_iter()
        .map(|(date, (sale_count, total))| DailyTotal {
            date,
            sale_count,
            total,
        })
        .collect()
}

/// Best-selling products by units sold, ties broken by name.
///
/// A product keeps the name it was first seen with in `sales`.
#[must_use]
pub fn top_products(sales: &[SaleWithItems], limit: usize) -> Vec<ProductQuantity> {
    let mut products: HashMap<i64, ProductQuantity> = HashMap::new();
    for item in sales.iter().flat_map(|s| &s.items) {
        let entry = products
            .entry(item.product_id)
            .or_insert_with(|| ProductQuantity {
                product_id: item.product_id,
                name: item.product_name.clone(),
                quantity: 0,
                revenue: 0.0,
            });
        entry.quantity += item.quantity;
        entry.revenue += item.subtotal;
    }

    let mut ranked: Vec<ProductQuantity> = products.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Formats an amount with the store's currency symbol, e.g. `S/ 12.50`.
#[must_use]
pub fn format_currency(amount: f64, symbol: &str) -> String {
    if amount < 0.0 {
        format!("-{symbol} {:.2}", amount.abs())
    } else {
        format!("{symbol} {amount:.2}")
    }
}

/// One-line description of a sale, e.g. `#12 | 2024-05-15 09:30 | 3 units | S/ 17.50`.
#[must_use]
pub fn format_sale_summary(recorded: &SaleWithItems, symbol: &str) -> String {
    let units: i64 = recorded.items.iter().map(|i| i.quantity).sum();
    let unit_label = if units == 1 { "unit" } else { "units" };
    let when = recorded.sale.created_at.format("%Y-%m-%d %H:%M");
    let total = format_currency(recorded.sale.total, symbol);

    format!("#{} | {when} | {units} {unit_label} | {total}", recorded.sale.id)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::sale::get_all_sales;
    use crate::test_utils::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(12.5, "S/"), "S/ 12.50");
        assert_eq!(format_currency(0.0, "S/"), "S/ 0.00");
        assert_eq!(format_currency(1234.567, "$"), "$ 1234.57");
        assert_eq!(format_currency(-3.0, "S/"), "-S/ 3.00");
    }

    #[tokio::test]
    async fn test_get_sales_summary_windows() -> Result<()> {
        let (db, coffee, bread) = setup_with_products().await?;

        // Outside the month on both sides
        insert_sale_at(&db, utc(2024, 4, 30, 23, 59, 59), &[(&coffee, 1)]).await?;
        insert_sale_at(&db, utc(2024, 6, 1, 0, 0, 0), &[(&coffee, 1)]).await?;

        // Earlier this month: 4.5 + 4 x 2.0
        insert_sale_at(&db, utc(2024, 5, 1, 0, 0, 0), &[(&coffee, 1)]).await?;
        insert_sale_at(&db, utc(2024, 5, 14, 23, 59, 59), &[(&bread, 4)]).await?;

        // Today: 2 x 2.0 + 3 x 2.0
        insert_sale_at(&db, utc(2024, 5, 15, 0, 0, 0), &[(&bread, 2)]).await?;
        insert_sale_at(&db, utc(2024, 5, 15, 11, 30, 0), &[(&bread, 3)]).await?;

        let summary = get_sales_summary(&db, utc(2024, 5, 15, 12, 0, 0)).await?;
        assert_eq!(summary.today, 10.0);
        assert_eq!(summary.month, 22.5);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_sales_summary_empty() -> Result<()> {
        let db = setup_test_db().await?;

        let summary = get_sales_summary(&db, utc(2024, 12, 31, 23, 0, 0)).await?;
        assert_eq!(summary.today, 0.0);
        assert_eq!(summary.month, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_totals_and_top_products() -> Result<()> {
        let (db, coffee, bread) = setup_with_products().await?;
        let tea = create_test_product(&db, "Tea", 3.0, 10).await?;

        insert_sale_at(&db, utc(2024, 5, 2, 10, 0, 0), &[(&coffee, 2), (&bread, 1)]).await?;
        insert_sale_at(&db, utc(2024, 5, 1, 9, 0, 0), &[(&tea, 3)]).await?;
        insert_sale_at(&db, utc(2024, 5, 2, 18, 0, 0), &[(&coffee, 1)]).await?;

        let sales = get_all_sales(&db).await?;

        let days = daily_totals(&sales);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].sale_count, 1);
        assert_eq!(days[0].total, 9.0);
        assert_eq!(days[1].sale_count, 2);
        assert_eq!(days[1].total, 15.5);

        // Coffee and Tea both sold 3 units; name breaks the tie
        let top = top_products(&sales, DEFAULT_TOP_PRODUCTS);
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Coffee", "Tea", "Bread"]);
        assert_eq!(top[0].quantity, 3);
        assert_eq!(top[0].revenue, 13.5);

        let top_one = top_products(&sales, 1);
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].product_id, coffee.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_format_sale_summary() -> Result<()> {
        let (db, coffee, bread) = setup_with_products().await?;
        let recorded =
            insert_sale_at(&db, utc(2024, 5, 15, 9, 30, 0), &[(&coffee, 2), (&bread, 1)]).await?;

        assert_eq!(
            format_sale_summary(&recorded, "S/"),
            format!("#{} | 2024-05-15 09:30 | 3 units | S/ 11.00", recorded.sale.id)
        );
        Ok(())
    }
}
