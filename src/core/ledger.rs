//! Storage port for the sale writer.
//!
//! [`crate::core::sale::record_sale`] is written against these two traits instead
//! of a concrete database. A [`LedgerStore`] opens a unit of work; the returned
//! [`LedgerUnit`] performs every read and write of one sale and is then either
//! committed or rolled back as a whole.
//!
//! The `SeaORM` implementation maps a unit of work onto a database transaction.
//! Stock is taken with a guarded `UPDATE ... WHERE stock >= n`, so even two
//! transactions racing on the same product cannot push it below zero.

use crate::{
    core::sale::CartLine,
    entities::{Product, product, sale, sale_item},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseConnection, DatabaseTransaction, Set, TransactionTrait, prelude::*, sea_query::Expr,
};

/// Name and units on hand of a sellable product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    /// Current product name
    pub name: String,
    /// Units on hand
    pub stock: i64,
}

/// Something that can open a unit of work for recording a sale.
#[allow(async_fn_in_trait)]
pub trait LedgerStore {
    /// The unit of work type
    type Unit: LedgerUnit;

    /// Opens a new unit of work. Nothing written through it is visible until commit.
    async fn begin(&self) -> Result<Self::Unit>;
}

/// One all-or-nothing set of ledger reads and writes.
#[allow(async_fn_in_trait)]
pub trait LedgerUnit {
    /// Stock of a product, or `None` if it does not exist or was deleted.
    async fn product_stock(&self, product_id: i64) -> Result<Option<StockLevel>>;

    /// Removes `quantity` units from a product's stock.
    ///
    /// Returns `false` without changing anything when the product has fewer units
    /// than requested (or is gone).
    async fn take_stock(&self, product_id: i64, quantity: i64) -> Result<bool>;

    /// Inserts a sale header.
    async fn insert_sale(&self, total: f64, created_at: DateTime<Utc>) -> Result<sale::Model>;

    /// Inserts one line item of a sale, freezing its price and product name.
    async fn insert_line_item(
        &self,
        sale_id: i64,
        line: &CartLine,
        product_name: &str,
    ) -> Result<sale_item::Model>;

    /// Makes every write of this unit visible.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this unit.
    async fn rollback(self) -> Result<()>;
}

impl LedgerStore for DatabaseConnection {
    type Unit = DatabaseTransaction;

    async fn begin(&self) -> Result<DatabaseTransaction> {
        TransactionTrait::begin(self).await.map_err(Into::into)
    }
}

impl LedgerUnit for DatabaseTransaction {
    async fn product_stock(&self, product_id: i64) -> Result<Option<StockLevel>> {
        let product = Product::find_by_id(product_id).one(self).await?;

        Ok(product.filter(|p| !p.is_deleted).map(|p| StockLevel {
            name: p.name,
            stock: p.stock,
        }))
    }

    async fn take_stock(&self, product_id: i64, quantity: i64) -> Result<bool> {
        // stock = stock - quantity, only where enough is left
        let result = Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .col_expr(
                product::Column::UpdatedAt,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::IsDeleted.eq(false))
            .filter(product::Column::Stock.gte(quantity))
            .exec(self)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn insert_sale(&self, total: f64, created_at: DateTime<Utc>) -> Result<sale::Model> {
        let sale = sale::ActiveModel {
            total: Set(total),
            created_at: Set(created_at),
            ..Default::default()
        };
        sale.insert(self).await.map_err(Into::into)
    }

    async fn insert_line_item(
        &self,
        sale_id: i64,
        line: &CartLine,
        product_name: &str,
    ) -> Result<sale_item::Model> {
        let item = sale_item::ActiveModel {
            sale_id: Set(sale_id),
            product_id: Set(line.product_id),
            product_name: Set(product_name.to_string()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            subtotal: Set(line.subtotal()),
            ..Default::default()
        };
        item.insert(self).await.map_err(Into::into)
    }

    async fn commit(self) -> Result<()> {
        Self::commit(self).await.map_err(Into::into)
    }

    async fn rollback(self) -> Result<()> {
        Self::rollback(self).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::product::{delete_product, get_product_by_id};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_product_stock_reports_active_products_only() -> Result<()> {
        let (db, coffee, bread) = setup_with_products().await?;
        delete_product(&db, bread.id).await?;

        let unit = LedgerStore::begin(&db).await?;
        let level = unit.product_stock(coffee.id).await?.unwrap();
        assert_eq!(level.name, "Coffee");
        assert_eq!(level.stock, 10);

        assert!(unit.product_stock(bread.id).await?.is_none());
        assert!(unit.product_stock(999).await?.is_none());
        LedgerUnit::rollback(unit).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_take_stock_is_guarded() -> Result<()> {
        let (db, coffee, _bread) = setup_with_products().await?;

        let unit = LedgerStore::begin(&db).await?;
        assert!(unit.take_stock(coffee.id, 4).await?);
        assert!(unit.take_stock(coffee.id, 6).await?);
        // Nothing left; the guard refuses instead of going negative
        assert!(!unit.take_stock(coffee.id, 1).await?);
        assert!(!unit.take_stock(999, 1).await?);
        LedgerUnit::commit(unit).await?;

        let coffee = get_product_by_id(&db, coffee.id).await?.unwrap();
        assert_eq!(coffee.stock, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() -> Result<()> {
        let (db, coffee, _bread) = setup_with_products().await?;

        let unit = LedgerStore::begin(&db).await?;
        let sale = unit.insert_sale(9.0, Utc::now()).await?;
        unit.insert_line_item(sale.id, &line(&coffee, 2), &coffee.name)
            .await?;
        assert!(unit.take_stock(coffee.id, 2).await?);
        LedgerUnit::rollback(unit).await?;

        assert_eq!(count_sales(&db).await?, 0);
        assert_eq!(count_sale_items(&db).await?, 0);
        assert_eq!(get_product_by_id(&db, coffee.id).await?.unwrap().stock, 10);
        Ok(())
    }
}
