//! Sale item entity - One product line of a recorded sale.
//!
//! `unit_price` and `product_name` are copies taken when the sale was recorded,
//! so later catalog edits never rewrite history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_items")]
pub struct Model {
    /// Unique identifier for the line item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the sale this line belongs to
    pub sale_id: i64,
    /// ID of the product sold
    pub product_id: i64,
    /// Product name as it was at sale time
    pub product_name: String,
    /// Units sold, always positive
    pub quantity: i64,
    /// Unit price frozen at sale time
    pub unit_price: f64,
    /// `quantity * unit_price`
    pub subtotal: f64,
}

/// Defines relationships between `SaleItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
    /// Each line references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
