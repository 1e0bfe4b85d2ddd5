//! Category entity - Optional grouping for catalog products.
//!
//! Categories are referenced by products through a nullable `category_id`.
//! Like products they are soft-deleted so that historical data keeps resolving.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Drinks", "Bakery"), unique across categories
    #[sea_orm(unique)]
    pub name: String,
    /// Soft delete flag - if true, category is hidden but data is preserved
    pub is_deleted: bool,
    /// When the category was created
    pub created_at: DateTime,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category groups many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
