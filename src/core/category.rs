//! Category business logic - Lookup and creation of product categories.
//!
//! Category names are trimmed and must not be empty. Products created from the
//! catalog file or by callers use [`find_or_create_category`] so that the same
//! name always resolves to the same category.

use crate::{
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Retrieves all active categories, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_categories<C>(db: &C) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::IsDeleted.eq(false))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active category by its exact (trimmed) name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_category_by_name<C>(db: &C, name: &str) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .filter(category::Column::Name.eq(name.trim()))
        .filter(category::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new category. A deleted category with the same name is restored instead.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - An active category with the same name already exists
/// - The database insert operation fails
pub async fn create_category<C>(db: &C, name: &str) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = validated_name(name)?;

    let deleted = Category::find()
        .filter(category::Column::Name.eq(name))
        .filter(category::Column::IsDeleted.eq(true))
        .one(db)
        .await?;
    if let Some(deleted) = deleted {
        let mut restored: category::ActiveModel = deleted.into();
        restored.is_deleted = Set(false);
        return restored.update(db).await.map_err(Into::into);
    }

    let category = category::ActiveModel {
        name: Set(name.to_string()),
        is_deleted: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    category.insert(db).await.map_err(Into::into)
}

/// Returns the category with the given name, creating it when it does not exist yet.
///
/// # Errors
/// Returns an error if the name is empty or a database operation fails.
pub async fn find_or_create_category<C>(db: &C, name: &str) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = validated_name(name)?;

    match get_category_by_name(db, name).await? {
        Some(existing) => Ok(existing),
        None => create_category(db, name).await,
    }
}

/// Soft deletes a category. Its products stay in the catalog, uncategorized in listings.
///
/// # Errors
/// Returns an error if:
/// - The category does not exist or is already deleted
/// - The database update operation fails
pub async fn delete_category<C>(db: &C, category_id: i64) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or(Error::CategoryNotFound { id: category_id })?;

    let mut category: category::ActiveModel = category.into();
    category.is_deleted = Set(true);
    category.update(db).await.map_err(Into::into)
}

fn validated_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Config {
            message: "Category name cannot be empty".to_string(),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_category_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_category(&db, "").await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        let result = find_or_create_category(&db, "   ").await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        // Validation happens before any query
        assert!(db.into_transaction_log().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_and_get_category() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_category(&db, "  Drinks ").await?;
        assert_eq!(created.name, "Drinks");
        assert!(!created.is_deleted);

        let found = get_category_by_name(&db, "Drinks").await?.unwrap();
        assert_eq!(found.id, created.id);

        assert!(get_category_by_name(&db, "Bakery").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_category_name_fails() -> Result<()> {
        let db = setup_test_db().await?;

        create_category(&db, "Drinks").await?;
        let result = create_category(&db, "Drinks").await;
        assert!(matches!(result.unwrap_err(), Error::Database(_)));
        Ok(())
    }

    #[tokio::test]
    async fn test_find_or_create_category_reuses_existing() -> Result<()> {
        let db = setup_test_db().await?;

        let first = find_or_create_category(&db, "Bakery").await?;
        let second = find_or_create_category(&db, " Bakery  ").await?;
        assert_eq!(first.id, second.id);

        let all = get_all_categories(&db).await?;
        assert_eq!(all.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_hides_it() -> Result<()> {
        let db = setup_test_db().await?;

        let drinks = create_category(&db, "Drinks").await?;
        create_category(&db, "Bakery").await?;

        let deleted = delete_category(&db, drinks.id).await?;
        assert!(deleted.is_deleted);

        assert!(get_category_by_name(&db, "Drinks").await?.is_none());
        let names: Vec<String> = get_all_categories(&db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Bakery"]);

        let result = delete_category(&db, drinks.id).await;
        assert!(matches!(result.unwrap_err(), Error::CategoryNotFound { .. }));
        let result = delete_category(&db, 999).await;
        assert!(matches!(result.unwrap_err(), Error::CategoryNotFound { id: 999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_recreating_deleted_category_restores_it() -> Result<()> {
        let db = setup_test_db().await?;

        let drinks = create_category(&db, "Drinks").await?;
        delete_category(&db, drinks.id).await?;

        let again = find_or_create_category(&db, "Drinks").await?;
        assert_eq!(again.id, drinks.id);
        assert!(!again.is_deleted);
        assert_eq!(get_all_categories(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_categories_ordered_by_name() -> Result<()> {
        let db = setup_test_db().await?;

        create_category(&db, "Snacks").await?;
        create_category(&db, "Bakery").await?;
        create_category(&db, "Drinks").await?;

        let names: Vec<String> = get_all_categories(&db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Bakery", "Drinks", "Snacks"]);
        Ok(())
    }
}
