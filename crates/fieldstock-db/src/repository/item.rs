//! # Item Repository
//!
//! Catalog operations for material items.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fieldstock_core::validation::{validate_item_code, validate_name};
use fieldstock_core::Item;

/// Repository for item catalog operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, code, name, unit, category, min_level, is_active, created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, code, name, unit, category, min_level, is_active, created_at, updated_at
            FROM items
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active items, ordered by code.
    pub async fn list_active(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, code, name, unit, category, min_level, is_active, created_at, updated_at
            FROM items
            WHERE is_active = 1
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, item: &Item) -> DbResult<Item> {
        validate_item_code(&item.code)?;
        validate_name(&item.name)?;

        debug!(code = %item.code, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, code, name, unit, category, min_level, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.code)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(item.min_level)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item.clone())
    }

    /// Updates an existing item.
    pub async fn update(&self, item: &Item) -> DbResult<()> {
        validate_item_code(&item.code)?;
        validate_name(&item.name)?;

        debug!(id = %item.id, "Updating item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                code = ?2,
                name = ?3,
                unit = ?4,
                category = ?5,
                min_level = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.code)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(&item.category)
        .bind(item.min_level)
        .bind(item.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Soft-deletes an item by setting is_active = false.
    ///
    /// Historical movements and balance sheets still reference it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting item");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE items SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }

    /// Counts active items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;

    fn item(code: &str) -> Item {
        let now = Utc::now();
        Item {
            id: generate_item_id(),
            code: code.to_string(),
            name: format!("Item {code}"),
            unit: "pcs".to_string(),
            category: None,
            min_level: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = test_db().await;
        let inserted = db.items().insert(&item("DROP-24F")).await.unwrap();

        let by_id = db.items().get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "DROP-24F");

        let by_code = db.items().get_by_code("DROP-24F").await.unwrap().unwrap();
        assert_eq!(by_code.id, inserted.id);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        db.items().insert(&item("DROP-24F")).await.unwrap();

        let err = db.items().insert(&item("DROP-24F")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = test_db().await;
        let inserted = db.items().insert(&item("DROP-24F")).await.unwrap();
        assert_eq!(db.items().count().await.unwrap(), 1);

        db.items().soft_delete(&inserted.id).await.unwrap();
        assert_eq!(db.items().count().await.unwrap(), 0);
        assert!(db.items().list_active().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_code_rejected() {
        let db = test_db().await;
        let err = db.items().insert(&item("bad code")).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}
