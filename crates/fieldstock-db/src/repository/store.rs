//! # Store Repository
//!
//! Catalog operations for stores. The `areas` list is persisted as a
//! JSON array column, so rows are mapped by hand instead of `FromRow`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fieldstock_core::validation::validate_name;
use fieldstock_core::{Store, StoreType};

/// Private row shape; `areas` still serialized.
#[derive(sqlx::FromRow)]
struct StoreRow {
    id: String,
    name: String,
    store_type: StoreType,
    manager: Option<String>,
    areas: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoreRow {
    fn into_store(self) -> DbResult<Store> {
        let areas: Vec<String> = serde_json::from_str(&self.areas)
            .map_err(|e| DbError::Internal(format!("bad areas column: {e}")))?;
        Ok(Store {
            id: self.id,
            name: self.name,
            store_type: self.store_type,
            manager: self.manager,
            areas,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for store operations.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    /// Creates a new StoreRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Gets a store by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Store>> {
        let row = sqlx::query_as::<_, StoreRow>(
            r#"
            SELECT id, name, store_type, manager, areas, created_at, updated_at
            FROM stores
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoreRow::into_store).transpose()
    }

    /// Lists all stores, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Store>> {
        let rows = sqlx::query_as::<_, StoreRow>(
            r#"
            SELECT id, name, store_type, manager, areas, created_at, updated_at
            FROM stores
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoreRow::into_store).collect()
    }

    /// Inserts a new store.
    pub async fn insert(&self, store: &Store) -> DbResult<Store> {
        validate_name(&store.name)?;

        debug!(name = %store.name, "Inserting store");

        let areas = serde_json::to_string(&store.areas)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO stores (
                id, name, store_type, manager, areas, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(store.store_type)
        .bind(&store.manager)
        .bind(&areas)
        .bind(store.created_at)
        .bind(store.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(store.clone())
    }

    /// Updates a store's mutable fields.
    pub async fn update(&self, store: &Store) -> DbResult<()> {
        validate_name(&store.name)?;

        let areas = serde_json::to_string(&store.areas)
            .map_err(|e| DbError::Internal(e.to_string()))?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stores SET
                name = ?2,
                store_type = ?3,
                manager = ?4,
                areas = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(store.store_type)
        .bind(&store.manager)
        .bind(&areas)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store", &store.id));
        }

        Ok(())
    }
}

/// Helper to generate a new store ID.
pub fn generate_store_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;

    fn store(name: &str) -> Store {
        let now = Utc::now();
        Store {
            id: generate_store_id(),
            name: name.to_string(),
            store_type: StoreType::Sub,
            manager: Some("k.perera".to_string()),
            areas: vec!["AREA-NORTH".to_string(), "AREA-EAST".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_areas_round_trip() {
        let db = test_db().await;
        let inserted = db.stores().insert(&store("North Sub Store")).await.unwrap();

        let fetched = db.stores().get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched.store_type, StoreType::Sub);
        assert_eq!(fetched.areas, vec!["AREA-NORTH", "AREA-EAST"]);
    }

    #[tokio::test]
    async fn test_update_store() {
        let db = test_db().await;
        let mut s = db.stores().insert(&store("North Sub Store")).await.unwrap();

        s.name = "North Main Store".to_string();
        s.store_type = StoreType::Main;
        s.areas.push("AREA-WEST".to_string());
        db.stores().update(&s).await.unwrap();

        let fetched = db.stores().get_by_id(&s.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "North Main Store");
        assert_eq!(fetched.store_type, StoreType::Main);
        assert_eq!(fetched.areas.len(), 3);
    }
}
