//! # GRN Repository
//!
//! Goods-received-note intake. A GRN and its GRN_IN movements commit in
//! one transaction; intake only increases stock, so creation cannot fail
//! on insufficiency.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::document_number;
use crate::repository::ledger::{MovementLine, MovementProcessor};
use fieldstock_core::validation::{validate_line_count, validate_quantity, validate_required};
use fieldstock_core::{Grn, GrnLine, MovementType, NewGrn};

/// Repository for GRN intake operations.
#[derive(Debug, Clone)]
pub struct GrnRepository {
    pool: SqlitePool,
}

impl GrnRepository {
    /// Creates a new GrnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        GrnRepository { pool }
    }

    /// Creates a GRN and books its stock into the store.
    ///
    /// ## What This Does (one transaction)
    /// 1. Inserts the GRN header and lines
    /// 2. Applies a GRN_IN movement for every line
    pub async fn create(&self, input: NewGrn) -> DbResult<Grn> {
        validate_required("store_id", &input.store_id)?;
        validate_required("received_by", &input.received_by)?;
        validate_line_count(input.lines.len())?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
        }

        let grn = Grn {
            id: Uuid::new_v4().to_string(),
            grn_number: document_number("GRN"),
            store_id: input.store_id,
            source_type: input.source_type,
            supplier: input.supplier,
            received_by: input.received_by,
            received_at: Utc::now(),
        };

        debug!(grn_number = %grn.grn_number, store_id = %grn.store_id, "Creating GRN");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO grns (
                id, grn_number, store_id, source_type, supplier, received_by, received_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&grn.id)
        .bind(&grn.grn_number)
        .bind(&grn.store_id)
        .bind(&grn.source_type)
        .bind(&grn.supplier)
        .bind(&grn.received_by)
        .bind(grn.received_at)
        .execute(&mut *tx)
        .await?;

        let mut movement_lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            sqlx::query(
                "INSERT INTO grn_lines (id, grn_id, item_id, quantity) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&grn.id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            movement_lines.push(MovementLine::new(&line.item_id, line.quantity));
        }

        MovementProcessor::apply(
            &mut tx,
            &grn.store_id,
            MovementType::GrnIn,
            &grn.id,
            None,
            &movement_lines,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(grn)
    }

    /// Gets a GRN by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Grn>> {
        let grn = sqlx::query_as::<_, Grn>(
            r#"
            SELECT id, grn_number, store_id, source_type, supplier, received_by, received_at
            FROM grns
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(grn)
    }

    /// Gets all lines for a GRN.
    pub async fn get_lines(&self, grn_id: &str) -> DbResult<Vec<GrnLine>> {
        let lines = sqlx::query_as::<_, GrnLine>(
            r#"
            SELECT id, grn_id, item_id, quantity
            FROM grn_lines
            WHERE grn_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(grn_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists GRNs for a store, newest first.
    pub async fn list_for_store(&self, store_id: &str, limit: u32) -> DbResult<Vec<Grn>> {
        let grns = sqlx::query_as::<_, Grn>(
            r#"
            SELECT id, grn_number, store_id, source_type, supplier, received_by, received_at
            FROM grns
            WHERE store_id = ?1
            ORDER BY received_at DESC
            LIMIT ?2
            "#,
        )
        .bind(store_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(grns)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_item, seed_store, test_db};
    use fieldstock_core::QuantityLine;

    #[tokio::test]
    async fn test_grn_books_stock() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;

        // Scenario: receiving 100 units leaves the store holding 100.
        let grn = db
            .grns()
            .create(NewGrn {
                store_id: store.clone(),
                source_type: "supplier".to_string(),
                supplier: Some("CableCo".to_string()),
                received_by: "k.perera".to_string(),
                lines: vec![QuantityLine {
                    item_id: item.clone(),
                    quantity: 100,
                }],
            })
            .await
            .unwrap();

        assert!(grn.grn_number.starts_with("GRN-"));
        assert_eq!(db.stock().get_quantity(&store, &item).await.unwrap(), 100);
        assert_eq!(
            db.stock().replayed_quantity(&store, &item).await.unwrap(),
            100
        );

        let lines = db.grns().get_lines(&grn.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 100);
    }

    #[tokio::test]
    async fn test_grn_rejects_empty_lines() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;

        let err = db
            .grns()
            .create(NewGrn {
                store_id: store,
                source_type: "supplier".to_string(),
                supplier: None,
                received_by: "k.perera".to_string(),
                lines: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_grn_rejects_nonpositive_quantity() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;

        let err = db
            .grns()
            .create(NewGrn {
                store_id: store.clone(),
                source_type: "supplier".to_string(),
                supplier: None,
                received_by: "k.perera".to_string(),
                lines: vec![QuantityLine {
                    item_id: item.clone(),
                    quantity: 0,
                }],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(_)));
        assert_eq!(db.stock().get_quantity(&store, &item).await.unwrap(), 0);
    }
}
