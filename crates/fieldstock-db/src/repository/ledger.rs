//! # Stock Ledger Repository & Movement Gateway
//!
//! The "current balance + append-only log" pair lives behind one
//! gateway: every quantity change in the system funnels through
//! [`MovementProcessor::apply`], which is crate-private so document
//! repositories are the only possible callers.
//!
//! ## One Movement Document, One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Movement Application (per document)                        │
//! │                                                                         │
//! │  document repo: BEGIN                                                  │
//! │       │  INSERT document header + lines                                │
//! │       ▼                                                                 │
//! │  MovementProcessor::apply(store, type, reference, lines)               │
//! │       │                                                                 │
//! │       │  for each line:                                                │
//! │       │    SELECT quantity (INSERT 0-row if absent)                    │
//! │       │    apply_delta(current, delta)   ← core, may fail              │
//! │       │    UPDATE stock_entries                                        │
//! │       │                                                                 │
//! │       │  INSERT stock_transactions + stock_transaction_lines           │
//! │       ▼                                                                 │
//! │  COMMIT ← document, balances, and log land together or not at all      │
//! │                                                                         │
//! │  Same-key movements serialize on SQLite's single writer; no           │
//! │  read-modify-write can interleave inside another's transaction.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fieldstock_core::ledger::{apply_delta, LedgerKey};
use fieldstock_core::{
    MovementType, StockEntry, TransactionLine, TransactionRecord, ValidationError,
};

// =============================================================================
// Movement Processor
// =============================================================================

/// One item line of a movement, before application.
#[derive(Debug, Clone)]
pub(crate) struct MovementLine {
    pub item_id: String,
    /// Signed quantity change.
    pub delta: i64,
}

impl MovementLine {
    pub(crate) fn new(item_id: impl Into<String>, delta: i64) -> Self {
        MovementLine {
            item_id: item_id.into(),
            delta,
        }
    }
}

/// The single writer of `stock_entries` / `stock_transactions`.
///
/// Crate-private: document repositories call this inside their own
/// sqlx transaction; nothing else can touch a balance.
pub(crate) struct MovementProcessor;

impl MovementProcessor {
    /// Applies one movement document's lines at one store.
    ///
    /// Reads each (store, item) balance, checks the non-negativity
    /// invariant in `fieldstock-core`, writes the new balance, and
    /// appends the audit record. Any failing line aborts the whole
    /// call; the caller's transaction rollback discards the partial
    /// writes.
    pub(crate) async fn apply(
        conn: &mut SqliteConnection,
        store_id: &str,
        movement_type: MovementType,
        reference_id: &str,
        notes: Option<&str>,
        lines: &[MovementLine],
    ) -> DbResult<TransactionRecord> {
        let now = Utc::now();
        let transaction_id = Uuid::new_v4().to_string();

        debug!(
            store_id = %store_id,
            ?movement_type,
            reference_id = %reference_id,
            lines = lines.len(),
            "Applying movement"
        );

        let mut applied: Vec<TransactionLine> = Vec::with_capacity(lines.len());

        for line in lines {
            let key = LedgerKey::new(store_id, line.item_id.clone());
            let before = Self::read_or_create_entry(conn, store_id, &line.item_id).await?;
            let after = apply_delta(&key, before, line.delta)?;

            sqlx::query(
                r#"
                UPDATE stock_entries
                SET quantity = ?3, updated_at = ?4
                WHERE store_id = ?1 AND item_id = ?2
                "#,
            )
            .bind(store_id)
            .bind(&line.item_id)
            .bind(after)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            applied.push(TransactionLine {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction_id.clone(),
                item_id: line.item_id.clone(),
                delta: line.delta,
                quantity_before: before,
                quantity_after: after,
            });
        }

        let record = TransactionRecord {
            id: transaction_id,
            movement_type,
            store_id: store_id.to_string(),
            reference_id: reference_id.to_string(),
            notes: notes.map(str::to_string),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_transactions (
                id, movement_type, store_id, reference_id, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(record.movement_type)
        .bind(&record.store_id)
        .bind(&record.reference_id)
        .bind(&record.notes)
        .bind(record.created_at)
        .execute(&mut *conn)
        .await?;

        for line in &applied {
            sqlx::query(
                r#"
                INSERT INTO stock_transaction_lines (
                    id, transaction_id, item_id, delta, quantity_before, quantity_after
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&line.id)
            .bind(&line.transaction_id)
            .bind(&line.item_id)
            .bind(line.delta)
            .bind(line.quantity_before)
            .bind(line.quantity_after)
            .execute(&mut *conn)
            .await?;
        }

        Ok(record)
    }

    /// Reads the current balance, inserting a zero entry on first
    /// movement of a (store, item) pair.
    async fn read_or_create_entry(
        conn: &mut SqliteConnection,
        store_id: &str,
        item_id: &str,
    ) -> DbResult<i64> {
        let current: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM stock_entries WHERE store_id = ?1 AND item_id = ?2",
        )
        .bind(store_id)
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(quantity) = current {
            return Ok(quantity);
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO stock_entries (id, store_id, item_id, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, 0, ?4, ?4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(store_id)
        .bind(item_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(0)
    }
}

// =============================================================================
// Stock Repository (reads + manual adjustment)
// =============================================================================

/// A stock row at or below its item's reorder threshold.
///
/// Outbound surface for the low-stock alerting collaborator.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockRow {
    pub store_id: String,
    pub store_name: String,
    pub item_id: String,
    pub item_code: String,
    pub item_name: String,
    pub unit: String,
    pub quantity: i64,
    pub min_level: i64,
}

/// Repository for ledger reads and manual adjustments.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets the current quantity for a (store, item) pair.
    ///
    /// A pair with no committed movements reads as 0.
    pub async fn get_quantity(&self, store_id: &str, item_id: &str) -> DbResult<i64> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM stock_entries WHERE store_id = ?1 AND item_id = ?2",
        )
        .bind(store_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    /// Gets the stock entry for a (store, item) pair, if one exists.
    pub async fn get_entry(&self, store_id: &str, item_id: &str) -> DbResult<Option<StockEntry>> {
        let entry = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT id, store_id, item_id, quantity, created_at, updated_at
            FROM stock_entries
            WHERE store_id = ?1 AND item_id = ?2
            "#,
        )
        .bind(store_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Lists all stock entries for a store.
    pub async fn list_for_store(&self, store_id: &str) -> DbResult<Vec<StockEntry>> {
        let entries = sqlx::query_as::<_, StockEntry>(
            r#"
            SELECT id, store_id, item_id, quantity, created_at, updated_at
            FROM stock_entries
            WHERE store_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Lists stock rows at or below their item's reorder threshold.
    ///
    /// Read-only; polled by the alerting collaborator. Delivery of the
    /// alerts themselves is outside the ledger core.
    pub async fn list_low_stock(&self) -> DbResult<Vec<LowStockRow>> {
        let rows = sqlx::query_as::<_, LowStockRow>(
            r#"
            SELECT
                e.store_id,
                s.name AS store_name,
                e.item_id,
                i.code AS item_code,
                i.name AS item_name,
                i.unit,
                e.quantity,
                i.min_level
            FROM stock_entries e
            INNER JOIN items i ON i.id = e.item_id
            INNER JOIN stores s ON s.id = e.store_id
            WHERE i.is_active = 1 AND e.quantity <= i.min_level
            ORDER BY s.name, i.code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists committed movement records for a store, newest first.
    pub async fn list_transactions(
        &self,
        store_id: &str,
        limit: u32,
    ) -> DbResult<Vec<TransactionRecord>> {
        let records = sqlx::query_as::<_, TransactionRecord>(
            r#"
            SELECT id, movement_type, store_id, reference_id, notes, created_at
            FROM stock_transactions
            WHERE store_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(store_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Gets the lines of one movement record.
    pub async fn get_transaction_lines(
        &self,
        transaction_id: &str,
    ) -> DbResult<Vec<TransactionLine>> {
        let lines = sqlx::query_as::<_, TransactionLine>(
            r#"
            SELECT id, transaction_id, item_id, delta, quantity_before, quantity_after
            FROM stock_transaction_lines
            WHERE transaction_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Replays all committed deltas for a (store, item) pair.
    ///
    /// Must always equal `get_quantity` for the same pair - the ledger
    /// replay property. Used by audit checks and tests.
    pub async fn replayed_quantity(&self, store_id: &str, item_id: &str) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(l.delta)
            FROM stock_transaction_lines l
            INNER JOIN stock_transactions t ON t.id = l.transaction_id
            WHERE t.store_id = ?1 AND l.item_id = ?2
            "#,
        )
        .bind(store_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Records a manual stock correction.
    ///
    /// Goes through the same gateway as every other movement and is
    /// subject to the same non-negativity rule. The reason lands in the
    /// audit record's notes.
    pub async fn record_adjustment(
        &self,
        store_id: &str,
        item_id: &str,
        delta: i64,
        reason: &str,
    ) -> DbResult<TransactionRecord> {
        if delta == 0 {
            return Err(ValidationError::InvalidFormat {
                field: "delta".to_string(),
                reason: "must be nonzero".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let record = MovementProcessor::apply(
            &mut tx,
            store_id,
            MovementType::Adjustment,
            &Uuid::new_v4().to_string(),
            Some(reason),
            &[MovementLine::new(item_id, delta)],
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(record)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_item, seed_store, test_db};

    #[tokio::test]
    async fn test_adjustment_creates_entry_and_log() {
        let db = test_db().await;
        let store = seed_store(&db, "Area Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;

        let record = db
            .stock()
            .record_adjustment(&store, &item, 50, "opening count")
            .await
            .unwrap();

        assert_eq!(db.stock().get_quantity(&store, &item).await.unwrap(), 50);
        assert_eq!(
            db.stock().replayed_quantity(&store, &item).await.unwrap(),
            50
        );

        let lines = db.stock().get_transaction_lines(&record.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity_before, 0);
        assert_eq!(lines[0].quantity_after, 50);
    }

    #[tokio::test]
    async fn test_negative_adjustment_cannot_overdraw() {
        let db = test_db().await;
        let store = seed_store(&db, "Area Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;

        db.stock()
            .record_adjustment(&store, &item, 20, "opening count")
            .await
            .unwrap();

        let err = db
            .stock()
            .record_adjustment(&store, &item, -30, "shrinkage")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(fieldstock_core::CoreError::InsufficientStock {
                available: 20,
                requested: 30,
                ..
            })
        ));

        // Nothing applied: balance and replay unchanged.
        assert_eq!(db.stock().get_quantity(&store, &item).await.unwrap(), 20);
        assert_eq!(
            db.stock().replayed_quantity(&store, &item).await.unwrap(),
            20
        );
    }

    #[tokio::test]
    async fn test_zero_delta_adjustment_rejected() {
        let db = test_db().await;
        let store = seed_store(&db, "Area Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;

        let err = db
            .stock()
            .record_adjustment(&store, &item, 0, "noop")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_low_stock_query() {
        let db = test_db().await;
        let store = seed_store(&db, "Area Store", "main").await;
        let scarce = seed_item(&db, "DROP-24F", 10).await;
        let plenty = seed_item(&db, "ONT-G240", 5).await;

        db.stock()
            .record_adjustment(&store, &scarce, 10, "opening count")
            .await
            .unwrap();
        db.stock()
            .record_adjustment(&store, &plenty, 100, "opening count")
            .await
            .unwrap();

        let rows = db.stock().list_low_stock().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, scarce);
        assert_eq!(rows[0].quantity, 10);
        assert_eq!(rows[0].min_level, 10);
    }
}
