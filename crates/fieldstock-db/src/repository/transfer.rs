//! # Transfer Repository
//!
//! Inter-store stock requests and the approval state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_request ──► PENDING ──approve──► COMPLETED                     │
//! │                         │                                               │
//! │                         └──────reject───► REJECTED                      │
//! │                                                                         │
//! │  Approval applies, per allocated line, in ONE transaction:              │
//! │    TRANSFER_OUT at the supplying store (to_store)                       │
//! │    TRANSFER_IN  at the requesting store (from_store)                    │
//! │                                                                         │
//! │  The deltas sum to zero per item, so conservation across the pair       │
//! │  is a derivable property of the two self-contained store histories.     │
//! │  Any insufficiency aborts the whole approval; the request stays         │
//! │  PENDING and neither store's balance changes.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::document_number;
use crate::repository::ledger::{MovementLine, MovementProcessor};
use fieldstock_core::validation::{validate_line_count, validate_quantity, validate_required};
use fieldstock_core::{
    Allocation, CoreError, MovementType, NewStockRequest, RequestStatus, StockRequest,
    StockRequestLine, ValidationError,
};

/// Repository for inter-store transfer operations.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
}

impl TransferRepository {
    /// Creates a new TransferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransferRepository { pool }
    }

    /// Creates a PENDING stock request. No stock effect.
    pub async fn create_request(&self, input: NewStockRequest) -> DbResult<StockRequest> {
        validate_required("from_store_id", &input.from_store_id)?;
        validate_required("to_store_id", &input.to_store_id)?;
        validate_required("requested_by", &input.requested_by)?;
        validate_line_count(input.lines.len())?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
        }
        if input.from_store_id == input.to_store_id {
            return Err(ValidationError::InvalidFormat {
                field: "to_store_id".to_string(),
                reason: "supplying store must differ from requesting store".to_string(),
            }
            .into());
        }

        let request = StockRequest {
            id: Uuid::new_v4().to_string(),
            request_number: document_number("TRF"),
            from_store_id: input.from_store_id,
            to_store_id: input.to_store_id,
            requested_by: input.requested_by,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };

        debug!(
            request_number = %request.request_number,
            from = %request.from_store_id,
            to = %request.to_store_id,
            "Creating stock request"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO stock_requests (
                id, request_number, from_store_id, to_store_id,
                requested_by, status, created_at, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&request.id)
        .bind(&request.request_number)
        .bind(&request.from_store_id)
        .bind(&request.to_store_id)
        .bind(&request.requested_by)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.resolved_at)
        .execute(&mut *tx)
        .await?;

        for line in &input.lines {
            sqlx::query(
                r#"
                INSERT INTO stock_request_lines (
                    id, request_id, item_id, requested_qty, approved_qty
                ) VALUES (?1, ?2, ?3, ?4, NULL)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&request.id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(request)
    }

    /// Approves a PENDING request with the given allocation.
    ///
    /// Applies TRANSFER_OUT at the supplying store and TRANSFER_IN at
    /// the requesting store for every allocated line, records the
    /// approved quantities, and completes the request - all in one
    /// transaction. If any line would overdraw the supplying store, the
    /// whole approval fails and the request stays PENDING.
    pub async fn approve(&self, request_id: &str, allocation: &[Allocation]) -> DbResult<()> {
        validate_line_count(allocation.len())?;
        for alloc in allocation {
            validate_quantity(alloc.approved_qty)?;
        }

        let mut tx = self.pool.begin().await?;

        let request = Self::fetch_request(&mut tx, request_id).await?;
        if request.status != RequestStatus::Pending {
            return Err(CoreError::invalid_state(
                "StockRequest",
                request_id,
                request.status.as_str(),
                "approve",
            )
            .into());
        }

        let lines = sqlx::query_as::<_, StockRequestLine>(
            r#"
            SELECT id, request_id, item_id, requested_qty, approved_qty
            FROM stock_request_lines
            WHERE request_id = ?1
            "#,
        )
        .bind(request_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut out_lines = Vec::with_capacity(allocation.len());
        let mut in_lines = Vec::with_capacity(allocation.len());

        for alloc in allocation {
            let line = lines
                .iter()
                .find(|l| l.item_id == alloc.item_id)
                .ok_or_else(|| DbError::not_found("StockRequestLine", &alloc.item_id))?;

            sqlx::query("UPDATE stock_request_lines SET approved_qty = ?2 WHERE id = ?1")
                .bind(&line.id)
                .bind(alloc.approved_qty)
                .execute(&mut *tx)
                .await?;

            out_lines.push(MovementLine::new(&alloc.item_id, -alloc.approved_qty));
            in_lines.push(MovementLine::new(&alloc.item_id, alloc.approved_qty));
        }

        // Two independently auditable movements: the supplying store's
        // history and the requesting store's history are each
        // self-contained, and their deltas sum to zero per item.
        MovementProcessor::apply(
            &mut tx,
            &request.to_store_id,
            MovementType::TransferOut,
            request_id,
            None,
            &out_lines,
        )
        .await?;

        MovementProcessor::apply(
            &mut tx,
            &request.from_store_id,
            MovementType::TransferIn,
            request_id,
            None,
            &in_lines,
        )
        .await?;

        let now = Utc::now();
        sqlx::query(
            "UPDATE stock_requests SET status = 'completed', resolved_at = ?2 WHERE id = ?1",
        )
        .bind(request_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(request_id = %request_id, "Stock request approved");
        Ok(())
    }

    /// Rejects a PENDING request. Terminal; no stock effect.
    pub async fn reject(&self, request_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let request = Self::fetch_request(&mut tx, request_id).await?;
        if request.status != RequestStatus::Pending {
            return Err(CoreError::invalid_state(
                "StockRequest",
                request_id,
                request.status.as_str(),
                "reject",
            )
            .into());
        }

        let now = Utc::now();
        sqlx::query(
            "UPDATE stock_requests SET status = 'rejected', resolved_at = ?2 WHERE id = ?1",
        )
        .bind(request_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets a request by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockRequest>> {
        let request = sqlx::query_as::<_, StockRequest>(
            r#"
            SELECT id, request_number, from_store_id, to_store_id,
                   requested_by, status, created_at, resolved_at
            FROM stock_requests
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Gets all lines for a request.
    pub async fn get_lines(&self, request_id: &str) -> DbResult<Vec<StockRequestLine>> {
        let lines = sqlx::query_as::<_, StockRequestLine>(
            r#"
            SELECT id, request_id, item_id, requested_qty, approved_qty
            FROM stock_request_lines
            WHERE request_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists PENDING requests awaiting a supplying store's review.
    pub async fn list_pending_for_supplier(&self, to_store_id: &str) -> DbResult<Vec<StockRequest>> {
        let requests = sqlx::query_as::<_, StockRequest>(
            r#"
            SELECT id, request_number, from_store_id, to_store_id,
                   requested_by, status, created_at, resolved_at
            FROM stock_requests
            WHERE to_store_id = ?1 AND status = 'pending'
            ORDER BY created_at
            "#,
        )
        .bind(to_store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn fetch_request(
        tx: &mut sqlx::SqliteConnection,
        request_id: &str,
    ) -> DbResult<StockRequest> {
        sqlx::query_as::<_, StockRequest>(
            r#"
            SELECT id, request_number, from_store_id, to_store_id,
                   requested_by, status, created_at, resolved_at
            FROM stock_requests
            WHERE id = ?1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("StockRequest", request_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{grn_intake, seed_item, seed_store, test_db};
    use fieldstock_core::QuantityLine;

    async fn pending_request(
        db: &crate::Database,
        from: &str,
        to: &str,
        item: &str,
        qty: i64,
    ) -> StockRequest {
        db.transfers()
            .create_request(NewStockRequest {
                from_store_id: from.to_string(),
                to_store_id: to.to_string(),
                requested_by: "s.fernando".to_string(),
                lines: vec![QuantityLine {
                    item_id: item.to_string(),
                    quantity: qty,
                }],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_approval_moves_stock_and_conserves() {
        let db = test_db().await;
        let main = seed_store(&db, "Main Store", "main").await;
        let sub = seed_store(&db, "Sub Store", "sub").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &main, &item, 100).await;

        // Scenario: sub store requests 30 from main, approved in full.
        let request = pending_request(&db, &sub, &main, &item, 30).await;
        db.transfers()
            .approve(
                &request.id,
                &[Allocation {
                    item_id: item.clone(),
                    approved_qty: 30,
                }],
            )
            .await
            .unwrap();

        assert_eq!(db.stock().get_quantity(&main, &item).await.unwrap(), 70);
        assert_eq!(db.stock().get_quantity(&sub, &item).await.unwrap(), 30);

        // Conservation: the two transfer records' deltas cancel.
        let main_delta = db.stock().replayed_quantity(&main, &item).await.unwrap() - 100;
        let sub_delta = db.stock().replayed_quantity(&sub, &item).await.unwrap();
        assert_eq!(main_delta + sub_delta, 0);

        let updated = db.transfers().get_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(updated.status, RequestStatus::Completed);
        assert!(updated.resolved_at.is_some());

        let lines = db.transfers().get_lines(&request.id).await.unwrap();
        assert_eq!(lines[0].approved_qty, Some(30));

        // Two records: TRANSFER_OUT at main, TRANSFER_IN at sub.
        let main_txns = db.stock().list_transactions(&main, 10).await.unwrap();
        assert!(main_txns
            .iter()
            .any(|t| t.movement_type == MovementType::TransferOut && t.reference_id == request.id));
        let sub_txns = db.stock().list_transactions(&sub, 10).await.unwrap();
        assert!(sub_txns
            .iter()
            .any(|t| t.movement_type == MovementType::TransferIn && t.reference_id == request.id));
    }

    #[tokio::test]
    async fn test_overdraw_approval_fails_atomically() {
        let db = test_db().await;
        let main = seed_store(&db, "Main Store", "main").await;
        let sub = seed_store(&db, "Sub Store", "sub").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &main, &item, 20).await;

        let request = pending_request(&db, &sub, &main, &item, 30).await;
        let err = db
            .transfers()
            .approve(
                &request.id,
                &[Allocation {
                    item_id: item.clone(),
                    approved_qty: 30,
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        // Neither store changed and the request is still pending.
        assert_eq!(db.stock().get_quantity(&main, &item).await.unwrap(), 20);
        assert_eq!(db.stock().get_quantity(&sub, &item).await.unwrap(), 0);
        let unchanged = db.transfers().get_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, RequestStatus::Pending);
        assert_eq!(
            db.transfers().get_lines(&request.id).await.unwrap()[0].approved_qty,
            None
        );
    }

    #[tokio::test]
    async fn test_partial_allocation_approval() {
        let db = test_db().await;
        let main = seed_store(&db, "Main Store", "main").await;
        let sub = seed_store(&db, "Sub Store", "sub").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &main, &item, 100).await;

        // Requested 80, approved 50.
        let request = pending_request(&db, &sub, &main, &item, 80).await;
        db.transfers()
            .approve(
                &request.id,
                &[Allocation {
                    item_id: item.clone(),
                    approved_qty: 50,
                }],
            )
            .await
            .unwrap();

        assert_eq!(db.stock().get_quantity(&main, &item).await.unwrap(), 50);
        assert_eq!(db.stock().get_quantity(&sub, &item).await.unwrap(), 50);
        let lines = db.transfers().get_lines(&request.id).await.unwrap();
        assert_eq!(lines[0].requested_qty, 80);
        assert_eq!(lines[0].approved_qty, Some(50));
    }

    #[tokio::test]
    async fn test_resolved_request_cannot_be_reapproved() {
        let db = test_db().await;
        let main = seed_store(&db, "Main Store", "main").await;
        let sub = seed_store(&db, "Sub Store", "sub").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &main, &item, 100).await;

        let request = pending_request(&db, &sub, &main, &item, 10).await;
        let allocation = [Allocation {
            item_id: item.clone(),
            approved_qty: 10,
        }];
        db.transfers().approve(&request.id, &allocation).await.unwrap();

        let err = db
            .transfers()
            .approve(&request.id, &allocation)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidState { .. })
        ));

        // Rejecting a completed request is also invalid.
        let err = db.transfers().reject(&request.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_reject_is_terminal_and_stockless() {
        let db = test_db().await;
        let main = seed_store(&db, "Main Store", "main").await;
        let sub = seed_store(&db, "Sub Store", "sub").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &main, &item, 100).await;

        let request = pending_request(&db, &sub, &main, &item, 10).await;
        db.transfers().reject(&request.id).await.unwrap();

        let rejected = db.transfers().get_by_id(&request.id).await.unwrap().unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(db.stock().get_quantity(&main, &item).await.unwrap(), 100);
    }
}
