//! # Balance Sheet Repository
//!
//! Monthly opening → closing reconciliation per (contractor, store,
//! month), chained across months.
//!
//! ## Generation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            generate / freeze (contractor, store, month)                 │
//! │                                                                         │
//! │  1. opening   ← prior month's sheet lines (0 when no prior sheet)      │
//! │  2. received  ← issue documents for the account month                   │
//! │  3. returned  ← GOOD lines of ACCEPTED returns for the month            │
//! │  4. used      ← USED service-order lines in the month window            │
//! │     wastage   ← WASTAGE service-order lines + contractor wastage docs   │
//! │  5. reconcile (fieldstock-core::balance)                                │
//! │  6. snapshot item code/name/unit                                        │
//! │  7. replace the triple's row-set in one transaction                     │
//! │                                                                         │
//! │  Read-only over the ledger: regeneration never touches stock_entries,   │
//! │  so it may run while current-month movements commit. Movements         │
//! │  committed after generation show up on the next regeneration.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A DRAFT sheet is replaced freely. Freezing stores the identical
//! computation as FINAL - the record the next month chains from. A
//! month is no longer regenerable once it is FINAL, or once the
//! following month has a FINAL sheet chained off its closing balances.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fieldstock_core::balance::{reconcile, ReconciledRow, SheetInputs};
use fieldstock_core::month;
use fieldstock_core::{BalanceSheet, BalanceSheetLine, CoreError, SheetStatus};

/// Repository for balance sheet generation and reads.
#[derive(Debug, Clone)]
pub struct BalanceSheetRepository {
    pool: SqlitePool,
}

impl BalanceSheetRepository {
    /// Creates a new BalanceSheetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BalanceSheetRepository { pool }
    }

    /// Generates (or regenerates) the DRAFT sheet for a triple.
    ///
    /// Idempotent given unchanged source documents: the previous
    /// row-set for the triple is deleted and replaced.
    pub async fn generate(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
        generated_by: &str,
    ) -> DbResult<(BalanceSheet, Vec<BalanceSheetLine>)> {
        self.run(contractor_id, store_id, month_key, generated_by, SheetStatus::Draft)
            .await
    }

    /// Re-runs the identical computation and stores the result as the
    /// FINAL record future months will chain from.
    pub async fn freeze(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
        generated_by: &str,
    ) -> DbResult<(BalanceSheet, Vec<BalanceSheetLine>)> {
        self.run(contractor_id, store_id, month_key, generated_by, SheetStatus::Final)
            .await
    }

    /// Gets the sheet and its lines for a triple, if generated.
    pub async fn get(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
    ) -> DbResult<Option<(BalanceSheet, Vec<BalanceSheetLine>)>> {
        let Some(sheet) = self.get_header(contractor_id, store_id, month_key).await? else {
            return Ok(None);
        };
        let lines = self.get_lines(&sheet.id).await?;
        Ok(Some((sheet, lines)))
    }

    /// Gets the lines of a sheet, ordered by item code.
    pub async fn get_lines(&self, sheet_id: &str) -> DbResult<Vec<BalanceSheetLine>> {
        let lines = sqlx::query_as::<_, BalanceSheetLine>(
            r#"
            SELECT id, sheet_id, item_id, item_code, item_name, unit,
                   opening, received, returned, used, wastage, closing
            FROM balance_sheet_lines
            WHERE sheet_id = ?1
            ORDER BY item_code
            "#,
        )
        .bind(sheet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // =========================================================================
    // Generation internals
    // =========================================================================

    async fn run(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
        generated_by: &str,
        status: SheetStatus,
    ) -> DbResult<(BalanceSheet, Vec<BalanceSheetLine>)> {
        Self::validate_params(contractor_id, store_id, month_key)?;
        let operation = match status {
            SheetStatus::Draft => "regenerate",
            SheetStatus::Final => "freeze",
        };
        self.guard_chain(contractor_id, store_id, month_key, operation)
            .await?;

        debug!(
            contractor_id = %contractor_id,
            store_id = %store_id,
            month = %month_key,
            ?status,
            "Generating balance sheet"
        );

        let inputs = self.collect_inputs(contractor_id, store_id, month_key).await?;
        let rows = reconcile(&inputs);

        self.persist(contractor_id, store_id, month_key, generated_by, status, &rows)
            .await
    }

    fn validate_params(contractor_id: &str, store_id: &str, month_key: &str) -> DbResult<()> {
        if contractor_id.trim().is_empty() {
            return Err(CoreError::missing("contractor_id").into());
        }
        if store_id.trim().is_empty() {
            return Err(CoreError::missing("store_id").into());
        }
        if month_key.trim().is_empty() {
            return Err(CoreError::missing("month").into());
        }
        month::validate_month(month_key).map_err(CoreError::from)?;
        Ok(())
    }

    /// Rejects regeneration of a month that is itself FINAL, or that
    /// the following month's FINAL sheet has already chained from.
    async fn guard_chain(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
        operation: &str,
    ) -> DbResult<()> {
        if let Some(sheet) = self.get_header(contractor_id, store_id, month_key).await? {
            if sheet.status == SheetStatus::Final {
                return Err(CoreError::invalid_state(
                    "BalanceSheet",
                    &sheet.id,
                    sheet.status.as_str(),
                    operation,
                )
                .into());
            }
        }

        let next = month::next_month(month_key).map_err(CoreError::from)?;
        if let Some(next_sheet) = self.get_header(contractor_id, store_id, &next).await? {
            if next_sheet.status == SheetStatus::Final {
                return Err(CoreError::invalid_state(
                    "BalanceSheet",
                    &next_sheet.id,
                    "final",
                    "regenerate the month it chains from",
                )
                .into());
            }
        }

        Ok(())
    }

    async fn collect_inputs(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
    ) -> DbResult<SheetInputs> {
        let mut inputs = SheetInputs::default();

        // 1. Opening balances chain from the prior month's sheet.
        let prior = month::previous_month(month_key).map_err(CoreError::from)?;
        let opening_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT l.item_id, l.closing
            FROM balance_sheet_lines l
            INNER JOIN balance_sheets s ON s.id = l.sheet_id
            WHERE s.contractor_id = ?1 AND s.store_id = ?2 AND s.month = ?3
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(&prior)
        .fetch_all(&self.pool)
        .await?;
        inputs.opening = opening_rows.into_iter().collect();

        // 2. Received: issue documents for the account month. Matches
        // the issuance policy: these same quantities left the store as
        // ISSUE_OUT movements when the documents were created.
        let received_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT il.item_id, SUM(il.quantity)
            FROM material_issue_lines il
            INNER JOIN material_issues i ON i.id = il.issue_id
            WHERE i.contractor_id = ?1 AND i.store_id = ?2 AND i.month = ?3
            GROUP BY il.item_id
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(month_key)
        .fetch_all(&self.pool)
        .await?;
        inputs.received = received_rows.into_iter().collect();

        // 3. Returned: GOOD lines of accepted returns for the month.
        let returned_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT rl.item_id, SUM(rl.quantity)
            FROM material_return_lines rl
            INNER JOIN material_returns r ON r.id = rl.return_id
            WHERE r.contractor_id = ?1 AND r.store_id = ?2 AND r.month = ?3
              AND r.status = 'accepted' AND rl.condition = 'good'
            GROUP BY rl.item_id
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(month_key)
        .fetch_all(&self.pool)
        .await?;
        inputs.returned = returned_rows.into_iter().collect();

        // 4. Used and wastage from service orders completed in the
        // month's time window.
        let (window_start, window_end) =
            month::month_bounds(month_key).map_err(CoreError::from)?;

        let used_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT item_id, SUM(quantity)
            FROM material_usages
            WHERE contractor_id = ?1 AND store_id = ?2 AND usage_type = 'used'
              AND used_at >= ?3 AND used_at < ?4
            GROUP BY item_id
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await?;
        inputs.used = used_rows.into_iter().collect();

        let usage_wastage_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT item_id, SUM(quantity)
            FROM material_usages
            WHERE contractor_id = ?1 AND store_id = ?2 AND usage_type = 'wastage'
              AND used_at >= ?3 AND used_at < ?4
            GROUP BY item_id
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await?;
        inputs.wastage = usage_wastage_rows.into_iter().collect();

        // Direct contractor wastage records add into wastage.
        let doc_wastage_rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT wl.item_id, SUM(wl.quantity)
            FROM wastage_lines wl
            INNER JOIN wastages w ON w.id = wl.wastage_id
            WHERE w.contractor_id = ?1 AND w.store_id = ?2 AND w.month = ?3
            GROUP BY wl.item_id
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(month_key)
        .fetch_all(&self.pool)
        .await?;
        for (item_id, qty) in doc_wastage_rows {
            *inputs.wastage.entry(item_id).or_insert(0) += qty;
        }

        Ok(inputs)
    }

    /// Replaces the triple's row-set with the freshly computed rows.
    async fn persist(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
        generated_by: &str,
        status: SheetStatus,
        rows: &[ReconciledRow],
    ) -> DbResult<(BalanceSheet, Vec<BalanceSheetLine>)> {
        let catalog = self.snapshot_items(rows).await?;

        let sheet = BalanceSheet {
            id: Uuid::new_v4().to_string(),
            contractor_id: contractor_id.to_string(),
            store_id: store_id.to_string(),
            month: month_key.to_string(),
            status,
            generated_by: generated_by.to_string(),
            generated_at: Utc::now(),
        };

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let (item_code, item_name, unit) = catalog
                .get(&row.item_id)
                .cloned()
                .ok_or_else(|| DbError::not_found("Item", &row.item_id))?;
            lines.push(BalanceSheetLine {
                id: Uuid::new_v4().to_string(),
                sheet_id: sheet.id.clone(),
                item_id: row.item_id.clone(),
                item_code,
                item_name,
                unit,
                opening: row.opening,
                received: row.received,
                returned: row.returned,
                used: row.used,
                wastage: row.wastage,
                closing: row.closing,
            });
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM balance_sheet_lines
            WHERE sheet_id IN (
                SELECT id FROM balance_sheets
                WHERE contractor_id = ?1 AND store_id = ?2 AND month = ?3
            )
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(month_key)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM balance_sheets WHERE contractor_id = ?1 AND store_id = ?2 AND month = ?3",
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(month_key)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO balance_sheets (
                id, contractor_id, store_id, month, status, generated_by, generated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sheet.id)
        .bind(&sheet.contractor_id)
        .bind(&sheet.store_id)
        .bind(&sheet.month)
        .bind(sheet.status)
        .bind(&sheet.generated_by)
        .bind(sheet.generated_at)
        .execute(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO balance_sheet_lines (
                    id, sheet_id, item_id, item_code, item_name, unit,
                    opening, received, returned, used, wastage, closing
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(&line.id)
            .bind(&line.sheet_id)
            .bind(&line.item_id)
            .bind(&line.item_code)
            .bind(&line.item_name)
            .bind(&line.unit)
            .bind(line.opening)
            .bind(line.received)
            .bind(line.returned)
            .bind(line.used)
            .bind(line.wastage)
            .bind(line.closing)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        lines.sort_by(|a, b| a.item_code.cmp(&b.item_code));
        Ok((sheet, lines))
    }

    /// Snapshots (code, name, unit) for every item on the sheet.
    async fn snapshot_items(
        &self,
        rows: &[ReconciledRow],
    ) -> DbResult<HashMap<String, (String, String, String)>> {
        let mut catalog = HashMap::with_capacity(rows.len());
        for row in rows {
            let meta: Option<(String, String, String)> =
                sqlx::query_as("SELECT code, name, unit FROM items WHERE id = ?1")
                    .bind(&row.item_id)
                    .fetch_optional(&self.pool)
                    .await?;
            let meta = meta.ok_or_else(|| DbError::not_found("Item", &row.item_id))?;
            catalog.insert(row.item_id.clone(), meta);
        }
        Ok(catalog)
    }

    async fn get_header(
        &self,
        contractor_id: &str,
        store_id: &str,
        month_key: &str,
    ) -> DbResult<Option<BalanceSheet>> {
        let sheet = sqlx::query_as::<_, BalanceSheet>(
            r#"
            SELECT id, contractor_id, store_id, month, status, generated_by, generated_at
            FROM balance_sheets
            WHERE contractor_id = ?1 AND store_id = ?2 AND month = ?3
            "#,
        )
        .bind(contractor_id)
        .bind(store_id)
        .bind(month_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sheet)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{grn_intake, seed_item, seed_store, test_db};
    use chrono::TimeZone;
    use fieldstock_core::{
        NewMaterialIssue, NewMaterialReturn, NewServiceOrderUsage, NewWastage, ReturnCondition,
        ReturnLineInput, ReturnWorkflowMode, UnitQuantityLine, UsageLineInput, UsageType,
    };

    const CONTRACTOR: &str = "CTR-001";

    async fn issue(db: &crate::Database, store: &str, item: &str, month: &str, qty: i64) {
        db.contractor()
            .create_issue(NewMaterialIssue {
                contractor_id: CONTRACTOR.to_string(),
                store_id: store.to_string(),
                month: month.to_string(),
                issued_by: "k.perera".to_string(),
                lines: vec![UnitQuantityLine {
                    item_id: item.to_string(),
                    quantity: qty,
                    unit: "pcs".to_string(),
                }],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_month_opens_at_zero() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &store, &item, 100).await;

        // Scenario: 10 issued, no prior sheet.
        issue(&db, &store, &item, "2026-08", 10).await;

        let (sheet, lines) = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();

        assert_eq!(sheet.status, SheetStatus::Draft);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].opening, 0);
        assert_eq!(lines[0].received, 10);
        assert_eq!(lines[0].closing, 10);
        assert_eq!(lines[0].item_code, "DROP-24F");
    }

    #[tokio::test]
    async fn test_full_reconciliation_arithmetic() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &store, &item, 100).await;

        issue(&db, &store, &item, "2026-08", 20).await;

        // 4 GOOD + 2 DAMAGED returned; only the 4 count as returned.
        db.contractor()
            .create_return(
                NewMaterialReturn {
                    contractor_id: CONTRACTOR.to_string(),
                    store_id: store.clone(),
                    month: "2026-08".to_string(),
                    lines: vec![
                        ReturnLineInput {
                            item_id: item.clone(),
                            quantity: 4,
                            unit: "pcs".to_string(),
                            condition: ReturnCondition::Good,
                        },
                        ReturnLineInput {
                            item_id: item.clone(),
                            quantity: 2,
                            unit: "pcs".to_string(),
                            condition: ReturnCondition::Damaged,
                        },
                    ],
                },
                ReturnWorkflowMode::AutoAccept,
            )
            .await
            .unwrap();

        // Service order: 12 used + 1 wasted, inside the month window.
        db.contractor()
            .record_usage(NewServiceOrderUsage {
                contractor_id: CONTRACTOR.to_string(),
                store_id: store.clone(),
                service_order_id: "SO-9001".to_string(),
                used_at: Utc.with_ymd_and_hms(2026, 8, 14, 10, 0, 0).unwrap(),
                lines: vec![
                    UsageLineInput {
                        item_id: item.clone(),
                        quantity: 12,
                        usage_type: UsageType::Used,
                    },
                    UsageLineInput {
                        item_id: item.clone(),
                        quantity: 1,
                        usage_type: UsageType::Wastage,
                    },
                ],
            })
            .await
            .unwrap();

        // Direct contractor wastage record: 2 more into wastage.
        db.contractor()
            .record_wastage(NewWastage {
                contractor_id: Some(CONTRACTOR.to_string()),
                store_id: store.clone(),
                month: "2026-08".to_string(),
                description: None,
                lines: vec![UnitQuantityLine {
                    item_id: item.clone(),
                    quantity: 2,
                    unit: "pcs".to_string(),
                }],
            })
            .await
            .unwrap();

        let (_, lines) = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();

        assert_eq!(lines.len(), 1);
        let row = &lines[0];
        assert_eq!(row.opening, 0);
        assert_eq!(row.received, 20);
        assert_eq!(row.returned, 4);
        assert_eq!(row.used, 12);
        assert_eq!(row.wastage, 3);
        assert_eq!(row.closing, 1);
        assert_eq!(
            row.closing,
            row.opening + row.received - row.returned - row.used - row.wastage
        );
    }

    #[tokio::test]
    async fn test_chain_continuity_across_months() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &store, &item, 100).await;

        issue(&db, &store, &item, "2026-07", 15).await;
        db.balance_sheets()
            .freeze(CONTRACTOR, &store, "2026-07", "reporter")
            .await
            .unwrap();

        // No August activity: the carried-forward opening still emits.
        let (_, august) = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();

        let (_, july) = db
            .balance_sheets()
            .get(CONTRACTOR, &store, "2026-07")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(august.len(), 1);
        assert_eq!(august[0].opening, july[0].closing);
        assert_eq!(august[0].received, 0);
        assert_eq!(august[0].closing, july[0].closing);
    }

    #[tokio::test]
    async fn test_regeneration_is_idempotent() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &store, &item, 100).await;
        issue(&db, &store, &item, "2026-08", 10).await;

        let (first_sheet, first) = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();
        let (second_sheet, second) = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();

        // The draft row-set was replaced, not accumulated.
        assert_ne!(first_sheet.id, second_sheet.id);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.item_id, b.item_id);
            assert_eq!(
                (a.opening, a.received, a.returned, a.used, a.wastage, a.closing),
                (b.opening, b.received, b.returned, b.used, b.wastage, b.closing)
            );
        }

        let stored = db
            .balance_sheets()
            .get(CONTRACTOR, &store, "2026-08")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.1.len(), 1);
    }

    #[tokio::test]
    async fn test_chained_from_month_cannot_regenerate() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &store, &item, 100).await;

        issue(&db, &store, &item, "2026-07", 15).await;
        db.balance_sheets()
            .freeze(CONTRACTOR, &store, "2026-07", "reporter")
            .await
            .unwrap();
        db.balance_sheets()
            .freeze(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();

        // July is final: regenerating it is invalid on its own, and it
        // is also the month August's final sheet chains from.
        let err = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-07", "reporter")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidState { .. })
        ));

        // A frozen month cannot be frozen again either.
        let err = db
            .balance_sheets()
            .freeze(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_draft_behind_final_next_month_cannot_regenerate() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &store, &item, 100).await;

        issue(&db, &store, &item, "2026-07", 15).await;
        db.balance_sheets()
            .generate(CONTRACTOR, &store, "2026-07", "reporter")
            .await
            .unwrap();
        db.balance_sheets()
            .freeze(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();

        // July is still a draft, but August's FINAL sheet chained off
        // its closing balances; rewriting history is rejected.
        let err = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-07", "reporter")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_usage_outside_window_excluded() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;
        let item = seed_item(&db, "DROP-24F", 10).await;
        grn_intake(&db, &store, &item, 100).await;
        issue(&db, &store, &item, "2026-08", 10).await;

        // September usage must not appear on the August sheet.
        db.contractor()
            .record_usage(NewServiceOrderUsage {
                contractor_id: CONTRACTOR.to_string(),
                store_id: store.clone(),
                service_order_id: "SO-9002".to_string(),
                used_at: Utc.with_ymd_and_hms(2026, 9, 1, 8, 0, 0).unwrap(),
                lines: vec![UsageLineInput {
                    item_id: item.clone(),
                    quantity: 6,
                    usage_type: UsageType::Used,
                }],
            })
            .await
            .unwrap();

        let (_, lines) = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "2026-08", "reporter")
            .await
            .unwrap();
        assert_eq!(lines[0].used, 0);
        assert_eq!(lines[0].closing, 10);
    }

    #[tokio::test]
    async fn test_missing_parameters_rejected() {
        let db = test_db().await;
        let store = seed_store(&db, "Main Store", "main").await;

        let err = db
            .balance_sheets()
            .generate("", &store, "2026-08", "reporter")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MissingParameters { .. })
        ));

        let err = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "", "reporter")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MissingParameters { .. })
        ));

        let err = db
            .balance_sheets()
            .generate(CONTRACTOR, &store, "08-2026", "reporter")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
