//! # Contractor Material Account Repository
//!
//! Issue, return, and wastage bookkeeping for material handed to field
//! contractors, plus the service-order usage feed the monthly
//! reconciliation reads.
//!
//! ## Stock Effects
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  operation                       store ledger effect                    │
//! │  ─────────────────────────────   ─────────────────────────────────────  │
//! │  issue to contractor             ISSUE_OUT per line (may fail on       │
//! │                                  insufficiency, aborts the issue)      │
//! │  return accepted                 RETURN_IN for GOOD lines only;        │
//! │                                  DAMAGED lines never re-enter stock    │
//! │  contractor wastage              none (account-level record)           │
//! │  store wastage                   WASTAGE_OUT per line                  │
//! │  service-order usage             none (reconciliation input)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::ledger::{MovementLine, MovementProcessor};
use fieldstock_core::month::validate_month;
use fieldstock_core::validation::{validate_line_count, validate_quantity, validate_required};
use fieldstock_core::{
    CoreError, MaterialIssue, MaterialIssueLine, MaterialReturn, MaterialReturnLine,
    MaterialUsage, MovementType, NewMaterialIssue, NewMaterialReturn, NewServiceOrderUsage,
    NewWastage, ReturnCondition, ReturnStatus, ReturnWorkflowMode, Wastage, WastageLine,
};

/// Repository for contractor material account operations.
#[derive(Debug, Clone)]
pub struct ContractorRepository {
    pool: SqlitePool,
}

impl ContractorRepository {
    /// Creates a new ContractorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ContractorRepository { pool }
    }

    // =========================================================================
    // Issues
    // =========================================================================

    /// Issues material from a store to a contractor.
    ///
    /// Deducts store stock immediately via ISSUE_OUT movements, in the
    /// same transaction as the issue document. Overdrawing any line
    /// aborts the whole issue.
    pub async fn create_issue(&self, input: NewMaterialIssue) -> DbResult<MaterialIssue> {
        validate_required("contractor_id", &input.contractor_id)?;
        validate_required("store_id", &input.store_id)?;
        validate_required("issued_by", &input.issued_by)?;
        validate_month(&input.month)?;
        validate_line_count(input.lines.len())?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
        }

        let issue = MaterialIssue {
            id: Uuid::new_v4().to_string(),
            contractor_id: input.contractor_id,
            store_id: input.store_id,
            month: input.month,
            issued_by: input.issued_by,
            issue_date: Utc::now(),
        };

        debug!(
            contractor_id = %issue.contractor_id,
            store_id = %issue.store_id,
            month = %issue.month,
            "Issuing material to contractor"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO material_issues (
                id, contractor_id, store_id, month, issued_by, issue_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&issue.id)
        .bind(&issue.contractor_id)
        .bind(&issue.store_id)
        .bind(&issue.month)
        .bind(&issue.issued_by)
        .bind(issue.issue_date)
        .execute(&mut *tx)
        .await?;

        let mut movement_lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            sqlx::query(
                r#"
                INSERT INTO material_issue_lines (id, issue_id, item_id, quantity, unit)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&issue.id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .bind(&line.unit)
            .execute(&mut *tx)
            .await?;

            movement_lines.push(MovementLine::new(&line.item_id, -line.quantity));
        }

        MovementProcessor::apply(
            &mut tx,
            &issue.store_id,
            MovementType::IssueOut,
            &issue.id,
            None,
            &movement_lines,
        )
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(issue)
    }

    /// Gets an issue by ID.
    pub async fn get_issue(&self, id: &str) -> DbResult<Option<MaterialIssue>> {
        let issue = sqlx::query_as::<_, MaterialIssue>(
            r#"
            SELECT id, contractor_id, store_id, month, issued_by, issue_date
            FROM material_issues
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(issue)
    }

    /// Gets all lines for an issue.
    pub async fn get_issue_lines(&self, issue_id: &str) -> DbResult<Vec<MaterialIssueLine>> {
        let lines = sqlx::query_as::<_, MaterialIssueLine>(
            r#"
            SELECT id, issue_id, item_id, quantity, unit
            FROM material_issue_lines
            WHERE issue_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // =========================================================================
    // Returns
    // =========================================================================

    /// Creates a material return.
    ///
    /// In `AutoAccept` mode the return is accepted immediately and GOOD
    /// lines re-enter store stock in the same transaction. In `Review`
    /// mode the return is created PENDING with no stock effect until
    /// [`accept_return`](Self::accept_return).
    pub async fn create_return(
        &self,
        input: NewMaterialReturn,
        mode: ReturnWorkflowMode,
    ) -> DbResult<MaterialReturn> {
        validate_required("contractor_id", &input.contractor_id)?;
        validate_required("store_id", &input.store_id)?;
        validate_month(&input.month)?;
        validate_line_count(input.lines.len())?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
        }

        let now = Utc::now();
        let (status, accepted_at) = match mode {
            ReturnWorkflowMode::AutoAccept => (ReturnStatus::Accepted, Some(now)),
            ReturnWorkflowMode::Review => (ReturnStatus::Pending, None),
        };

        let ret = MaterialReturn {
            id: Uuid::new_v4().to_string(),
            contractor_id: input.contractor_id,
            store_id: input.store_id,
            month: input.month,
            status,
            accepted_by: None,
            accepted_at,
            created_at: now,
        };

        debug!(
            contractor_id = %ret.contractor_id,
            store_id = %ret.store_id,
            ?mode,
            "Creating material return"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO material_returns (
                id, contractor_id, store_id, month, status,
                accepted_by, accepted_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&ret.id)
        .bind(&ret.contractor_id)
        .bind(&ret.store_id)
        .bind(&ret.month)
        .bind(ret.status)
        .bind(&ret.accepted_by)
        .bind(ret.accepted_at)
        .bind(ret.created_at)
        .execute(&mut *tx)
        .await?;

        let mut good_lines = Vec::new();
        for line in &input.lines {
            sqlx::query(
                r#"
                INSERT INTO material_return_lines (
                    id, return_id, item_id, quantity, unit, condition
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&ret.id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .bind(&line.unit)
            .bind(line.condition)
            .execute(&mut *tx)
            .await?;

            if line.condition == ReturnCondition::Good {
                good_lines.push(MovementLine::new(&line.item_id, line.quantity));
            }
        }

        if status == ReturnStatus::Accepted && !good_lines.is_empty() {
            MovementProcessor::apply(
                &mut tx,
                &ret.store_id,
                MovementType::ReturnIn,
                &ret.id,
                None,
                &good_lines,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(ret)
    }

    /// Accepts a PENDING return; GOOD lines re-enter store stock.
    pub async fn accept_return(&self, return_id: &str, accepted_by: &str) -> DbResult<()> {
        validate_required("accepted_by", accepted_by)?;

        let mut tx = self.pool.begin().await?;

        let ret = Self::fetch_return(&mut tx, return_id).await?;
        if ret.status != ReturnStatus::Pending {
            return Err(CoreError::invalid_state(
                "MaterialReturn",
                return_id,
                ret.status.as_str(),
                "accept",
            )
            .into());
        }

        let lines = sqlx::query_as::<_, MaterialReturnLine>(
            r#"
            SELECT id, return_id, item_id, quantity, unit, condition
            FROM material_return_lines
            WHERE return_id = ?1
            "#,
        )
        .bind(return_id)
        .fetch_all(&mut *tx)
        .await?;

        let good_lines: Vec<MovementLine> = lines
            .iter()
            .filter(|l| l.condition == ReturnCondition::Good)
            .map(|l| MovementLine::new(&l.item_id, l.quantity))
            .collect();

        if !good_lines.is_empty() {
            MovementProcessor::apply(
                &mut tx,
                &ret.store_id,
                MovementType::ReturnIn,
                return_id,
                None,
                &good_lines,
            )
            .await?;
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE material_returns
            SET status = 'accepted', accepted_by = ?2, accepted_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(return_id)
        .bind(accepted_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(return_id = %return_id, "Material return accepted");
        Ok(())
    }

    /// Rejects a PENDING return. Terminal; no stock effect.
    pub async fn reject_return(&self, return_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let ret = Self::fetch_return(&mut tx, return_id).await?;
        if ret.status != ReturnStatus::Pending {
            return Err(CoreError::invalid_state(
                "MaterialReturn",
                return_id,
                ret.status.as_str(),
                "reject",
            )
            .into());
        }

        sqlx::query("UPDATE material_returns SET status = 'rejected' WHERE id = ?1")
            .bind(return_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets a return by ID.
    pub async fn get_return(&self, id: &str) -> DbResult<Option<MaterialReturn>> {
        let ret = sqlx::query_as::<_, MaterialReturn>(
            r#"
            SELECT id, contractor_id, store_id, month, status,
                   accepted_by, accepted_at, created_at
            FROM material_returns
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ret)
    }

    /// Gets all lines for a return.
    pub async fn get_return_lines(&self, return_id: &str) -> DbResult<Vec<MaterialReturnLine>> {
        let lines = sqlx::query_as::<_, MaterialReturnLine>(
            r#"
            SELECT id, return_id, item_id, quantity, unit, condition
            FROM material_return_lines
            WHERE return_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(return_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // =========================================================================
    // Wastage
    // =========================================================================

    /// Records wastage.
    ///
    /// With a contractor this is an account-level record consumed by
    /// reconciliation only. Without one it is a store write-off and
    /// every line applies WASTAGE_OUT.
    pub async fn record_wastage(&self, input: NewWastage) -> DbResult<Wastage> {
        validate_required("store_id", &input.store_id)?;
        validate_month(&input.month)?;
        validate_line_count(input.lines.len())?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
        }

        let wastage = Wastage {
            id: Uuid::new_v4().to_string(),
            contractor_id: input.contractor_id,
            store_id: input.store_id,
            month: input.month,
            description: input.description,
            created_at: Utc::now(),
        };

        debug!(
            store_id = %wastage.store_id,
            contractor = wastage.contractor_id.is_some(),
            "Recording wastage"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO wastages (
                id, contractor_id, store_id, month, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&wastage.id)
        .bind(&wastage.contractor_id)
        .bind(&wastage.store_id)
        .bind(&wastage.month)
        .bind(&wastage.description)
        .bind(wastage.created_at)
        .execute(&mut *tx)
        .await?;

        let mut movement_lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            sqlx::query(
                r#"
                INSERT INTO wastage_lines (id, wastage_id, item_id, quantity, unit)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&wastage.id)
            .bind(&line.item_id)
            .bind(line.quantity)
            .bind(&line.unit)
            .execute(&mut *tx)
            .await?;

            movement_lines.push(MovementLine::new(&line.item_id, -line.quantity));
        }

        // Contractor wastage never touches the store ledger.
        if wastage.contractor_id.is_none() {
            MovementProcessor::apply(
                &mut tx,
                &wastage.store_id,
                MovementType::WastageOut,
                &wastage.id,
                None,
                &movement_lines,
            )
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(wastage)
    }

    /// Gets all lines for a wastage record.
    pub async fn get_wastage_lines(&self, wastage_id: &str) -> DbResult<Vec<WastageLine>> {
        let lines = sqlx::query_as::<_, WastageLine>(
            r#"
            SELECT id, wastage_id, item_id, quantity, unit
            FROM wastage_lines
            WHERE wastage_id = ?1
            ORDER BY item_id
            "#,
        )
        .bind(wastage_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // =========================================================================
    // Service-Order Usage
    // =========================================================================

    /// Records material usage from a service-order completion event.
    ///
    /// Reconciliation input only; no stock effect.
    pub async fn record_usage(&self, input: NewServiceOrderUsage) -> DbResult<Vec<MaterialUsage>> {
        validate_required("contractor_id", &input.contractor_id)?;
        validate_required("store_id", &input.store_id)?;
        validate_required("service_order_id", &input.service_order_id)?;
        validate_line_count(input.lines.len())?;
        for line in &input.lines {
            validate_quantity(line.quantity)?;
        }

        let mut tx = self.pool.begin().await?;
        let mut rows = Vec::with_capacity(input.lines.len());

        for line in &input.lines {
            let usage = MaterialUsage {
                id: Uuid::new_v4().to_string(),
                contractor_id: input.contractor_id.clone(),
                store_id: input.store_id.clone(),
                service_order_id: input.service_order_id.clone(),
                item_id: line.item_id.clone(),
                quantity: line.quantity,
                usage_type: line.usage_type,
                used_at: input.used_at,
            };

            sqlx::query(
                r#"
                INSERT INTO material_usages (
                    id, contractor_id, store_id, service_order_id,
                    item_id, quantity, usage_type, used_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&usage.id)
            .bind(&usage.contractor_id)
            .bind(&usage.store_id)
            .bind(&usage.service_order_id)
            .bind(&usage.item_id)
            .bind(usage.quantity)
            .bind(usage.usage_type)
            .bind(usage.used_at)
            .execute(&mut *tx)
            .await?;

            rows.push(usage);
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(rows)
    }

    async fn fetch_return(
        tx: &mut SqliteConnection,
        return_id: &str,
    ) -> DbResult<MaterialReturn> {
        sqlx::query_as::<_, MaterialReturn>(
            r#"
            SELECT id, contractor_id, store_id, month, status,
                   accepted_by, accepted_at, created_at
            FROM material_returns
            WHERE id = ?1
            "#,
        )
        .bind(return_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("MaterialReturn", return_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
