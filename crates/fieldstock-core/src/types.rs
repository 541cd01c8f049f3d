//! # Domain Types
//!
//! Core domain types for the fieldstock ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Item        │   │     Store       │   │   StockEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  (store, item)  │       │
//! │  │  code (business)│   │  store_type     │   │  quantity ≥ 0   │       │
//! │  │  min_level      │   │  areas          │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Documents: Grn, StockRequest, MaterialIssue, MaterialReturn,          │
//! │             Wastage, MaterialUsage, BalanceSheet                        │
//! │                                                                         │
//! │  Every document creation flows through the movement gateway which      │
//! │  appends TransactionRecord rows - the append-only audit trail.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (item code, grn_number, request_number)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Item
// =============================================================================

/// A material item tracked by the ledger (cable drum, splitter, ONT, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code - unique, human-entered (e.g., "DROP-24F").
    pub code: String,

    /// Display name.
    pub name: String,

    /// Unit of measure ("m", "pcs", "roll").
    pub unit: String,

    /// Optional category grouping.
    pub category: Option<String>,

    /// Global reorder threshold. Stock at or below this level is
    /// surfaced by the low-stock query.
    pub min_level: i64,

    /// Whether the item is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Store
// =============================================================================

/// Store classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Regional main warehouse.
    Main,
    /// Sub-store feeding field teams.
    Sub,
}

/// A warehouse holding stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// MAIN or SUB.
    pub store_type: StoreType,

    /// Optional manager user reference.
    pub manager: Option<String>,

    /// Administrative areas this store serves. Persisted as a JSON
    /// array column; not interpreted by the ledger core.
    pub areas: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Entry
// =============================================================================

/// Current balance for one (store, item) pair.
///
/// Invariant: `quantity >= 0` at every committed state. Created on first
/// movement, updated thereafter, never deleted. Only the movement gateway
/// writes these rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockEntry {
    pub id: String,
    pub store_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Movement Type
// =============================================================================

/// The kind of stock movement a transaction line records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods received into a store (GRN intake).
    GrnIn,
    /// Stock leaving the supplying store of a transfer.
    TransferOut,
    /// Stock arriving at the requesting store of a transfer.
    TransferIn,
    /// Stock issued to a contractor's material account.
    IssueOut,
    /// Good-condition contractor return re-entering stock.
    ReturnIn,
    /// Store-level wastage write-off.
    WastageOut,
    /// Manual correction.
    Adjustment,
}

impl MovementType {
    /// True for movement kinds whose deltas are always non-negative.
    pub const fn is_inbound(&self) -> bool {
        matches!(
            self,
            MovementType::GrnIn | MovementType::TransferIn | MovementType::ReturnIn
        )
    }
}

// =============================================================================
// Transaction Record
// =============================================================================

/// Append-only header for one committed movement document at one store.
///
/// Never mutated or deleted. Replaying all line deltas for a
/// (store, item) pair reproduces the current `StockEntry.quantity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionRecord {
    pub id: String,
    pub movement_type: MovementType,
    pub store_id: String,
    /// The originating document (GRN, request, return, wastage, ...).
    pub reference_id: String,
    /// Free-text context; set for manual adjustments.
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One item line of a transaction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionLine {
    pub id: String,
    pub transaction_id: String,
    pub item_id: String,
    /// Signed quantity change.
    pub delta: i64,
    /// Balance before this line applied.
    pub quantity_before: i64,
    /// Balance after this line applied.
    pub quantity_after: i64,
}

// =============================================================================
// GRN (Goods Received Note)
// =============================================================================

/// Goods entering a store from an external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Grn {
    pub id: String,
    /// Human-readable number, e.g. `GRN-20260805-0042`.
    pub grn_number: String,
    pub store_id: String,
    /// Source descriptor ("supplier", "project", ...).
    pub source_type: String,
    pub supplier: Option<String>,
    pub received_by: String,
    pub received_at: DateTime<Utc>,
}

/// One item line of a GRN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct GrnLine {
    pub id: String,
    pub grn_id: String,
    pub item_id: String,
    pub quantity: i64,
}

// =============================================================================
// Stock Request (inter-store transfer)
// =============================================================================

/// Stock request lifecycle.
///
/// `Pending → Completed` via approval, `Pending → Rejected` terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Completed,
    Rejected,
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

impl RequestStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Completed => "completed",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// An inter-store transfer request.
///
/// `from_store_id` is the requesting store, `to_store_id` the supplying
/// store. Approval moves stock `to_store → from_store`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockRequest {
    pub id: String,
    /// Human-readable number, e.g. `TRF-20260805-0007`.
    pub request_number: String,
    pub from_store_id: String,
    pub to_store_id: String,
    pub requested_by: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One item line of a stock request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockRequestLine {
    pub id: String,
    pub request_id: String,
    pub item_id: String,
    pub requested_qty: i64,
    /// Set on approval; stays NULL on pending/rejected requests.
    pub approved_qty: Option<i64>,
}

/// Approved quantity for one request line, supplied at approval time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub item_id: String,
    pub approved_qty: i64,
}

// =============================================================================
// Contractor Material Account
// =============================================================================

/// Material issued from a store to a field contractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaterialIssue {
    pub id: String,
    pub contractor_id: String,
    pub store_id: String,
    /// Account month key, `YYYY-MM`.
    pub month: String,
    pub issued_by: String,
    pub issue_date: DateTime<Utc>,
}

/// One item line of a material issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaterialIssueLine {
    pub id: String,
    pub issue_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit: String,
}

/// Material return lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReturnStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Accepted => "accepted",
            ReturnStatus::Rejected => "rejected",
        }
    }
}

/// Condition of returned material.
///
/// Only GOOD lines re-enter usable stock; DAMAGED lines are recorded
/// for the account but never produce a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ReturnCondition {
    Good,
    Damaged,
}

/// How returns enter the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnWorkflowMode {
    /// Returns are accepted immediately on creation.
    AutoAccept,
    /// Returns are created PENDING and await store review.
    Review,
}

/// Material returned by a contractor to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaterialReturn {
    pub id: String,
    pub contractor_id: String,
    pub store_id: String,
    /// Account month key, `YYYY-MM`.
    pub month: String,
    pub status: ReturnStatus,
    pub accepted_by: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One item line of a material return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaterialReturnLine {
    pub id: String,
    pub return_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit: String,
    pub condition: ReturnCondition,
}

/// Wastage record.
///
/// With a `contractor_id` this is an account-level record only; without
/// one it is a store write-off backed by WASTAGE_OUT movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Wastage {
    pub id: String,
    pub contractor_id: Option<String>,
    pub store_id: String,
    /// Account month key, `YYYY-MM`.
    pub month: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One item line of a wastage record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WastageLine {
    pub id: String,
    pub wastage_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub unit: String,
}

// =============================================================================
// Service-Order Material Usage
// =============================================================================

/// How a service order consumed material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum UsageType {
    Used,
    Wastage,
}

/// Material usage reported by a completed service order.
///
/// Read-only input to balance-sheet generation; never a store movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MaterialUsage {
    pub id: String,
    pub contractor_id: String,
    pub store_id: String,
    pub service_order_id: String,
    pub item_id: String,
    pub quantity: i64,
    pub usage_type: UsageType,
    pub used_at: DateTime<Utc>,
}

// =============================================================================
// Balance Sheet
// =============================================================================

/// Balance sheet lifecycle.
///
/// DRAFT rows are replaced on regeneration; FINAL rows are the record
/// the next month chains its opening balances from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Draft,
    Final,
}

impl SheetStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SheetStatus::Draft => "draft",
            SheetStatus::Final => "final",
        }
    }
}

/// Monthly reconciliation snapshot header, unique per
/// (contractor, store, month).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BalanceSheet {
    pub id: String,
    pub contractor_id: String,
    pub store_id: String,
    /// Month key, `YYYY-MM`.
    pub month: String,
    pub status: SheetStatus,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}

/// One reconciliation row.
///
/// Item code/name/unit are snapshotted at generation time so the report
/// stays stable if the catalog changes later.
///
/// Invariant: `closing == opening + received - returned - used - wastage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BalanceSheetLine {
    pub id: String,
    pub sheet_id: String,
    pub item_id: String,
    pub item_code: String,
    pub item_name: String,
    pub unit: String,
    pub opening: i64,
    pub received: i64,
    pub returned: i64,
    pub used: i64,
    pub wastage: i64,
    pub closing: i64,
}

// =============================================================================
// Document Input Types
// =============================================================================

/// A bare (item, quantity) input line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityLine {
    pub item_id: String,
    pub quantity: i64,
}

/// An input line carrying the unit of measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitQuantityLine {
    pub item_id: String,
    pub quantity: i64,
    pub unit: String,
}

/// Input for GRN creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrn {
    pub store_id: String,
    pub source_type: String,
    pub supplier: Option<String>,
    pub received_by: String,
    pub lines: Vec<QuantityLine>,
}

/// Input for stock request creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockRequest {
    /// Requesting store (receives stock on approval).
    pub from_store_id: String,
    /// Supplying store (gives up stock on approval).
    pub to_store_id: String,
    pub requested_by: String,
    pub lines: Vec<QuantityLine>,
}

/// Input for material issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMaterialIssue {
    pub contractor_id: String,
    pub store_id: String,
    pub month: String,
    pub issued_by: String,
    pub lines: Vec<UnitQuantityLine>,
}

/// One input line of a material return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnLineInput {
    pub item_id: String,
    pub quantity: i64,
    pub unit: String,
    pub condition: ReturnCondition,
}

/// Input for material return creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMaterialReturn {
    pub contractor_id: String,
    pub store_id: String,
    pub month: String,
    pub lines: Vec<ReturnLineInput>,
}

/// Input for wastage recording. `contractor_id: None` marks store
/// wastage, which is a ledger movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWastage {
    pub contractor_id: Option<String>,
    pub store_id: String,
    pub month: String,
    pub description: Option<String>,
    pub lines: Vec<UnitQuantityLine>,
}

/// One usage line from a service-order completion event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLineInput {
    pub item_id: String,
    pub quantity: i64,
    pub usage_type: UsageType,
}

/// Input for a service-order completion event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceOrderUsage {
    pub contractor_id: String,
    pub store_id: String,
    pub service_order_id: String,
    pub used_at: DateTime<Utc>,
    pub lines: Vec<UsageLineInput>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_default() {
        assert_eq!(RequestStatus::default(), RequestStatus::Pending);
    }

    #[test]
    fn test_movement_type_direction() {
        assert!(MovementType::GrnIn.is_inbound());
        assert!(MovementType::TransferIn.is_inbound());
        assert!(MovementType::ReturnIn.is_inbound());
        assert!(!MovementType::TransferOut.is_inbound());
        assert!(!MovementType::IssueOut.is_inbound());
        assert!(!MovementType::WastageOut.is_inbound());
        assert!(!MovementType::Adjustment.is_inbound());
    }

    #[test]
    fn test_movement_type_serde() {
        let json = serde_json::to_string(&MovementType::TransferOut).unwrap();
        assert_eq!(json, "\"transfer_out\"");
        let back: MovementType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MovementType::TransferOut);
    }

    #[test]
    fn test_return_condition_serde() {
        let json = serde_json::to_string(&ReturnCondition::Damaged).unwrap();
        assert_eq!(json, "\"damaged\"");
    }
}
