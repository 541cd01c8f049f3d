//! # Repository Module
//!
//! Database repository implementations for the fieldstock ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Caller (ERP endpoint / event handler)                                 │
//! │       │                                                                 │
//! │       │  db.grns().create(new_grn)                                     │
//! │       ▼                                                                 │
//! │  Document repositories                 Ledger                          │
//! │  ├── GrnRepository          ──┐                                        │
//! │  ├── TransferRepository     ──┼──►  MovementProcessor (crate-private)  │
//! │  ├── ContractorRepository   ──┘        │ sole writer of                │
//! │  └── BalanceSheetRepository (reads)    │ stock_entries +               │
//! │                                        ▼ stock_transactions            │
//! │  Catalog: ItemRepository, StoreRepository                              │
//! │  Reads:   StockRepository (quantities, history, low stock)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;

pub mod balance_sheet;
pub mod contractor;
pub mod grn;
pub mod item;
pub mod ledger;
pub mod store;
pub mod transfer;

/// Generates a document number in format: {PREFIX}-YYYYMMDD-NNNN
///
/// ## Example
/// `GRN-20260805-0431`, `TRF-20260805-0007`
pub(crate) fn document_number(prefix: &str) -> String {
    let now = Utc::now();
    let date_part = now.format("%Y%m%d");

    // For now, use timestamp milliseconds as sequence
    // TODO: In production, this should be a proper daily counter
    let seq = (now.timestamp_millis() % 10000) as u32;

    format!("{}-{}-{:04}", prefix, date_part, seq)
}
