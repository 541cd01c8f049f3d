//! # fieldstock-db: Database Layer for the Fieldstock Ledger
//!
//! This crate provides persistence for the fieldstock inventory
//! subsystem. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Fieldstock Data Flow                               │
//! │                                                                         │
//! │  ERP document call (create GRN, approve transfer, issue material)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   fieldstock-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  + movement   │    │  (embedded)  │  │   │
//! │  │   │               │    │    gateway    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ GrnRepo       │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │ TransferRepo  │    │ 002_idx.sql  │  │   │
//! │  │   │               │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations and the movement gateway
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fieldstock_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/fieldstock.db")).await?;
//!
//! let grn = db.grns().create(new_grn).await?;
//! let sheet = db.balance_sheets().generate(&ctr, &store, "2026-08", &user).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::balance_sheet::BalanceSheetRepository;
pub use repository::contractor::ContractorRepository;
pub use repository::grn::GrnRepository;
pub use repository::item::ItemRepository;
pub use repository::ledger::{LowStockRow, StockRepository};
pub use repository::store::StoreRepository;
pub use repository::transfer::TransferRepository;
