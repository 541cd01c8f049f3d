//! # fieldstock-core: Pure Business Logic for the Fieldstock Ledger
//!
//! This crate is the **heart** of the fieldstock inventory subsystem. It
//! contains the ledger and reconciliation rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Fieldstock Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ERP Collaborators (out of scope)                │   │
//! │  │   GRN intake · transfer approval · contractor endpoints ·       │   │
//! │  │   service-order completion events · low-stock alerting          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ fieldstock-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  ledger   │  │  balance  │  │   month   │  │   │
//! │  │   │  Item     │  │ LedgerKey │  │ reconcile │  │  windows  │  │   │
//! │  │   │  Grn ...  │  │ deltas    │  │  rows     │  │  chains   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                fieldstock-db (Database Layer)                   │   │
//! │  │       SQLite queries, migrations, movement gateway              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Store, Grn, StockRequest, ...)
//! - [`ledger`] - Ledger key abstraction and delta arithmetic
//! - [`balance`] - Balance-sheet row assembly
//! - [`month`] - `YYYY-MM` month keys, windows, and chaining
//! - [`error`] - Domain error types
//! - [`validation`] - Document input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Quantities**: All quantities are whole units (i64), direction
//!    comes from the movement type
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod balance;
pub mod error;
pub mod ledger;
pub mod month;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use fieldstock_core::LedgerKey` instead of
// `use fieldstock_core::ledger::LedgerKey`

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::LedgerKey;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single document.
///
/// A GRN, transfer, issue, return, or wastage record beyond this size is
/// almost certainly malformed caller input.
pub const MAX_DOCUMENT_LINES: usize = 200;

/// Maximum quantity on a single document line.
///
/// Catches fat-finger entries (e.g., 1000000 instead of 100) before they
/// reach the ledger.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;
