//! # Ledger Arithmetic
//!
//! Pure balance math for the stock ledger. The non-negativity invariant
//! is enforced here, in one place, rather than scattered across the
//! document operations that trigger movements.
//!
//! ## The Gateway Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Movement Application                                 │
//! │                                                                         │
//! │  Document operation (GRN / transfer approval / issue / ...)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  MovementProcessor (fieldstock-db)                                     │
//! │       │   reads current quantity for (store, item)                     │
//! │       ▼                                                                 │
//! │  apply_delta(current, delta)  ← THIS MODULE                            │
//! │       │                                                                 │
//! │       ├── Ok(new)                → write back + append log line        │
//! │       └── Err(InsufficientStock) → abort the WHOLE document            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Identity of one ledger balance: a (store, item) pair.
///
/// Every read-modify-write of a balance is scoped to exactly one key;
/// a transfer touches two keys, nothing touches more.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub store_id: String,
    pub item_id: String,
}

impl LedgerKey {
    pub fn new(store_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        LedgerKey {
            store_id: store_id.into(),
            item_id: item_id.into(),
        }
    }
}

/// Applies a signed delta to a current balance.
///
/// Returns the new balance, or `InsufficientStock` when the delta would
/// drive the balance negative. The caller must not have written anything
/// for the enclosing document before this check passes.
pub fn apply_delta(key: &LedgerKey, current: i64, delta: i64) -> CoreResult<i64> {
    let new = current + delta;
    if new < 0 {
        return Err(CoreError::InsufficientStock {
            store_id: key.store_id.clone(),
            item_id: key.item_id.clone(),
            available: current,
            requested: -delta,
        });
    }
    Ok(new)
}

/// Replays a sequence of committed deltas from zero.
///
/// `quantity(store, item)` must equal the replay of all committed
/// transaction-line deltas for that pair since the store's first
/// movement. Used by audit checks and tests.
pub fn replay(deltas: &[i64]) -> i64 {
    deltas.iter().sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> LedgerKey {
        LedgerKey::new("S1", "DROP-24F")
    }

    #[test]
    fn test_apply_positive_delta() {
        assert_eq!(apply_delta(&key(), 0, 100).unwrap(), 100);
        assert_eq!(apply_delta(&key(), 70, 30).unwrap(), 100);
    }

    #[test]
    fn test_apply_negative_delta_within_stock() {
        assert_eq!(apply_delta(&key(), 100, -30).unwrap(), 70);
        // Draining to exactly zero is allowed.
        assert_eq!(apply_delta(&key(), 30, -30).unwrap(), 0);
    }

    #[test]
    fn test_apply_negative_delta_overdraw() {
        let err = apply_delta(&key(), 20, -30).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                store_id,
                item_id,
                available,
                requested,
            } => {
                assert_eq!(store_id, "S1");
                assert_eq!(item_id, "DROP-24F");
                assert_eq!(available, 20);
                assert_eq!(requested, 30);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_replay_matches_final_balance() {
        let deltas = [100, -30, 25, -95];
        let mut balance = 0;
        for d in deltas {
            balance = apply_delta(&key(), balance, d).unwrap();
        }
        assert_eq!(balance, replay(&deltas));
        assert_eq!(balance, 0);
    }
}
