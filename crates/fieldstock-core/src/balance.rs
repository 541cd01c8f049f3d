//! # Balance-Sheet Arithmetic
//!
//! Pure reconciliation math for the monthly contractor balance sheet.
//! The db layer aggregates the monthly sums; this module assembles the
//! rows and proves the arithmetic invariant:
//!
//! ```text
//!   closing = opening + received - returned - used - wastage
//! ```
//!
//! ## Row Assembly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  One (contractor, store, month)                         │
//! │                                                                         │
//! │  opening[item]   ← prior month's closing (0 if no prior sheet)         │
//! │  received[item]  ← issue documents dated in the month                  │
//! │  returned[item]  ← GOOD lines of ACCEPTED returns in the month         │
//! │  used[item]      ← USED service-order lines in the month               │
//! │  wastage[item]   ← WASTAGE service-order lines + wastage documents     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  union of item ids → one row per item → drop all-zero rows             │
//! │  (a nonzero carried-forward opening is never dropped)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashMap};

/// Monthly aggregates for one (contractor, store, month), keyed by item id.
#[derive(Debug, Clone, Default)]
pub struct SheetInputs {
    /// Prior month's closing balances.
    pub opening: HashMap<String, i64>,
    /// Quantities issued to the contractor during the month.
    pub received: HashMap<String, i64>,
    /// GOOD-condition quantities on accepted returns during the month.
    pub returned: HashMap<String, i64>,
    /// USED service-order quantities during the month.
    pub used: HashMap<String, i64>,
    /// WASTAGE service-order quantities plus contractor wastage records.
    pub wastage: HashMap<String, i64>,
}

/// One reconciled row, before item-catalog enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRow {
    pub item_id: String,
    pub opening: i64,
    pub received: i64,
    pub returned: i64,
    pub used: i64,
    pub wastage: i64,
    pub closing: i64,
}

/// Assembles reconciliation rows from monthly aggregates.
///
/// Takes the union of item ids across all five inputs, computes the
/// closing balance per item, and drops rows with no opening and no
/// monthly activity. A nonzero carried-forward opening is always
/// emitted, even with no activity, so the month-to-month chain stays
/// unbroken.
///
/// Output is ordered by item id; the same inputs always produce the
/// same rows (regeneration is idempotent given unchanged documents).
pub fn reconcile(inputs: &SheetInputs) -> Vec<ReconciledRow> {
    let mut item_ids: BTreeSet<&String> = BTreeSet::new();
    item_ids.extend(inputs.opening.keys());
    item_ids.extend(inputs.received.keys());
    item_ids.extend(inputs.returned.keys());
    item_ids.extend(inputs.used.keys());
    item_ids.extend(inputs.wastage.keys());

    let at = |map: &HashMap<String, i64>, id: &String| map.get(id).copied().unwrap_or(0);

    let mut rows = Vec::with_capacity(item_ids.len());
    for item_id in item_ids {
        let opening = at(&inputs.opening, item_id);
        let received = at(&inputs.received, item_id);
        let returned = at(&inputs.returned, item_id);
        let used = at(&inputs.used, item_id);
        let wastage = at(&inputs.wastage, item_id);

        if opening == 0 && received == 0 && returned == 0 && used == 0 && wastage == 0 {
            continue;
        }

        rows.push(ReconciledRow {
            item_id: item_id.clone(),
            opening,
            received,
            returned,
            used,
            wastage,
            closing: opening + received - returned - used - wastage,
        });
    }

    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, i64)]) -> HashMap<String, i64> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_closing_arithmetic() {
        let inputs = SheetInputs {
            opening: map(&[("a", 10)]),
            received: map(&[("a", 20)]),
            returned: map(&[("a", 4)]),
            used: map(&[("a", 12)]),
            wastage: map(&[("a", 2)]),
        };

        let rows = reconcile(&inputs);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.closing, 12); // 10 + 20 - 4 - 12 - 2
        assert_eq!(
            row.closing,
            row.opening + row.received - row.returned - row.used - row.wastage
        );
    }

    #[test]
    fn test_union_of_item_ids() {
        let inputs = SheetInputs {
            opening: map(&[("a", 5)]),
            received: map(&[("b", 7)]),
            used: map(&[("c", 1)]),
            ..Default::default()
        };

        let rows = reconcile(&inputs);
        let ids: Vec<&str> = rows.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // Items touched only by usage can go negative against a zero
        // opening; the sheet reports it rather than hiding it.
        assert_eq!(rows[2].closing, -1);
    }

    #[test]
    fn test_all_zero_rows_dropped() {
        let inputs = SheetInputs {
            opening: map(&[("a", 0)]),
            received: map(&[("a", 0), ("b", 3)]),
            ..Default::default()
        };

        let rows = reconcile(&inputs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, "b");
    }

    #[test]
    fn test_carried_forward_opening_always_emitted() {
        // No activity in the month, but a prior closing exists: the row
        // must survive so next month's opening can chain from it.
        let inputs = SheetInputs {
            opening: map(&[("a", 8)]),
            ..Default::default()
        };

        let rows = reconcile(&inputs);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].opening, 8);
        assert_eq!(rows[0].closing, 8);
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let inputs = SheetInputs {
            opening: map(&[("b", 1), ("a", 2)]),
            received: map(&[("c", 3)]),
            ..Default::default()
        };

        assert_eq!(reconcile(&inputs), reconcile(&inputs));
        let ids: Vec<String> = reconcile(&inputs).into_iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
