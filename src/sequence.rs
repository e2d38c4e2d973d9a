//! Human-readable order numbering.
//!
//! Each session holds its own counter, seeded once at startup from the
//! highest `ORD`-prefixed number already persisted. The counter only
//! advances after a checkout fully succeeds, so a failed checkout
//! retries under the same number.
//!
//! The counter is display-only: the order row's primary key is a UUID,
//! so two sessions racing to the same `ORD` number cannot collide at
//! the storage layer. Centralised numbering is deliberately out of
//! scope for a single-terminal deployment.

use tracing::debug;

use crate::models::OrderRecord;

const ORDER_NO_PREFIX: &str = "ORD";

/// Parse the numeric suffix of an order number. Returns `None` for
/// anything that is not `ORD` followed by plain decimal digits, so
/// malformed historical rows are skipped rather than failing the scan.
fn parse_order_suffix(order_no: &str) -> Option<u32> {
    let suffix = order_no.strip_prefix(ORDER_NO_PREFIX)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// Session-local order number counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSequencer {
    counter: u32,
}

impl Default for OrderSequencer {
    fn default() -> Self {
        Self { counter: 1 }
    }
}

impl OrderSequencer {
    /// Fresh sequencer starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from previously persisted orders: counter = highest parsed
    /// suffix + 1, or 1 when nothing parses.
    pub fn seed(orders: &[OrderRecord]) -> Self {
        let max = orders
            .iter()
            .filter_map(|o| parse_order_suffix(&o.order_no))
            .max();
        let counter = max.map(|m| m + 1).unwrap_or(1);
        debug!(counter, scanned = orders.len(), "order sequencer seeded");
        Self { counter }
    }

    pub fn current(&self) -> u32 {
        self.counter
    }

    /// Format the current counter as `ORD` + zero-padded 4-digit
    /// decimal. Values above 9999 are printed in full, never
    /// truncated.
    pub fn current_order_no(&self) -> String {
        format!("{ORDER_NO_PREFIX}{:04}", self.counter)
    }

    /// Advance by exactly 1. Called only after all checkout writes
    /// have committed.
    pub fn advance(&mut self) {
        self.counter += 1;
    }
}
