//! In-memory order draft (the running cart).
//!
//! Lines keep insertion order. Name, unit price, and cost are
//! snapshotted from the catalog when a line is first added and never
//! re-synced afterwards: the price of an in-progress order must not
//! shift under the cashier when the catalog changes.
//!
//! Totals are never maintained incrementally. Every structural
//! mutation recomputes each line total and the subtotal/grand total
//! from scratch, so the totals are a pure function of the current
//! lines at all times.

use crate::models::MenuItem;

/// Direction of a quantity adjustment on an existing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Increase,
    Decrease,
}

/// One draft line. `qty` is always >= 1; a decrement that would reach
/// zero removes the line instead.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub item_id: String,
    pub name: String,
    pub unit_price: f64,
    pub cost: f64,
    pub qty: u32,
    pub total: f64,
}

/// The order currently being built.
#[derive(Debug, Clone, Default)]
pub struct OrderDraft {
    lines: Vec<OrderLine>,
    subtotal: f64,
    discount: f64,
    grand_total: f64,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `item` to the draft. A line for the same item
    /// id gets its quantity bumped; otherwise a new line is appended
    /// with the item's current name/price/cost snapshotted.
    pub fn add_line(&mut self, item: &MenuItem) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item.id) {
            line.qty += 1;
        } else {
            self.lines.push(OrderLine {
                item_id: item.id.clone(),
                name: item.name.clone(),
                unit_price: item.price,
                cost: item.cost_default,
                qty: 1,
                total: item.price,
            });
        }
        self.recompute();
    }

    /// Adjust the quantity of the line for `item_id`. Increase adds 1;
    /// Decrease subtracts 1 and drops the line once the quantity would
    /// reach zero. No-op when no line matches.
    pub fn change_quantity(&mut self, item_id: &str, change: QuantityChange) {
        let Some(idx) = self.lines.iter().position(|l| l.item_id == item_id) else {
            return;
        };
        match change {
            QuantityChange::Increase => self.lines[idx].qty += 1,
            QuantityChange::Decrease => {
                if self.lines[idx].qty <= 1 {
                    self.lines.remove(idx);
                } else {
                    self.lines[idx].qty -= 1;
                }
            }
        }
        self.recompute();
    }

    /// Reset to the empty draft.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute();
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    pub fn grand_total(&self) -> f64 {
        self.grand_total
    }

    /// Recompute every line total and both totals from the line
    /// sequence. Called after every mutation; no delta tracking.
    fn recompute(&mut self) {
        for line in &mut self.lines {
            line.total = line.qty as f64 * line.unit_price;
        }
        self.subtotal = self.lines.iter().map(|l| l.total).sum();
        self.grand_total = self.subtotal - self.discount;
    }
}
