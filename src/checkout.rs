//! Checkout workflow.
//!
//! Drives one order from the draft into the remote store:
//!
//! ```text
//! Idle -> AwaitingPaymentSelection -> Submitting -> Succeeded
//!                                          \-> Failed (recoverable)
//! ```
//!
//! Writes are sequential: the order row first (its generated id is the
//! foreign key for every line), then one row per draft line in draft
//! order. There is no multi-row transaction on the PostgREST surface,
//! so instead of compensating deletes the workflow pre-generates the
//! order id and every line-item id when submission first starts and
//! keeps them across a failed attempt. All inserts are idempotent
//! upserts keyed by those ids: a retry after a partial failure
//! re-sends the same rows and the store converges instead of
//! accumulating duplicates.
//!
//! A failed attempt leaves the draft and the sequencer untouched. The
//! sequencer advances only after every row has been accepted.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::TerminalConfig;
use crate::draft::OrderDraft;
use crate::error::CheckoutError;
use crate::gateway::DataGateway;
use crate::models::{OrderItemRecord, OrderRecord};
use crate::sequence::OrderSequencer;

/// Only status this workflow ever writes.
const STATUS_PAID: &str = "paid";

/// Observable workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    AwaitingPaymentSelection,
    Submitting,
    Succeeded,
    /// Carries the user-facing failure message. Recoverable: the draft
    /// is intact and `submit` may be called again.
    Failed(String),
}

/// Ids reserved for the in-flight order, kept across failed attempts
/// so retries upsert the same rows.
#[derive(Debug, Clone)]
struct ReservedIds {
    order_id: String,
    line_ids: Vec<String>,
}

/// One checkout per session. Reused across orders; every success
/// resets it to `Idle`-equivalent readiness (state stays `Succeeded`
/// until the next `begin`).
#[derive(Debug, Default)]
pub struct CheckoutWorkflow {
    state: CheckoutState,
    reserved: Option<ReservedIds>,
}

impl CheckoutWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Enter the payment-selection step. Refuses (state stays `Idle`)
    /// when the draft has no lines.
    pub fn begin(&mut self, draft: &OrderDraft) -> bool {
        if draft.is_empty() {
            self.state = CheckoutState::Idle;
            return false;
        }
        self.state = CheckoutState::AwaitingPaymentSelection;
        true
    }

    /// Abandon the payment-selection step without submitting. The
    /// draft is untouched; reserved ids (if any) survive so an earlier
    /// partial failure can still be retried later.
    pub fn cancel(&mut self) {
        self.state = CheckoutState::Idle;
    }

    /// Drop any ids reserved by a failed attempt. Called when the
    /// draft they belong to is discarded: the abandoned order's
    /// partial rows stay orphaned and the next submission gets fresh
    /// ids instead of aliasing them.
    pub fn discard_reservation(&mut self) {
        self.reserved = None;
    }

    /// Reserve (or reuse) row ids for the current draft shape. Ids are
    /// regenerated only when the draft's line count changed since the
    /// failed attempt that reserved them; same-count edits reuse the
    /// ids, so the retry upserts over the partial rows of the same
    /// order.
    fn reserve_ids(&mut self, line_count: usize) -> ReservedIds {
        match self.reserved.take() {
            Some(ids) if ids.line_ids.len() == line_count => ids,
            _ => ReservedIds {
                order_id: Uuid::new_v4().to_string(),
                line_ids: (0..line_count).map(|_| Uuid::new_v4().to_string()).collect(),
            },
        }
    }

    /// Submit the draft as a paid order. Requires `begin` first:
    /// submitting from `Idle` or `Succeeded` is rejected without any
    /// write or state transition.
    ///
    /// On success: draft cleared, sequencer advanced by exactly 1,
    /// state `Succeeded`, the stored order row is returned. On any
    /// failure: draft and sequencer untouched, state `Failed`, error
    /// returned; the caller may fix the cause and call `submit` again.
    pub async fn submit(
        &mut self,
        gateway: &dyn DataGateway,
        draft: &mut OrderDraft,
        sequencer: &mut OrderSequencer,
        payment_method: Option<&str>,
        config: &TerminalConfig,
    ) -> Result<OrderRecord, CheckoutError> {
        if draft.is_empty() {
            // Entry guard: nothing to submit, no state transition.
            return Err(CheckoutError::Validation("The order is empty".into()));
        }
        if matches!(self.state, CheckoutState::Idle | CheckoutState::Succeeded) {
            return Err(CheckoutError::Validation(
                "Checkout has not been started".into(),
            ));
        }

        let payment_method = match payment_method.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => p.to_string(),
            None => {
                let msg = "Please select a payment method".to_string();
                self.state = CheckoutState::Failed(msg.clone());
                return Err(CheckoutError::Validation(msg));
            }
        };

        self.state = CheckoutState::Submitting;
        let ids = self.reserve_ids(draft.lines().len());

        // Format the number now; the counter moves only on success.
        let order_no = sequencer.current_order_no();
        let now = Utc::now().to_rfc3339();

        let order = OrderRecord {
            id: ids.order_id.clone(),
            order_no: order_no.clone(),
            status: STATUS_PAID.into(),
            subtotal: draft.subtotal(),
            grand_total: draft.grand_total(),
            payment_method,
            branch_id: Some(config.branch_id.clone()),
            cashier_id: Some(config.cashier_id.clone()),
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let stored_order = match gateway.create_order(&order).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(order_no = %order_no, error = %e, "order row write failed");
                self.reserved = Some(ids);
                let err = CheckoutError::Persistence(e);
                self.state = CheckoutState::Failed(err.user_message());
                return Err(err);
            }
        };

        // Line rows reference the stored order's generated id and are
        // written one at a time in draft order.
        for (line, line_id) in draft.lines().iter().zip(&ids.line_ids) {
            let item = OrderItemRecord {
                id: line_id.clone(),
                order_id: stored_order.id.clone(),
                item_id: line.item_id.clone(),
                name: line.name.clone(),
                qty: line.qty,
                unit_price: line.unit_price,
                total_price: line.total,
                created_at: now.clone(),
            };
            if let Err(e) = gateway.create_order_item(&item).await {
                warn!(
                    order_no = %order_no,
                    item_id = %line.item_id,
                    error = %e,
                    "order line write failed, order is partially persisted until retried"
                );
                self.reserved = Some(ids.clone());
                let err = CheckoutError::Persistence(e);
                self.state = CheckoutState::Failed(err.user_message());
                return Err(err);
            }
        }

        draft.clear();
        sequencer.advance();
        self.reserved = None;
        self.state = CheckoutState::Succeeded;
        info!(
            order_no = %order_no,
            grand_total = stored_order.grand_total,
            lines = ids.line_ids.len(),
            "checkout committed"
        );
        Ok(stored_order)
    }
}
