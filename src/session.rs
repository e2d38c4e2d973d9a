//! Terminal session state.
//!
//! One `PosSession` per terminal: the loaded catalog, the category
//! filter, the draft being built, the selected payment method, the
//! order-number sequencer, and the checkout workflow. All draft
//! mutations go through [`PosSession::handle`] as synchronous
//! commands, so a rendering layer only ever dispatches messages and
//! re-reads state; the ordering logic stays testable without any UI.
//!
//! Remote calls (`load_catalog`, `checkout`) are async and awaited
//! sequentially by the caller. No mutation interleaves with another.

use tracing::{info, trace, warn};

use crate::checkout::{CheckoutState, CheckoutWorkflow};
use crate::config::TerminalConfig;
use crate::draft::{OrderDraft, QuantityChange};
use crate::error::CheckoutError;
use crate::gateway::DataGateway;
use crate::models::{MenuCategory, MenuItem, PaymentMethod};
use crate::sequence::OrderSequencer;

/// Category filter over the loaded menu.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

/// Synchronous state mutations dispatched by the rendering layer.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    SetCategoryFilter(CategoryFilter),
    /// Add one unit of a menu item to the draft. Unknown ids are
    /// ignored silently, matching the ordering screen's behaviour.
    AddItem(String),
    ChangeQuantity(String, QuantityChange),
    ClearOrder,
    SelectPaymentMethod(String),
}

/// User-facing notification produced by a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// The application-state struct owned by a single controller.
#[derive(Debug)]
pub struct PosSession {
    config: TerminalConfig,
    categories: Vec<MenuCategory>,
    menu_items: Vec<MenuItem>,
    payment_methods: Vec<PaymentMethod>,
    filter: CategoryFilter,
    draft: OrderDraft,
    sequencer: OrderSequencer,
    selected_payment_method: Option<String>,
    checkout: CheckoutWorkflow,
}

impl PosSession {
    pub fn new(config: TerminalConfig) -> Self {
        Self {
            config,
            categories: Vec::new(),
            menu_items: Vec::new(),
            payment_methods: Vec::new(),
            filter: CategoryFilter::All,
            draft: OrderDraft::new(),
            sequencer: OrderSequencer::new(),
            selected_payment_method: None,
            checkout: CheckoutWorkflow::new(),
        }
    }

    // -- startup ------------------------------------------------------------

    /// Load the catalog and seed the sequencer.
    ///
    /// Each list degrades to empty on failure (the screen still opens
    /// with whatever loaded), and a failed order scan degrades the
    /// sequencer to 1: availability is preferred over strict numbering
    /// continuity. Never returns an error.
    pub async fn load_catalog(&mut self, gateway: &dyn DataGateway) {
        self.categories = gateway.list_menu_categories().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load menu categories");
            Vec::new()
        });
        self.menu_items = gateway.list_menu_items().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load menu items");
            Vec::new()
        });
        self.payment_methods = gateway.list_payment_methods().await.unwrap_or_else(|e| {
            warn!(error = %e, "failed to load payment methods");
            Vec::new()
        });

        // Default selection mirrors the ordering screen: first listed
        // payment method, if any.
        self.selected_payment_method = self.payment_methods.first().map(|pm| pm.id.clone());

        self.sequencer = match gateway.list_orders().await {
            Ok(orders) => OrderSequencer::seed(&orders),
            Err(e) => {
                warn!(error = %e, "order scan failed, order numbering restarts at 1");
                OrderSequencer::new()
            }
        };

        info!(
            categories = self.categories.len(),
            items = self.menu_items.len(),
            payment_methods = self.payment_methods.len(),
            next_order_no = %self.sequencer.current_order_no(),
            "catalog loaded"
        );
    }

    // -- synchronous command dispatch ---------------------------------------

    pub fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SetCategoryFilter(filter) => self.filter = filter,
            SessionCommand::AddItem(item_id) => {
                match self.menu_items.iter().find(|i| i.id == item_id) {
                    Some(item) => {
                        let item = item.clone();
                        self.draft.add_line(&item);
                    }
                    None => trace!(item_id = %item_id, "add ignored, item not in loaded catalog"),
                }
            }
            SessionCommand::ChangeQuantity(item_id, change) => {
                self.draft.change_quantity(&item_id, change);
            }
            SessionCommand::ClearOrder => {
                self.draft.clear();
                // The order those ids were reserved for is gone; the
                // next checkout must not alias its rows.
                self.checkout.discard_reservation();
            }
            SessionCommand::SelectPaymentMethod(id) => {
                self.selected_payment_method = Some(id);
            }
        }
    }

    // -- checkout -----------------------------------------------------------

    /// Open the payment step. `false` (and no state change) when the
    /// draft is empty.
    pub fn begin_checkout(&mut self) -> bool {
        self.checkout.begin(&self.draft)
    }

    /// Close the payment step without submitting and reset the payment
    /// selection to the default, matching the screen's cancel button.
    pub fn cancel_checkout(&mut self) {
        self.checkout.cancel();
        self.selected_payment_method = self.payment_methods.first().map(|pm| pm.id.clone());
    }

    /// Run the checkout workflow and fold the outcome into a
    /// user-facing notice. Never panics; every failure leaves the
    /// session usable and the draft intact.
    pub async fn checkout(&mut self, gateway: &dyn DataGateway) -> Notice {
        let result = self
            .checkout
            .submit(
                gateway,
                &mut self.draft,
                &mut self.sequencer,
                self.selected_payment_method.as_deref(),
                &self.config,
            )
            .await;

        match result {
            Ok(order) => Notice::Success(format!(
                "Payment completed. Order {} saved.",
                order.order_no
            )),
            Err(CheckoutError::Validation(msg)) => Notice::Error(msg),
            Err(err @ CheckoutError::Persistence(_)) => Notice::Error(err.user_message()),
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn categories(&self) -> &[MenuCategory] {
        &self.categories
    }

    /// Menu items under the current category filter, in catalog order.
    pub fn visible_items(&self) -> Vec<&MenuItem> {
        match &self.filter {
            CategoryFilter::All => self.menu_items.iter().collect(),
            CategoryFilter::Category(id) => self
                .menu_items
                .iter()
                .filter(|i| &i.category_id == id)
                .collect(),
        }
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    pub fn selected_payment_method(&self) -> Option<&str> {
        self.selected_payment_method.as_deref()
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn checkout_state(&self) -> &CheckoutState {
        self.checkout.state()
    }

    /// Number the next successful checkout will be persisted under.
    pub fn current_order_no(&self) -> String {
        self.sequencer.current_order_no()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::MemoryGateway;
    use crate::models::OrderRecord;

    fn category(id: &str, name: &str) -> MenuCategory {
        MenuCategory {
            id: id.into(),
            name: name.into(),
            display_order: 0,
            is_active: true,
        }
    }

    fn menu_item(id: &str, category_id: &str, price: f64) -> MenuItem {
        MenuItem {
            id: id.into(),
            category_id: category_id.into(),
            name: format!("Item {id}"),
            price,
            cost_default: 0.0,
            image_url: None,
            is_active: true,
            branch_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn payment_method(id: &str, name: &str) -> PaymentMethod {
        PaymentMethod {
            id: id.into(),
            name: name.into(),
            display_order: 0,
            is_active: true,
        }
    }

    fn seeded_order(order_no: &str) -> OrderRecord {
        OrderRecord {
            id: format!("id-{order_no}"),
            order_no: order_no.into(),
            status: "paid".into(),
            subtotal: 10.0,
            grand_total: 10.0,
            payment_method: "pm-cash".into(),
            branch_id: None,
            cashier_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn stocked_gateway() -> MemoryGateway {
        let mut gw = MemoryGateway::with_orders(vec![
            seeded_order("ORD0003"),
            seeded_order("ORDxyz"),
            seeded_order("ORD0010"),
        ]);
        gw.categories = vec![category("cat-noodles", "Noodles"), category("cat-rice", "Rice")];
        gw.items = vec![
            menu_item("i-padthai", "cat-noodles", 95.0),
            menu_item("i-friedrice", "cat-rice", 80.0),
            menu_item("i-kaopad", "cat-rice", 70.0),
        ];
        gw.set_payment_methods(vec![
            payment_method("pm-cash", "Cash"),
            payment_method("pm-promptpay", "PromptPay"),
        ]);
        gw
    }

    #[tokio::test]
    async fn load_catalog_selects_default_payment_and_seeds_sequencer() {
        let gateway = stocked_gateway();
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        assert_eq!(session.categories().len(), 2);
        assert_eq!(session.visible_items().len(), 3);
        assert_eq!(session.selected_payment_method(), Some("pm-cash"));
        assert_eq!(session.current_order_no(), "ORD0011");
    }

    #[tokio::test]
    async fn failed_order_scan_degrades_numbering_to_one() {
        let mut gateway = stocked_gateway();
        gateway.faults.fail_list_orders = true;
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        assert_eq!(session.current_order_no(), "ORD0001");
        // Catalog still usable.
        assert_eq!(session.visible_items().len(), 3);
    }

    #[tokio::test]
    async fn category_filter_narrows_visible_items() {
        let gateway = stocked_gateway();
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        session.handle(SessionCommand::SetCategoryFilter(CategoryFilter::Category(
            "cat-rice".into(),
        )));
        let visible: Vec<&str> = session.visible_items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(visible, vec!["i-friedrice", "i-kaopad"]);

        session.handle(SessionCommand::SetCategoryFilter(CategoryFilter::All));
        assert_eq!(session.visible_items().len(), 3);
    }

    #[tokio::test]
    async fn unknown_item_ids_are_ignored_silently() {
        let gateway = stocked_gateway();
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        session.handle(SessionCommand::AddItem("i-missing".into()));
        assert!(session.draft().is_empty());

        session.handle(SessionCommand::AddItem("i-padthai".into()));
        assert_eq!(session.draft().lines().len(), 1);
    }

    #[tokio::test]
    async fn full_order_flow_through_commands_and_checkout() {
        let gateway = stocked_gateway();
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        session.handle(SessionCommand::AddItem("i-padthai".into()));
        session.handle(SessionCommand::AddItem("i-padthai".into()));
        session.handle(SessionCommand::AddItem("i-friedrice".into()));
        session.handle(SessionCommand::SelectPaymentMethod("pm-promptpay".into()));
        assert_eq!(session.draft().grand_total(), 270.0);

        assert!(session.begin_checkout());
        let notice = session.checkout(&gateway).await;

        assert_eq!(
            notice,
            Notice::Success("Payment completed. Order ORD0011 saved.".into())
        );
        assert!(session.draft().is_empty());
        assert_eq!(session.current_order_no(), "ORD0012");

        let orders = gateway.orders();
        let stored = orders.iter().find(|o| o.order_no == "ORD0011").unwrap();
        assert_eq!(stored.payment_method, "pm-promptpay");
        assert_eq!(gateway.order_items().len(), 2);
    }

    #[tokio::test]
    async fn begin_checkout_refuses_empty_draft() {
        let gateway = stocked_gateway();
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        assert!(!session.begin_checkout());
        assert_eq!(*session.checkout_state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn cancel_checkout_resets_payment_selection_to_default() {
        let gateway = stocked_gateway();
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        session.handle(SessionCommand::AddItem("i-padthai".into()));
        session.handle(SessionCommand::SelectPaymentMethod("pm-promptpay".into()));
        assert!(session.begin_checkout());
        session.cancel_checkout();

        assert_eq!(*session.checkout_state(), CheckoutState::Idle);
        assert_eq!(session.selected_payment_method(), Some("pm-cash"));
        // Draft survives a cancelled payment step.
        assert_eq!(session.draft().lines().len(), 1);
    }

    #[tokio::test]
    async fn clearing_the_order_after_a_partial_failure_abandons_its_rows() {
        let mut gateway = stocked_gateway();
        gateway.faults.fail_item_create_at = Some(1);
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        session.handle(SessionCommand::AddItem("i-padthai".into()));
        assert!(session.begin_checkout());
        let notice = session.checkout(&gateway).await;
        assert!(matches!(notice, Notice::Error(_)));
        let orphan_id = gateway
            .orders()
            .iter()
            .find(|o| o.order_no == "ORD0011")
            .expect("partial order row persisted")
            .id
            .clone();

        // Cashier abandons the order and rings up a different one.
        gateway.faults.fail_item_create_at = None;
        session.handle(SessionCommand::ClearOrder);
        session.handle(SessionCommand::AddItem("i-friedrice".into()));
        assert!(session.begin_checkout());
        let notice = session.checkout(&gateway).await;
        assert!(matches!(notice, Notice::Success(_)));

        // The new order got a fresh row; the orphaned partial row was
        // not overwritten.
        let orders = gateway.orders();
        let new_order = orders
            .iter()
            .find(|o| o.order_no == "ORD0011" && o.id != orphan_id)
            .expect("fresh row for the new order");
        assert_eq!(new_order.grand_total, 80.0);
        let orphan = orders.iter().find(|o| o.id == orphan_id).unwrap();
        assert_eq!(orphan.grand_total, 95.0);
    }

    #[tokio::test]
    async fn checkout_failure_surfaces_error_notice_and_keeps_draft() {
        let mut gateway = stocked_gateway();
        gateway.faults.fail_order_create = true;
        let mut session = PosSession::new(TerminalConfig::default());
        session.load_catalog(&gateway).await;

        session.handle(SessionCommand::AddItem("i-padthai".into()));
        assert!(session.begin_checkout());
        let notice = session.checkout(&gateway).await;

        match notice {
            Notice::Error(msg) => assert!(msg.contains("Could not save the order")),
            other => panic!("expected error notice, got {other:?}"),
        }
        assert_eq!(session.draft().lines().len(), 1);
        assert_eq!(session.current_order_no(), "ORD0011");
    }
}
