//! Remote data gateway.
//!
//! Typed per-entity read/insert/update operations over the Supabase
//! collections. The trait is the seam the checkout workflow and the
//! session are tested against; production code talks to
//! [`SupabaseGateway`], which rides on [`crate::api::SupabaseClient`].
//!
//! Every operation reports failure as a value. A write either hands
//! back the stored row or a [`GatewayError`]; nothing here panics on a
//! remote failure.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::SupabaseClient;
use crate::config::TerminalConfig;
use crate::error::GatewayError;
use crate::models::{
    ExpenseRecord, IncomeRecord, MenuCategory, MenuItem, OrderItemRecord, OrderRecord,
    PaymentMethod,
};

/// Table names on the remote project.
pub mod tables {
    pub const MENU_CATEGORIES: &str = "menu_categories";
    pub const MENU_ITEMS: &str = "menu_items";
    pub const PAYMENT_METHODS: &str = "payment_methods";
    pub const ORDERS: &str = "orders";
    pub const ORDER_ITEMS: &str = "order_items";
    pub const EXPENSES: &str = "expenses";
    pub const INCOME: &str = "income";
}

/// Row-level access to the remote collections.
#[async_trait]
pub trait DataGateway: Send + Sync {
    // -- catalog ------------------------------------------------------------
    async fn list_menu_categories(&self) -> Result<Vec<MenuCategory>, GatewayError>;
    async fn create_menu_category(
        &self,
        category: &MenuCategory,
    ) -> Result<MenuCategory, GatewayError>;
    async fn update_menu_category(
        &self,
        id: &str,
        updates: &Value,
    ) -> Result<MenuCategory, GatewayError>;

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, GatewayError>;
    async fn create_menu_item(&self, item: &MenuItem) -> Result<MenuItem, GatewayError>;
    async fn update_menu_item(&self, id: &str, updates: &Value) -> Result<MenuItem, GatewayError>;

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, GatewayError>;
    async fn create_payment_method(
        &self,
        method: &PaymentMethod,
    ) -> Result<PaymentMethod, GatewayError>;
    async fn update_payment_method(
        &self,
        id: &str,
        updates: &Value,
    ) -> Result<PaymentMethod, GatewayError>;

    // -- orders -------------------------------------------------------------
    async fn list_orders(&self) -> Result<Vec<OrderRecord>, GatewayError>;
    /// Idempotent: re-sending a row with the same id merges instead of
    /// duplicating, which makes checkout retries safe.
    async fn create_order(&self, order: &OrderRecord) -> Result<OrderRecord, GatewayError>;
    async fn update_order(&self, id: &str, updates: &Value) -> Result<OrderRecord, GatewayError>;

    async fn list_order_items(&self, order_id: &str)
        -> Result<Vec<OrderItemRecord>, GatewayError>;
    /// Idempotent, same as [`DataGateway::create_order`].
    async fn create_order_item(
        &self,
        item: &OrderItemRecord,
    ) -> Result<OrderItemRecord, GatewayError>;

    // -- back office --------------------------------------------------------
    async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>, GatewayError>;
    async fn create_expense(&self, expense: &ExpenseRecord)
        -> Result<ExpenseRecord, GatewayError>;
    async fn list_income(&self) -> Result<Vec<IncomeRecord>, GatewayError>;
    async fn create_income(&self, income: &IncomeRecord) -> Result<IncomeRecord, GatewayError>;
}

// ---------------------------------------------------------------------------
// Supabase implementation
// ---------------------------------------------------------------------------

/// PostgREST-backed gateway.
#[derive(Debug, Clone)]
pub struct SupabaseGateway {
    client: SupabaseClient,
}

impl SupabaseGateway {
    pub fn new(config: &TerminalConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: SupabaseClient::new(config)?,
        })
    }

    pub fn from_client(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn list_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        let rows = self.client.select(table, query).await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| GatewayError::Decode(format!("{table} row: {e}")))
            })
            .collect()
    }

    async fn insert_row<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        row: &T,
        upsert: bool,
    ) -> Result<T, GatewayError> {
        let value = serde_json::to_value(row)
            .map_err(|e| GatewayError::Decode(format!("{table} payload: {e}")))?;
        let stored = self.client.insert(table, &value, upsert).await?;
        serde_json::from_value(stored)
            .map_err(|e| GatewayError::Decode(format!("{table} stored row: {e}")))
    }

    async fn update_row<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
        updates: &Value,
    ) -> Result<T, GatewayError> {
        let stored = self.client.update(table, id, updates).await?;
        serde_json::from_value(stored)
            .map_err(|e| GatewayError::Decode(format!("{table} stored row: {e}")))
    }
}

#[async_trait]
impl DataGateway for SupabaseGateway {
    async fn list_menu_categories(&self) -> Result<Vec<MenuCategory>, GatewayError> {
        self.list_rows(
            tables::MENU_CATEGORIES,
            &[
                ("select", "*".into()),
                ("is_active", "eq.true".into()),
                ("order", "display_order".into()),
            ],
        )
        .await
    }

    async fn create_menu_category(
        &self,
        category: &MenuCategory,
    ) -> Result<MenuCategory, GatewayError> {
        self.insert_row(tables::MENU_CATEGORIES, category, false)
            .await
    }

    async fn update_menu_category(
        &self,
        id: &str,
        updates: &Value,
    ) -> Result<MenuCategory, GatewayError> {
        self.update_row(tables::MENU_CATEGORIES, id, updates).await
    }

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, GatewayError> {
        self.list_rows(
            tables::MENU_ITEMS,
            &[("select", "*".into()), ("is_active", "eq.true".into())],
        )
        .await
    }

    async fn create_menu_item(&self, item: &MenuItem) -> Result<MenuItem, GatewayError> {
        self.insert_row(tables::MENU_ITEMS, item, false).await
    }

    async fn update_menu_item(&self, id: &str, updates: &Value) -> Result<MenuItem, GatewayError> {
        self.update_row(tables::MENU_ITEMS, id, updates).await
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, GatewayError> {
        self.list_rows(
            tables::PAYMENT_METHODS,
            &[
                ("select", "*".into()),
                ("is_active", "eq.true".into()),
                ("order", "display_order".into()),
            ],
        )
        .await
    }

    async fn create_payment_method(
        &self,
        method: &PaymentMethod,
    ) -> Result<PaymentMethod, GatewayError> {
        self.insert_row(tables::PAYMENT_METHODS, method, false).await
    }

    async fn update_payment_method(
        &self,
        id: &str,
        updates: &Value,
    ) -> Result<PaymentMethod, GatewayError> {
        self.update_row(tables::PAYMENT_METHODS, id, updates).await
    }

    async fn list_orders(&self) -> Result<Vec<OrderRecord>, GatewayError> {
        self.list_rows(
            tables::ORDERS,
            &[("select", "*".into()), ("order", "created_at.desc".into())],
        )
        .await
    }

    async fn create_order(&self, order: &OrderRecord) -> Result<OrderRecord, GatewayError> {
        self.insert_row(tables::ORDERS, order, true).await
    }

    async fn update_order(&self, id: &str, updates: &Value) -> Result<OrderRecord, GatewayError> {
        self.update_row(tables::ORDERS, id, updates).await
    }

    async fn list_order_items(
        &self,
        order_id: &str,
    ) -> Result<Vec<OrderItemRecord>, GatewayError> {
        self.list_rows(
            tables::ORDER_ITEMS,
            &[
                ("select", "*".into()),
                ("order_id", format!("eq.{order_id}")),
            ],
        )
        .await
    }

    async fn create_order_item(
        &self,
        item: &OrderItemRecord,
    ) -> Result<OrderItemRecord, GatewayError> {
        self.insert_row(tables::ORDER_ITEMS, item, true).await
    }

    async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>, GatewayError> {
        self.list_rows(
            tables::EXPENSES,
            &[("select", "*".into()), ("order", "created_at.desc".into())],
        )
        .await
    }

    async fn create_expense(
        &self,
        expense: &ExpenseRecord,
    ) -> Result<ExpenseRecord, GatewayError> {
        self.insert_row(tables::EXPENSES, expense, false).await
    }

    async fn list_income(&self) -> Result<Vec<IncomeRecord>, GatewayError> {
        self.list_rows(
            tables::INCOME,
            &[("select", "*".into()), ("order", "created_at.desc".into())],
        )
        .await
    }

    async fn create_income(&self, income: &IncomeRecord) -> Result<IncomeRecord, GatewayError> {
        self.insert_row(tables::INCOME, income, false).await
    }
}

// ---------------------------------------------------------------------------
// In-memory gateway for tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Failure injection switches for [`MemoryGateway`].
    #[derive(Debug, Default)]
    pub struct Faults {
        /// Fail every `create_order` call.
        pub fail_order_create: bool,
        /// Fail the Nth `create_order_item` call of the current test
        /// (1-based), counted across the gateway's lifetime.
        pub fail_item_create_at: Option<usize>,
        /// Fail `list_orders` (sequencer seeding path).
        pub fail_list_orders: bool,
    }

    #[derive(Debug, Default)]
    struct Store {
        payment_methods: Vec<PaymentMethod>,
        orders: Vec<OrderRecord>,
        order_items: Vec<OrderItemRecord>,
        item_create_calls: usize,
    }

    /// Upsert-faithful in-memory stand-in for the remote project.
    #[derive(Debug, Default)]
    pub struct MemoryGateway {
        pub categories: Vec<MenuCategory>,
        pub items: Vec<MenuItem>,
        pub faults: Faults,
        store: Mutex<Store>,
    }

    impl MemoryGateway {
        pub fn with_orders(mut orders: Vec<OrderRecord>) -> Self {
            let gw = Self::default();
            gw.store.lock().unwrap().orders.append(&mut orders);
            gw
        }

        pub fn set_payment_methods(&self, methods: Vec<PaymentMethod>) {
            self.store.lock().unwrap().payment_methods = methods;
        }

        pub fn orders(&self) -> Vec<OrderRecord> {
            self.store.lock().unwrap().orders.clone()
        }

        pub fn order_items(&self) -> Vec<OrderItemRecord> {
            self.store.lock().unwrap().order_items.clone()
        }
    }

    fn unsupported<T>(what: &str) -> Result<T, GatewayError> {
        Err(GatewayError::Remote(format!(
            "{what} is not wired up in MemoryGateway"
        )))
    }

    #[async_trait]
    impl DataGateway for MemoryGateway {
        async fn list_menu_categories(&self) -> Result<Vec<MenuCategory>, GatewayError> {
            Ok(self.categories.clone())
        }

        async fn create_menu_category(
            &self,
            _category: &MenuCategory,
        ) -> Result<MenuCategory, GatewayError> {
            unsupported("create_menu_category")
        }

        async fn update_menu_category(
            &self,
            _id: &str,
            _updates: &Value,
        ) -> Result<MenuCategory, GatewayError> {
            unsupported("update_menu_category")
        }

        async fn list_menu_items(&self) -> Result<Vec<MenuItem>, GatewayError> {
            Ok(self.items.clone())
        }

        async fn create_menu_item(&self, _item: &MenuItem) -> Result<MenuItem, GatewayError> {
            unsupported("create_menu_item")
        }

        async fn update_menu_item(
            &self,
            _id: &str,
            _updates: &Value,
        ) -> Result<MenuItem, GatewayError> {
            unsupported("update_menu_item")
        }

        async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, GatewayError> {
            Ok(self.store.lock().unwrap().payment_methods.clone())
        }

        async fn create_payment_method(
            &self,
            method: &PaymentMethod,
        ) -> Result<PaymentMethod, GatewayError> {
            let mut store = self.store.lock().unwrap();
            if store.payment_methods.iter().any(|pm| pm.id == method.id) {
                return Err(GatewayError::Remote(format!(
                    "payment method {} already exists",
                    method.id
                )));
            }
            store.payment_methods.push(method.clone());
            Ok(method.clone())
        }

        async fn update_payment_method(
            &self,
            id: &str,
            updates: &Value,
        ) -> Result<PaymentMethod, GatewayError> {
            let mut store = self.store.lock().unwrap();
            let method = store
                .payment_methods
                .iter_mut()
                .find(|pm| pm.id == id)
                .ok_or_else(|| GatewayError::Remote(format!("payment method {id} not found")))?;
            // PATCH semantics: only the supplied columns change.
            let mut row = serde_json::to_value(&*method)
                .map_err(|e| GatewayError::Decode(e.to_string()))?;
            if let (Some(obj), Some(patch)) = (row.as_object_mut(), updates.as_object()) {
                for (key, value) in patch {
                    obj.insert(key.clone(), value.clone());
                }
            }
            *method =
                serde_json::from_value(row).map_err(|e| GatewayError::Decode(e.to_string()))?;
            Ok(method.clone())
        }

        async fn list_orders(&self) -> Result<Vec<OrderRecord>, GatewayError> {
            if self.faults.fail_list_orders {
                return Err(GatewayError::Transport(
                    "Cannot reach Supabase at https://test.invalid".into(),
                ));
            }
            Ok(self.orders())
        }

        async fn create_order(&self, order: &OrderRecord) -> Result<OrderRecord, GatewayError> {
            if self.faults.fail_order_create {
                return Err(GatewayError::Remote("orders insert rejected".into()));
            }
            let mut store = self.store.lock().unwrap();
            // merge-duplicates semantics: same id replaces the row
            if let Some(existing) = store.orders.iter_mut().find(|o| o.id == order.id) {
                *existing = order.clone();
            } else {
                store.orders.push(order.clone());
            }
            Ok(order.clone())
        }

        async fn update_order(
            &self,
            _id: &str,
            _updates: &Value,
        ) -> Result<OrderRecord, GatewayError> {
            unsupported("update_order")
        }

        async fn list_order_items(
            &self,
            order_id: &str,
        ) -> Result<Vec<OrderItemRecord>, GatewayError> {
            Ok(self
                .order_items()
                .into_iter()
                .filter(|i| i.order_id == order_id)
                .collect())
        }

        async fn create_order_item(
            &self,
            item: &OrderItemRecord,
        ) -> Result<OrderItemRecord, GatewayError> {
            let mut store = self.store.lock().unwrap();
            store.item_create_calls += 1;
            if Some(store.item_create_calls) == self.faults.fail_item_create_at {
                return Err(GatewayError::Remote("order_items insert rejected".into()));
            }
            if let Some(existing) = store.order_items.iter_mut().find(|i| i.id == item.id) {
                *existing = item.clone();
            } else {
                store.order_items.push(item.clone());
            }
            Ok(item.clone())
        }

        async fn list_expenses(&self) -> Result<Vec<ExpenseRecord>, GatewayError> {
            Ok(vec![])
        }

        async fn create_expense(
            &self,
            _expense: &ExpenseRecord,
        ) -> Result<ExpenseRecord, GatewayError> {
            unsupported("create_expense")
        }

        async fn list_income(&self) -> Result<Vec<IncomeRecord>, GatewayError> {
            Ok(vec![])
        }

        async fn create_income(&self, _income: &IncomeRecord) -> Result<IncomeRecord, GatewayError> {
            unsupported("create_income")
        }
    }
}
