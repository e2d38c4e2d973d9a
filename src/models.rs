//! Row types for the Supabase collections used by the ordering core.
//!
//! Field names match the remote column names one-to-one so the types
//! serialize straight into PostgREST payloads. Timestamps are RFC 3339
//! strings produced with `chrono`, mirroring what the backend stores.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A menu category (`menu_categories`). Read-only input to the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A sellable menu item (`menu_items`). Read-only input to the draft;
/// `image_url` is whatever public URL the object store handed back at
/// upload time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub cost_default: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A payment method (`payment_methods`). Exactly one must be selected
/// before a checkout can complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A persisted order row (`orders`). Written once per checkout; this
/// workflow never updates an order after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub order_no: String,
    pub status: String,
    pub subtotal: f64,
    pub grand_total: f64,
    pub payment_method: String,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub cashier_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A persisted order line (`order_items`), one row per distinct draft
/// line. Always written after its parent order row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub id: String,
    pub order_id: String,
    pub item_id: String,
    pub name: String,
    pub qty: u32,
    pub unit_price: f64,
    pub total_price: f64,
    #[serde(default)]
    pub created_at: String,
}

/// An expense row (`expenses`). Carried for the back-office screens;
/// no ordering workflow consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// An income row (`income`). Same status as [`ExpenseRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub id: String,
    pub source: String,
    pub amount: f64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
}
