//! Siam POS ordering core.
//!
//! Headless point-of-sale library: menu catalog state, a running order
//! draft, human-readable order numbering, and a checkout workflow that
//! persists orders and their line items to a Supabase project. A
//! rendering layer (desktop shell, web view, terminal UI) dispatches
//! [`session::SessionCommand`]s and awaits the async entry points; all
//! ordering logic lives here and is tested without any UI.
//!
//! Typical wiring:
//!
//! ```no_run
//! use siam_pos::{config::TerminalConfig, gateway::SupabaseGateway, session::PosSession};
//!
//! # async fn start() {
//! let config = TerminalConfig::resolve();
//! let gateway = SupabaseGateway::new(&config).expect("terminal is provisioned");
//! let mut session = PosSession::new(config);
//! session.load_catalog(&gateway).await;
//! # }
//! ```

pub mod api;
pub mod checkout;
pub mod config;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod object_store;
pub mod sequence;
pub mod session;
pub mod storage;

pub use checkout::{CheckoutState, CheckoutWorkflow};
pub use config::TerminalConfig;
pub use draft::{OrderDraft, OrderLine, QuantityChange};
pub use error::{CheckoutError, GatewayError};
pub use gateway::{DataGateway, SupabaseGateway};
pub use models::{
    ExpenseRecord, IncomeRecord, MenuCategory, MenuItem, OrderItemRecord, OrderRecord,
    PaymentMethod,
};
pub use object_store::{ObjectStore, StoredObject};
pub use sequence::OrderSequencer;
pub use session::{CategoryFilter, Notice, PosSession, SessionCommand};
