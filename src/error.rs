//! Error taxonomy for the ordering core.
//!
//! Remote failures are carried as values all the way to the session
//! boundary, where they become user-facing notifications. Nothing in
//! this crate is allowed to crash a terminal session.

use thiserror::Error;

/// Failure reported by the remote data gateway or the object store.
///
/// Every variant carries a message that is already safe to show to a
/// cashier; callers branch on the value rather than unwinding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced an HTTP response (connect, timeout,
    /// DNS, TLS).
    #[error("{0}")]
    Transport(String),

    /// Supabase answered with a non-success status.
    #[error("{0}")]
    Remote(String),

    /// The response body could not be decoded into the expected shape.
    #[error("Invalid response from Supabase: {0}")]
    Decode(String),

    /// The terminal has no usable Supabase configuration.
    #[error("Terminal not configured: {0}")]
    NotConfigured(String),
}

/// Failure raised by the checkout workflow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Local validation failed before any remote write was attempted
    /// (empty cart, missing payment selection). Recoverable; no state
    /// was mutated.
    #[error("{0}")]
    Validation(String),

    /// A remote write failed. The draft and sequencer are preserved so
    /// the checkout can be retried; rows written earlier in the same
    /// attempt stay persisted and are re-sent idempotently on retry.
    #[error("{0}")]
    Persistence(#[from] GatewayError),
}

impl CheckoutError {
    /// Message suitable for a toast/notification in the hosting UI.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::Validation(msg) => msg.clone(),
            CheckoutError::Persistence(err) => {
                format!("Could not save the order: {err}. Please try again.")
            }
        }
    }
}
