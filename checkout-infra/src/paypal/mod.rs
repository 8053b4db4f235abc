//! Outbound client for the PayPal REST API (OAuth2 token exchange, Orders v2,
//! Payments v2).

pub mod client;
pub mod token;

pub use client::PayPalClient;
pub use token::{TokenPolicy, TokenProvider};

use checkout_core::ProcessorError;

/// User agent for processor requests.
pub const USER_AGENT_VALUE: &str = concat!("checkout-infra/", env!("CARGO_PKG_VERSION"));

pub(crate) fn transport_error(err: reqwest::Error) -> ProcessorError {
    if err.is_timeout() {
        ProcessorError::Timeout
    } else {
        ProcessorError::Network(err.to_string())
    }
}
