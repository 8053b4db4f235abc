pub mod app_config;
pub mod paypal;

pub use app_config::{Config, PayPalConfig};
pub use paypal::{PayPalClient, TokenPolicy, TokenProvider};
