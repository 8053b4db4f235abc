use std::sync::Arc;

use checkout_core::PaymentProcessor;
use checkout_infra::Config;
use checkout_order::CheckoutOrchestrator;

/// Identifiers the browser SDK needs. Never includes the client secret.
#[derive(Clone, Debug, Default)]
pub struct SdkConfig {
    pub client_id: Option<String>,
    pub merchant_id: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub checkout: Arc<CheckoutOrchestrator>,
    pub sdk: SdkConfig,
    pub static_dir: String,
}

impl AppState {
    pub fn new(processor: Arc<dyn PaymentProcessor>, config: &Config) -> Self {
        Self {
            checkout: Arc::new(CheckoutOrchestrator::new(processor)),
            sdk: SdkConfig {
                client_id: config.paypal.client_id.clone(),
                merchant_id: config.paypal.merchant_id.clone(),
            },
            static_dir: config.server.static_dir.clone(),
        }
    }
}
