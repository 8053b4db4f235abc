use checkout_core::{Authorization, CaptureTarget, Order, OrderIntent};

use crate::models::{CheckoutError, CheckoutResult};

/// Per-checkout context: the order, its intent and the authorization (once
/// there is one). Passed through the call chain instead of living in globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    order_id: String,
    intent: OrderIntent,
    authorization_id: Option<String>,
}

impl CheckoutSession {
    pub fn new(order_id: impl Into<String>, intent: OrderIntent) -> Self {
        Self {
            order_id: order_id.into(),
            intent,
            authorization_id: None,
        }
    }

    /// Rebuilds the session from the processor's view of the order. A missing
    /// intent is read as CAPTURE.
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            intent: order.intent.unwrap_or(OrderIntent::Capture),
            authorization_id: order.first_authorization().map(|a| a.id.clone()),
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn intent(&self) -> OrderIntent {
        self.intent
    }

    pub fn authorization_id(&self) -> Option<&str> {
        self.authorization_id.as_deref()
    }

    /// Records the authorization created for this order. Only AUTHORIZE
    /// sessions have one, and only one.
    pub(crate) fn record_authorization(&mut self, authorization: &Authorization) -> CheckoutResult<()> {
        if self.intent != OrderIntent::Authorize {
            return Err(CheckoutError::InvalidRequest(format!(
                "order {} was not created with AUTHORIZE intent",
                self.order_id
            )));
        }
        match &self.authorization_id {
            Some(existing) if existing != &authorization.id => Err(CheckoutError::InvalidRequest(format!(
                "order {} already has authorization {}",
                self.order_id, existing
            ))),
            _ => {
                self.authorization_id = Some(authorization.id.clone());
                Ok(())
            }
        }
    }

    pub fn capture_target(&self) -> CheckoutResult<CaptureTarget> {
        CaptureTarget::for_intent(self.intent, &self.order_id, self.authorization_id.as_deref())
            .ok_or_else(|| CheckoutError::CaptureNotPermitted {
                order_id: self.order_id.clone(),
                reason: "order has not been authorized yet".to_string(),
            })
    }
}
