use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::order::OrderIntent;

/// Reference id every purchase unit is created with; shipping patches target it.
pub const DEFAULT_REFERENCE_ID: &str = "default";

pub const RETURN_URL: &str = "https://example.com/returnUrl";
pub const CANCEL_URL: &str = "https://example.com/cancelUrl";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Amount {
    pub currency_code: String,
    pub value: String,
}

impl Amount {
    pub fn new(currency_code: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            currency_code: currency_code.into(),
            value: value.into(),
        }
    }

    /// The fixed amount every demo checkout charges.
    pub fn demo() -> Self {
        Self::new("GBP", "10.00")
    }
}

/// A cart line as the page sends it. Never priced, so both fields take any
/// JSON (`"1"` and `1` are both seen for quantities).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub quantity: Value,
}

/// Items forwarded by the browser. The cart is logged but not priced.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Cart(pub Vec<CartItem>);

impl Cart {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Checkout flows the browser can start. Each selects the order intent and
/// the `payment_source` block sent with the create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutFlow {
    /// Wallet button, captured on approval, payer vaulted on success.
    Button,
    /// Hosted card fields with SCA; vaults the card when `save_card`.
    AdvancedCard { save_card: bool },
    /// Authorize first, capture the authorization later.
    AuthorizeCapture,
    /// Wallet button that collects the payer's shipping address.
    Shipping,
}

impl CheckoutFlow {
    /// Maps the browser's `task` field to a flow. A missing task selects the
    /// authorize-then-capture flow.
    pub fn from_task(task: Option<&str>, save_card: bool) -> Option<Self> {
        match task {
            None | Some("authorizeCapture") | Some("authcap") => Some(CheckoutFlow::AuthorizeCapture),
            Some("button") => Some(CheckoutFlow::Button),
            Some("advancedCC") => Some(CheckoutFlow::AdvancedCard { save_card }),
            Some("shipping") => Some(CheckoutFlow::Shipping),
            Some(_) => None,
        }
    }

    pub fn intent(&self) -> OrderIntent {
        match self {
            CheckoutFlow::AuthorizeCapture => OrderIntent::Authorize,
            CheckoutFlow::Button | CheckoutFlow::AdvancedCard { .. } | CheckoutFlow::Shipping => {
                OrderIntent::Capture
            }
        }
    }

    fn payment_source(&self) -> Option<Value> {
        match self {
            CheckoutFlow::Button => Some(json!({
                "paypal": {
                    "experience_context": {
                        "shipping_preference": "NO_SHIPPING",
                        "return_url": RETURN_URL,
                        "cancel_url": CANCEL_URL,
                    },
                    "attributes": {
                        "vault": {
                            "store_in_vault": "ON_SUCCESS",
                            "usage_type": "MERCHANT",
                            "customer_type": "CONSUMER",
                        }
                    }
                }
            })),
            CheckoutFlow::AdvancedCard { save_card } => {
                let mut attributes = json!({ "verification": { "method": "SCA_ALWAYS" } });
                if *save_card {
                    attributes["vault"] = json!({ "store_in_vault": "ON_SUCCESS" });
                }
                Some(json!({ "card": { "attributes": attributes } }))
            }
            CheckoutFlow::Shipping => Some(json!({
                "paypal": {
                    "experience_context": {
                        "shipping_preference": "GET_FROM_FILE",
                        "user_action": "PAY_NOW",
                        "return_url": RETURN_URL,
                        "cancel_url": CANCEL_URL,
                    }
                }
            })),
            CheckoutFlow::AuthorizeCapture => None,
        }
    }

    /// Shipping offered up front so the payer's pick can later be patched in.
    fn shipping(&self) -> Option<Value> {
        match self {
            CheckoutFlow::Shipping => Some(json!({ "options": default_shipping_options() })),
            _ => None,
        }
    }
}

/// Options the shipping flow starts with; standard delivery is preselected.
pub fn default_shipping_options() -> Value {
    json!([
        {
            "id": "SHIP_STANDARD",
            "label": "Standard Shipping",
            "type": "SHIPPING",
            "selected": true,
            "amount": { "currency_code": "GBP", "value": "0.00" }
        },
        {
            "id": "PICKUP_IN_STORE",
            "label": "Pick up in store",
            "type": "PICKUP",
            "selected": false,
            "amount": { "currency_code": "GBP", "value": "0.00" }
        }
    ])
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseUnitRequest {
    pub reference_id: String,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Value>,
}

/// Body of the processor's create-order call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderRequest {
    pub intent: OrderIntent,
    pub purchase_units: Vec<PurchaseUnitRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_source: Option<Value>,
}

impl OrderRequest {
    pub fn for_flow(flow: CheckoutFlow, amount: Amount) -> Self {
        Self {
            intent: flow.intent(),
            purchase_units: vec![PurchaseUnitRequest {
                reference_id: DEFAULT_REFERENCE_ID.to_string(),
                amount,
                shipping: flow.shipping(),
            }],
            payment_source: flow.payment_source(),
        }
    }
}
