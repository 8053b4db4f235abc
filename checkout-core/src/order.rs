//! Typed views over the processor's order representation.
//!
//! The processor owns these records. Only the fields this service branches on
//! are modelled; every nested level is optional so a missing field surfaces as
//! `None` instead of a lookup panic.

use serde::{Deserialize, Serialize};

use crate::checkout::Amount;

pub const INSTRUMENT_DECLINED: &str = "INSTRUMENT_DECLINED";

/// Longest order or authorization id accepted from a caller.
pub const MAX_RESOURCE_ID_LEN: usize = 64;

/// Processor order and authorization ids are short ASCII tokens such as
/// `5O190127TN364715T`. Anything else is refused before it can become part
/// of an outbound URL.
pub fn is_resource_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_RESOURCE_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderIntent {
    Capture,
    Authorize,
}

/// Order status in the processor lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Saved,
    Approved,
    Voided,
    Completed,
    PayerActionRequired,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub intent: Option<OrderIntent>,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
    #[serde(default)]
    pub payment_source: Option<PaymentSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseUnit {
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub shipping: Option<serde_json::Value>,
    #[serde(default)]
    pub payments: Option<Payments>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
    #[serde(default)]
    pub captures: Vec<Capture>,
}

/// A hold on funds, captured through its own id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Authorization {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capture {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSource {
    #[serde(default)]
    pub card: Option<CardSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardSource {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub last_digits: Option<String>,
    #[serde(default)]
    pub authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthenticationResult {
    #[serde(default)]
    pub liability_shift: Option<String>,
    #[serde(default)]
    pub three_d_secure: Option<ThreeDSecure>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreeDSecure {
    #[serde(default)]
    pub enrollment_status: Option<String>,
    #[serde(default)]
    pub authentication_status: Option<String>,
}

impl Order {
    fn payments(&self) -> impl Iterator<Item = &Payments> {
        self.purchase_units.iter().filter_map(|unit| unit.payments.as_ref())
    }

    pub fn first_authorization(&self) -> Option<&Authorization> {
        self.payments().flat_map(|p| p.authorizations.iter()).next()
    }

    pub fn first_capture(&self) -> Option<&Capture> {
        self.payments().flat_map(|p| p.captures.iter()).next()
    }

    pub fn authentication_result(&self) -> Option<&AuthenticationResult> {
        self.payment_source
            .as_ref()?
            .card
            .as_ref()?
            .authentication_result
            .as_ref()
    }

    pub fn three_d_secure(&self) -> Option<&ThreeDSecure> {
        self.authentication_result()?.three_d_secure.as_ref()
    }

    pub fn liability_shift(&self) -> Option<&str> {
        self.authentication_result()?.liability_shift.as_deref()
    }
}

/// Processor error payload (`name`, `details[]`, `debug_id`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorIssue {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub debug_id: Option<String>,
    #[serde(default)]
    pub details: Vec<IssueDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDetail {
    pub issue: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProcessorIssue {
    /// Reads an issue out of a response body. Returns `None` when the body
    /// carries no `details` entries.
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        let issue: ProcessorIssue = serde_json::from_value(body.clone()).ok()?;
        if issue.details.is_empty() {
            return None;
        }
        Some(issue)
    }

    pub fn first_issue(&self) -> Option<&str> {
        self.details.first().map(|d| d.issue.as_str())
    }

    pub fn description(&self) -> Option<&str> {
        self.details
            .first()
            .and_then(|d| d.description.as_deref())
            .or(self.message.as_deref())
    }

    pub fn is_instrument_declined(&self) -> bool {
        self.first_issue() == Some(INSTRUMENT_DECLINED)
    }
}
