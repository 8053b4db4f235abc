use checkout_core::{ProcessorError, ProcessorReply, ThreeDsCheck};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("Order {order_id} cannot be captured: {reason}")]
    CaptureNotPermitted { order_id: String, reason: String },

    #[error("Invalid checkout request: {0}")]
    InvalidRequest(String),
}

pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Result of the hosted-card completion step.
#[derive(Debug, Clone)]
pub enum CardCaptureOutcome {
    /// 3-D Secure passed and the order was captured
    Captured {
        check: ThreeDsCheck,
        /// Processor id from the capture reply, when it could be read
        transaction_id: Option<String>,
        capture_status: Option<String>,
        reply: ProcessorReply,
    },
    /// The order stays approved; nothing was captured
    Withheld { check: ThreeDsCheck, reason: String },
}

/// What the browser gets back from the completion step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCaptureSummary {
    pub captured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub three_d_secure: ThreeDsCheck,
}

impl CardCaptureOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, CardCaptureOutcome::Captured { .. })
    }

    pub fn summary(&self) -> CardCaptureSummary {
        match self {
            CardCaptureOutcome::Captured { check, transaction_id, capture_status, .. } => {
                CardCaptureSummary {
                    captured: true,
                    transaction_id: transaction_id.clone(),
                    capture_status: capture_status.clone(),
                    reason: None,
                    three_d_secure: check.clone(),
                }
            }
            CardCaptureOutcome::Withheld { check, reason } => CardCaptureSummary {
                captured: false,
                transaction_id: None,
                capture_status: None,
                reason: Some(reason.clone()),
                three_d_secure: check.clone(),
            },
        }
    }
}
