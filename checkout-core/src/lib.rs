pub mod capture;
pub mod checkout;
pub mod order;
pub mod patch;
pub mod payment;
pub mod token;

pub use capture::{CaptureDecision, CaptureTarget, ThreeDsCheck};
pub use checkout::{Amount, Cart, CartItem, CheckoutFlow, OrderRequest};
pub use order::{is_resource_id, Authorization, Capture, Order, OrderIntent, OrderStatus, ProcessorIssue};
pub use patch::{PatchOp, PatchOperation};
pub use payment::{AuthorizeOutcome, PaymentProcessor, ProcessorReply};
pub use token::AccessToken;

/// Failures talking to the payment processor.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Processor credentials are not configured")]
    CredentialsMissing,
    #[error("Token exchange rejected with status {status}")]
    AuthFailure { status: u16, body: String },
    #[error("Processor rejected the request with status {status}")]
    Upstream { status: u16, body: serde_json::Value },
    #[error("Network failure: {0}")]
    Network(String),
    #[error("Processor call timed out")]
    Timeout,
    #[error("Malformed processor response: {0}")]
    MalformedResponse(String),
}

impl ProcessorError {
    /// Transient failures a caller could safely try again. Nothing in this
    /// workspace retries; the flag only drives logging and status mapping.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProcessorError::Network(_) | ProcessorError::Timeout)
    }
}

pub type CoreResult<T> = Result<T, ProcessorError>;
