use async_trait::async_trait;
use serde_json::Value;

use crate::capture::CaptureTarget;
use crate::checkout::OrderRequest;
use crate::order::{Authorization, Capture, Order, ProcessorIssue};
use crate::patch::PatchOperation;
use crate::{CoreResult, ProcessorError};

/// A successful processor response: HTTP status plus the raw JSON body
/// (`Null` when the processor sent none, e.g. 204 on PATCH).
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorReply {
    pub status: u16,
    pub body: Value,
}

impl ProcessorReply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn order(&self) -> CoreResult<Order> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ProcessorError::MalformedResponse(format!("order body: {}", e)))
    }

    /// Body of an authorization capture, which is a bare capture record.
    pub fn capture(&self) -> CoreResult<Capture> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| ProcessorError::MalformedResponse(format!("capture body: {}", e)))
    }
}

/// The processor's order and payments API, one outbound operation per method.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create an order; the body shape comes from the checkout flow
    async fn create_order(&self, request: &OrderRequest) -> CoreResult<ProcessorReply>;

    /// Authorize an approved AUTHORIZE-intent order
    async fn authorize_order(&self, order_id: &str) -> CoreResult<ProcessorReply>;

    /// Capture an order or an authorization
    async fn capture(&self, target: &CaptureTarget) -> CoreResult<ProcessorReply>;

    /// Fetch current order details
    async fn get_order(&self, order_id: &str) -> CoreResult<ProcessorReply>;

    /// Apply JSON-patch operations to an order
    async fn update_order(
        &self,
        order_id: &str,
        operations: &[PatchOperation],
    ) -> CoreResult<ProcessorReply>;
}

/// Result of an authorize call as the checkout sees it.
#[derive(Debug, Clone)]
pub enum AuthorizeOutcome {
    /// Funds are held. `authorization` is `None` when the processor's
    /// success body could not be read as an order with an authorization.
    Authorized {
        authorization: Option<Authorization>,
        reply: ProcessorReply,
    },
    /// The payer's instrument was declined; the browser should restart the
    /// approval so the payer can pick another one.
    Restart { reply: ProcessorReply },
    /// Any other processor-reported issue. Fatal to this attempt.
    Rejected {
        issue: ProcessorIssue,
        reply: ProcessorReply,
    },
}

impl AuthorizeOutcome {
    pub fn classify(result: CoreResult<ProcessorReply>) -> CoreResult<Self> {
        let reply = match result {
            Ok(reply) => reply,
            Err(ProcessorError::Upstream { status, body }) => match ProcessorIssue::from_body(&body) {
                Some(issue) => return Ok(Self::from_issue(issue, ProcessorReply::new(status, body))),
                None => return Err(ProcessorError::Upstream { status, body }),
            },
            Err(e) => return Err(e),
        };

        if let Some(issue) = ProcessorIssue::from_body(&reply.body) {
            return Ok(Self::from_issue(issue, reply));
        }

        let authorization = reply
            .order()
            .ok()
            .and_then(|order| order.first_authorization().cloned());

        Ok(AuthorizeOutcome::Authorized { authorization, reply })
    }

    fn from_issue(issue: ProcessorIssue, reply: ProcessorReply) -> Self {
        if issue.is_instrument_declined() {
            AuthorizeOutcome::Restart { reply }
        } else {
            AuthorizeOutcome::Rejected { issue, reply }
        }
    }

    pub fn reply(&self) -> &ProcessorReply {
        match self {
            AuthorizeOutcome::Authorized { reply, .. }
            | AuthorizeOutcome::Restart { reply }
            | AuthorizeOutcome::Rejected { reply, .. } => reply,
        }
    }
}
