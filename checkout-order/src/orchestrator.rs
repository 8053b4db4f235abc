use checkout_core::{
    is_resource_id, Amount, AuthorizeOutcome, CaptureDecision, CaptureTarget, Cart, CheckoutFlow,
    OrderIntent, OrderRequest, PatchOperation, PaymentProcessor, ProcessorReply, ThreeDsCheck,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{CardCaptureOutcome, CheckoutError, CheckoutResult};
use crate::session::CheckoutSession;

/// Refuses ids that could rewrite the processor URL they are placed in.
fn resource_id<'a>(kind: &str, id: &'a str) -> CheckoutResult<&'a str> {
    if is_resource_id(id) {
        Ok(id)
    } else {
        warn!("Refusing malformed {} id {:?}", kind, id);
        Err(CheckoutError::InvalidRequest(format!("Invalid {} id", kind)))
    }
}

/// Sequences processor calls for each checkout step. Holds no per-checkout
/// state; everything a step needs is either passed in or read back from the
/// processor.
pub struct CheckoutOrchestrator {
    processor: Arc<dyn PaymentProcessor>,
    amount: Amount,
}

impl CheckoutOrchestrator {
    pub fn new(processor: Arc<dyn PaymentProcessor>) -> Self {
        Self {
            processor,
            amount: Amount::demo(),
        }
    }

    pub async fn create_order(&self, flow: CheckoutFlow, cart: &Cart) -> CheckoutResult<ProcessorReply> {
        info!(?flow, items = cart.len(), "Creating order");
        let request = OrderRequest::for_flow(flow, self.amount.clone());
        Ok(self.processor.create_order(&request).await?)
    }

    pub async fn get_order(&self, order_id: &str) -> CheckoutResult<ProcessorReply> {
        let order_id = resource_id("order", order_id)?;
        Ok(self.processor.get_order(order_id).await?)
    }

    pub async fn authorize(&self, order_id: &str) -> CheckoutResult<AuthorizeOutcome> {
        let order_id = resource_id("order", order_id)?;
        let mut session = CheckoutSession::new(order_id, OrderIntent::Authorize);
        self.authorize_session(&mut session).await
    }

    /// Authorizes and records the authorization on the session.
    async fn authorize_session(&self, session: &mut CheckoutSession) -> CheckoutResult<AuthorizeOutcome> {
        let order_id = session.order_id().to_string();
        let outcome = AuthorizeOutcome::classify(self.processor.authorize_order(&order_id).await)?;

        match &outcome {
            AuthorizeOutcome::Authorized { authorization: Some(authorization), .. } => {
                info!("Order {} authorized as {}", order_id, authorization.id);
                session.record_authorization(authorization)?;
            }
            AuthorizeOutcome::Authorized { authorization: None, reply } => {
                // Funds are held; the page still gets the processor reply
                warn!(status = reply.status, "Order {} authorized without a readable authorization", order_id);
            }
            AuthorizeOutcome::Restart { .. } => {
                warn!("Instrument declined for order {}, payer must restart", order_id);
            }
            AuthorizeOutcome::Rejected { issue, .. } => {
                warn!(
                    issue = issue.first_issue().unwrap_or("unknown"),
                    debug_id = issue.debug_id.as_deref().unwrap_or(""),
                    "Authorization rejected for order {}",
                    order_id
                );
            }
        }

        Ok(outcome)
    }

    pub async fn capture_session(&self, session: &CheckoutSession) -> CheckoutResult<ProcessorReply> {
        let target = session.capture_target()?;
        info!(capture_target = ?target, "Capturing order {}", session.order_id());
        Ok(self.processor.capture(&target).await?)
    }

    /// Captures an order after reading its intent back from the processor, so
    /// an AUTHORIZE order is always captured through its authorization.
    pub async fn capture_order(&self, order_id: &str) -> CheckoutResult<ProcessorReply> {
        let order_id = resource_id("order", order_id)?;
        let order = self.processor.get_order(order_id).await?.order()?;
        let session = CheckoutSession::from_order(&order);
        self.capture_session(&session).await
    }

    pub async fn capture_authorization(&self, authorization_id: &str) -> CheckoutResult<ProcessorReply> {
        let authorization_id = resource_id("authorization", authorization_id)?;
        info!("Capturing authorization {}", authorization_id);
        let target = CaptureTarget::Authorization(authorization_id.to_string());
        Ok(self.processor.capture(&target).await?)
    }

    /// Hosted-card completion: inspects the 3-D Secure result and captures
    /// only when liability shifted and the payer enrolled and authenticated.
    pub async fn complete_card_payment(
        &self,
        order_id: &str,
        reported_shift: Option<&str>,
    ) -> CheckoutResult<CardCaptureOutcome> {
        let order_id = resource_id("order", order_id)?;
        let order = self.processor.get_order(order_id).await?.order()?;
        let check = ThreeDsCheck::from_order(&order, reported_shift);

        match check.decide() {
            CaptureDecision::Withhold { reason } => {
                info!("Order {} not captured: {}", order_id, reason);
                Ok(CardCaptureOutcome::Withheld { check, reason })
            }
            CaptureDecision::Capture => {
                let session = CheckoutSession::from_order(&order);
                let reply = self.capture_session(&session).await?;

                // Capture is committed at this point; an unreadable reply only loses detail
                let transaction_id = reply.body.get("id").and_then(Value::as_str).map(str::to_string);
                let capture_status = match reply.order() {
                    Ok(captured) => captured.first_capture().and_then(|c| c.status.clone()),
                    Err(e) => {
                        warn!("Order {} captured but the reply was unreadable: {}", order_id, e);
                        None
                    }
                };
                info!(
                    capture_status = capture_status.as_deref().unwrap_or("unknown"),
                    "Order {} captured",
                    transaction_id.as_deref().unwrap_or(order_id)
                );
                Ok(CardCaptureOutcome::Captured {
                    check,
                    transaction_id,
                    capture_status,
                    reply,
                })
            }
        }
    }

    pub async fn update_shipping_option(&self, order_id: &str, option: Value) -> CheckoutResult<ProcessorReply> {
        let order_id = resource_id("order", order_id)?;
        let patch = [PatchOperation::shipping_option(option)];
        Ok(self.processor.update_order(order_id, &patch).await?)
    }

    pub async fn update_shipping_address(&self, order_id: &str, address: Value) -> CheckoutResult<ProcessorReply> {
        let order_id = resource_id("order", order_id)?;
        let patch = [PatchOperation::shipping_address(address)];
        Ok(self.processor.update_order(order_id, &patch).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckoutError;
    use async_trait::async_trait;
    use checkout_core::{CoreResult, OrderIntent, ProcessorError};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(OrderRequest),
        Authorize(String),
        Capture(CaptureTarget),
        Get(String),
        Update(String, Vec<PatchOperation>),
    }

    /// Records every call and answers from canned order bodies.
    #[derive(Default)]
    struct RecordingProcessor {
        calls: Mutex<Vec<Call>>,
        orders: HashMap<String, Value>,
        authorize_result: Option<Result<Value, (u16, Value)>>,
        capture_body: Option<Value>,
    }

    impl RecordingProcessor {
        fn with_order(mut self, body: Value) -> Self {
            let id = body["id"].as_str().unwrap().to_string();
            self.orders.insert(id, body);
            self
        }

        fn with_authorize(mut self, result: Result<Value, (u16, Value)>) -> Self {
            self.authorize_result = Some(result);
            self
        }

        fn with_capture_body(mut self, body: Value) -> Self {
            self.capture_body = Some(body);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn captures(&self) -> Vec<CaptureTarget> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Capture(target) => Some(target),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl PaymentProcessor for RecordingProcessor {
        async fn create_order(&self, request: &OrderRequest) -> CoreResult<ProcessorReply> {
            self.record(Call::Create(request.clone()));
            Ok(ProcessorReply::new(201, json!({ "id": "ORDER1", "status": "CREATED" })))
        }

        async fn authorize_order(&self, order_id: &str) -> CoreResult<ProcessorReply> {
            self.record(Call::Authorize(order_id.to_string()));
            match self.authorize_result.clone() {
                Some(Ok(body)) => Ok(ProcessorReply::new(201, body)),
                Some(Err((status, body))) => Err(ProcessorError::Upstream { status, body }),
                None => Err(ProcessorError::Network("no canned authorize".into())),
            }
        }

        async fn capture(&self, target: &CaptureTarget) -> CoreResult<ProcessorReply> {
            self.record(Call::Capture(target.clone()));
            if let Some(body) = self.capture_body.clone() {
                return Ok(ProcessorReply::new(201, body));
            }
            let body = match target {
                CaptureTarget::Order(id) => json!({
                    "id": id,
                    "status": "COMPLETED",
                    "purchase_units": [{ "payments": { "captures": [{ "id": "CAP1", "status": "COMPLETED" }] } }]
                }),
                CaptureTarget::Authorization(_) => json!({ "id": "CAP1", "status": "COMPLETED" }),
            };
            Ok(ProcessorReply::new(201, body))
        }

        async fn get_order(&self, order_id: &str) -> CoreResult<ProcessorReply> {
            self.record(Call::Get(order_id.to_string()));
            self.orders
                .get(order_id)
                .cloned()
                .map(|body| ProcessorReply::new(200, body))
                .ok_or_else(|| ProcessorError::Upstream {
                    status: 404,
                    body: json!({ "name": "RESOURCE_NOT_FOUND" }),
                })
        }

        async fn update_order(&self, order_id: &str, operations: &[PatchOperation]) -> CoreResult<ProcessorReply> {
            self.record(Call::Update(order_id.to_string(), operations.to_vec()));
            Ok(ProcessorReply::new(204, Value::Null))
        }
    }

    fn card_order(shift: &str, enrollment: &str, authentication: &str) -> Value {
        json!({
            "id": "CARD1",
            "intent": "CAPTURE",
            "status": "APPROVED",
            "payment_source": { "card": { "authentication_result": {
                "liability_shift": shift,
                "three_d_secure": { "enrollment_status": enrollment, "authentication_status": authentication }
            }}}
        })
    }

    #[tokio::test]
    async fn test_create_order_sends_one_create() {
        let processor = Arc::new(RecordingProcessor::default());
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        let cart: Cart = serde_json::from_value(json!([{ "id": "1", "quantity": "1" }])).unwrap();
        let reply = orchestrator.create_order(CheckoutFlow::AuthorizeCapture, &cart).await.unwrap();

        assert_eq!(reply.order().unwrap().id, "ORDER1");
        let calls = processor.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            Call::Create(request) => assert_eq!(request.intent, OrderIntent::Authorize),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_three_ds_pass_captures_order() {
        let processor = Arc::new(RecordingProcessor::default().with_order(card_order("POSSIBLE", "Y", "Y")));
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        let outcome = orchestrator.complete_card_payment("CARD1", None).await.unwrap();

        assert!(outcome.is_captured());
        assert_eq!(processor.captures(), vec![CaptureTarget::Order("CARD1".into())]);
        let summary = outcome.summary();
        assert_eq!(summary.transaction_id.as_deref(), Some("CARD1"));
        assert_eq!(summary.capture_status.as_deref(), Some("COMPLETED"));
    }

    #[tokio::test]
    async fn test_three_ds_failures_never_capture() {
        for (shift, enrollment, authentication) in [
            ("NO", "Y", "Y"),
            ("POSSIBLE", "N", "Y"),
            ("POSSIBLE", "Y", "N"),
            ("UNKNOWN", "U", "U"),
        ] {
            let processor = Arc::new(
                RecordingProcessor::default().with_order(card_order(shift, enrollment, authentication)),
            );
            let orchestrator = CheckoutOrchestrator::new(processor.clone());

            let outcome = orchestrator.complete_card_payment("CARD1", Some("POSSIBLE")).await.unwrap();

            assert!(!outcome.is_captured());
            assert!(outcome.summary().reason.is_some());
            assert!(processor.captures().is_empty());
        }
    }

    #[tokio::test]
    async fn test_authorize_intent_captures_authorization() {
        let processor = Arc::new(RecordingProcessor::default().with_order(json!({
            "id": "ORDER7",
            "intent": "AUTHORIZE",
            "status": "COMPLETED",
            "purchase_units": [{ "payments": { "authorizations": [{ "id": "AUTH7" }] } }]
        })));
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        orchestrator.capture_order("ORDER7").await.unwrap();

        assert_eq!(processor.captures(), vec![CaptureTarget::Authorization("AUTH7".into())]);
    }

    #[tokio::test]
    async fn test_capture_intent_captures_order() {
        let processor = Arc::new(
            RecordingProcessor::default().with_order(json!({ "id": "ORDER8", "intent": "CAPTURE", "status": "APPROVED" })),
        );
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        orchestrator.capture_order("ORDER8").await.unwrap();

        assert_eq!(processor.captures(), vec![CaptureTarget::Order("ORDER8".into())]);
    }

    #[tokio::test]
    async fn test_unauthorized_authorize_order_is_not_captured() {
        let processor = Arc::new(
            RecordingProcessor::default().with_order(json!({ "id": "ORDER9", "intent": "AUTHORIZE", "status": "APPROVED" })),
        );
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        let err = orchestrator.capture_order("ORDER9").await.unwrap_err();

        assert!(matches!(err, CheckoutError::CaptureNotPermitted { .. }));
        assert!(processor.captures().is_empty());
    }

    #[tokio::test]
    async fn test_declined_authorization_signals_restart() {
        let processor = Arc::new(RecordingProcessor::default().with_authorize(Err((
            422,
            json!({ "name": "UNPROCESSABLE_ENTITY", "details": [{ "issue": "INSTRUMENT_DECLINED" }] }),
        ))));
        let orchestrator = CheckoutOrchestrator::new(processor.clone());
        let mut session = CheckoutSession::new("ORDER1", OrderIntent::Authorize);

        let outcome = orchestrator.authorize_session(&mut session).await.unwrap();

        assert!(matches!(outcome, AuthorizeOutcome::Restart { .. }));
        assert!(session.authorization_id().is_none());
    }

    #[tokio::test]
    async fn test_authorize_then_capture_session() {
        let processor = Arc::new(RecordingProcessor::default().with_authorize(Ok(json!({
            "id": "ORDER1",
            "status": "COMPLETED",
            "purchase_units": [{ "payments": { "authorizations": [{ "id": "AUTH1", "status": "CREATED" }] } }]
        }))));
        let orchestrator = CheckoutOrchestrator::new(processor.clone());
        let mut session = CheckoutSession::new("ORDER1", OrderIntent::Authorize);

        orchestrator.authorize_session(&mut session).await.unwrap();
        assert_eq!(session.authorization_id(), Some("AUTH1"));

        let reply = orchestrator.capture_session(&session).await.unwrap();
        assert_eq!(reply.capture().unwrap().id, "CAP1");
        assert_eq!(processor.captures(), vec![CaptureTarget::Authorization("AUTH1".into())]);
    }

    #[tokio::test]
    async fn test_shipping_updates_patch_default_unit() {
        let processor = Arc::new(RecordingProcessor::default());
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        orchestrator
            .update_shipping_address("ORDER1", json!({ "country_code": "GB" }))
            .await
            .unwrap();

        match &processor.calls()[0] {
            Call::Update(order_id, ops) => {
                assert_eq!(order_id, "ORDER1");
                assert_eq!(ops[0].path, "/purchase_units/@reference_id=='default'/shipping/address");
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreadable_capture_reply_still_reports_capture() {
        let processor = Arc::new(
            RecordingProcessor::default()
                .with_order(card_order("POSSIBLE", "Y", "Y"))
                .with_capture_body(json!({ "status": "COMPLETED", "purchase_units": "unexpected" })),
        );
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        let outcome = orchestrator.complete_card_payment("CARD1", None).await.unwrap();

        assert!(outcome.is_captured());
        let summary = outcome.summary();
        assert!(summary.transaction_id.is_none());
        assert!(summary.capture_status.is_none());
        assert_eq!(processor.captures().len(), 1);
    }

    #[tokio::test]
    async fn test_authorized_reply_without_authorization_is_relayed() {
        let processor = Arc::new(
            RecordingProcessor::default().with_authorize(Ok(json!({ "id": "ORDER1", "status": "COMPLETED" }))),
        );
        let orchestrator = CheckoutOrchestrator::new(processor.clone());

        match orchestrator.authorize("ORDER1").await.unwrap() {
            AuthorizeOutcome::Authorized { authorization, reply } => {
                assert!(authorization.is_none());
                assert_eq!(reply.status, 201);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_ids_never_reach_processor() {
        let processor = Arc::new(RecordingProcessor::default());
        let orchestrator = CheckoutOrchestrator::new(processor.clone());
        let hostile = "../captures/CAP1/refund?";

        assert!(matches!(orchestrator.get_order(hostile).await, Err(CheckoutError::InvalidRequest(_))));
        assert!(matches!(orchestrator.authorize(hostile).await, Err(CheckoutError::InvalidRequest(_))));
        assert!(matches!(orchestrator.capture_order(hostile).await, Err(CheckoutError::InvalidRequest(_))));
        assert!(matches!(
            orchestrator.capture_authorization(hostile).await,
            Err(CheckoutError::InvalidRequest(_))
        ));
        assert!(matches!(
            orchestrator.complete_card_payment(hostile, None).await,
            Err(CheckoutError::InvalidRequest(_))
        ));
        assert!(matches!(
            orchestrator.update_shipping_address("ORDER1/../..", json!({})).await,
            Err(CheckoutError::InvalidRequest(_))
        ));
        assert!(processor.calls().is_empty());
    }
}
