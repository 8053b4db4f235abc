use serde::Serialize;

use crate::order::{Order, OrderIntent};

pub const LIABILITY_SHIFT_POSSIBLE: &str = "POSSIBLE";
pub const THREE_DS_YES: &str = "Y";

/// What a capture call is aimed at. CAPTURE-intent orders are captured by
/// order id, AUTHORIZE-intent orders only through their authorization id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Order(String),
    Authorization(String),
}

impl CaptureTarget {
    /// Returns `None` for an AUTHORIZE intent with no authorization yet.
    pub fn for_intent(
        intent: OrderIntent,
        order_id: &str,
        authorization_id: Option<&str>,
    ) -> Option<Self> {
        match intent {
            OrderIntent::Capture => Some(CaptureTarget::Order(order_id.to_string())),
            OrderIntent::Authorize => {
                authorization_id.map(|id| CaptureTarget::Authorization(id.to_string()))
            }
        }
    }

    /// Resolves the target from a fetched order. An order without an intent
    /// is treated as CAPTURE, the processor's only other mode.
    pub fn for_order(order: &Order) -> Option<Self> {
        let intent = order.intent.unwrap_or(OrderIntent::Capture);
        let authorization_id = order.first_authorization().map(|a| a.id.as_str());
        Self::for_intent(intent, &order.id, authorization_id)
    }

    pub fn id(&self) -> &str {
        match self {
            CaptureTarget::Order(id) | CaptureTarget::Authorization(id) => id,
        }
    }
}

/// 3-D Secure fields that gate capture in the hosted-card flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDsCheck {
    pub liability_shift: Option<String>,
    pub enrollment_status: Option<String>,
    pub authentication_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureDecision {
    Capture,
    Withhold { reason: String },
}

impl ThreeDsCheck {
    /// Reads the challenge result from an order. The processor's liability
    /// shift wins; `reported_shift` (from the browser SDK) fills the gap when
    /// the order does not carry one.
    pub fn from_order(order: &Order, reported_shift: Option<&str>) -> Self {
        let tds = order.three_d_secure();
        Self {
            liability_shift: order.liability_shift().or(reported_shift).map(str::to_string),
            enrollment_status: tds.and_then(|t| t.enrollment_status.clone()),
            authentication_status: tds.and_then(|t| t.authentication_status.clone()),
        }
    }

    pub fn decide(&self) -> CaptureDecision {
        let shift_ok = self.liability_shift.as_deref() == Some(LIABILITY_SHIFT_POSSIBLE);
        let enrolled = self.enrollment_status.as_deref() == Some(THREE_DS_YES);
        let authenticated = self.authentication_status.as_deref() == Some(THREE_DS_YES);

        if shift_ok && enrolled && authenticated {
            return CaptureDecision::Capture;
        }

        CaptureDecision::Withhold {
            reason: format!(
                "capture conditions not met (liability_shift={}, enrollment_status={}, authentication_status={})",
                self.liability_shift.as_deref().unwrap_or("none"),
                self.enrollment_status.as_deref().unwrap_or("none"),
                self.authentication_status.as_deref().unwrap_or("none"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(shift: Option<&str>, enrollment: Option<&str>, auth: Option<&str>) -> ThreeDsCheck {
        ThreeDsCheck {
            liability_shift: shift.map(str::to_string),
            enrollment_status: enrollment.map(str::to_string),
            authentication_status: auth.map(str::to_string),
        }
    }

    #[test]
    fn test_only_full_match_captures() {
        assert_eq!(check(Some("POSSIBLE"), Some("Y"), Some("Y")).decide(), CaptureDecision::Capture);

        let shifts = [Some("POSSIBLE"), Some("NO"), Some("UNKNOWN"), None];
        let flags = [Some("Y"), Some("N"), Some("U"), None];
        for shift in shifts {
            for enrollment in flags {
                for auth in flags {
                    let expected_capture =
                        shift == Some("POSSIBLE") && enrollment == Some("Y") && auth == Some("Y");
                    let decision = check(shift, enrollment, auth).decide();
                    assert_eq!(decision == CaptureDecision::Capture, expected_capture);
                }
            }
        }
    }

    #[test]
    fn test_capture_target_by_intent() {
        assert_eq!(
            CaptureTarget::for_intent(OrderIntent::Capture, "ORDER1", Some("AUTH1")),
            Some(CaptureTarget::Order("ORDER1".into()))
        );
        assert_eq!(
            CaptureTarget::for_intent(OrderIntent::Authorize, "ORDER1", Some("AUTH1")),
            Some(CaptureTarget::Authorization("AUTH1".into()))
        );
        assert_eq!(CaptureTarget::for_intent(OrderIntent::Authorize, "ORDER1", None), None);
    }

    #[test]
    fn test_capture_target_from_order() {
        let order: Order = serde_json::from_value(json!({
            "id": "ORDER9",
            "intent": "AUTHORIZE",
            "purchase_units": [{ "payments": { "authorizations": [{ "id": "AUTH9" }] } }]
        }))
        .unwrap();
        assert_eq!(CaptureTarget::for_order(&order), Some(CaptureTarget::Authorization("AUTH9".into())));
    }

    #[test]
    fn test_reported_shift_is_fallback_only() {
        let order: Order = serde_json::from_value(json!({
            "id": "ORDER3",
            "payment_source": { "card": { "authentication_result": {
                "liability_shift": "NO",
                "three_d_secure": { "enrollment_status": "Y", "authentication_status": "Y" }
            }}}
        }))
        .unwrap();
        let check = ThreeDsCheck::from_order(&order, Some("POSSIBLE"));
        assert_eq!(check.liability_shift.as_deref(), Some("NO"));
        assert!(matches!(check.decide(), CaptureDecision::Withhold { .. }));

        let bare: Order = serde_json::from_value(json!({ "id": "ORDER4" })).unwrap();
        let check = ThreeDsCheck::from_order(&bare, Some("POSSIBLE"));
        assert_eq!(check.liability_shift.as_deref(), Some("POSSIBLE"));
        assert!(matches!(check.decide(), CaptureDecision::Withhold { .. }));
    }
}
