use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use checkout_core::{ProcessorError, ProcessorReply};
use checkout_order::CheckoutError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    /// A checkout step failed; `action` is the short message the browser sees
    /// when the failure is internal.
    Checkout {
        action: &'static str,
        error: CheckoutError,
    },
}

impl AppError {
    pub fn checkout(action: &'static str) -> impl FnOnce(CheckoutError) -> AppError {
        move |error| AppError::Checkout { action, error }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

/// Forwards a processor reply: same status, same JSON body.
pub fn relay(reply: ProcessorReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    if reply.body.is_null() {
        return status.into_response();
    }
    (status, Json(reply.body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Checkout { action, error } => match error {
                CheckoutError::Processor(ProcessorError::Upstream { status, body }) => {
                    tracing::warn!("{} Processor returned {}", action, status);
                    return relay(ProcessorReply::new(status, body));
                }
                CheckoutError::Processor(ProcessorError::Timeout) => {
                    tracing::error!("{} Processor timed out", action);
                    (StatusCode::GATEWAY_TIMEOUT, action.to_string())
                }
                CheckoutError::Processor(err) => {
                    tracing::error!("{} {}", action, err);
                    (StatusCode::INTERNAL_SERVER_ERROR, action.to_string())
                }
                CheckoutError::CaptureNotPermitted { order_id, reason } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Order {} cannot be captured: {}", order_id, reason),
                ),
                CheckoutError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            },
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: ProcessorError) -> StatusCode {
        AppError::checkout("Failed to create order.")(CheckoutError::Processor(error))
            .into_response()
            .status()
    }

    #[test]
    fn test_upstream_status_is_forwarded() {
        let status = status_of(ProcessorError::Upstream {
            status: 422,
            body: json!({ "name": "UNPROCESSABLE_ENTITY" }),
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_internal_failures_collapse_to_500() {
        assert_eq!(status_of(ProcessorError::CredentialsMissing), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(ProcessorError::AuthFailure { status: 401, body: String::new() }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(ProcessorError::Network("reset".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_of(ProcessorError::MalformedResponse("html".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        assert_eq!(status_of(ProcessorError::Timeout), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_capture_before_authorization() {
        let response = AppError::checkout("Failed to capture order.")(CheckoutError::CaptureNotPermitted {
            order_id: "ORDER1".into(),
            reason: "order has not been authorized yet".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_empty_reply_has_no_body() {
        let response = relay(ProcessorReply::new(204, serde_json::Value::Null));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
