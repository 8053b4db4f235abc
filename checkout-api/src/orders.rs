use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use checkout_core::{AuthorizeOutcome, Cart, CheckoutFlow};
use serde::Deserialize;
use serde_json::json;

use crate::error::{relay, AppError};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub cart: Cart,
    /// `button`, `advancedCC`, `authorizeCapture` or `shipping`
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub save_card: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteCardRequest {
    /// Liability shift as reported by the card-fields SDK
    #[serde(default)]
    pub liability_shift: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/orders
/// Create an order for the requested checkout flow
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let flow = CheckoutFlow::from_task(req.task.as_deref(), req.save_card).ok_or_else(|| {
        AppError::ValidationError(format!(
            "Unknown checkout task: {}",
            req.task.as_deref().unwrap_or_default()
        ))
    })?;

    let reply = state
        .checkout
        .create_order(flow, &req.cart)
        .await
        .map_err(AppError::checkout("Failed to create order."))?;

    if reply.status != StatusCode::CREATED.as_u16() {
        return Ok(relay(reply));
    }

    let order = reply
        .order()
        .map_err(|e| AppError::checkout("Failed to create order.")(e.into()))?;

    Ok((StatusCode::CREATED, Json(json!({ "orderID": order.id }))).into_response())
}

/// GET /api/orders/:order_id
/// Current order details, including the 3-D Secure challenge result
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Response, AppError> {
    let reply = state
        .checkout
        .get_order(&order_id)
        .await
        .map_err(AppError::checkout("Failed to fetch order."))?;

    Ok(relay(reply))
}

/// POST /api/orders/:order_id/authorize
pub async fn authorize_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Response, AppError> {
    let outcome = state
        .checkout
        .authorize(&order_id)
        .await
        .map_err(AppError::checkout("Failed to authorize order."))?;

    let response = match outcome {
        // 200 so the browser reads `details[0].issue` and restarts the approval
        AuthorizeOutcome::Restart { reply } => (StatusCode::OK, Json(reply.body)).into_response(),
        AuthorizeOutcome::Authorized { reply, .. } | AuthorizeOutcome::Rejected { reply, .. } => {
            relay(reply)
        }
    };

    Ok(response)
}

/// POST /api/orders/:order_id/capture
/// Capture by order id or by authorization id, depending on the order intent
pub async fn capture_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Response, AppError> {
    tracing::info!("Attempting to capture order {}", order_id);

    let reply = state
        .checkout
        .capture_order(&order_id)
        .await
        .map_err(AppError::checkout("Failed to capture order."))?;

    Ok(relay(reply))
}

/// POST /api/authorizations/:authorization_id/capture
pub async fn capture_authorization(
    State(state): State<AppState>,
    Path(authorization_id): Path<String>,
) -> Result<Response, AppError> {
    let reply = state
        .checkout
        .capture_authorization(&authorization_id)
        .await
        .map_err(AppError::checkout("Failed to capture authorization."))?;

    Ok(relay(reply))
}

/// POST /api/orders/:order_id/complete
/// Hosted-card completion: captures only when 3-D Secure passed
pub async fn complete_card_payment(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let req: CompleteCardRequest = if body.is_empty() {
        CompleteCardRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::ValidationError(format!("Invalid request body: {}", e)))?
    };

    let outcome = state
        .checkout
        .complete_card_payment(&order_id, req.liability_shift.as_deref())
        .await
        .map_err(AppError::checkout("Failed to complete card payment."))?;

    Ok((StatusCode::OK, Json(outcome.summary())).into_response())
}
