use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{relay, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShippingRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub selected_shipping_option: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[serde(rename = "orderID")]
    pub order_id: String,
    pub shipping_address: Value,
}

/// PATCH /api/orders/update-shipping
pub async fn update_shipping(
    State(state): State<AppState>,
    payload: Result<Json<UpdateShippingRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let reply = state
        .checkout
        .update_shipping_option(&req.order_id, req.selected_shipping_option)
        .await
        .map_err(AppError::checkout("Failed to update shipping option."))?;

    Ok(relay(reply))
}

/// PATCH /api/orders/update-address
pub async fn update_address(
    State(state): State<AppState>,
    payload: Result<Json<UpdateAddressRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    let reply = state
        .checkout
        .update_shipping_address(&req.order_id, req.shipping_address)
        .await
        .map_err(AppError::checkout("Failed to update shipping address."))?;

    Ok(relay(reply))
}
