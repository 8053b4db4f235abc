use axum::{
    extract::State,
    http::Method,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod orders;
pub mod shipping;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    // Checkout page(s) for everything that is not an API route
    let static_files = ServeDir::new(&state.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/config", get(client_config))
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/update-shipping", patch(shipping::update_shipping))
        .route("/api/orders/update-address", patch(shipping::update_address))
        .route("/api/orders/{order_id}", get(orders::get_order))
        .route("/api/orders/{order_id}/authorize", post(orders::authorize_order))
        .route("/api/orders/{order_id}/capture", post(orders::capture_order))
        .route("/api/orders/{order_id}/complete", post(orders::complete_card_payment))
        .route(
            "/api/authorizations/{authorization_id}/capture",
            post(orders::capture_authorization),
        )
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/config
/// Public identifiers the browser SDK is loaded with
async fn client_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "clientId": state.sdk.client_id,
        "merchantId": state.sdk.merchant_id,
    }))
}
