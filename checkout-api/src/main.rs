use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use checkout_api::{app, AppState};
use checkout_infra::{Config, PayPalClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "checkout_api=debug,checkout_order=debug,checkout_infra=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting checkout proxy on port {}", config.server.port);

    if !config.paypal.has_credentials() {
        tracing::warn!("PAYPAL_CLIENT_ID / PAYPAL_CLIENT_SECRET are not set; processor calls will fail");
    }

    let client = PayPalClient::new(&config.paypal).context("Failed to create processor client")?;
    tracing::info!(
        base_url = client.base_url(),
        token_policy = ?client.tokens().policy(),
        "Processor client ready"
    );

    let app = app(AppState::new(Arc::new(client), &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on http://localhost:{}/", config.server.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
