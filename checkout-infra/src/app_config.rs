use checkout_shared::Masked;
use serde::Deserialize;
use std::env;

pub const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paypal: PayPalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Checkout page directory, resolved against the working directory.
    /// `config/default.toml` points it at `checkout-api/public` for runs
    /// from the workspace root.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_port() -> u16 { 8888 }
fn default_static_dir() -> String { "public".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct PayPalConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<Masked<String>>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reuse access tokens until shortly before they expire instead of
    /// exchanging credentials on every call.
    #[serde(default)]
    pub cache_tokens: bool,
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            merchant_id: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            cache_tokens: false,
        }
    }
}

fn default_base_url() -> String { SANDBOX_BASE_URL.to_string() }
fn default_timeout_secs() -> u64 { 15 }

impl PayPalConfig {
    pub fn with_credentials(mut self, client_id: &str, client_secret: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self.client_secret = Some(Masked(client_secret.to_string()));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_credentials(&self) -> bool {
        let id_ok = self.client_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        let secret_ok = self.client_secret.as_ref().is_some_and(|s| !s.is_blank());
        id_ok && secret_ok
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing .env file is normal outside local development
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `CHECKOUT__PAYPAL__TIMEOUT_SECS=5` sets `paypal.timeout_secs`
            .add_source(config::Environment::with_prefix("CHECKOUT").separator("__"))
            // The conventional bare variables win over everything else
            .set_override_option("paypal.client_id", env::var("PAYPAL_CLIENT_ID").ok())?
            .set_override_option("paypal.client_secret", env::var("PAYPAL_CLIENT_SECRET").ok())?
            .set_override_option("paypal.merchant_id", env::var("PAYPAL_MERCHANT_ID").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()?;

        s.try_deserialize()
    }
}
