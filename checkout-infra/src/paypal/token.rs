use chrono::{DateTime, Duration, Utc};
use checkout_core::{AccessToken, CoreResult, ProcessorError};
use checkout_shared::Masked;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::transport_error;
use crate::app_config::PayPalConfig;

/// Seconds shaved off `expires_in` so a cached token is never sent stale.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Exchange credentials before every processor call.
    PerRequest,
    /// Reuse the last token until it is about to expire.
    Cached,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: AccessToken,
    expires_at: DateTime<Utc>,
}

/// Client-credentials token exchange against `/v1/oauth2/token`.
#[derive(Debug)]
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<Masked<String>>,
    policy: TokenPolicy,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, config: &PayPalConfig) -> Self {
        let policy = if config.cache_tokens {
            TokenPolicy::Cached
        } else {
            TokenPolicy::PerRequest
        };

        Self {
            http,
            token_url: format!("{}/v1/oauth2/token", config.base_url.trim_end_matches('/')),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            policy,
            cache: RwLock::new(None),
        }
    }

    pub fn policy(&self) -> TokenPolicy {
        self.policy
    }

    fn credentials(&self) -> CoreResult<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.trim().is_empty() && !secret.is_blank() => {
                Ok((id.as_str(), secret.expose().as_str()))
            }
            _ => Err(ProcessorError::CredentialsMissing),
        }
    }

    /// Returns a bearer token, exchanging credentials unless a cached token is
    /// still fresh.
    pub async fn access_token(&self) -> CoreResult<AccessToken> {
        let (client_id, client_secret) = self.credentials()?;

        if self.policy == TokenPolicy::Cached {
            let cached = self.cache.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.expires_at > Utc::now() {
                    return Ok(entry.token.clone());
                }
            }
        }

        let fetched = self.exchange(client_id, client_secret).await?;

        if self.policy == TokenPolicy::Cached {
            if let Some(expires_in) = fetched.expires_in {
                let lifetime = (expires_in - EXPIRY_MARGIN_SECS).max(0);
                let mut cache = self.cache.write().await;
                *cache = Some(CachedToken {
                    token: AccessToken::new(fetched.access_token.clone()),
                    expires_at: Utc::now() + Duration::seconds(lifetime),
                });
            }
        }

        Ok(AccessToken::new(fetched.access_token))
    }

    async fn exchange(&self, client_id: &str, client_secret: &str) -> CoreResult<TokenResponse> {
        debug!(url = %self.token_url, "requesting access token");

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "access token request rejected");
            return Err(ProcessorError::AuthFailure {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            if e.is_timeout() {
                ProcessorError::Timeout
            } else {
                ProcessorError::MalformedResponse(format!("token response: {}", e))
            }
        })
    }
}
