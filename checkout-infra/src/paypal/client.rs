use std::time::Duration;

use async_trait::async_trait;
use checkout_core::{
    CaptureTarget, CoreResult, OrderRequest, PatchOperation, PaymentProcessor, ProcessorError,
    ProcessorReply,
};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{transport_error, TokenProvider, USER_AGENT_VALUE};
use crate::app_config::PayPalConfig;

/// Orders v2 / Payments v2 client. Every call first obtains a token from the
/// [`TokenProvider`], then issues exactly one processor request.
#[derive(Debug)]
pub struct PayPalClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: TokenProvider,
}

impl PayPalClient {
    pub fn new(config: &PayPalConfig) -> CoreResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ProcessorError::Network(format!("failed to create HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ProcessorError::Network(format!("invalid processor base url {}", config.base_url)))?;

        let tokens = TokenProvider::new(http.clone(), config);

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `segments` to the base url. Each segment is percent-encoded on
    /// its own, so an id can never add path levels or a query.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> CoreResult<ProcessorReply> {
        let token = self.tokens.access_token().await?;
        let path = url.path().to_string();
        debug!(method = %method, url = %url, "calling processor");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token.secret())
            .headers(headers);

        request = match body {
            Some(body) => request.json(&body),
            None => request.header(reqwest::header::CONTENT_TYPE, "application/json"),
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(transport_error)?;
        let success = (200..300).contains(&status);

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(json) => json,
                // Keep whatever the processor said so the caller can still see it
                Err(_) if !success => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) => {
                    return Err(ProcessorError::MalformedResponse(format!(
                        "HTTP {} from {}: {}",
                        status, path, e
                    )))
                }
            }
        };

        if !success {
            warn!(status, path, "processor rejected request");
            return Err(ProcessorError::Upstream { status, body });
        }

        Ok(ProcessorReply::new(status, body))
    }
}

#[async_trait]
impl PaymentProcessor for PayPalClient {
    async fn create_order(&self, request: &OrderRequest) -> CoreResult<ProcessorReply> {
        let body = serde_json::to_value(request)
            .map_err(|e| ProcessorError::MalformedResponse(format!("order request: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        let request_id = format!("new-order-{}", Uuid::new_v4());
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("PayPal-Request-Id", value);
        }

        let url = self.endpoint(&["v2", "checkout", "orders"]);
        self.send(Method::POST, url, Some(body), headers).await
    }

    async fn authorize_order(&self, order_id: &str) -> CoreResult<ProcessorReply> {
        let url = self.endpoint(&["v2", "checkout", "orders", order_id, "authorize"]);
        self.send(Method::POST, url, None, HeaderMap::new()).await
    }

    async fn capture(&self, target: &CaptureTarget) -> CoreResult<ProcessorReply> {
        let url = match target {
            CaptureTarget::Order(id) => self.endpoint(&["v2", "checkout", "orders", id.as_str(), "capture"]),
            CaptureTarget::Authorization(id) => {
                self.endpoint(&["v2", "payments", "authorizations", id.as_str(), "capture"])
            }
        };
        self.send(Method::POST, url, None, HeaderMap::new()).await
    }

    async fn get_order(&self, order_id: &str) -> CoreResult<ProcessorReply> {
        let url = self.endpoint(&["v2", "checkout", "orders", order_id]);
        self.send(Method::GET, url, None, HeaderMap::new()).await
    }

    async fn update_order(
        &self,
        order_id: &str,
        operations: &[PatchOperation],
    ) -> CoreResult<ProcessorReply> {
        let body = serde_json::to_value(operations)
            .map_err(|e| ProcessorError::MalformedResponse(format!("patch body: {}", e)))?;
        let url = self.endpoint(&["v2", "checkout", "orders", order_id]);
        self.send(Method::PATCH, url, Some(body), HeaderMap::new()).await
    }
}
