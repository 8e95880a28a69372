//! Kite Connect REST client with rate limiting and bounded requests.
//!
//! Every request carries the configured timeout and waits on a `governor`
//! limiter first. Nothing is retried here: a failed or timed-out call is
//! reported to the caller as a [`BrokerError`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info};

use kite_bridge_core::{
    Broker, BrokerError, Instrument, KiteConfig, OrderAck, OrderRequest, Position, Segment,
};

use crate::types::Envelope;

/// Kite Connect API version header value.
pub const KITE_API_VERSION: &str = "3";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Authenticated Kite Connect client.
///
/// The access token is obtained out of band (login flow and token storage
/// are not handled here).
pub struct KiteClient {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: String,
    rate_limiter: Arc<DirectLimiter>,
}

impl KiteClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &KiteConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build Kite HTTP client")?;

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        info!(
            base_url = %config.api_url,
            timeout_secs = config.request_timeout_secs,
            requests_per_second = rps.get(),
            "Kite client configured"
        );

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            rate_limiter,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches version and authorization headers.
    pub(crate) fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Kite-Version", KITE_API_VERSION)
            .header(
                "Authorization",
                format!("token {}:{}", self.api_key, self.access_token),
            )
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.post(self.url(path)))
    }

    /// Sends a request after the rate limiter admits it.
    pub(crate) async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, BrokerError> {
        self.rate_limiter.until_ready().await;
        debug!(operation, "Kite request");
        request
            .send()
            .await
            .map_err(|e| map_transport_error(operation, &e))
    }

    /// Sends a request and decodes the standard JSON envelope.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, BrokerError> {
        let response = self.send(operation, request).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(operation, &e))?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(_) if !status.is_success() => Err(BrokerError::Http {
                status: status.as_u16(),
                message: body,
            }),
            Err(e) => Err(BrokerError::Decode(format!("{operation}: {e}"))),
        }
    }
}

/// Converts a reqwest failure, keeping timeouts distinguishable.
pub(crate) fn map_transport_error(operation: &'static str, err: &reqwest::Error) -> BrokerError {
    if err.is_timeout() {
        BrokerError::Timeout { operation }
    } else if err.is_decode() {
        BrokerError::Decode(format!("{operation}: {err}"))
    } else {
        BrokerError::Network(format!("{operation}: {err}"))
    }
}

#[async_trait]
impl Broker for KiteClient {
    fn name(&self) -> &str {
        "kite"
    }

    async fn instruments(&self, segment: Segment) -> Result<Vec<Instrument>, BrokerError> {
        self.fetch_instruments(segment).await
    }

    async fn positions(&self) -> Result<Vec<Position>, BrokerError> {
        self.net_positions().await
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        self.place_regular_order(order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> KiteConfig {
        KiteConfig {
            api_url: base_url.to_string(),
            api_key: "key".to_string(),
            access_token: "token".to_string(),
            requests_per_second: 100,
            ..KiteConfig::default()
        }
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = KiteClient::new(&test_config("http://localhost:9999/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999");
        assert_eq!(client.url("/orders/regular"), "http://localhost:9999/orders/regular");
    }

    #[tokio::test]
    async fn requests_carry_version_and_token_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/portfolio/positions"))
            .and(header("X-Kite-Version", "3"))
            .and(header("Authorization", "token key:token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "data": {"net": [], "day": []}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = KiteClient::new(&test_config(&mock_server.uri())).unwrap();
        let positions = client.positions().await.unwrap();
        assert!(positions.is_empty());
    }

    #[tokio::test]
    async fn non_json_error_body_maps_to_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/portfolio/positions"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let client = KiteClient::new(&test_config(&mock_server.uri())).unwrap();
        let err = client.positions().await.unwrap_err();
        assert_eq!(
            err,
            BrokerError::Http {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );
    }

    #[tokio::test]
    async fn slow_responses_surface_as_timeouts() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/portfolio/positions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(2_500))
                    .set_body_json(serde_json::json!({"status": "success", "data": {"net": []}})),
            )
            .mount(&mock_server)
            .await;

        let config = KiteConfig {
            request_timeout_secs: 1,
            ..test_config(&mock_server.uri())
        };
        let client = KiteClient::new(&config).unwrap();
        let err = client.positions().await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }
}
