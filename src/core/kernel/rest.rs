use crate::core::errors::ExchangeError;
use crate::core::kernel::request::{RawResponse, SignedRequest};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::{instrument, trace};

/// How a single round trip failed before a response was observed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    /// Nothing reached the exchange (e.g. connection refused).
    #[error("request not sent: {0}")]
    NotSent(String),
    /// The request may have been received and executed.
    #[error("no response observed: {reason}")]
    Ambiguous { reason: String, timed_out: bool },
}

/// REST client trait for making HTTP requests
///
/// One call to [`RestClient::send`] is exactly one round trip. Retrying,
/// signing and error classification live in the transport above it.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportFailure>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Upper bound on establishing a connection
    pub connect_timeout: Duration,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange_name,
            connect_timeout: Duration::from_secs(5),
            user_agent: concat!("aster-trader/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::TransportError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(ReqwestRest {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn new(base_url: String, exchange_name: String) -> Result<Self, ExchangeError> {
        RestClientBuilder::new(RestClientConfig::new(base_url, exchange_name)).build()
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url, endpoint)
    }

    fn classify(err: &reqwest::Error) -> TransportFailure {
        if err.is_connect() || err.is_builder() {
            TransportFailure::NotSent(err.to_string())
        } else {
            TransportFailure::Ambiguous {
                reason: err.to_string(),
                timed_out: err.is_timeout(),
            }
        }
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(
        skip(self, request),
        fields(exchange = %self.config.exchange_name, method = %request.method(), endpoint = %request.endpoint())
    )]
    async fn send(&self, request: &SignedRequest) -> Result<RawResponse, TransportFailure> {
        let encoded = request.encoded_params();
        let mut builder = if *request.method() == Method::GET {
            let url = if encoded.is_empty() {
                self.build_url(request.endpoint())
            } else {
                format!("{}?{}", self.build_url(request.endpoint()), encoded)
            };
            self.client.get(url)
        } else {
            self.client
                .request(request.method().clone(), self.build_url(request.endpoint()))
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded.to_string())
        };

        for (key, value) in request.headers() {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| Self::classify(&e))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        // The status line arrived, so the exchange saw the request.
        let body = response.text().await.map_err(|e| TransportFailure::Ambiguous {
            reason: format!("Failed to read response body: {}", e),
            timed_out: e.is_timeout(),
        })?;

        trace!(status, body = %body, "response");

        Ok(RawResponse {
            status,
            body,
            retry_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = RestClientConfig::new("https://fapi.asterdex.com/".to_string(), "aster".to_string());
        assert_eq!(config.base_url, "https://fapi.asterdex.com");
    }

    #[tokio::test]
    async fn test_connection_refused_is_not_sent() {
        // Nothing listens on port 9 (discard) in the test environment
        let rest = ReqwestRest::new("http://127.0.0.1:9".to_string(), "aster".to_string()).unwrap();
        let request = SignedRequest::public(&crate::core::kernel::request::RequestIntent::public(
            Method::GET,
            "/fapi/v1/ping",
        ))
        .unwrap();

        let failure = rest.send(&request).await.unwrap_err();
        assert!(matches!(failure, TransportFailure::NotSent(_)));
    }
}
