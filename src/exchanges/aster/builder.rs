use crate::core::config::{AuthScheme, ExchangeConfig};
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    HmacSigner, HttpTransport, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
    RetryPolicy, Signer,
};
use crate::exchanges::aster::{
    connector::AsterConnector,
    requests::{AsterRequests, EndpointSet},
    rest::AsterRestClient,
    signer::AsterSigner,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::info;

/// Signer and endpoint generation implied by the configured credentials.
///
/// Read-only configurations get no signer: signed calls then fail closed.
pub fn build_signer(
    config: &ExchangeConfig,
) -> Result<(Option<Arc<dyn Signer>>, EndpointSet), ExchangeError> {
    match config.auth_scheme() {
        AuthScheme::Evm => {
            let creds = config
                .evm
                .as_ref()
                .ok_or_else(|| ExchangeError::signing("EVM credentials missing"))?;
            let signer = AsterSigner::new(
                &creds.user,
                &creds.signer,
                creds.private_key.expose_secret(),
            )?;
            let signer: Arc<dyn Signer> = Arc::new(signer);
            Ok((Some(signer), EndpointSet::V3))
        }
        AuthScheme::Hmac => {
            let signer = HmacSigner::new(
                config.api_key_str().unwrap_or_default().to_string(),
                config.api_secret_str().unwrap_or_default().to_string(),
            )?;
            let signer: Arc<dyn Signer> = Arc::new(signer);
            Ok((Some(signer), EndpointSet::Legacy))
        }
        AuthScheme::ReadOnly => Ok((None, EndpointSet::V3)),
    }
}

/// Assemble a connector over any [`RestClient`]
pub fn build_connector_with_rest<R: RestClient + Clone>(
    rest: R,
    config: &ExchangeConfig,
) -> Result<AsterConnector<R>, ExchangeError> {
    let (signer, endpoints) = build_signer(config)?;

    let mut transport = HttpTransport::new(rest, RetryPolicy::from_config(config))
        .with_recv_window(config.recv_window)
        .with_exchange_name("aster");
    if let Some(signer) = signer {
        transport = transport.with_signer(signer);
    }
    if let Some(per_second) = config.rate_limit {
        transport = transport.with_rate_limit(per_second);
    }

    info!(
        base_url = %config.base_url,
        scheme = transport.signer_scheme().unwrap_or("read-only"),
        timeout = ?config.timeout,
        retries = config.max_retries,
        "aster connector ready"
    );

    Ok(AsterConnector::new(AsterRestClient::new(
        transport,
        AsterRequests::new(endpoints),
    )))
}

/// Create an Aster connector over HTTP
pub fn build_connector(config: &ExchangeConfig) -> Result<AsterConnector<ReqwestRest>, ExchangeError> {
    let rest_config = RestClientConfig::new(config.base_url.clone(), "aster".to_string())
        .with_connect_timeout(config.timeout);
    let rest = RestClientBuilder::new(rest_config).build()?;
    build_connector_with_rest(rest, config)
}
