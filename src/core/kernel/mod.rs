/// Exchange-agnostic transport kernel
///
/// The kernel knows nothing about individual endpoints. It turns a
/// [`RequestIntent`] into bytes on the wire and classifies what comes back:
///
/// - [`request`]: intents, per-attempt stamping and canonical encodings
/// - [`signer`]: the [`Signer`] trait and the HMAC API-key signer
/// - [`rest`]: [`RestClient`], one HTTP round trip, and its reqwest implementation
/// - [`transport`]: [`HttpTransport`], which signs each attempt and applies the
///   retry policy according to whether the call is idempotent
///
/// # Example
/// ```rust,no_run
/// use aster_trader::core::kernel::*;
/// use reqwest::Method;
///
/// # async fn example() -> Result<(), aster_trader::core::errors::ExchangeError> {
/// let rest = ReqwestRest::new("https://fapi.asterdex.com".to_string(), "aster".to_string())?;
/// let transport = HttpTransport::new(rest, RetryPolicy::default());
///
/// let intent = RequestIntent::public(Method::GET, "/fapi/v1/ticker/price")
///     .with_param("symbol", "BTCUSDT");
/// let body: serde_json::Value = transport.execute_json(&intent).await?;
/// # Ok(())
/// # }
/// ```
pub mod request;
pub mod rest;
pub mod signer;
pub mod transport;

pub use request::{Access, RawResponse, RequestIntent, RequestKind, SignedRequest, StampedRequest};
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig, TransportFailure};
pub use signer::{HmacSigner, Signer};
pub use transport::{HttpTransport, RetryPolicy};
