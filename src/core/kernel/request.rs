use crate::core::errors::ExchangeError;
use reqwest::Method;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Whether a call may be repeated without changing the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Idempotent,
    Mutating,
}

/// Whether a call needs a signature before it may be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Signed,
}

/// Semantic description of one exchange call.
///
/// Parameters are held sorted by key, so the canonical encoding never depends
/// on the order in which callers supplied them. An intent is immutable once
/// built; timestamps are attached per attempt by [`RequestIntent::stamp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIntent {
    method: Method,
    endpoint: String,
    params: BTreeMap<String, String>,
    access: Access,
}

impl RequestIntent {
    pub fn new(method: Method, endpoint: impl Into<String>, access: Access) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: BTreeMap::new(),
            access,
        }
    }

    pub fn public(method: Method, endpoint: impl Into<String>) -> Self {
        Self::new(method, endpoint, Access::Public)
    }

    pub fn signed(method: Method, endpoint: impl Into<String>) -> Self {
        Self::new(method, endpoint, Access::Signed)
    }

    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_optional_param<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub const fn access(&self) -> Access {
        self.access
    }

    /// Reads are idempotent; every other method mutates exchange state.
    pub fn kind(&self) -> RequestKind {
        if self.method == Method::GET {
            RequestKind::Idempotent
        } else {
            RequestKind::Mutating
        }
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Attach `recvWindow`, a millisecond timestamp and a microsecond nonce
    /// read from the system clock.
    pub fn stamp(&self, recv_window: u64) -> Result<StampedRequest, ExchangeError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ExchangeError::ClockError(format!("system clock before epoch: {}", e)))?;
        Ok(self.stamp_at(recv_window, now))
    }

    /// Stamp with an explicit time since the epoch.
    pub fn stamp_at(&self, recv_window: u64, since_epoch: Duration) -> StampedRequest {
        let timestamp_ms = since_epoch.as_millis() as u64;
        let nonce_us = since_epoch.as_micros() as u64;

        let mut params = self.params.clone();
        if self.access == Access::Signed {
            params.insert("recvWindow".to_string(), recv_window.to_string());
            params.insert("timestamp".to_string(), timestamp_ms.to_string());
        }

        StampedRequest {
            intent: self.clone(),
            params,
            timestamp_ms,
            nonce_us,
        }
    }
}

/// An intent with its per-attempt timing parameters attached.
#[derive(Debug, Clone)]
pub struct StampedRequest {
    intent: RequestIntent,
    params: BTreeMap<String, String>,
    timestamp_ms: u64,
    nonce_us: u64,
}

impl StampedRequest {
    pub fn intent(&self) -> &RequestIntent {
        &self.intent
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub const fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub const fn nonce_us(&self) -> u64 {
        self.nonce_us
    }

    /// Compact JSON object with lexicographically sorted keys and string values.
    pub fn canonical_json(&self) -> Result<String, ExchangeError> {
        serde_json::to_string(&self.params)
            .map_err(|e| ExchangeError::signing(format!("cannot encode payload: {}", e)))
    }

    /// `k=v&k=v` in sorted key order, form-encoded exactly as it goes on the wire.
    pub fn canonical_query(&self) -> Result<String, ExchangeError> {
        encode_pairs(&self.params)
    }
}

/// A request ready for the wire. Only constructible by signing or, for
/// public intents, by [`SignedRequest::public`].
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    endpoint: String,
    kind: RequestKind,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    encoded: String,
    signed: bool,
}

impl SignedRequest {
    /// Stamped params in canonical order, followed by the signer's own params.
    pub(crate) fn from_stamped(
        stamped: &StampedRequest,
        extra_params: Vec<(String, String)>,
        headers: Vec<(String, String)>,
    ) -> Result<Self, ExchangeError> {
        let intent = stamped.intent();
        let mut params: Vec<(String, String)> = stamped
            .params()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.extend(extra_params);
        let encoded = encode_pairs(&params)?;

        Ok(Self {
            method: intent.method().clone(),
            endpoint: intent.endpoint().to_string(),
            kind: intent.kind(),
            params,
            headers,
            encoded,
            signed: true,
        })
    }

    /// Wrap a public intent. Signed intents are refused.
    pub fn public(intent: &RequestIntent) -> Result<Self, ExchangeError> {
        if intent.access() == Access::Signed {
            return Err(ExchangeError::signing(format!(
                "refusing to send {} {} without a signature",
                intent.method(),
                intent.endpoint()
            )));
        }

        Ok(Self {
            method: intent.method().clone(),
            endpoint: intent.endpoint().to_string(),
            kind: intent.kind(),
            params: intent
                .params()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            headers: Vec::new(),
            encoded: encode_pairs(intent.params())?,
            signed: false,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub const fn is_signed(&self) -> bool {
        self.signed
    }

    /// Params form-encoded in send order.
    pub fn encoded_params(&self) -> &str {
        &self.encoded
    }
}

/// Raw HTTP outcome of a single round trip.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub retry_after: Option<Duration>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// `application/x-www-form-urlencoded`, pairs kept in the given order.
fn encode_pairs<T: serde::Serialize + ?Sized>(pairs: &T) -> Result<String, ExchangeError> {
    serde_urlencoded::to_string(pairs)
        .map_err(|e| ExchangeError::signing(format!("cannot form-encode params: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leverage_intent() -> RequestIntent {
        RequestIntent::signed(Method::POST, "/fapi/v3/leverage")
            .with_param("symbol", "ETHUSDT")
            .with_param("leverage", 20)
    }

    #[test]
    fn test_kind_follows_method() {
        assert_eq!(
            RequestIntent::signed(Method::GET, "/fapi/v3/positionRisk").kind(),
            RequestKind::Idempotent
        );
        assert_eq!(leverage_intent().kind(), RequestKind::Mutating);
        assert_eq!(
            RequestIntent::signed(Method::DELETE, "/fapi/v3/order").kind(),
            RequestKind::Mutating
        );
    }

    #[test]
    fn test_canonical_order_ignores_insertion_order() {
        let a = RequestIntent::signed(Method::POST, "/fapi/v3/order")
            .with_param("symbol", "BTCUSDT")
            .with_param("side", "BUY")
            .with_param("type", "MARKET")
            .with_param("quantity", "0.01");
        let b = RequestIntent::signed(Method::POST, "/fapi/v3/order")
            .with_param("quantity", "0.01")
            .with_param("type", "MARKET")
            .with_param("side", "BUY")
            .with_param("symbol", "BTCUSDT");
        let at = Duration::from_millis(1_700_000_000_000);

        let a = a.stamp_at(50_000, at);
        let b = b.stamp_at(50_000, at);
        assert_eq!(a.canonical_json().unwrap(), b.canonical_json().unwrap());
        assert_eq!(
            a.canonical_query().unwrap(),
            "quantity=0.01&recvWindow=50000&side=BUY&symbol=BTCUSDT&timestamp=1700000000000&type=MARKET"
        );
    }

    #[test]
    fn test_canonical_json_is_compact_and_sorted() {
        let stamped = leverage_intent().stamp_at(50_000, Duration::from_millis(1_700_000_000_000));
        assert_eq!(
            stamped.canonical_json().unwrap(),
            r#"{"leverage":"20","recvWindow":"50000","symbol":"ETHUSDT","timestamp":"1700000000000"}"#
        );
        assert_eq!(stamped.nonce_us(), 1_700_000_000_000_000);
    }

    #[test]
    fn test_public_intents_are_not_stamped() {
        let stamped = RequestIntent::public(Method::GET, "/fapi/v1/ticker/price")
            .with_param("symbol", "BTCUSDT")
            .stamp_at(50_000, Duration::from_secs(1));
        assert_eq!(stamped.canonical_query().unwrap(), "symbol=BTCUSDT");
    }

    #[test]
    fn test_signed_intent_cannot_go_out_unsigned() {
        let err = SignedRequest::public(&leverage_intent()).unwrap_err();
        assert!(matches!(err, ExchangeError::SigningError(_)));

        let public = SignedRequest::public(
            &RequestIntent::public(Method::GET, "/fapi/v1/ticker/price").with_param("symbol", "BTCUSDT"),
        )
        .unwrap();
        assert!(!public.is_signed());
        assert_eq!(public.param("symbol"), Some("BTCUSDT"));
    }

    #[test]
    fn test_form_encoding_escapes_reserved_bytes() {
        let stamped = RequestIntent::public(Method::GET, "/x")
            .with_param("note", "a b&c=d")
            .stamp_at(0, Duration::ZERO);
        assert_eq!(stamped.canonical_query().unwrap(), "note=a+b%26c%3Dd");

        let sent = SignedRequest::public(
            &RequestIntent::public(Method::GET, "/x").with_param("path", "/fapi?v=3~!"),
        )
        .unwrap();
        assert_eq!(sent.encoded_params(), "path=%2Ffapi%3Fv%3D3%7E%21");
    }
}
