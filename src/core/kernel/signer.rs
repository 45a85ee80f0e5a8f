use crate::core::errors::ExchangeError;
use crate::core::kernel::request::{SignedRequest, StampedRequest};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;

/// Signer trait for request authentication
///
/// Implementations turn a stamped request into a wire-ready [`SignedRequest`]
/// by computing a signature over the request's canonical encoding. Signing
/// must be deterministic: the same stamped request and key always yield the
/// same signature.
pub trait Signer: Send + Sync {
    /// Short scheme name for logging
    fn scheme(&self) -> &'static str;

    fn sign(&self, request: &StampedRequest) -> Result<SignedRequest, ExchangeError>;
}

/// HMAC-SHA256 API-key signer
///
/// Signs the sorted `k=v&...` query, appends the hex digest as the final
/// `signature` param and sends the key in `X-MBX-APIKEY`.
pub struct HmacSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl HmacSigner {
    pub const API_KEY_HEADER: &'static str = "X-MBX-APIKEY";

    pub fn new(api_key: String, secret_key: String) -> Result<Self, ExchangeError> {
        if api_key.trim().is_empty() {
            return Err(ExchangeError::signing("API key is empty"));
        }
        if secret_key.is_empty() {
            return Err(ExchangeError::signing("API secret is empty"));
        }
        Ok(Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        })
    }

    /// Hex HMAC-SHA256 of `payload`
    pub fn sign_payload(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::signing(format!("Invalid secret key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn scheme(&self) -> &'static str {
        "hmac"
    }

    fn sign(&self, request: &StampedRequest) -> Result<SignedRequest, ExchangeError> {
        let signature = self.sign_payload(&request.canonical_query()?)?;
        SignedRequest::from_stamped(
            request,
            vec![("signature".to_string(), signature)],
            vec![(
                Self::API_KEY_HEADER.to_string(),
                self.api_key.expose_secret().clone(),
            )],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::request::RequestIntent;
    use reqwest::Method;
    use std::time::Duration;

    #[test]
    fn test_hmac_known_vector() {
        // Published Binance API documentation example
        let signer = HmacSigner::new(
            "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A".to_string(),
            "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j".to_string(),
        )
        .unwrap();
        let payload = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        assert_eq!(
            signer.sign_payload(payload).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signature_is_last_and_deterministic() {
        let signer = HmacSigner::new("key".to_string(), "secret".to_string()).unwrap();
        let stamped = RequestIntent::signed(Method::POST, "/fapi/v1/leverage")
            .with_param("symbol", "ETHUSDT")
            .with_param("leverage", 20)
            .stamp_at(50_000, Duration::from_millis(1_700_000_000_000));

        let first = signer.sign(&stamped).unwrap();
        let second = signer.sign(&stamped).unwrap();
        assert_eq!(first.param("signature"), second.param("signature"));
        assert_eq!(first.params().last().map(|(k, _)| k.as_str()), Some("signature"));
        assert_eq!(
            first.headers(),
            &[("X-MBX-APIKEY".to_string(), "key".to_string())]
        );
        assert!(first
            .encoded_params()
            .starts_with(&format!("{}&signature=", stamped.canonical_query().unwrap())));
    }

    #[test]
    fn test_empty_secret_is_signing_error() {
        let err = HmacSigner::new("key".to_string(), String::new()).unwrap_err();
        assert!(matches!(err, ExchangeError::SigningError(_)));
    }
}
