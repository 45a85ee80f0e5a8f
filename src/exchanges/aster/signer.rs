use crate::core::errors::ExchangeError;
use crate::core::kernel::request::{SignedRequest, StampedRequest};
use crate::core::kernel::signer::Signer;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Aster v3 signer: ECDSA over the ABI-encoded request, signed by a
/// delegated signer key on behalf of the account owner.
///
/// The signed message is
/// `keccak256(PREFIX ‖ keccak256(abi.encode(payload, user, signer, nonce)))`
/// where `payload` is the sorted compact JSON of all request params.
pub struct AsterSigner {
    user: [u8; 20],
    signer: [u8; 20],
    secret_key: SecretKey,
    secp: Secp256k1<secp256k1::All>,
}

impl std::fmt::Debug for AsterSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsterSigner")
            .field("user", &self.user_address())
            .field("signer", &self.signer_address())
            .finish_non_exhaustive()
    }
}

impl AsterSigner {
    /// Fails if any input is malformed or if `private_key` does not belong to `signer`.
    pub fn new(user: &str, signer: &str, private_key: &str) -> Result<Self, ExchangeError> {
        let user = parse_address(user)?;
        let signer = parse_address(signer)?;

        let key_bytes = hex::decode(private_key.trim().trim_start_matches("0x"))
            .map_err(|e| ExchangeError::signing(format!("Invalid private key hex: {}", e)))?;
        if key_bytes.len() != 32 {
            return Err(ExchangeError::signing(format!(
                "Invalid private key length: expected 32 bytes, got {}",
                key_bytes.len()
            )));
        }
        let secret_key = SecretKey::from_slice(&key_bytes)
            .map_err(|e| ExchangeError::signing(format!("Invalid private key: {}", e)))?;

        let secp = Secp256k1::new();
        let derived = public_key_to_address(&PublicKey::from_secret_key(&secp, &secret_key));
        if derived != signer {
            return Err(ExchangeError::signing(format!(
                "private key belongs to {}, not the configured signer {}",
                eip55_checksum(&derived),
                eip55_checksum(&signer)
            )));
        }

        Ok(Self {
            user,
            signer,
            secret_key,
            secp,
        })
    }

    pub fn user_address(&self) -> String {
        eip55_checksum(&self.user)
    }

    pub fn signer_address(&self) -> String {
        eip55_checksum(&self.signer)
    }

    /// Hash that gets wrapped as a personal message and signed.
    pub fn payload_hash(&self, payload: &str, nonce: u64) -> [u8; 32] {
        keccak256(&abi_encode_request(payload, &self.user, &self.signer, nonce))
    }

    /// `0x`-prefixed `r ‖ s ‖ v` signature; deterministic (RFC 6979).
    pub fn sign_payload(&self, payload: &str, nonce: u64) -> Result<String, ExchangeError> {
        let digest = personal_message_digest(&self.payload_hash(payload, nonce));
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ExchangeError::signing(format!("Failed to create message: {}", e)))?;

        let (recovery_id, compact) = self
            .secp
            .sign_ecdsa_recoverable(&message, &self.secret_key)
            .serialize_compact();

        let mut signature = [0u8; 65];
        signature[..64].copy_from_slice(&compact);
        signature[64] = 27 + recovery_id.to_i32() as u8;
        Ok(format!("0x{}", hex::encode(signature)))
    }
}

impl Signer for AsterSigner {
    fn scheme(&self) -> &'static str {
        "evm"
    }

    fn sign(&self, request: &StampedRequest) -> Result<SignedRequest, ExchangeError> {
        let payload = request.canonical_json()?;
        let nonce = request.nonce_us();
        let signature = self.sign_payload(&payload, nonce)?;
        tracing::trace!(payload = %payload, nonce, "signed request payload");

        SignedRequest::from_stamped(
            request,
            vec![
                ("nonce".to_string(), nonce.to_string()),
                ("user".to_string(), self.user_address()),
                ("signer".to_string(), self.signer_address()),
                ("signature".to_string(), signature),
            ],
            Vec::new(),
        )
    }
}

/// `abi.encode(string, address, address, uint256)`
pub fn abi_encode_request(payload: &str, user: &[u8; 20], signer: &[u8; 20], nonce: u64) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let padded_len = bytes.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(32 * 5 + padded_len);

    // Head: offset of the dynamic string, then the static words
    out.extend_from_slice(&u64_word(4 * 32));
    out.extend_from_slice(&address_word(user));
    out.extend_from_slice(&address_word(signer));
    out.extend_from_slice(&u64_word(nonce));

    // Tail: length, then the bytes right-padded to a word boundary
    out.extend_from_slice(&u64_word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(32 * 5 + padded_len, 0);
    out
}

/// Mixed-case checksum encoding of an address.
pub fn eip55_checksum(address: &[u8; 20]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse a `0x` + 40 hex digit address. Checksum case is not enforced.
pub fn parse_address(address: &str) -> Result<[u8; 20], ExchangeError> {
    let address = address.trim();
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ExchangeError::signing(format!("Address must start with 0x: {}", address)))?;
    if digits.len() != 40 {
        return Err(ExchangeError::signing(format!(
            "Address must have 40 hex digits: {}",
            address
        )));
    }

    let mut out = [0u8; 20];
    hex::decode_to_slice(digits, &mut out)
        .map_err(|e| ExchangeError::signing(format!("Invalid address {}: {}", address, e)))?;
    Ok(out)
}

/// Address controlled by `private_key`, checksummed.
pub fn address_from_private_key(private_key: &str) -> Result<String, ExchangeError> {
    let key_bytes = hex::decode(private_key.trim().trim_start_matches("0x"))
        .map_err(|e| ExchangeError::signing(format!("Invalid private key hex: {}", e)))?;
    let secret_key = SecretKey::from_slice(&key_bytes)
        .map_err(|e| ExchangeError::signing(format!("Invalid private key: {}", e)))?;
    let secp = Secp256k1::signing_only();
    Ok(eip55_checksum(&public_key_to_address(
        &PublicKey::from_secret_key(&secp, &secret_key),
    )))
}

fn public_key_to_address(public_key: &PublicKey) -> [u8; 20] {
    // Drop the 0x04 uncompressed-point prefix
    let hash = keccak256(&public_key.serialize_uncompressed()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

fn personal_message_digest(hash: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX);
    hasher.update(hash);
    hasher.finalize().into()
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}
