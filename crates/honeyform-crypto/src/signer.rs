//! HMAC-SHA256 signing of encrypted envelopes.
//!
//! Signed format: [32 bytes: HMAC-SHA256(payload)][N bytes: payload]

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::hkdf::derive_key;
use crate::types::{SIGNATURE_LENGTH, SIGNING_KEY_INFO};

type HmacSha256 = Hmac<Sha256>;

/// Keyed signer for one form id.
pub struct Signer {
    mac: HmacSha256,
}

impl Signer {
    /// Derive a signer from a form secret.
    ///
    /// Uses its own HKDF label, so the signing key is independent of the
    /// `CipherBox` keys derived from the same secret.
    pub fn derive(secret: &[u8], form_id: &str) -> Result<Self, CryptoError> {
        let mut key = derive_key(secret, form_id, SIGNING_KEY_INFO)?;
        let mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|e| CryptoError::DerivationFailed(e.to_string()));
        key.zeroize();
        Ok(Self { mac: mac? })
    }

    fn tag(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac
    }

    /// Returns `tag || payload`.
    pub fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let tag = self.tag(payload).finalize().into_bytes();
        let mut signed = Vec::with_capacity(SIGNATURE_LENGTH + payload.len());
        signed.extend_from_slice(&tag);
        signed.extend_from_slice(payload);
        signed
    }

    /// Verify a `tag || payload` blob in constant time.
    ///
    /// Returns `false` for forged, truncated or otherwise malformed input;
    /// never errors.
    pub fn verify(&self, signed: &[u8]) -> bool {
        if signed.len() < SIGNATURE_LENGTH {
            return false;
        }
        let (tag, payload) = signed.split_at(SIGNATURE_LENGTH);
        self.tag(payload).verify_slice(tag).is_ok()
    }

    /// The payload part of a signed blob, without checking the tag.
    ///
    /// Callers that care about authenticity must call [`Signer::verify`] first.
    /// Input shorter than a tag yields an empty payload.
    pub fn payload_of<'a>(&self, signed: &'a [u8]) -> &'a [u8] {
        signed.get(SIGNATURE_LENGTH..).unwrap_or_default()
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &"hmac-sha256")
            .finish_non_exhaustive()
    }
}
