//! AES-256-GCM encryption of form metadata and field names.
//!
//! Envelope format: [12 bytes: IV][N bytes: ciphertext + tag]
//! No version byte: the envelope only ever lives inside a single rendered form.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::hkdf::derive_key;
use crate::types::{
    AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, ENCRYPTION_KEY_INFO, LABEL_HASH_LENGTH,
    LABEL_KEY_INFO,
};

/// Generate a random 12-byte IV for AES-GCM.
pub fn generate_iv() -> Result<[u8; AES_GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

/// Symmetric encryption helper for one form id.
///
/// Holds only derived keys, so one instance can be shared read-only between
/// the generator and the validator and across concurrent requests.
pub struct CipherBox {
    cipher: Aes256Gcm,
    label_mac: Hmac<Sha256>,
}

impl CipherBox {
    /// Derive a cipher box from a form secret.
    ///
    /// The AES key and the label-hash key are two separate HKDF expansions
    /// of `secret`, salted with `form_id`.
    pub fn derive(secret: &[u8], form_id: &str) -> Result<Self, CryptoError> {
        let mut enc_key = derive_key(secret, form_id, ENCRYPTION_KEY_INFO)?;
        let mut label_key = derive_key(secret, form_id, LABEL_KEY_INFO)?;
        let cipher = Aes256Gcm::new_from_slice(&enc_key).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: AES_KEY_LENGTH,
                got: enc_key.len(),
            }
        });
        let label_mac = <Hmac<Sha256> as Mac>::new_from_slice(&label_key)
            .map_err(|e| CryptoError::DerivationFailed(e.to_string()));
        enc_key.zeroize();
        label_key.zeroize();
        Ok(Self {
            cipher: cipher?,
            label_mac: label_mac?,
        })
    }

    /// Name of the cipher, for diagnostics.
    pub fn algorithm(&self) -> &'static str {
        "aes-256-gcm"
    }

    /// Length of the IV prefix on every envelope.
    pub fn iv_length(&self) -> usize {
        AES_GCM_IV_LENGTH
    }

    /// Deterministic keyed hash of a label.
    ///
    /// Used for stable, form-specific field names (e.g. the metadata field),
    /// compared by equality only.
    pub fn hash_label(&self, label: &str) -> [u8; LABEL_HASH_LENGTH] {
        let mut mac = self.label_mac.clone();
        mac.update(label.as_bytes());
        let digest = mac.finalize().into_bytes();
        let mut out = [0u8; LABEL_HASH_LENGTH];
        out.copy_from_slice(&digest[..LABEL_HASH_LENGTH]);
        out
    }

    /// Encrypt bytes under a fresh random IV.
    ///
    /// Returns `IV || ciphertext+tag`. Two calls with the same plaintext
    /// never produce the same output.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let iv = generate_iv()?;
        let nonce = Nonce::from_slice(&iv);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut result = Vec::with_capacity(iv.len() + ciphertext.len());
        result.extend_from_slice(&iv);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt an `IV || ciphertext+tag` envelope.
    ///
    /// Truncated, tampered or foreign envelopes are rejected by the GCM tag
    /// check; nothing here panics on attacker-controlled input.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < AES_GCM_IV_LENGTH + AES_GCM_TAG_LENGTH {
            return Err(CryptoError::DataTooShort);
        }
        let (iv, ciphertext) = blob.split_at(AES_GCM_IV_LENGTH);
        let nonce = Nonce::from_slice(iv);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for CipherBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherBox")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}
