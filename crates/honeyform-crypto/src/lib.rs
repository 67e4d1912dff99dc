//! Keyed primitives behind honeyform tokens: AES-256-GCM envelopes for
//! metadata and field names, HMAC-SHA256 signatures over those envelopes,
//! and the HKDF expansion of one form secret into independent keys.

pub mod cipher;
pub mod encoding;
pub mod error;
pub mod hkdf;
pub mod signer;
pub mod types;

pub use cipher::CipherBox;
pub use encoding::{b64_decode, b64_encode};
pub use error::CryptoError;
pub use hkdf::derive_key;
pub use signer::Signer;
pub use types::{
    AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, LABEL_HASH_LENGTH, SIGNATURE_LENGTH,
};
