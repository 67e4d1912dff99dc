//! Standard base64 (with padding) used for every wire artifact: field names,
//! the metadata token and honeypot ids all travel as form field names or
//! values, so they use the same alphabet a browser will echo back.

use base64ct::{Base64, Encoding};

use crate::error::CryptoError;

/// Base64 encode bytes with the standard alphabet and padding.
pub fn b64_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

/// Base64 decode a standard-alphabet, padded string.
pub fn b64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    Base64::decode_vec(s).map_err(|e| CryptoError::Base64Decode(e.to_string()))
}
