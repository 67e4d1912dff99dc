//! HKDF-SHA256 key derivation.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CryptoError;
use crate::types::AES_KEY_LENGTH;

/// Expand a form secret into a 256-bit key using HKDF-SHA256.
///
/// The raw secret is never used as a key directly: it is the HKDF input
/// keying material, the form id is the salt and `info` selects which key
/// (encryption, label hash or signing) is produced.
///
/// # Arguments
/// * `secret` - Form secret (any non-empty byte string)
/// * `form_id` - Form identifier, binds the key to one form
/// * `info` - Purpose label, one of the `*_KEY_INFO` constants
pub fn derive_key(
    secret: &[u8],
    form_id: &str,
    info: &[u8],
) -> Result<[u8; AES_KEY_LENGTH], CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::EmptySecret);
    }
    let hk = Hkdf::<Sha256>::new(Some(form_id.as_bytes()), secret);
    let mut okm = [0u8; AES_KEY_LENGTH];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::DerivationFailed(format!("HKDF expand failed: {}", e)))?;
    Ok(okm)
}
