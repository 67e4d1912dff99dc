/// AES-GCM IV length in bytes (96 bits per NIST recommendation).
pub const AES_GCM_IV_LENGTH: usize = 12;

/// AES-GCM tag length in bytes (128 bits).
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES key length in bytes (256 bits).
pub const AES_KEY_LENGTH: usize = 32;

/// HMAC-SHA256 tag length in bytes. Fixed prefix of every signed envelope.
pub const SIGNATURE_LENGTH: usize = 32;

/// Truncated length of a label hash. Long enough to be collision-free for
/// the handful of labels a form uses, short enough to keep field names small.
pub const LABEL_HASH_LENGTH: usize = 16;

/// HKDF info labels. Each derived key gets its own label so the encryption,
/// label-hash and signing keys are independent even though they share a secret.
pub const ENCRYPTION_KEY_INFO: &[u8] = b"honeyform:encryption:v1";
pub const LABEL_KEY_INFO: &[u8] = b"honeyform:label-hash:v1";
pub const SIGNING_KEY_INFO: &[u8] = b"honeyform:signing:v1";
