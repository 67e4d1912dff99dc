//! Submission validation.
//!
//! Pipeline, stopping at the first failure:
//!
//! 1. Locate the metadata input (`MissingMetadata`), verify its signature
//!    (`InvalidSignature`), decrypt it (`DecryptionFailure`) and parse it
//!    (`InvalidMetadata`). The metadata input is removed from every view.
//! 2. Compare the embedded form id with the validator's (`InvalidFormId`).
//! 3. Check the submission time against the window
//!    `[generated + min_delay, generated + max_age]` (`Timing`).
//! 4. Build the decrypted view, then require every honeypot listed in the
//!    metadata to be present (`HoneypotMissing`) and empty (`HoneypotFilled`).

use std::collections::BTreeMap;
use std::ops::Index;
use std::sync::Arc;

use honeyform_crypto::{b64_decode, CipherBox, Signer};

use crate::error::{CaptchaError, Result, TimingViolation};
use crate::generator::FIELD_NAME_PREFIX;
use crate::metadata::{metadata_field_name, FormMetadata};
use crate::options::CaptchaOptions;

/// Validates submissions for one form id.
#[derive(Debug, Clone)]
pub struct FormValidator {
    form_id: String,
    cipher: Arc<CipherBox>,
    signer: Arc<Signer>,
    options: CaptchaOptions,
}

impl FormValidator {
    pub fn new(
        form_id: impl Into<String>,
        cipher: Arc<CipherBox>,
        signer: Arc<Signer>,
        options: CaptchaOptions,
    ) -> Self {
        Self {
            form_id: form_id.into(),
            cipher,
            signer,
            options,
        }
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Run the full pipeline over raw submitted key/value pairs.
    pub fn validate<I, K, V>(&self, submission: I) -> Result<DecryptedFormData>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut raw: BTreeMap<String, String> = submission
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let metadata = self.open_metadata(&mut raw)?;

        if metadata.form_id() != self.form_id {
            return Err(CaptchaError::InvalidFormId {
                expected: self.form_id.clone(),
                got: metadata.form_id().to_string(),
            });
        }

        self.check_timing(&metadata)?;

        let fields = self.decrypt_keys(&raw);
        for id in metadata.honeypot_ids() {
            match fields.get(id) {
                None => return Err(CaptchaError::HoneypotMissing { field: id.clone() }),
                Some(value) if !value.is_empty() => {
                    return Err(CaptchaError::HoneypotFilled {
                        field: id.clone(),
                        value: value.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        Ok(DecryptedFormData {
            raw,
            fields,
            metadata,
        })
    }

    fn open_metadata(&self, raw: &mut BTreeMap<String, String>) -> Result<FormMetadata> {
        let token = raw
            .remove(&metadata_field_name(&self.cipher))
            .ok_or(CaptchaError::MissingMetadata)?;

        let signed = b64_decode(&token).map_err(|_| CaptchaError::InvalidSignature)?;
        if !self.signer.verify(&signed) {
            return Err(CaptchaError::InvalidSignature);
        }

        let wire = self
            .cipher
            .decrypt(self.signer.payload_of(&signed))
            .map_err(|_| CaptchaError::DecryptionFailure)?;

        FormMetadata::from_wire(&wire)
    }

    /// A window edge past chrono's range never arrives: the form stays too
    /// fast forever, or never expires.
    fn check_timing(&self, metadata: &FormMetadata) -> Result<()> {
        let now = self.options.now();
        let generated = metadata.generation_time();
        match generated.checked_add_signed(self.options.min_delay) {
            Some(valid_from) if now >= valid_from => {}
            _ => return Err(CaptchaError::Timing(TimingViolation::TooFast)),
        }
        if let Some(valid_until) = generated.checked_add_signed(self.options.max_age) {
            if now > valid_until {
                return Err(CaptchaError::Timing(TimingViolation::TooOld));
            }
        }
        Ok(())
    }

    /// Map each raw key to its logical name. Keys that are not ours keep
    /// their raw name. If two keys resolve to the same name the later one in
    /// key order wins.
    fn decrypt_keys(&self, raw: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        raw.iter()
            .map(|(key, value)| {
                let name = self.decrypt_key(key).unwrap_or_else(|| key.clone());
                (name, value.clone())
            })
            .collect()
    }

    fn decrypt_key(&self, key: &str) -> Option<String> {
        let decoded = b64_decode(key).ok()?;
        let blob = decoded.strip_prefix(FIELD_NAME_PREFIX)?;
        let plain = self.cipher.decrypt(blob).ok()?;
        String::from_utf8(plain).ok()
    }
}

/// Validated submission, keyed by logical field name.
///
/// Edits only touch this view; [`DecryptedFormData::raw`] keeps the
/// submission as it arrived, minus the metadata input.
#[derive(Debug, Clone)]
pub struct DecryptedFormData {
    raw: BTreeMap<String, String>,
    fields: BTreeMap<String, String>,
    metadata: FormMetadata,
}

impl DecryptedFormData {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn metadata(&self) -> &FormMetadata {
        &self.metadata
    }

    /// Wire keys and values as submitted, without the metadata input.
    pub fn raw(&self) -> &BTreeMap<String, String> {
        &self.raw
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.fields
    }
}

impl Index<&str> for DecryptedFormData {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no field named {:?} in form data", name),
        }
    }
}
