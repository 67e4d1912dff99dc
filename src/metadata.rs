//! Form metadata carried inside the signed, encrypted token.
//!
//! Wire format: `{"i": form_id, "d": "2018-05-01T10:00:00+0000", "h": [honeypot ids]}`
//! Short keys keep the token, and therefore the rendered field, small.

use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, Utc};
use honeyform_crypto::{b64_encode, CipherBox};
use serde::{Deserialize, Serialize};

use crate::error::{CaptchaError, Result};
use crate::options::{MAX_HONEYPOTS, MIN_HONEYPOTS};

/// ISO-8601 with a basic-format offset, e.g. `2018-05-01T10:00:00+0000`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

const METADATA_LABEL: &str = "meta-data";

#[derive(Serialize, Deserialize)]
struct WireMetadata {
    i: String,
    d: String,
    h: Vec<String>,
}

/// Identity, birth time and honeypot list of one rendered form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMetadata {
    form_id: String,
    generation_time: DateTime<Utc>,
    honeypot_ids: Vec<String>,
}

impl FormMetadata {
    /// Build metadata. The timestamp is truncated to whole seconds, the
    /// precision it has on the wire.
    pub fn new(
        form_id: impl Into<String>,
        generation_time: DateTime<Utc>,
        honeypot_ids: Vec<String>,
    ) -> Self {
        Self {
            form_id: form_id.into(),
            generation_time: generation_time.trunc_subsecs(0),
            honeypot_ids,
        }
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn generation_time(&self) -> DateTime<Utc> {
        self.generation_time
    }

    /// Honeypot wire names, in generation order.
    pub fn honeypot_ids(&self) -> &[String] {
        &self.honeypot_ids
    }

    /// Serialize to the compact JSON wire form.
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        let wire = WireMetadata {
            i: self.form_id.clone(),
            d: self.generation_time.format(DATETIME_FORMAT).to_string(),
            h: self.honeypot_ids.clone(),
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Parse the compact JSON wire form.
    ///
    /// # Errors
    /// `CaptchaError::InvalidMetadata` if a key is missing or mistyped, the
    /// date does not parse, or the honeypot list is out of shape.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        let wire: WireMetadata = serde_json::from_slice(bytes)
            .map_err(|e| CaptchaError::InvalidMetadata(e.to_string()))?;

        let generation_time = parse_datetime(&wire.d).ok_or_else(|| {
            CaptchaError::InvalidMetadata(format!("unparseable generation date {:?}", wire.d))
        })?;

        if !(MIN_HONEYPOTS..=MAX_HONEYPOTS).contains(&wire.h.len()) {
            return Err(CaptchaError::InvalidMetadata(format!(
                "expected {}..={} honeypots, got {}",
                MIN_HONEYPOTS,
                MAX_HONEYPOTS,
                wire.h.len()
            )));
        }
        let mut seen = HashSet::with_capacity(wire.h.len());
        for id in &wire.h {
            if id.is_empty() {
                return Err(CaptchaError::InvalidMetadata("empty honeypot id".into()));
            }
            if !seen.insert(id.as_str()) {
                return Err(CaptchaError::InvalidMetadata(format!(
                    "duplicate honeypot id {:?}",
                    id
                )));
            }
        }

        Ok(Self::new(wire.i, generation_time, wire.h))
    }
}

/// Wire name of the hidden input carrying the sealed metadata. Stable for a
/// given form id and secret.
pub fn metadata_field_name(cipher: &CipherBox) -> String {
    b64_encode(&cipher.hash_label(METADATA_LABEL))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
