//! Per-render form state: metadata token, honeypots, obfuscated field names.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use honeyform_crypto::{b64_encode, CipherBox, Signer};
use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::honeypot::{escape_attr, HoneypotField, HoneypotKind, HoneypotRepr};
use crate::metadata::{metadata_field_name, FormMetadata};
use crate::options::{MAX_HONEYPOTS, MIN_HONEYPOTS};

/// Marker prepended to an encrypted logical field name before encoding.
pub const FIELD_NAME_PREFIX: &[u8] = b"_e:";

/// Plaintext prefix of honeypot wire names.
const HONEYPOT_PREFIX: &str = "honey";

/// Defines `window.HoneyForm.onLoad`, which honeypot scripts hook into.
pub const HELPER_SCRIPT: &str = include_str!("../assets/helper.js");

/// Name and value of the hidden metadata input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

/// Everything a non-HTML client needs to build the form itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportForm {
    pub meta_data: MetadataField,
    pub honeypots: Vec<HoneypotRepr>,
    pub helper_script: String,
    /// Logical field name -> obfuscated wire name.
    pub fields: Map<String, Value>,
}

/// One freshly generated form instance.
///
/// Construction draws the honeypots and seals the metadata; everything after
/// that is rendering. Field names from [`FormGenerator::field_name`] are
/// re-encrypted on every call, so the same logical name yields a different
/// wire name each time. All of them decrypt back on submission.
#[derive(Debug)]
pub struct FormGenerator {
    cipher: Arc<CipherBox>,
    metadata: FormMetadata,
    honeypots: Vec<HoneypotField>,
    metadata_field: MetadataField,
}

impl FormGenerator {
    pub fn new(
        form_id: impl Into<String>,
        generation_time: DateTime<Utc>,
        cipher: Arc<CipherBox>,
        signer: Arc<Signer>,
    ) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let count = rng.gen_range(MIN_HONEYPOTS..=MAX_HONEYPOTS);

        let mut honeypots = Vec::with_capacity(count);
        for _ in 0..count {
            let nonce = format!("{}{}", HONEYPOT_PREFIX, uuid::Uuid::new_v4().simple());
            let field_id = b64_encode(&cipher.encrypt(nonce.as_bytes())?);
            honeypots.push(HoneypotField::new(field_id, HoneypotKind::random(&mut rng)));
        }

        let metadata = FormMetadata::new(
            form_id,
            generation_time,
            honeypots.iter().map(|h| h.field_id().to_string()).collect(),
        );

        let sealed = signer.sign(&cipher.encrypt(&metadata.to_wire()?)?);
        let metadata_field = MetadataField {
            name: metadata_field_name(&cipher),
            value: b64_encode(&sealed),
        };

        Ok(Self {
            cipher,
            metadata,
            honeypots,
            metadata_field,
        })
    }

    pub fn metadata(&self) -> &FormMetadata {
        &self.metadata
    }

    pub fn honeypots(&self) -> &[HoneypotField] {
        &self.honeypots
    }

    pub fn metadata_field_name(&self) -> &str {
        &self.metadata_field.name
    }

    pub fn metadata_field(&self) -> &MetadataField {
        &self.metadata_field
    }

    /// Wire name for a real input called `logical_name`.
    pub fn field_name(&self, logical_name: &str) -> Result<String> {
        let mut bytes = FIELD_NAME_PREFIX.to_vec();
        bytes.extend(self.cipher.encrypt(logical_name.as_bytes())?);
        Ok(b64_encode(&bytes))
    }

    pub fn render_metadata_field(&self) -> String {
        format!(
            r#"<input type="hidden" name="{}" value="{}" />"#,
            escape_attr(&self.metadata_field.name),
            escape_attr(&self.metadata_field.value)
        )
    }

    pub fn render_honeypot_fields(&self) -> String {
        self.honeypots
            .iter()
            .map(HoneypotField::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The helper must appear before any honeypot script runs.
    pub fn render_helper_script(&self) -> String {
        format!("<script>{}</script>", HELPER_SCRIPT)
    }

    /// Helper script, metadata input and honeypots, in that order.
    pub fn render_all(&self) -> String {
        [
            self.render_helper_script(),
            self.render_metadata_field(),
            self.render_honeypot_fields(),
        ]
        .join("\n")
    }

    pub fn to_transport_object(&self, real_field_names: &[&str]) -> Result<TransportForm> {
        let mut fields = Map::new();
        for name in real_field_names {
            fields.insert(name.to_string(), Value::String(self.field_name(name)?));
        }
        Ok(TransportForm {
            meta_data: self.metadata_field.clone(),
            honeypots: self.honeypots.iter().map(HoneypotField::to_repr).collect(),
            helper_script: HELPER_SCRIPT.to_string(),
            fields,
        })
    }

    /// [`FormGenerator::to_transport_object`] as a JSON string.
    pub fn to_json(&self, real_field_names: &[&str]) -> Result<String> {
        Ok(serde_json::to_string(
            &self.to_transport_object(real_field_names)?,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use honeyform_crypto::b64_decode;
    use std::collections::HashSet;

    const SECRET: &[u8] = b"generator test secret";

    fn generator() -> FormGenerator {
        let cipher = Arc::new(CipherBox::derive(SECRET, "contact").unwrap());
        let signer = Arc::new(Signer::derive(SECRET, "contact").unwrap());
        let at = Utc.with_ymd_and_hms(2018, 5, 1, 10, 0, 0).unwrap();
        FormGenerator::new("contact", at, cipher, signer).unwrap()
    }

    #[test]
    fn honeypot_count_within_bounds_and_unique() {
        for _ in 0..50 {
            let form = generator();
            let n = form.honeypots().len();
            assert!((MIN_HONEYPOTS..=MAX_HONEYPOTS).contains(&n), "{}", n);
            let ids: HashSet<_> = form.honeypots().iter().map(|h| h.field_id()).collect();
            assert_eq!(ids.len(), n);
        }
    }

    #[test]
    fn metadata_lists_honeypots_in_order() {
        let form = generator();
        let ids: Vec<_> = form
            .honeypots()
            .iter()
            .map(|h| h.field_id().to_string())
            .collect();
        assert_eq!(form.metadata().honeypot_ids(), ids.as_slice());
        assert_eq!(form.metadata().form_id(), "contact");
    }

    #[test]
    fn honeypot_ids_decrypt_to_prefixed_nonce() {
        let cipher = CipherBox::derive(SECRET, "contact").unwrap();
        let form = generator();
        for hp in form.honeypots() {
            let plain = cipher.decrypt(&b64_decode(hp.field_id()).unwrap()).unwrap();
            assert!(plain.starts_with(HONEYPOT_PREFIX.as_bytes()));
        }
    }

    #[test]
    fn metadata_token_opens_with_same_keys() {
        let cipher = CipherBox::derive(SECRET, "contact").unwrap();
        let signer = Signer::derive(SECRET, "contact").unwrap();
        let form = generator();

        let signed = b64_decode(&form.metadata_field().value).unwrap();
        assert!(signer.verify(&signed));
        let wire = cipher.decrypt(signer.payload_of(&signed)).unwrap();
        assert_eq!(&FormMetadata::from_wire(&wire).unwrap(), form.metadata());
        assert_eq!(form.metadata_field_name(), metadata_field_name(&cipher));
    }

    #[test]
    fn field_names_are_prefixed_and_fresh() {
        let form = generator();
        let a = form.field_name("email").unwrap();
        let b = form.field_name("email").unwrap();
        assert_ne!(a, b);
        assert!(b64_decode(&a).unwrap().starts_with(FIELD_NAME_PREFIX));
    }

    #[test]
    fn render_all_orders_helper_first() {
        let form = generator();
        let html = form.render_all();
        let helper = html.find("window.HoneyForm").unwrap();
        let meta = html.find(form.metadata_field_name()).unwrap();
        assert!(helper < meta);
        for hp in form.honeypots() {
            assert!(html.contains(&format!(r#"name="{}""#, hp.field_id())));
        }
    }

    #[test]
    fn transport_object_shape() {
        let form = generator();
        let value: Value = serde_json::from_str(&form.to_json(&["name", "email"]).unwrap()).unwrap();

        assert_eq!(value["metaData"]["name"], form.metadata_field_name());
        assert_eq!(
            value["honeypots"].as_array().unwrap().len(),
            form.honeypots().len()
        );
        assert!(value["helperScript"]
            .as_str()
            .unwrap()
            .contains("HoneyForm"));
        let fields = value["fields"].as_object().unwrap();
        assert_eq!(fields.keys().collect::<Vec<_>>(), ["name", "email"]);
    }
}
