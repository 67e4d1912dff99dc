//! Invisible form protection.
//!
//! Each rendered form carries a sealed metadata token (form id, generation
//! time, honeypot list) and a random set of honeypot inputs. A submission
//! passes only if the token is authentic, the form was filled in at human
//! speed within its lifetime, and every honeypot came back present and empty.
//!
//! ```no_run
//! use honeyform::Captcha;
//!
//! # fn main() -> honeyform::Result<()> {
//! let captcha = Captcha::new("contact", "server secret")?;
//! let form = captcha.generator()?;
//! let html = form.render_all();
//! let email_input = form.field_name("email")?;
//! # let submission: Vec<(String, String)> = Vec::new();
//! let data = captcha.validate(submission)?;
//! let email = data.get("email");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod honeypot;
pub mod metadata;
pub mod options;
pub mod validator;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use honeyform_crypto::{CipherBox, Signer};
use tracing::{debug, error, trace};

pub use error::{CaptchaError, ErrorClass, Result, TimingViolation};
pub use generator::{FormGenerator, MetadataField, TransportForm};
pub use honeypot::{HoneypotField, HoneypotKind, HoneypotRepr};
pub use metadata::FormMetadata;
pub use options::CaptchaOptions;
pub use validator::{DecryptedFormData, FormValidator};

/// Keys and options for one form id.
///
/// Cheap to clone; keys are shared between every generator and validator
/// created from it.
#[derive(Debug, Clone)]
pub struct Captcha {
    form_id: String,
    cipher: Arc<CipherBox>,
    signer: Arc<Signer>,
    options: CaptchaOptions,
}

impl Captcha {
    pub fn new(form_id: impl Into<String>, secret: impl AsRef<[u8]>) -> Result<Self> {
        Self::with_options(form_id, secret, CaptchaOptions::default())
    }

    pub fn with_options(
        form_id: impl Into<String>,
        secret: impl AsRef<[u8]>,
        options: CaptchaOptions,
    ) -> Result<Self> {
        options.validate()?;
        let form_id = form_id.into();
        let secret = secret.as_ref();
        Ok(Self {
            cipher: Arc::new(CipherBox::derive(secret, &form_id)?),
            signer: Arc::new(Signer::derive(secret, &form_id)?),
            form_id,
            options,
        })
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn options(&self) -> &CaptchaOptions {
        &self.options
    }

    /// Generate a form stamped with the configured clock's current time.
    pub fn generator(&self) -> Result<FormGenerator> {
        self.generator_at(self.options.now())
    }

    pub fn generator_at(&self, generation_time: DateTime<Utc>) -> Result<FormGenerator> {
        FormGenerator::new(
            self.form_id.clone(),
            generation_time,
            Arc::clone(&self.cipher),
            Arc::clone(&self.signer),
        )
    }

    pub fn validator(&self) -> FormValidator {
        FormValidator::new(
            self.form_id.clone(),
            Arc::clone(&self.cipher),
            Arc::clone(&self.signer),
            self.options.clone(),
        )
    }

    /// Validate a submission and log the outcome.
    ///
    /// Bot signals log at debug, tampering at error. Submitted honeypot
    /// values never reach the log.
    pub fn validate<I, K, V>(&self, submission: I) -> Result<DecryptedFormData>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        match self.validator().validate(submission) {
            Ok(data) => {
                trace!(form_id = %self.form_id, fields = data.len(), "form submission accepted");
                Ok(data)
            }
            Err(err) => {
                self.log_failure(&err);
                Err(err)
            }
        }
    }

    fn log_failure(&self, err: &CaptchaError) {
        // Display for HoneypotFilled omits the value.
        match err.class() {
            ErrorClass::TuringTest => debug!(
                form_id = %self.form_id,
                code = err.code(),
                error = %err,
                "form failed turing test"
            ),
            ErrorClass::Tampering => error!(
                form_id = %self.form_id,
                code = err.code(),
                error = %err,
                "form submission tampered"
            ),
            ErrorClass::Internal => error!(
                form_id = %self.form_id,
                critical = true,
                error = %err,
                "form validation failed internally"
            ),
        }
    }
}

/// Generate a form for `form_id` with default options.
pub fn generate(form_id: &str, secret: &str) -> Result<FormGenerator> {
    Captcha::new(form_id, secret)?.generator()
}

/// Validate a submission for `form_id` with default options.
pub fn validate<I, K, V>(form_id: &str, secret: &str, submission: I) -> Result<DecryptedFormData>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    Captcha::new(form_id, secret)?.validate(submission)
}
