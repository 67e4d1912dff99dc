//! Validation window and clock configuration.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::{CaptchaError, Result};

/// Minimum time between rendering a form and submitting it. Nobody fills in
/// a real form faster than this.
pub const DEFAULT_MIN_DELAY_SECS: i64 = 15;

/// Maximum age of a form token before it counts as replayed.
pub const DEFAULT_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Inclusive bounds on the number of honeypots per generated form.
pub const MIN_HONEYPOTS: usize = 4;
pub const MAX_HONEYPOTS: usize = 8;

/// Clock used for generation timestamps and the validity window.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Options for generating and validating forms.
#[derive(Clone)]
pub struct CaptchaOptions {
    /// Submissions earlier than `generation_time + min_delay` fail as too fast.
    pub min_delay: Duration,
    /// Submissions later than `generation_time + max_age` fail as too old.
    pub max_age: Duration,
    /// Time source. Defaults to `chrono::Utc::now()` if `None`.
    pub clock: Option<Clock>,
}

impl Default for CaptchaOptions {
    fn default() -> Self {
        Self {
            min_delay: Duration::seconds(DEFAULT_MIN_DELAY_SECS),
            max_age: Duration::seconds(DEFAULT_MAX_AGE_SECS),
            clock: None,
        }
    }
}

impl CaptchaOptions {
    /// Replace the clock, e.g. with a fixed time in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Current time according to the configured clock.
    pub fn now(&self) -> DateTime<Utc> {
        match &self.clock {
            Some(clock) => clock(),
            None => Utc::now(),
        }
    }

    /// Reject windows that no submission could ever satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.min_delay < Duration::zero() {
            return Err(CaptchaError::InvalidOptions(format!(
                "min_delay must not be negative, got {}s",
                self.min_delay.num_seconds()
            )));
        }
        if self.max_age <= self.min_delay {
            return Err(CaptchaError::InvalidOptions(format!(
                "max_age ({}s) must be greater than min_delay ({}s)",
                self.max_age.num_seconds(),
                self.min_delay.num_seconds()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CaptchaOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaOptions")
            .field("min_delay", &self.min_delay)
            .field("max_age", &self.max_age)
            .field("clock", &self.clock.as_ref().map(|_| "custom"))
            .finish()
    }
}
