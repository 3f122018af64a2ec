//! Invocation configuration and its resolution into a retry policy.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

const DEFAULT_NUM_TRIES: u32 = 1;
const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_BACKOFF_BASE_SECS: f64 = 0.5;
const DEFAULT_BACKOFF_MAX_SECS: f64 = 8.0;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Environment variables that override configuration fields.
pub const NUM_TRIES_ENV_VAR: &str = "VIBECHECK_NUM_TRIES";
pub const MAX_RETRIES_ENV_VAR: &str = "VIBECHECK_MAX_RETRIES";
pub const BACKOFF_BASE_ENV_VAR: &str = "VIBECHECK_BACKOFF_BASE";
pub const BACKOFF_MAX_ENV_VAR: &str = "VIBECHECK_BACKOFF_MAX";
pub const TIMEOUT_ENV_VAR: &str = "VIBECHECK_TIMEOUT_MS";

/// User-facing configuration knobs.
///
/// `num_tries` is the total number of attempts. `max_retries` is the older
/// knob counting additional attempts after the first. When both are set the
/// larger total wins: `max(num_tries, max_retries + 1)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VibeCheckConfig {
    pub num_tries: u32,
    pub max_retries: u32,
    /// Exponential backoff base delay, in seconds.
    pub backoff_base: f64,
    /// Maximum backoff delay, in seconds.
    pub backoff_max: f64,
    /// Per round trip timeout for HTTP backends, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for VibeCheckConfig {
    fn default() -> Self {
        Self {
            num_tries: DEFAULT_NUM_TRIES,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE_SECS,
            backoff_max: DEFAULT_BACKOFF_MAX_SECS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl VibeCheckConfig {
    /// Defaults overlaid with any `VIBECHECK_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay `VIBECHECK_*` environment variables onto this configuration.
    ///
    /// Logs a warning and keeps the current value when a variable is set but
    /// cannot be parsed.
    pub fn with_env_overrides(mut self) -> Self {
        override_from_env(NUM_TRIES_ENV_VAR, &mut self.num_tries);
        override_from_env(MAX_RETRIES_ENV_VAR, &mut self.max_retries);
        override_from_env(BACKOFF_BASE_ENV_VAR, &mut self.backoff_base);
        override_from_env(BACKOFF_MAX_ENV_VAR, &mut self.backoff_max);
        override_from_env(TIMEOUT_ENV_VAR, &mut self.timeout_ms);
        self
    }

    /// Total attempts implied by the two attempt knobs.
    pub fn total_attempts(&self) -> u32 {
        self.num_tries.max(self.max_retries.saturating_add(1))
    }

    /// Per round trip timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the knobs and fold them into a [`RetryPolicy`].
    pub fn resolve(&self) -> Result<RetryPolicy, ConfigError> {
        if self.num_tries == 0 {
            return Err(ConfigError::InvalidNumTries(self.num_tries));
        }
        if !self.backoff_base.is_finite() || self.backoff_base <= 0.0 {
            return Err(ConfigError::InvalidBackoffBase(self.backoff_base));
        }
        if !self.backoff_max.is_finite() || self.backoff_max < self.backoff_base {
            return Err(ConfigError::InvalidBackoffMax {
                base: self.backoff_base,
                max: self.backoff_max,
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        let backoff_base = Duration::try_from_secs_f64(self.backoff_base)
            .map_err(|_| ConfigError::InvalidBackoffBase(self.backoff_base))?;
        let backoff_max =
            Duration::try_from_secs_f64(self.backoff_max).map_err(|_| ConfigError::InvalidBackoffMax {
                base: self.backoff_base,
                max: self.backoff_max,
            })?;

        Ok(RetryPolicy {
            max_attempts: self.total_attempts(),
            backoff_base,
            backoff_max,
        })
    }
}

fn override_from_env<T: FromStr>(var: &str, slot: &mut T) {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => match v.trim().parse::<T>() {
            Ok(parsed) => *slot = parsed,
            Err(_) => warn!("Invalid {} value '{}', keeping configured value", var, v),
        },
        _ => {}
    }
}

/// Resolved, immutable retry policy shared by every call on a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl RetryPolicy {
    /// Build a policy directly. `max_attempts` is clamped to at least 1 and
    /// `backoff_max` to at least `backoff_base`.
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
            backoff_max: backoff_max.max(backoff_base),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }

    pub fn backoff_max(&self) -> Duration {
        self.backoff_max
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_NUM_TRIES,
            Duration::from_secs_f64(DEFAULT_BACKOFF_BASE_SECS),
            Duration::from_secs_f64(DEFAULT_BACKOFF_MAX_SECS),
        )
    }
}
