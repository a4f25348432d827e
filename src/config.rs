// src/config.rs
//! Runtime settings.
//!
//! Defaults are overlaid by environment variables prefixed `SSI_`:
//! - `SSI_REPLAY_WINDOW_MINUTES`: maximum presentation age (default 30)
//! - `SSI_CREDENTIAL_VALIDITY_DAYS`: default credential lifetime (default 365)
//! - `SSI_ENFORCE_FRESHNESS`: fail stale presentations instead of warning (default false)
//! - `SSI_STRICT_REVEAL`: reject unknown reveal keys (default true)

use crate::error::Result;
use crate::services::credential_issuer::DEFAULT_VALIDITY_DAYS;
use crate::services::verifier::{FreshnessPolicy, DEFAULT_REPLAY_WINDOW_MINUTES};
use crate::wallet::presentation_builder::RevealPolicy;
use chrono::Duration;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

const ENV_PREFIX: &str = "SSI";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub replay_window_minutes: i64,
    pub credential_validity_days: i64,
    pub enforce_freshness: bool,
    pub strict_reveal: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            replay_window_minutes: DEFAULT_REPLAY_WINDOW_MINUTES,
            credential_validity_days: DEFAULT_VALIDITY_DAYS,
            enforce_freshness: false,
            strict_reveal: true,
        }
    }
}

impl Settings {
    /// Loads defaults overlaid by `SSI_*` environment variables.
    ///
    /// # Errors
    /// `Config` if a variable cannot be parsed or a duration is not positive.
    pub fn load() -> Result<Self> {
        let config = Self::defaults()?
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Self::from_config(config)
    }

    /// Builder pre-populated with the default values.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let d = Settings::default();
        Ok(Config::builder()
            .set_default("replay_window_minutes", d.replay_window_minutes)?
            .set_default("credential_validity_days", d.credential_validity_days)?
            .set_default("enforce_freshness", d.enforce_freshness)?
            .set_default("strict_reveal", d.strict_reveal)?)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config.try_deserialize()?;
        if settings.replay_window_minutes <= 0 {
            return Err(ConfigError::Message("replay_window_minutes must be positive".into()).into());
        }
        if settings.credential_validity_days <= 0 {
            return Err(ConfigError::Message("credential_validity_days must be positive".into()).into());
        }
        Ok(settings)
    }

    pub fn replay_window(&self) -> Duration {
        Duration::minutes(self.replay_window_minutes)
    }

    pub fn credential_validity(&self) -> Duration {
        Duration::days(self.credential_validity_days)
    }

    pub fn freshness_policy(&self) -> FreshnessPolicy {
        if self.enforce_freshness {
            FreshnessPolicy::Enforced
        } else {
            FreshnessPolicy::Advisory
        }
    }

    pub fn reveal_policy(&self) -> RevealPolicy {
        if self.strict_reveal {
            RevealPolicy::Strict
        } else {
            RevealPolicy::IgnoreUnknown
        }
    }
}
