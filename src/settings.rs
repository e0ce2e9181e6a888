// src/settings.rs
//! Runtime configuration.
//!
//! Values come from built-in defaults overlaid by `CLAIMS_*` environment
//! variables (e.g. `CLAIMS_SESSION_TIMEOUT_MS=5000`). The binary loads an
//! optional `.env` first with `dotenv`.

use crate::error::FlowResult;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const ENV_PREFIX: &str = "CLAIMS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub verifier_name: String,
    pub prover_name: String,
    pub authority_name: String,
    pub notary_name: String,
    /// Handle of the Prover's master secret in the proof capability
    pub master_secret_id: String,
    pub session_timeout_ms: u64,
    /// Whether the ledger keeps two verifications under one identifier
    pub allow_duplicate_identifiers: bool,
}

/// Knobs a protocol run needs at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSettings {
    /// Upper bound on every session receive
    pub session_timeout: Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self { session_timeout: Duration::from_millis(30_000) }
    }
}

impl Settings {
    /// Loads defaults overlaid by the process environment.
    ///
    /// # Errors
    /// `Configuration` if a variable does not parse or a value is out of range
    pub fn load() -> FlowResult<Self> {
        Self::from_environment(None)
    }

    /// Same as [`Settings::load`] with an explicit variable map replacing the
    /// process environment.
    pub fn from_environment(variables: Option<HashMap<String, String>>) -> FlowResult<Self> {
        let settings: Settings = Config::builder()
            .set_default("verifier_name", "Verifier")?
            .set_default("prover_name", "Prover")?
            .set_default("authority_name", "Issuer")?
            .set_default("notary_name", "Notary")?
            .set_default("master_secret_id", "prover-master-secret")?
            .set_default("session_timeout_ms", 30_000_i64)?
            .set_default("allow_duplicate_identifiers", true)?
            .add_source(Environment::with_prefix(ENV_PREFIX).source(variables))
            .build()?
            .try_deserialize()?;

        if settings.session_timeout_ms == 0 {
            return Err(ConfigError::Message("session_timeout_ms must be positive".into()).into());
        }
        Ok(settings)
    }

    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings { session_timeout: Duration::from_millis(self.session_timeout_ms) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_environment(vars(&[])).unwrap();
        assert_eq!(settings.verifier_name, "Verifier");
        assert_eq!(settings.prover_name, "Prover");
        assert!(settings.allow_duplicate_identifiers);
        assert_eq!(settings.flow_settings(), FlowSettings::default());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::from_environment(vars(&[
            ("CLAIMS_PROVER_NAME", "Alice"),
            ("CLAIMS_SESSION_TIMEOUT_MS", "250"),
            ("CLAIMS_ALLOW_DUPLICATE_IDENTIFIERS", "false"),
        ]))
        .unwrap();
        assert_eq!(settings.prover_name, "Alice");
        assert!(!settings.allow_duplicate_identifiers);
        assert_eq!(settings.flow_settings().session_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_environment(vars(&[("CLAIMS_SESSION_TIMEOUT_MS", "0")])).unwrap_err();
        assert_eq!(err.kind(), "configuration");

        let err = Settings::from_environment(vars(&[("CLAIMS_SESSION_TIMEOUT_MS", "soon")])).unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }
}
