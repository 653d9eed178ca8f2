//! Harness configuration from environment variables with typed defaults

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::Role;

/// Environment variable names understood by the harness
pub mod env_keys {
    pub const BASE_URL: &str = "THESISTRACK_BASE_URL";
    pub const REPORT_DIR: &str = "THESISTRACK_REPORT_DIR";
    pub const STATE_DIR: &str = "THESISTRACK_STATE_DIR";
    pub const INSECURE: &str = "THESISTRACK_INSECURE";
    pub const TIMEOUT_SECS: &str = "THESISTRACK_TIMEOUT_SECS";
}

/// Login credentials for one seeded account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

/// Configuration for a harness run
///
/// The credential set and the tribunal member ids describe externally
/// seeded accounts; they are surfaced here instead of being buried in
/// request payloads so a different deployment can override them.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the API under test
    pub base_url: String,

    /// Directory for the persisted run report
    pub report_dir: PathBuf,

    /// Directory for ephemeral harness state (token file)
    pub state_dir: PathBuf,

    /// Accept self-signed TLS certificates (local dev deployments)
    pub accept_invalid_certs: bool,

    /// Per-request timeout
    pub timeout: Duration,

    /// Login credentials per role
    pub credentials: BTreeMap<Role, Credentials>,

    /// Credentials expected to be rejected by the login endpoint
    pub invalid_credentials: Credentials,

    /// Seeded user id used as submission supervisor
    pub supervisor_id: u64,

    /// Seeded user ids for tribunal composition
    pub president_id: u64,
    pub secretary_id: u64,
    pub vocal_id: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let mut credentials = BTreeMap::new();
        credentials.insert(Role::Student, Credentials::new("student@uni.edu", "123456"));
        credentials.insert(Role::Professor, Credentials::new("professor@uni.edu", "123456"));
        credentials.insert(Role::Admin, Credentials::new("admin@uni.edu", "123456"));
        credentials.insert(Role::President, Credentials::new("president@uni.edu", "123456"));

        Self {
            base_url: "https://thesistrack-backend.ddev.site".to_string(),
            report_dir: std::env::temp_dir(),
            state_dir: std::env::temp_dir(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(30),
            credentials,
            invalid_credentials: Credentials::new("nobody@uni.edu", "wrongpass"),
            supervisor_id: 2,
            president_id: 9,
            secretary_id: 7,
            vocal_id: 8,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = read_env(env_keys::BASE_URL)? {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = read_env(env_keys::REPORT_DIR)? {
            config.report_dir = PathBuf::from(dir);
        }
        if let Some(dir) = read_env(env_keys::STATE_DIR)? {
            config.state_dir = PathBuf::from(dir);
        }
        if let Some(raw) = read_env(env_keys::INSECURE)? {
            config.accept_invalid_certs = parse_bool(env_keys::INSECURE, &raw)?;
        }
        if let Some(raw) = read_env(env_keys::TIMEOUT_SECS)? {
            let secs: u64 = raw.parse().map_err(|_| {
                Error::InvalidConfig(format!("{} must be a positive integer", env_keys::TIMEOUT_SECS))
            })?;
            if secs == 0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a positive integer",
                    env_keys::TIMEOUT_SECS
                )));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Path of the ephemeral token file shared between suite runs
    pub fn token_file(&self) -> PathBuf {
        self.state_dir.join("thesistrack_test_tokens.json")
    }

    /// Credentials for a role, if configured
    pub fn credentials_for(&self, role: Role) -> Option<&Credentials> {
        self.credentials.get(&role)
    }
}

/// Read an environment variable, rejecting empty and non-UTF-8 values
fn read_env(name: &str) -> Result<Option<String>> {
    match std::env::var_os(name) {
        None => Ok(None),
        Some(raw) => {
            let value = raw
                .into_string()
                .map_err(|_| Error::InvalidConfig(format!("{name} must be valid UTF-8")))?;
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{name} is set but empty")));
            }
            Ok(Some(value))
        }
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(Error::InvalidConfig(format!(
            "{name} must be one of 1/0/true/false, got {raw}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_all_roles() {
        let config = HarnessConfig::default();
        for role in [Role::Student, Role::Professor, Role::Admin, Role::President] {
            assert!(config.credentials_for(role).is_some(), "missing {role}");
        }
    }

    #[test]
    fn test_token_file_under_state_dir() {
        let config = HarnessConfig {
            state_dir: PathBuf::from("/var/tmp"),
            ..Default::default()
        };
        assert_eq!(
            config.token_file(),
            PathBuf::from("/var/tmp/thesistrack_test_tokens.json")
        );
    }

    #[test]
    fn test_parse_bool_values() {
        assert!(parse_bool("X", "1").unwrap());
        assert!(parse_bool("X", "true").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(!parse_bool("X", "false").unwrap());
        assert!(parse_bool("X", "yes").is_err());
    }
}
