//! Token acquisition: one login per role, plus the refresh contract
//!
//! The resulting [`RoleTokens`] map is built once per run, immutable
//! afterwards, and passed by reference into every suite. One role's
//! login failure never blocks acquisition of the others.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thesistrack_common::{
    ApiClient, HarnessConfig, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
    Result, Role,
};
use tracing::{info, warn};

use crate::report::{Recorder, SuiteKind, SuiteReport};

/// Access token plus the optional refresh token for one role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Immutable role → token map; at most one entry per role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleTokens(BTreeMap<Role, TokenSet>);

impl RoleTokens {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Bearer token for a role, if that role authenticated
    pub fn bearer(&self, role: Role) -> Option<&str> {
        self.0.get(&role).map(|t| t.token.as_str())
    }

    /// Refresh token for a role, if the login response carried one
    pub fn refresh_token(&self, role: Role) -> Option<&str> {
        self.0.get(&role).and_then(|t| t.refresh_token.as_deref())
    }

    /// Persist to the ephemeral token file shared by single-suite runs
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load a previously persisted token map
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Remove the ephemeral token file; a missing file is not an error
    pub fn remove_file(path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => info!("removed token file {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove token file {}: {e}", path.display()),
        }
    }
}

/// Run the authentication suite and build the token map
///
/// Every outcome, including the invalid-credentials probe and the
/// refresh check, is an ordinary test result; nothing here aborts.
pub async fn acquire(client: &ApiClient, config: &HarnessConfig) -> (RoleTokens, SuiteReport) {
    let mut recorder = Recorder::new();
    let mut tokens = BTreeMap::new();

    for role in Role::ALL {
        let name = format!("login {role}");
        let Some(creds) = config.credentials_for(role) else {
            recorder.fail(&name, format!("no credentials configured for {role}"));
            continue;
        };
        let request = LoginRequest {
            username: creds.username.clone(),
            password: creds.password.clone(),
        };
        match client.post_json("/api/auth/login", &request, None).await {
            Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<LoginResponse>() {
                Ok(login) if !login.token.is_empty() => {
                    let preview: String = login.token.chars().take(16).collect();
                    recorder.pass(&name, format!("token acquired: {preview}..."));
                    tokens.insert(
                        role,
                        TokenSet {
                            token: login.token,
                            refresh_token: login.refresh_token,
                        },
                    );
                }
                Ok(_) => recorder.fail(&name, "response carried an empty token"),
                Err(_) => recorder.fail(&name, "response body has no token field"),
            },
            Ok(resp) => recorder.fail(&name, resp.describe()),
            Err(e) => recorder.fail(&name, format!("request error: {e}")),
        }
    }

    test_invalid_login(client, config, &mut recorder).await;

    let tokens = RoleTokens(tokens);
    test_refresh(client, &tokens, &mut recorder).await;

    (tokens, recorder.into_report(SuiteKind::Auth))
}

/// Known-bad credentials must be rejected with 401 or 403
async fn test_invalid_login(client: &ApiClient, config: &HarnessConfig, recorder: &mut Recorder) {
    let name = "login with invalid credentials";
    let request = LoginRequest {
        username: config.invalid_credentials.username.clone(),
        password: config.invalid_credentials.password.clone(),
    };
    match client.post_json("/api/auth/login", &request, None).await {
        Ok(resp) if matches!(resp.status.as_u16(), 401 | 403) => {
            recorder.pass(name, format!("rejected with {}", resp.status.as_u16()));
        }
        Ok(resp) => recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => recorder.fail(name, format!("request error: {e}")),
    }
}

/// Exchange the student's refresh token for a fresh access token
async fn test_refresh(client: &ApiClient, tokens: &RoleTokens, recorder: &mut Recorder) {
    let name = "refresh token";
    let Some(refresh) = tokens.refresh_token(Role::Student) else {
        recorder.fail(name, "no refresh token available for student");
        return;
    };
    let request = RefreshRequest {
        refresh_token: refresh.to_string(),
    };
    match client.post_json("/api/auth/refresh", &request, None).await {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<RefreshResponse>() {
            Ok(refreshed) if !refreshed.token.is_empty() => {
                recorder.pass(name, "new access token issued");
            }
            _ => recorder.fail(name, "response body has no token field"),
        },
        Ok(resp) => recorder.fail(name, resp.describe()),
        Err(e) => recorder.fail(name, format!("request error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tokens() -> RoleTokens {
        let mut map = BTreeMap::new();
        map.insert(
            Role::Student,
            TokenSet {
                token: "student-token".to_string(),
                refresh_token: Some("student-refresh".to_string()),
            },
        );
        map.insert(
            Role::Admin,
            TokenSet {
                token: "admin-token".to_string(),
                refresh_token: None,
            },
        );
        RoleTokens(map)
    }

    #[test]
    fn test_bearer_lookup() {
        let tokens = sample_tokens();
        assert_eq!(tokens.bearer(Role::Admin), Some("admin-token"));
        assert_eq!(tokens.bearer(Role::Professor), None);
        assert_eq!(tokens.refresh_token(Role::Student), Some("student-refresh"));
        assert_eq!(tokens.refresh_token(Role::Admin), None);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let tokens = sample_tokens();
        tokens.save(&path).unwrap();

        let loaded = RoleTokens::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.bearer(Role::Student), Some("student-token"));
    }

    #[test]
    fn test_remove_missing_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        RoleTokens::remove_file(&dir.path().join("absent.json"));
    }

    #[test]
    fn test_empty_map() {
        let tokens = RoleTokens::default();
        assert!(tokens.is_empty());
        assert_eq!(tokens.len(), 0);
    }
}
