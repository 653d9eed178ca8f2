//! Per-domain suite runners
//!
//! Every suite follows the same fixed internal order: read-only tests,
//! then creation/mutation, then permission-negative, then
//! payload-validation, then conflict-specific tests. Later negative
//! tests rely on the happy path having already proven the endpoint
//! reachable and correctly shaped.

pub mod defenses;
pub mod notifications;
pub mod submissions;
pub mod tribunals;
pub mod users;

use thesistrack_common::{ApiClient, HarnessConfig, Role};

use crate::auth::RoleTokens;
use crate::report::{Recorder, SuiteKind, SuiteReport};
use crate::tracker::ResourceTracker;

/// Shared context for one suite run
///
/// The token map is borrowed and read-only; the recorder and tracker are
/// owned by the suite and handed back when it finishes.
pub struct SuiteCx<'a> {
    pub client: &'a ApiClient,
    pub tokens: &'a RoleTokens,
    pub config: &'a HarnessConfig,
    pub recorder: Recorder,
    pub tracker: ResourceTracker,
}

impl<'a> SuiteCx<'a> {
    pub fn new(client: &'a ApiClient, tokens: &'a RoleTokens, config: &'a HarnessConfig) -> Self {
        Self {
            client,
            tokens,
            config,
            recorder: Recorder::new(),
            tracker: ResourceTracker::new(),
        }
    }

    /// Bearer for a role, or record the missing-token failure
    ///
    /// A missing prerequisite token is functionally a skip but is counted
    /// as a failure, matching the aggregate contract.
    pub fn token_or_fail(&mut self, role: Role, test_name: &str) -> Option<&'a str> {
        match self.tokens.bearer(role) {
            Some(token) => Some(token),
            None => {
                self.recorder
                    .fail(test_name, format!("{role} token unavailable"));
                None
            }
        }
    }

    /// Finish the suite, yielding its report and its tracker for cleanup
    pub fn finish(self, kind: SuiteKind) -> (SuiteReport, ResourceTracker) {
        let mut report = self.recorder.into_report(kind);
        report.resources = self.tracker.items().to_vec();
        (report, self.tracker)
    }
}

/// Authorization failures for write/read attempts without privilege
pub fn is_denied(status: u16) -> bool {
    matches!(status, 401 | 403)
}

/// Structurally invalid payload rejections
pub fn is_validation_error(status: u16) -> bool {
    matches!(status, 400 | 422)
}

/// Conflict rejections; servers are also allowed to accept the conflict
pub fn is_conflict_rejection(status: u16) -> bool {
    matches!(status, 400 | 409 | 422)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(is_denied(401));
        assert!(is_denied(403));
        assert!(!is_denied(200));
        assert!(!is_denied(404));

        assert!(is_validation_error(400));
        assert!(is_validation_error(422));
        assert!(!is_validation_error(409));

        assert!(is_conflict_rejection(409));
        assert!(is_conflict_rejection(400));
        assert!(is_conflict_rejection(422));
        assert!(!is_conflict_rejection(201));
    }
}
