//! Tracking and best-effort cleanup of resources created during a run

use serde::{Deserialize, Serialize};
use thesistrack_common::ApiClient;
use tracing::{info, warn};

/// Server-side entity kinds the harness may create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Submission,
    Tribunal,
    Defense,
    User,
    Notification,
}

impl ResourceKind {
    /// Collection path under `/api`
    pub const fn path(self) -> &'static str {
        match self {
            ResourceKind::Submission => "/api/submissions",
            ResourceKind::Tribunal => "/api/tribunals",
            ResourceKind::Defense => "/api/defenses",
            ResourceKind::User => "/api/users",
            ResourceKind::Notification => "/api/notifications",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Submission => "submission",
            ResourceKind::Tribunal => "tribunal",
            ResourceKind::Defense => "defense",
            ResourceKind::User => "user",
            ResourceKind::Notification => "notification",
        };
        f.write_str(name)
    }
}

/// One tracked server-side entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResource {
    pub kind: ResourceKind,
    pub id: u64,
}

/// Counts from one cleanup pass, for the log line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    pub deleted: usize,
    pub already_absent: usize,
    pub failed: usize,
}

/// Records created resource ids for later best-effort deletion
///
/// Each suite owns exactly one tracker; suites never read each other's.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    items: Vec<CreatedResource>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a created resource; the same (kind, id) is stored at most once
    pub fn record(&mut self, kind: ResourceKind, id: u64) {
        let item = CreatedResource { kind, id };
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CreatedResource] {
        &self.items
    }

    /// Delete every tracked resource with the admin token
    ///
    /// {200,204} counts as deleted, {403,404} as already absent. Any other
    /// status or transport failure is logged and never escapes; remaining
    /// resources are still attempted. Deletion order is not significant.
    pub async fn cleanup(&self, client: &ApiClient, admin_token: Option<&str>) -> CleanupStats {
        let mut stats = CleanupStats::default();
        if self.items.is_empty() {
            return stats;
        }

        let Some(token) = admin_token else {
            warn!(
                "cannot clean up {} resource(s): no admin token",
                self.items.len()
            );
            stats.failed = self.items.len();
            return stats;
        };

        info!("cleaning up {} created resource(s)", self.items.len());
        for item in &self.items {
            let path = format!("{}/{}", item.kind.path(), item.id);
            match client.delete(&path, Some(token)).await {
                Ok(resp) => match resp.status.as_u16() {
                    200 | 204 => {
                        info!("deleted {} {}", item.kind, item.id);
                        stats.deleted += 1;
                    }
                    403 | 404 => {
                        info!("{} {} already absent", item.kind, item.id);
                        stats.already_absent += 1;
                    }
                    status => {
                        warn!("could not delete {} {}: status {status}", item.kind, item.id);
                        stats.failed += 1;
                    }
                },
                Err(e) => {
                    warn!("error deleting {} {}: {e}", item.kind, item.id);
                    stats.failed += 1;
                }
            }
        }
        stats
    }
}
