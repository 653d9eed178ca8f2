//! Seed phase: create the entities the defenses suite schedules against
//!
//! Defenses need an approved submission and a tribunal. Instead of
//! assuming the backend was seeded with specific ids, this phase creates
//! both through the same creation contracts under test, records them for
//! end-of-run cleanup, and injects the ids into the dependent suite. A
//! setup failure downgrades dependent tests to explicit failures; it
//! never aborts the run.

use thesistrack_common::{
    ApiClient, HarnessConfig, NewSubmission, NewTribunal, Result, Role, StatusChange,
};
use tracing::{info, warn};

use crate::auth::RoleTokens;
use crate::tracker::{ResourceKind, ResourceTracker};

/// Ids of the entities created for the defenses suite
#[derive(Debug, Clone, Copy)]
pub struct SeedData {
    pub submission_id: u64,
    pub tribunal_id: u64,
}

/// Create and approve a submission, then create a tribunal
///
/// Everything created lands in `tracker` whether or not the phase as a
/// whole succeeds, so partial seed data still gets cleaned up.
pub async fn seed(
    client: &ApiClient,
    tokens: &RoleTokens,
    config: &HarnessConfig,
    tracker: &mut ResourceTracker,
) -> Option<SeedData> {
    match seed_inner(client, tokens, config, tracker).await {
        Ok(data) => {
            info!(
                "seed data ready: submission {}, tribunal {}",
                data.submission_id, data.tribunal_id
            );
            Some(data)
        }
        Err(e) => {
            warn!("seed setup failed: {e}");
            None
        }
    }
}

async fn seed_inner(
    client: &ApiClient,
    tokens: &RoleTokens,
    config: &HarnessConfig,
    tracker: &mut ResourceTracker,
) -> Result<SeedData> {
    use thesistrack_common::Error;

    let student = tokens
        .bearer(Role::Student)
        .ok_or_else(|| Error::MissingToken(Role::Student.to_string()))?;
    let admin = tokens
        .bearer(Role::Admin)
        .ok_or_else(|| Error::MissingToken(Role::Admin.to_string()))?;

    // 1. Submission as student
    let payload = NewSubmission {
        title: "Seed submission for scheduled defenses".to_string(),
        description: "Created by the harness seed phase".to_string(),
        summary: "Approved submission required before a defense can be scheduled".to_string(),
        keywords: vec!["seed".to_string(), "defense".to_string()],
        supervisor_id: config.supervisor_id,
    };
    let resp = client.post_json("/api/submissions", &payload, Some(student)).await?;
    if !matches!(resp.status.as_u16(), 200 | 201) {
        return Err(Error::Setup(format!("submission creation: {}", resp.describe())));
    }
    let submission_id = resp.created_id()?;
    tracker.record(ResourceKind::Submission, submission_id);

    // 2. Walk the submission to approved as admin
    for status in ["under_review", "approved"] {
        let change = StatusChange {
            status: status.to_string(),
            comment: None,
        };
        let resp = client
            .put_json(
                &format!("/api/submissions/{submission_id}/status"),
                &change,
                Some(admin),
            )
            .await?;
        if resp.status.as_u16() != 200 {
            return Err(Error::Setup(format!(
                "submission {submission_id} -> {status}: {}",
                resp.describe()
            )));
        }
    }

    // 3. Tribunal as admin
    let payload = NewTribunal {
        name: "Seed tribunal for scheduled defenses".to_string(),
        description: "Created by the harness seed phase".to_string(),
        president_id: config.president_id,
        secretary_id: config.secretary_id,
        vocal_id: config.vocal_id,
    };
    let resp = client.post_json("/api/tribunals", &payload, Some(admin)).await?;
    if !matches!(resp.status.as_u16(), 200 | 201) {
        return Err(Error::Setup(format!("tribunal creation: {}", resp.describe())));
    }
    let tribunal_id = resp.created_id()?;
    tracker.record(ResourceKind::Tribunal, tribunal_id);

    Ok(SeedData {
        submission_id,
        tribunal_id,
    })
}
