//! Defenses suite: calendar queries, scheduling, permission and payload
//! negatives, and the intentionally open schedule-conflict contract

use chrono::{Duration, Utc};
use thesistrack_common::{CalendarResponse, NewDefense, Role};

use super::{is_conflict_rejection, is_denied, is_validation_error, SuiteCx};
use crate::report::{SuiteKind, SuiteReport};
use crate::setup::SeedData;
use crate::tracker::{ResourceKind, ResourceTracker};

/// Run the defenses suite in its fixed order
///
/// `seed` carries the approved submission and tribunal created by the
/// setup phase; without it every scheduling test fails explicitly.
pub async fn run(mut cx: SuiteCx<'_>, seed: Option<SeedData>) -> (SuiteReport, ResourceTracker) {
    // Read-only
    calendar(&mut cx, Role::Professor).await;
    calendar(&mut cx, Role::Student).await;
    calendar(&mut cx, Role::Admin).await;

    // Creation
    create(&mut cx, Role::Admin, seed, 7, 10).await;
    create(&mut cx, Role::President, seed, 8, 11).await;

    // Permission negatives
    create_forbidden(&mut cx, Role::Professor, seed).await;
    create_forbidden(&mut cx, Role::Student, seed).await;

    // Payload validation
    create_invalid(&mut cx).await;

    // Conflict-specific
    conflicting_slot(&mut cx, seed).await;

    cx.finish(SuiteKind::Defenses)
}

/// Slot at `days` from now, on the hour
fn slot(days: i64, hour: u32) -> String {
    let date = (Utc::now() + Duration::days(days)).date_naive();
    format!("{date}T{hour:02}:00:00Z")
}

fn defense_payload(seed: SeedData, days: i64, hour: u32, room: &str) -> NewDefense {
    NewDefense {
        submission_id: seed.submission_id,
        tribunal_id: seed.tribunal_id,
        scheduled_at: slot(days, hour),
        room: room.to_string(),
        duration_minutes: 30,
        notes: "Defense scheduled by the API test harness".to_string(),
    }
}

/// GET /api/defenses/calendar with a one-month date range
async fn calendar(cx: &mut SuiteCx<'_>, role: Role) {
    let name = format!("defense calendar as {role}");
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    let from = Utc::now().date_naive().to_string();
    let to = (Utc::now() + Duration::days(30)).date_naive().to_string();
    let query = [("from", from), ("to", to)];
    match cx
        .client
        .get_query("/api/defenses/calendar", &query, Some(token))
        .await
    {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<CalendarResponse>() {
            Ok(cal) => cx
                .recorder
                .pass(&name, format!("{} event(s) in range", cal.events.len())),
            Err(_) => cx.recorder.fail(&name, "body is not a calendar envelope"),
        },
        Ok(resp) => cx.recorder.fail(&name, resp.describe()),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

async fn create(cx: &mut SuiteCx<'_>, role: Role, seed: Option<SeedData>, days: i64, hour: u32) {
    let name = format!("schedule defense as {role}");
    let Some(seed) = seed else {
        cx.recorder.fail(&name, "seed data unavailable");
        return;
    };
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    let payload = defense_payload(seed, days, hour, "Room 101");
    match cx.client.post_json("/api/defenses", &payload, Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 201 => match resp.created_id() {
            Ok(id) => {
                cx.tracker.record(ResourceKind::Defense, id);
                cx.recorder.pass(&name, format!("scheduled defense {id}"));
            }
            Err(_) => cx.recorder.fail(&name, "201 without a numeric id"),
        },
        Ok(resp) => cx.recorder.fail(&name, resp.describe()),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

async fn create_forbidden(cx: &mut SuiteCx<'_>, role: Role, seed: Option<SeedData>) {
    let name = format!("schedule defense as {role} (forbidden)");
    let Some(seed) = seed else {
        cx.recorder.fail(&name, "seed data unavailable");
        return;
    };
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    let payload = defense_payload(seed, 9, 12, "Room 102");
    match cx.client.post_json("/api/defenses", &payload, Some(token)).await {
        Ok(resp) if is_denied(resp.status.as_u16()) => {
            cx.recorder
                .pass(&name, format!("denied with {}", resp.status.as_u16()));
        }
        Ok(resp) if resp.status.as_u16() == 201 => {
            if let Ok(id) = resp.created_id() {
                cx.tracker.record(ResourceKind::Defense, id);
            }
            cx.recorder.fail(&name, "unprivileged scheduling was accepted");
        }
        Ok(resp) => cx
            .recorder
            .fail(&name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

/// Malformed date, empty room, negative duration, dead foreign ids
async fn create_invalid(cx: &mut SuiteCx<'_>) {
    let name = "schedule defense with invalid payload";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let payload = NewDefense {
        submission_id: 999_999,
        tribunal_id: 999_999,
        scheduled_at: "not-a-date".to_string(),
        room: String::new(),
        duration_minutes: -10,
        notes: String::new(),
    };
    match cx.client.post_json("/api/defenses", &payload, Some(token)).await {
        Ok(resp) if is_validation_error(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("rejected with {}", resp.status.as_u16()));
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// Two back-to-back creations for the same slot and room
///
/// The conflict policy is deliberately open: a rejection of the second
/// call with {400,409,422} and an acceptance of both are each a pass.
/// The back-to-back ordering is only meaningful because the harness is
/// strictly sequential.
async fn conflicting_slot(cx: &mut SuiteCx<'_>, seed: Option<SeedData>) {
    let name = "schedule two defenses in the same slot";
    let Some(seed) = seed else {
        cx.recorder.fail(name, "seed data unavailable");
        return;
    };
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let payload = defense_payload(seed, 11, 14, "Room Conflict");

    let first = match cx.client.post_json("/api/defenses", &payload, Some(token)).await {
        Ok(resp) => resp,
        Err(e) => {
            cx.recorder.fail(name, format!("request error: {e}"));
            return;
        }
    };
    if first.status.as_u16() != 201 {
        cx.recorder
            .fail(name, format!("first creation failed: {}", first.describe()));
        return;
    }
    let Ok(first_id) = first.created_id() else {
        cx.recorder.fail(name, "201 without a numeric id");
        return;
    };
    cx.tracker.record(ResourceKind::Defense, first_id);

    match cx.client.post_json("/api/defenses", &payload, Some(token)).await {
        Ok(second) if is_conflict_rejection(second.status.as_u16()) => {
            cx.recorder.pass(
                name,
                format!("conflict rejected with {}", second.status.as_u16()),
            );
        }
        Ok(second) if second.status.as_u16() == 201 => {
            if let Ok(id) = second.created_id() {
                cx.tracker.record(ResourceKind::Defense, id);
            }
            cx.recorder.pass(name, "conflict permitted by server policy");
        }
        Ok(second) => cx
            .recorder
            .fail(name, format!("unexpected {}", second.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_is_rfc3339_on_the_hour() {
        let s = slot(7, 10);
        assert!(s.ends_with("T10:00:00Z"), "{s}");
        assert_eq!(s.len(), "2026-01-01T10:00:00Z".len());
    }
}
