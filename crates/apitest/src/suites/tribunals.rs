//! Tribunals suite: listings, creation by privileged roles, permission
//! and payload negatives

use serde_json::Value;
use thesistrack_common::{NewTribunal, Paginated, Role};

use super::{is_denied, is_validation_error, SuiteCx};
use crate::report::{SuiteKind, SuiteReport};
use crate::tracker::{ResourceKind, ResourceTracker};

/// Run the tribunals suite in its fixed order
pub async fn run(mut cx: SuiteCx<'_>) -> (SuiteReport, ResourceTracker) {
    // Read-only
    list(&mut cx, Role::Professor).await;
    list(&mut cx, Role::Admin).await;
    list_forbidden(&mut cx, Role::Student).await;

    // Creation
    create(&mut cx, Role::Admin).await;
    create(&mut cx, Role::President).await;

    // Permission negatives
    create_forbidden(&mut cx, Role::Professor).await;
    create_forbidden(&mut cx, Role::Student).await;

    // Payload validation
    create_invalid(&mut cx).await;

    cx.finish(SuiteKind::Tribunals)
}

async fn list(cx: &mut SuiteCx<'_>, role: Role) {
    let name = format!("list tribunals as {role}");
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    match cx.client.get("/api/tribunals", Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<Paginated<Value>>() {
            Ok(page) => cx
                .recorder
                .pass(&name, format!("{} tribunal(s) listed", page.data.len())),
            Err(_) => cx.recorder.fail(&name, "body is not a listing envelope"),
        },
        Ok(resp) => cx.recorder.fail(&name, resp.describe()),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

/// Students may not enumerate tribunals
async fn list_forbidden(cx: &mut SuiteCx<'_>, role: Role) {
    let name = format!("list tribunals as {role} (forbidden)");
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    match cx.client.get("/api/tribunals", Some(token)).await {
        Ok(resp) if is_denied(resp.status.as_u16()) => {
            cx.recorder
                .pass(&name, format!("denied with {}", resp.status.as_u16()));
        }
        Ok(resp) => cx
            .recorder
            .fail(&name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

fn tribunal_payload(cx: &SuiteCx<'_>, name: &str) -> NewTribunal {
    NewTribunal {
        name: name.to_string(),
        description: "Tribunal created by the API test harness".to_string(),
        president_id: cx.config.president_id,
        secretary_id: cx.config.secretary_id,
        vocal_id: cx.config.vocal_id,
    }
}

async fn create(cx: &mut SuiteCx<'_>, role: Role) {
    let name = format!("create tribunal as {role}");
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    let payload = tribunal_payload(cx, &format!("Harness tribunal ({role})"));
    match cx.client.post_json("/api/tribunals", &payload, Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 201 => match resp.created_id() {
            Ok(id) => {
                cx.tracker.record(ResourceKind::Tribunal, id);
                cx.recorder.pass(&name, format!("created tribunal {id}"));
            }
            Err(_) => cx.recorder.fail(&name, "201 without a numeric id"),
        },
        Ok(resp) => cx.recorder.fail(&name, resp.describe()),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

async fn create_forbidden(cx: &mut SuiteCx<'_>, role: Role) {
    let name = format!("create tribunal as {role} (forbidden)");
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    let payload = tribunal_payload(cx, "Harness tribunal (must not exist)");
    match cx.client.post_json("/api/tribunals", &payload, Some(token)).await {
        Ok(resp) if is_denied(resp.status.as_u16()) => {
            cx.recorder
                .pass(&name, format!("denied with {}", resp.status.as_u16()));
        }
        Ok(resp) if resp.status.as_u16() == 201 => {
            if let Ok(id) = resp.created_id() {
                cx.tracker.record(ResourceKind::Tribunal, id);
            }
            cx.recorder.fail(&name, "unprivileged creation was accepted");
        }
        Ok(resp) => cx
            .recorder
            .fail(&name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

/// Empty name and non-existent member ids must both trip validation
async fn create_invalid(cx: &mut SuiteCx<'_>) {
    let name = "create tribunal with invalid payload";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let payload = NewTribunal {
        name: String::new(),
        description: String::new(),
        president_id: 999_999,
        secretary_id: 999_999,
        vocal_id: 999_999,
    };
    match cx.client.post_json("/api/tribunals", &payload, Some(token)).await {
        Ok(resp) if is_validation_error(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("rejected with {}", resp.status.as_u16()));
        }
        Ok(resp) if resp.status.as_u16() == 201 => {
            if let Ok(id) = resp.created_id() {
                cx.tracker.record(ResourceKind::Tribunal, id);
            }
            cx.recorder.fail(name, "invalid payload was accepted with 201");
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}
