//! Notifications suite: listings, the mark-as-read sub-resource,
//! ownership and authentication negatives, filters and pagination
//!
//! Listing tests return their typed payload so the mark-as-read tests
//! can reuse it instead of refetching.

use thesistrack_common::{NotificationItem, NotificationList, Role};

use super::{is_denied, SuiteCx};
use crate::report::{SuiteKind, SuiteReport};
use crate::tracker::ResourceTracker;

/// Id far past anything the harness environment seeds
const FOREIGN_NOTIFICATION_ID: u64 = 1_000_000;

/// Run the notifications suite in its fixed order
pub async fn run(mut cx: SuiteCx<'_>) -> (SuiteReport, ResourceTracker) {
    // Read-only
    let student_items = list(&mut cx, Role::Student).await;
    let professor_items = list(&mut cx, Role::Professor).await;
    let _ = list(&mut cx, Role::Admin).await;
    list_unauthenticated(&mut cx).await;

    // Mutation (mark-as-read)
    mark_read(&mut cx, Role::Student, student_items).await;
    mark_read(&mut cx, Role::Professor, professor_items).await;

    // Negatives
    mark_read_missing_id(&mut cx).await;
    mark_read_unauthenticated(&mut cx).await;
    mark_read_foreign(&mut cx).await;

    // Filters
    list_filtered_by_kind(&mut cx).await;
    list_paginated(&mut cx).await;

    cx.finish(SuiteKind::Notifications)
}

async fn list(cx: &mut SuiteCx<'_>, role: Role) -> Option<Vec<NotificationItem>> {
    let name = format!("list notifications as {role}");
    let token = cx.token_or_fail(role, &name)?;
    match cx.client.get("/api/notifications", Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<NotificationList>() {
            Ok(list) => {
                cx.recorder.pass(
                    &name,
                    format!("{} notification(s), {} unread", list.data.len(), list.unread),
                );
                Some(list.data)
            }
            Err(_) => {
                cx.recorder.fail(&name, "body is not a notification list");
                None
            }
        },
        Ok(resp) => {
            cx.recorder.fail(&name, resp.describe());
            None
        }
        Err(e) => {
            cx.recorder.fail(&name, format!("request error: {e}"));
            None
        }
    }
}

async fn list_unauthenticated(cx: &mut SuiteCx<'_>) {
    let name = "list notifications without a token";
    match cx.client.get("/api/notifications", None).await {
        Ok(resp) if is_denied(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("denied with {}", resp.status.as_u16()));
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// Mark the first unread notification from the earlier fetch, falling
/// back to the first one when everything is already read
async fn mark_read(cx: &mut SuiteCx<'_>, role: Role, items: Option<Vec<NotificationItem>>) {
    let name = format!("mark notification read as {role}");
    let Some(items) = items else {
        cx.recorder.fail(&name, "no notification listing to reuse");
        return;
    };
    let Some(target) = items.iter().find(|n| !n.read).or_else(|| items.first()) else {
        cx.recorder.fail(&name, "no notifications available to mark");
        return;
    };
    let id = target.id;
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    match cx
        .client
        .put_empty(&format!("/api/notifications/{id}/read"), Some(token))
        .await
    {
        Ok(resp) if resp.status.as_u16() == 200 => {
            cx.recorder.pass(&name, format!("notification {id} marked read"));
        }
        Ok(resp) => cx.recorder.fail(&name, resp.describe()),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

async fn mark_read_missing_id(cx: &mut SuiteCx<'_>) {
    let name = "mark non-existent notification read";
    let Some(token) = cx.token_or_fail(Role::Student, name) else {
        return;
    };
    match cx
        .client
        .put_empty("/api/notifications/999999/read", Some(token))
        .await
    {
        Ok(resp) if resp.status.as_u16() == 404 => {
            cx.recorder.pass(name, "rejected with 404");
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn mark_read_unauthenticated(cx: &mut SuiteCx<'_>) {
    let name = "mark notification read without a token";
    match cx.client.put_empty("/api/notifications/1/read", None).await {
        Ok(resp) if is_denied(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("denied with {}", resp.status.as_u16()));
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// Another user's notification must come back forbidden or hidden
async fn mark_read_foreign(cx: &mut SuiteCx<'_>) {
    let name = "mark another user's notification read";
    let Some(token) = cx.token_or_fail(Role::Student, name) else {
        return;
    };
    let path = format!("/api/notifications/{FOREIGN_NOTIFICATION_ID}/read");
    match cx.client.put_empty(&path, Some(token)).await {
        Ok(resp) if matches!(resp.status.as_u16(), 403 | 404) => {
            cx.recorder
                .pass(name, format!("denied with {}", resp.status.as_u16()));
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn list_filtered_by_kind(cx: &mut SuiteCx<'_>) {
    let name = "list notifications filtered by kind";
    let Some(token) = cx.token_or_fail(Role::Student, name) else {
        return;
    };
    let query = [("kind", "info".to_string())];
    match cx
        .client
        .get_query("/api/notifications", &query, Some(token))
        .await
    {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<NotificationList>() {
            Ok(list) => cx
                .recorder
                .pass(name, format!("{} notification(s) of kind info", list.data.len())),
            Err(_) => cx.recorder.fail(name, "body is not a notification list"),
        },
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn list_paginated(cx: &mut SuiteCx<'_>) {
    let name = "list notifications with pagination";
    let Some(token) = cx.token_or_fail(Role::Professor, name) else {
        return;
    };
    let query = [("page", "1".to_string()), ("per_page", "5".to_string())];
    match cx
        .client
        .get_query("/api/notifications", &query, Some(token))
        .await
    {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<NotificationList>() {
            Ok(list) if list.data.len() <= 5 => cx
                .recorder
                .pass(name, format!("{} notification(s) on page 1", list.data.len())),
            Ok(list) => cx.recorder.fail(
                name,
                format!("asked for 5 per page, got {}", list.data.len()),
            ),
            Err(_) => cx.recorder.fail(name, "body is not a notification list"),
        },
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}
