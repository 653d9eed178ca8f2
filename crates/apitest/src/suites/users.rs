//! Users suite: admin-only listings with pagination and role filters,
//! account creation per role, permission and payload negatives

use serde_json::Value;
use thesistrack_common::{NewUser, Paginated, Role};
use uuid::Uuid;

use super::{is_conflict_rejection, is_denied, is_validation_error, SuiteCx};
use crate::report::{SuiteKind, SuiteReport};
use crate::tracker::{ResourceKind, ResourceTracker};

/// Run the users suite in its fixed order
pub async fn run(mut cx: SuiteCx<'_>) -> (SuiteReport, ResourceTracker) {
    // Read-only
    list(&mut cx).await;
    list_paginated(&mut cx).await;
    list_filtered_by_role(&mut cx).await;
    list_forbidden(&mut cx, Role::Professor).await;
    list_forbidden(&mut cx, Role::Student).await;

    // Creation
    create(&mut cx, Role::Student).await;
    create(&mut cx, Role::Professor).await;
    create(&mut cx, Role::Admin).await;

    // Permission negatives
    create_forbidden(&mut cx, Role::Professor).await;
    create_forbidden(&mut cx, Role::Student).await;

    // Payload validation
    create_invalid_email(&mut cx).await;
    create_missing_fields(&mut cx).await;

    // Conflict-specific
    create_duplicate_email(&mut cx).await;

    cx.finish(SuiteKind::Users)
}

/// Unique address per run so reruns never trip the duplicate check
fn random_email() -> String {
    let tag = Uuid::new_v4().simple().to_string();
    format!("harness_{}@uni.edu", &tag[..8])
}

fn user_payload(email: String, role: Role) -> NewUser {
    NewUser {
        email,
        password: "password123".to_string(),
        first_name: "Harness".to_string(),
        last_name: format!("{role} account"),
        roles: vec![role.api_name().to_string()],
    }
}

async fn list(cx: &mut SuiteCx<'_>) {
    let name = "list users as admin";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    match cx.client.get("/api/users", Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<Paginated<Value>>() {
            Ok(page) => {
                let total = page.meta.map(|m| m.total).unwrap_or(page.data.len() as u64);
                cx.recorder
                    .pass(name, format!("{} user(s), total {total}", page.data.len()));
            }
            Err(_) => cx.recorder.fail(name, "body is not a listing envelope"),
        },
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn list_paginated(cx: &mut SuiteCx<'_>) {
    let name = "list users with pagination as admin";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let query = [("page", "1".to_string()), ("per_page", "5".to_string())];
    match cx.client.get_query("/api/users", &query, Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<Paginated<Value>>() {
            Ok(page) if page.data.len() <= 5 => {
                let meta = page.meta.unwrap_or_default();
                cx.recorder.pass(
                    name,
                    format!("page {}: {} user(s)", meta.page, page.data.len()),
                );
            }
            Ok(page) => cx.recorder.fail(
                name,
                format!("asked for 5 per page, got {}", page.data.len()),
            ),
            Err(_) => cx.recorder.fail(name, "body is not a listing envelope"),
        },
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn list_filtered_by_role(cx: &mut SuiteCx<'_>) {
    let name = "list users filtered by role as admin";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let query = [("role", Role::Student.api_name().to_string())];
    match cx.client.get_query("/api/users", &query, Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<Paginated<Value>>() {
            Ok(page) => cx
                .recorder
                .pass(name, format!("{} student account(s)", page.data.len())),
            Err(_) => cx.recorder.fail(name, "body is not a listing envelope"),
        },
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn list_forbidden(cx: &mut SuiteCx<'_>, role: Role) {
    let name = format!("list users as {role} (forbidden)");
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    match cx.client.get("/api/users", Some(token)).await {
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

/// Admin creates an account carrying the given role
async fn create(cx: &mut SuiteCx<'_>, new_role: Role) {
    let name = format!("create {new_role} user as admin");
    let Some(token) = cx.token_or_fail(Role::Admin, &name) else {
        return;
    };
    let payload = user_payload(random_email(), new_role);
    match cx.client.post_json("/api/users", &payload, Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 201 => match resp.created_id() {
            Ok(id) => {
                cx.tracker.record(ResourceKind::User, id);
                cx.recorder.pass(&name, format!("created user {id}"));
            }
            Err(_) => cx.recorder.fail(&name, "201 without a numeric id"),
        },
        Ok(resp) => cx.recorder.fail(&name, resp.describe()),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

async fn create_forbidden(cx: &mut SuiteCx<'_>, role: Role) {
    let name = format!("create user as {role} (forbidden)");
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    let payload = user_payload(random_email(), Role::Student);
    match cx.client.post_json("/api/users", &payload, Some(token)).await {
        Ok(resp) if is_denied(resp.status.as_u16()) => {
            cx.recorder
                .pass(&name, format!("denied with {}", resp.status.as_u16()));
        }
        Ok(resp) if resp.status.as_u16() == 201 => {
            if let Ok(id) = resp.created_id() {
                cx.tracker.record(ResourceKind::User, id);
            }
            cx.recorder.fail(&name, "unprivileged creation was accepted");
        }
        Ok(resp) => cx
            .recorder
            .fail(&name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

async fn create_invalid_email(cx: &mut SuiteCx<'_>) {
    let name = "create user with invalid email";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let payload = user_payload("not-an-email".to_string(), Role::Student);
    match cx.client.post_json("/api/users", &payload, Some(token)).await {
        Ok(resp) if is_validation_error(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("rejected with {}", resp.status.as_u16()));
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// Only an email, everything else missing
async fn create_missing_fields(cx: &mut SuiteCx<'_>) {
    let name = "create user with missing fields";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let payload = serde_json::json!({ "email": random_email() });
    match cx.client.post_json("/api/users", &payload, Some(token)).await {
        Ok(resp) if is_validation_error(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("rejected with {}", resp.status.as_u16()));
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// Reuse the admin account's own address; uniqueness must hold
async fn create_duplicate_email(cx: &mut SuiteCx<'_>) {
    let name = "create user with duplicate email";
    let Some(token) = cx.token_or_fail(Role::Admin, name) else {
        return;
    };
    let Some(creds) = cx.config.credentials_for(Role::Admin) else {
        cx.recorder.fail(name, "no admin credentials configured");
        return;
    };
    let payload = user_payload(creds.username.clone(), Role::Student);
    match cx.client.post_json("/api/users", &payload, Some(token)).await {
        Ok(resp) if is_conflict_rejection(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("duplicate rejected with {}", resp.status.as_u16()));
        }
        Ok(resp) if resp.status.as_u16() == 201 => {
            if let Ok(id) = resp.created_id() {
                cx.tracker.record(ResourceKind::User, id);
            }
            cx.recorder.fail(name, "duplicate email was accepted");
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_emails_are_unique() {
        let a = random_email();
        let b = random_email();
        assert_ne!(a, b);
        assert!(a.ends_with("@uni.edu"));
    }

    #[test]
    fn test_user_payload_role_name() {
        let payload = user_payload(random_email(), Role::Professor);
        assert_eq!(payload.roles, ["ROLE_PROFESSOR"]);
    }
}
