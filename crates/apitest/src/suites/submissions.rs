//! Submissions suite: listing, creation, update, file upload/download,
//! supervisor status change, payload validation

use thesistrack_common::{
    NewSubmission, Paginated, Role, StatusChange, SubmissionUpdate,
};
use serde_json::Value;

use super::{is_validation_error, SuiteCx};
use crate::report::{SuiteKind, SuiteReport};
use crate::tracker::{ResourceKind, ResourceTracker};

/// Run the submissions suite in its fixed order
pub async fn run(mut cx: SuiteCx<'_>) -> (SuiteReport, ResourceTracker) {
    // Read-only
    list_own(&mut cx, Role::Student).await;
    list_own(&mut cx, Role::Professor).await;

    // Creation and mutation
    let submission_id = create(&mut cx).await;
    update(&mut cx, submission_id).await;
    upload(&mut cx, submission_id).await;
    change_status(&mut cx, submission_id).await;
    download(&mut cx, submission_id).await;

    // Payload validation
    create_invalid(&mut cx).await;

    cx.finish(SuiteKind::Submissions)
}

/// GET /api/submissions/mine returns the caller's own submissions; for
/// a professor that means the submissions they supervise
async fn list_own(cx: &mut SuiteCx<'_>, role: Role) {
    let name = match role {
        Role::Professor => "list supervised submissions as professor".to_string(),
        _ => format!("list own submissions as {role}"),
    };
    let Some(token) = cx.token_or_fail(role, &name) else {
        return;
    };
    match cx.client.get("/api/submissions/mine", Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 200 => match resp.json::<Paginated<Value>>() {
            Ok(page) => cx
                .recorder
                .pass(&name, format!("{} submission(s) listed", page.data.len())),
            Err(_) => cx.recorder.fail(&name, "body is not a listing envelope"),
        },
        Ok(resp) => cx.recorder.fail(&name, resp.describe()),
        Err(e) => cx.recorder.fail(&name, format!("request error: {e}")),
    }
}

async fn create(cx: &mut SuiteCx<'_>) -> Option<u64> {
    let name = "create submission as student";
    let token = cx.token_or_fail(Role::Student, name)?;
    let payload = NewSubmission {
        title: "Harness submission - web application".to_string(),
        description: "Submission created by the API test harness".to_string(),
        summary: "Throwaway record covering the creation contract".to_string(),
        keywords: vec!["harness".to_string(), "api".to_string()],
        supervisor_id: cx.config.supervisor_id,
    };
    match cx.client.post_json("/api/submissions", &payload, Some(token)).await {
        Ok(resp) if resp.status.as_u16() == 201 => match resp.created_id() {
            Ok(id) => {
                // Tracked before any later test runs
                cx.tracker.record(ResourceKind::Submission, id);
                cx.recorder.pass(name, format!("created submission {id}"));
                Some(id)
            }
            Err(_) => {
                cx.recorder.fail(name, "201 without a numeric id");
                None
            }
        },
        Ok(resp) => {
            cx.recorder.fail(name, resp.describe());
            None
        }
        Err(e) => {
            cx.recorder.fail(name, format!("request error: {e}"));
            None
        }
    }
}

async fn update(cx: &mut SuiteCx<'_>, submission_id: Option<u64>) {
    let name = "update submission as student";
    let Some(id) = submission_id else {
        cx.recorder.fail(name, "no submission id from creation");
        return;
    };
    let Some(token) = cx.token_or_fail(Role::Student, name) else {
        return;
    };
    let payload = SubmissionUpdate {
        title: "Harness submission - web application (updated)".to_string(),
        description: "Updated description".to_string(),
        summary: "Updated summary".to_string(),
        keywords: vec!["harness".to_string(), "api".to_string(), "updated".to_string()],
    };
    match cx
        .client
        .put_json(&format!("/api/submissions/{id}"), &payload, Some(token))
        .await
    {
        Ok(resp) if resp.status.as_u16() == 200 => {
            cx.recorder.pass(name, format!("submission {id} updated"));
        }
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn upload(cx: &mut SuiteCx<'_>, submission_id: Option<u64>) {
    let name = "upload document as student";
    let Some(id) = submission_id else {
        cx.recorder.fail(name, "no submission id from creation");
        return;
    };
    let Some(token) = cx.token_or_fail(Role::Student, name) else {
        return;
    };
    match cx
        .client
        .upload(
            &format!("/api/submissions/{id}/upload"),
            "file",
            "harness_submission.pdf",
            "application/pdf",
            minimal_pdf(),
            Some(token),
        )
        .await
    {
        Ok(resp) if matches!(resp.status.as_u16(), 200 | 201) => {
            cx.recorder.pass(name, format!("document attached to submission {id}"));
        }
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// The supervisor moves the submission into review
async fn change_status(cx: &mut SuiteCx<'_>, submission_id: Option<u64>) {
    let name = "change submission status as professor";
    let Some(id) = submission_id else {
        cx.recorder.fail(name, "no submission id from creation");
        return;
    };
    let Some(token) = cx.token_or_fail(Role::Professor, name) else {
        return;
    };
    let payload = StatusChange {
        status: "under_review".to_string(),
        comment: Some("moved to review by the harness".to_string()),
    };
    match cx
        .client
        .put_json(&format!("/api/submissions/{id}/status"), &payload, Some(token))
        .await
    {
        Ok(resp) if resp.status.as_u16() == 200 => {
            cx.recorder.pass(name, format!("submission {id} now under review"));
        }
        Ok(resp) => cx.recorder.fail(name, resp.describe()),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

async fn download(cx: &mut SuiteCx<'_>, submission_id: Option<u64>) {
    let name = "download submission document";
    let Some(id) = submission_id else {
        cx.recorder.fail(name, "no submission id from creation");
        return;
    };
    let Some(token) = cx.token_or_fail(Role::Student, name) else {
        return;
    };
    match cx
        .client
        .download(&format!("/api/submissions/{id}/download"), Some(token))
        .await
    {
        Ok((status, content_type, bytes)) if status.as_u16() == 200 => {
            let pdf = content_type
                .as_deref()
                .map(|ct| ct.to_ascii_lowercase().contains("pdf"))
                .unwrap_or(false);
            if pdf || !bytes.is_empty() {
                cx.recorder.pass(
                    name,
                    format!("{} byte(s), content type {:?}", bytes.len(), content_type),
                );
            } else {
                cx.recorder.fail(name, "200 with an empty body");
            }
        }
        Ok((status, _, _)) => cx.recorder.fail(name, format!("Status: {}", status.as_u16())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// Empty title and summary must be rejected as a validation error
async fn create_invalid(cx: &mut SuiteCx<'_>) {
    let name = "create submission with invalid payload";
    let Some(token) = cx.token_or_fail(Role::Student, name) else {
        return;
    };
    let payload = NewSubmission {
        title: String::new(),
        description: String::new(),
        summary: String::new(),
        keywords: vec![],
        supervisor_id: 999_999,
    };
    match cx.client.post_json("/api/submissions", &payload, Some(token)).await {
        Ok(resp) if is_validation_error(resp.status.as_u16()) => {
            cx.recorder
                .pass(name, format!("rejected with {}", resp.status.as_u16()));
        }
        Ok(resp) if resp.status.as_u16() == 201 => {
            // Track it anyway: the server accepted it, so it must be removed
            if let Ok(id) = resp.created_id() {
                cx.tracker.record(ResourceKind::Submission, id);
            }
            cx.recorder.fail(name, "invalid payload was accepted with 201");
        }
        Ok(resp) => cx.recorder.fail(name, format!("unexpected {}", resp.describe())),
        Err(e) => cx.recorder.fail(name, format!("request error: {e}")),
    }
}

/// Smallest structurally valid PDF the upload endpoint will take
fn minimal_pdf() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"%PDF-1.4\n");
    bytes.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    bytes.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
    bytes.extend_from_slice(
        b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n",
    );
    bytes.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\n%%EOF\n");
    bytes
}
