//! Wire types for the ThesisTrack API
//!
//! Every endpoint the harness touches gets an explicit typed shape here.
//! Optional response fields carry documented defaults so "field absent"
//! and "field present but empty" stay distinguishable where the contract
//! cares (`Option` for absence, `#[serde(default)]` where absence simply
//! means empty).

use serde::{Deserialize, Serialize};

/// A named permission class governing which API operations a token may invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Professor,
    Admin,
    /// Tribunal president
    President,
}

impl Role {
    /// All roles the harness authenticates, in login order
    pub const ALL: [Role; 4] = [Role::Student, Role::Professor, Role::Admin, Role::President];

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Professor => "professor",
            Role::Admin => "admin",
            Role::President => "president",
        }
    }

    /// Role name as the API spells it in user payloads and filters
    pub const fn api_name(self) -> &'static str {
        match self {
            Role::Student => "ROLE_STUDENT",
            Role::Professor => "ROLE_PROFESSOR",
            Role::Admin => "ROLE_ADMIN",
            Role::President => "ROLE_TRIBUNAL_PRESIDENT",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Auth endpoints

/// `POST /api/auth/login` request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/login` 200 response
///
/// `refresh_token` is absent on deployments without refresh support;
/// absence maps to `None`, never to an empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// `POST /api/auth/refresh` request body
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `POST /api/auth/refresh` 200 response
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}

// Shared response shapes

/// Successful creation response; the contract guarantees a numeric `id`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedId {
    pub id: u64,
}

/// Paginated listing envelope used by collection endpoints
///
/// `data` absent means an empty page; `meta` absent means the endpoint
/// does not paginate and the whole collection was returned.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// Pagination metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub per_page: u64,
    #[serde(default)]
    pub total: u64,
}

// Submissions

/// `POST /api/submissions` request body
#[derive(Debug, Clone, Serialize)]
pub struct NewSubmission {
    pub title: String,
    pub description: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub supervisor_id: u64,
}

/// `PUT /api/submissions/{id}` request body
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionUpdate {
    pub title: String,
    pub description: String,
    pub summary: String,
    pub keywords: Vec<String>,
}

/// `PUT /api/submissions/{id}/status` request body
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// Tribunals

/// `POST /api/tribunals` request body
#[derive(Debug, Clone, Serialize)]
pub struct NewTribunal {
    pub name: String,
    pub description: String,
    pub president_id: u64,
    pub secretary_id: u64,
    pub vocal_id: u64,
}

// Defenses

/// `POST /api/defenses` request body
#[derive(Debug, Clone, Serialize)]
pub struct NewDefense {
    pub submission_id: u64,
    pub tribunal_id: u64,
    /// RFC 3339 timestamp of the scheduled slot
    pub scheduled_at: String,
    pub room: String,
    pub duration_minutes: i64,
    pub notes: String,
}

/// One event in a `GET /api/defenses/calendar` response
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub id: u64,
    #[serde(default)]
    pub scheduled_at: String,
    #[serde(default)]
    pub room: String,
}

/// `GET /api/defenses/calendar` 200 response
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarResponse {
    #[serde(default = "Vec::new")]
    pub events: Vec<CalendarEvent>,
}

// Users

/// `POST /api/users` request body
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

// Notifications

/// One notification in a listing response
///
/// `read` absent defaults to `false` (an unread notification); `kind`
/// absent defaults to empty, meaning the server did not classify it.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationItem {
    pub id: u64,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub kind: String,
}

/// `GET /api/notifications` 200 response
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationList {
    #[serde(default = "Vec::new")]
    pub data: Vec<NotificationItem>,
    /// Count of unread notifications; absent means zero
    #[serde(default)]
    pub unread: u64,
}
