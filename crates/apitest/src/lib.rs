//! ThesisTrack API Test Harness
//!
//! This crate drives a full integration run against a live ThesisTrack
//! deployment: it authenticates every role once, runs the per-domain
//! suites strictly sequentially, cleans up everything it created, and
//! aggregates the results into a persisted run report with a
//! deterministic exit status.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  HarnessRunner (orchestrator)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  auth::acquire() ──► RoleTokens (immutable, injected)       │
//! │           │  gate: empty map aborts the run                 │
//! │  setup::seed() ───► SeedData { submission_id, tribunal_id } │
//! │           │                                                 │
//! │  suites (fixed order, each followed by its own cleanup):    │
//! │    submissions → tribunals → defenses → users → notifs      │
//! │           │                                                 │
//! │  ResourceTracker::cleanup() per suite (best effort)         │
//! │           │                                                 │
//! │  RunReport: rollup + failure dump + timestamped JSON file   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod report;
pub mod runner;
pub mod setup;
pub mod suites;
pub mod tracker;

pub use auth::RoleTokens;
pub use report::{RunReport, SuiteReport, TestResult};
pub use runner::HarnessRunner;
pub use tracker::{ResourceKind, ResourceTracker};
