//! Test results, per-suite reports, and the aggregated run report

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thesistrack_common::Result;
use tracing::{error, info};

use crate::tracker::CreatedResource;

/// The domains a run exercises, in fixed execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    Auth,
    Submissions,
    Tribunals,
    Defenses,
    Users,
    Notifications,
}

impl SuiteKind {
    /// Domain suites in the order the orchestrator runs them
    pub const DOMAIN_ORDER: [SuiteKind; 5] = [
        SuiteKind::Submissions,
        SuiteKind::Tribunals,
        SuiteKind::Defenses,
        SuiteKind::Users,
        SuiteKind::Notifications,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SuiteKind::Auth => "auth",
            SuiteKind::Submissions => "submissions",
            SuiteKind::Tribunals => "tribunals",
            SuiteKind::Defenses => "defenses",
            SuiteKind::Users => "users",
            SuiteKind::Notifications => "notifications",
        }
    }
}

impl std::fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SuiteKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auth" => Ok(SuiteKind::Auth),
            "submissions" => Ok(SuiteKind::Submissions),
            "tribunals" => Ok(SuiteKind::Tribunals),
            "defenses" => Ok(SuiteKind::Defenses),
            "users" => Ok(SuiteKind::Users),
            "notifications" => Ok(SuiteKind::Notifications),
            other => Err(format!(
                "unknown suite '{other}' (expected one of: auth, submissions, \
                 tribunals, defenses, users, notifications)"
            )),
        }
    }
}

/// Outcome of a single test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Ordered result collector for one suite
///
/// Prints the PASS/FAIL line the moment a result lands, so a hung later
/// call never hides earlier outcomes.
#[derive(Debug, Default)]
pub struct Recorder {
    results: Vec<TestResult>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pass(&mut self, name: &str, detail: impl Into<String>) {
        let detail = detail.into();
        info!("[PASS] {name}");
        self.results.push(TestResult {
            name: name.to_string(),
            passed: true,
            detail,
        });
    }

    pub fn fail(&mut self, name: &str, detail: impl Into<String>) {
        let detail = detail.into();
        error!("[FAIL] {name} - {detail}");
        self.results.push(TestResult {
            name: name.to_string(),
            passed: false,
            detail,
        });
    }

    /// Record a boolean outcome with a shared detail string
    pub fn record(&mut self, name: &str, passed: bool, detail: impl Into<String>) {
        if passed {
            self.pass(name, detail);
        } else {
            self.fail(name, detail);
        }
    }

    pub fn into_report(self, suite: SuiteKind) -> SuiteReport {
        SuiteReport {
            suite,
            results: self.results,
            resources: Vec::new(),
        }
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }
}

/// Ordered results for one domain, plus the resources it created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: SuiteKind,
    pub results: Vec<TestResult>,
    #[serde(default)]
    pub resources: Vec<CreatedResource>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed_results(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Aggregated report for a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub base_url: String,
    /// True when the auth gate stopped the run before any domain suite
    pub aborted: bool,
    pub suites: Vec<SuiteReport>,
    pub passed: usize,
    pub total: usize,
}

impl RunReport {
    /// Aggregate suite reports; pass and total are derived, never stored
    /// independently of the per-suite results.
    pub fn aggregate(
        started_at: DateTime<Utc>,
        base_url: &str,
        suites: Vec<SuiteReport>,
        aborted: bool,
    ) -> Self {
        let finished_at = Utc::now();
        let passed = suites.iter().map(SuiteReport::passed).sum();
        let total = suites.iter().map(SuiteReport::total).sum();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            started_at,
            finished_at,
            duration_ms,
            base_url: base_url.to_string(),
            aborted,
            suites,
            passed,
            total,
        }
    }

    /// The run succeeds only when every recorded test passed
    pub fn success(&self) -> bool {
        !self.aborted && self.passed == self.total
    }

    /// Log the per-suite rollup and the detail of every failed test
    pub fn print_summary(&self) {
        info!("{}", "=".repeat(60));
        info!("Run summary");
        info!("{}", "=".repeat(60));
        for suite in &self.suites {
            info!(
                "{:<14} {:>2}/{:<2} passed",
                suite.suite,
                suite.passed(),
                suite.total()
            );
        }
        info!("{}", "-".repeat(60));
        info!(
            "overall: {}/{} passed in {:.1}s{}",
            self.passed,
            self.total,
            self.duration_ms as f64 / 1000.0,
            if self.aborted { " (run aborted)" } else { "" }
        );

        if self.passed < self.total {
            error!("failed tests:");
            for suite in &self.suites {
                for result in suite.failed_results() {
                    error!("  [{}] {}: {}", suite.suite, result.name, result.detail);
                }
            }
        }
    }

    /// Persist the report as timestamped pretty JSON, returning the path
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let name = format!(
            "thesistrack_report_{}.json",
            self.started_at.format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(name);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        info!("report written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite(kind: SuiteKind, outcomes: &[bool]) -> SuiteReport {
        let mut recorder = Recorder::new();
        for (i, &ok) in outcomes.iter().enumerate() {
            recorder.record(&format!("case {i}"), ok, "");
        }
        recorder.into_report(kind)
    }

    #[test]
    fn test_suite_counts() {
        let report = suite(SuiteKind::Users, &[true, false, true]);
        assert_eq!(report.passed(), 2);
        assert_eq!(report.total(), 3);
        assert_eq!(report.failed_results().count(), 1);
    }

    #[test]
    fn test_recorder_preserves_order() {
        let mut recorder = Recorder::new();
        recorder.pass("first", "");
        recorder.fail("second", "boom");
        recorder.pass("third", "");
        let names: Vec<_> = recorder.results().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_aggregate_matches_per_suite_sums() {
        let suites = vec![
            suite(SuiteKind::Auth, &[true, true]),
            suite(SuiteKind::Submissions, &[true, false, false]),
            suite(SuiteKind::Tribunals, &[true]),
        ];
        let report = RunReport::aggregate(Utc::now(), "http://x", suites, false);
        assert_eq!(report.passed, 4);
        assert_eq!(report.total, 6);
        let per_suite: usize = report.suites.iter().map(SuiteReport::passed).sum();
        assert_eq!(report.passed, per_suite);
        assert!(!report.success());
    }

    #[test]
    fn test_all_passed_is_success() {
        let suites = vec![suite(SuiteKind::Auth, &[true, true])];
        let report = RunReport::aggregate(Utc::now(), "http://x", suites, false);
        assert!(report.success());
    }

    #[test]
    fn test_aborted_run_never_succeeds() {
        let suites = vec![suite(SuiteKind::Auth, &[true])];
        let report = RunReport::aggregate(Utc::now(), "http://x", suites, true);
        assert!(!report.success());
    }

    #[test]
    fn test_report_roundtrip() {
        let suites = vec![suite(SuiteKind::Defenses, &[true, false])];
        let report = RunReport::aggregate(Utc::now(), "http://x", suites, false);
        let dir = tempfile::tempdir().unwrap();
        let path = report.write(dir.path()).unwrap();
        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded.passed, 1);
        assert_eq!(loaded.total, 2);
    }
}
