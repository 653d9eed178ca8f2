//! Run orchestration: auth gate, sequential suites, unconditional
//! cleanup, aggregation, and the persisted run report

use chrono::Utc;
use thesistrack_common::{ApiClient, HarnessConfig, Result, Role};
use tracing::{error, info, warn};

use crate::auth::{self, RoleTokens};
use crate::report::{RunReport, SuiteKind, SuiteReport};
use crate::setup::{self, SeedData};
use crate::suites::{self, SuiteCx};
use crate::tracker::ResourceTracker;

/// Orchestrates one harness run end to end
pub struct HarnessRunner {
    config: HarnessConfig,
    client: ApiClient,
    /// Leave created resources in place (debugging aid)
    skip_cleanup: bool,
}

impl HarnessRunner {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self {
            config,
            client,
            skip_cleanup: false,
        })
    }

    pub fn with_skip_cleanup(mut self, skip: bool) -> Self {
        self.skip_cleanup = skip;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run everything: auth, seed, all five domain suites, report
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        self.print_header();

        // Authentication is a hard gate, not an ordinary suite
        let (tokens, auth_report) = auth::acquire(&self.client, &self.config).await;
        if let Err(e) = tokens.save(&self.config.token_file()) {
            warn!("could not persist token file: {e}");
        }

        if tokens.is_empty() {
            error!("no tokens acquired; skipping every suite");
            return self.finish(started_at, vec![auth_report], true);
        }
        info!("{} role(s) authenticated", tokens.len());

        // Seed data for the defenses suite, tracked for end-of-run cleanup
        let mut seed_tracker = ResourceTracker::new();
        let seed = setup::seed(&self.client, &tokens, &self.config, &mut seed_tracker).await;

        let mut reports = vec![auth_report];
        for kind in SuiteKind::DOMAIN_ORDER {
            reports.push(self.run_domain_suite(kind, &tokens, seed).await);
        }

        self.cleanup(&seed_tracker, &tokens).await;
        self.finish(started_at, reports, false)
    }

    /// Run one domain suite, reusing a persisted token map when present
    ///
    /// Mirrors invoking a single suite on its own: tokens come from the
    /// ephemeral file of a previous run when available, otherwise a fresh
    /// acquisition (whose results are part of the report). The token file
    /// is kept for the next single-suite invocation.
    pub async fn run_single(&self, kind: SuiteKind) -> Result<RunReport> {
        let started_at = Utc::now();
        self.print_header();

        let token_file = self.config.token_file();
        if kind == SuiteKind::Auth {
            let (tokens, report) = auth::acquire(&self.client, &self.config).await;
            if let Err(e) = tokens.save(&token_file) {
                warn!("could not persist token file: {e}");
            }
            let aborted = tokens.is_empty();
            let finished =
                RunReport::aggregate(started_at, self.client.base_url(), vec![report], aborted);
            finished.print_summary();
            finished.write(&self.config.report_dir)?;
            return Ok(finished);
        }

        let (tokens, auth_report) = match RoleTokens::load(&token_file) {
            Ok(tokens) if !tokens.is_empty() => {
                info!("reusing token file {}", token_file.display());
                (tokens, None)
            }
            _ => {
                let (tokens, report) = auth::acquire(&self.client, &self.config).await;
                if let Err(e) = tokens.save(&token_file) {
                    warn!("could not persist token file: {e}");
                }
                (tokens, Some(report))
            }
        };

        let mut reports: Vec<SuiteReport> = auth_report.into_iter().collect();
        if tokens.is_empty() {
            error!("no tokens acquired; skipping the {kind} suite");
            let finished = RunReport::aggregate(started_at, self.client.base_url(), reports, true);
            finished.print_summary();
            finished.write(&self.config.report_dir)?;
            return Ok(finished);
        }

        if kind == SuiteKind::Defenses {
            let mut seed_tracker = ResourceTracker::new();
            let seed = setup::seed(&self.client, &tokens, &self.config, &mut seed_tracker).await;
            reports.push(self.run_domain_suite(kind, &tokens, seed).await);
            self.cleanup(&seed_tracker, &tokens).await;
        } else {
            reports.push(self.run_domain_suite(kind, &tokens, None).await);
        }

        let finished = RunReport::aggregate(started_at, self.client.base_url(), reports, false);
        finished.print_summary();
        finished.write(&self.config.report_dir)?;
        Ok(finished)
    }

    async fn run_domain_suite(
        &self,
        kind: SuiteKind,
        tokens: &RoleTokens,
        seed: Option<SeedData>,
    ) -> SuiteReport {
        info!("{}", "-".repeat(60));
        info!("running {kind} suite");
        let cx = SuiteCx::new(&self.client, tokens, &self.config);
        let (report, tracker) = match kind {
            SuiteKind::Auth => unreachable!("auth is the gate, not a domain suite"),
            SuiteKind::Submissions => suites::submissions::run(cx).await,
            SuiteKind::Tribunals => suites::tribunals::run(cx).await,
            SuiteKind::Defenses => suites::defenses::run(cx, seed).await,
            SuiteKind::Users => suites::users::run(cx).await,
            SuiteKind::Notifications => suites::notifications::run(cx).await,
        };
        info!(
            "{kind} suite: {}/{} passed",
            report.passed(),
            report.total()
        );

        // Cleanup runs whether the suite passed or failed
        self.cleanup(&tracker, tokens).await;
        report
    }

    async fn cleanup(&self, tracker: &ResourceTracker, tokens: &RoleTokens) {
        if self.skip_cleanup {
            if !tracker.is_empty() {
                warn!("skipping cleanup of {} resource(s)", tracker.items().len());
            }
            return;
        }
        let admin = tokens.bearer(Role::Admin);
        let stats = tracker.cleanup(&self.client, admin).await;
        if stats.failed > 0 {
            warn!(
                "cleanup: {} deleted, {} already absent, {} failed",
                stats.deleted, stats.already_absent, stats.failed
            );
        }
    }

    fn finish(
        &self,
        started_at: chrono::DateTime<Utc>,
        reports: Vec<SuiteReport>,
        aborted: bool,
    ) -> Result<RunReport> {
        let report = RunReport::aggregate(started_at, self.client.base_url(), reports, aborted);
        report.print_summary();
        report.write(&self.config.report_dir)?;
        RoleTokens::remove_file(&self.config.token_file());
        Ok(report)
    }

    /// Remove ephemeral files after an interrupt or unexpected error
    ///
    /// Created-resource cleanup is best effort and may be incomplete
    /// at this point; only harness-side state is removed here.
    pub fn emergency_cleanup(&self) {
        warn!("emergency cleanup of ephemeral files");
        RoleTokens::remove_file(&self.config.token_file());
    }

    fn print_header(&self) {
        info!("{}", "=".repeat(60));
        info!("ThesisTrack API test harness v{}", thesistrack_common::VERSION);
        info!("base URL: {}", self.client.base_url());
        info!("started:  {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
        info!("{}", "=".repeat(60));
    }
}
