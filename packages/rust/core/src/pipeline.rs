//! End-to-end run: login → discovery → per-item extraction → enrichment.
//!
//! [`run_pipeline`] does the scraping over an already-prepared browser.
//! [`run_session`] owns the browser for a whole run: it gates on the login
//! outcome, runs the pipeline and always waits at the shutdown checkpoint and
//! closes the browser before returning.

use std::fmt;

use tracing::{info, instrument, warn};

use leetscribe_browser::{Browser, Checkpoint};
use leetscribe_crawler::{
    AuthOutcome, LoginPacing, SiteProfile, bootstrap, discover, extract_blocks,
};
use leetscribe_shared::{
    AnnotatedBlock, AnnotatedResult, LeetscribeError, Result, ScrapeConfig, SiteCredentials,
    WorkItem,
};

use crate::enrichment::Enricher;
use crate::generator::TextGenerator;

/// Prompt shown before the browser is closed.
pub const SHUTDOWN_PROMPT: &str = "Press Enter to close browser...";

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

/// Whether a run logs in first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginPolicy {
    /// Log in and refuse to continue unless it succeeds.
    #[default]
    Required,
    /// Do not open the login page; scrape anonymously.
    Skip,
}

/// Everything a session needs besides the browser and the generator.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub profile: SiteProfile,
    pub scrape: ScrapeConfig,
    pub login: LoginPolicy,
    pub credentials: Option<SiteCredentials>,
    pub pacing: LoginPacing,
}

/// Outcome of a completed session.
#[derive(Debug)]
pub struct SessionReport {
    /// `None` when login was skipped.
    pub auth: Option<AuthOutcome>,
    pub results: Vec<AnnotatedResult>,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Phases of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Bootstrap,
    /// Suspended until a person confirms the login challenge is solved.
    AwaitingHuman,
    Discovery,
    Processing,
    Shutdown,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bootstrap => "Logging in",
            Self::AwaitingHuman => "Waiting for manual challenge",
            Self::Discovery => "Discovering problems",
            Self::Processing => "Processing problems",
            Self::Shutdown => "Shutting down",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn stage(&self, stage: Stage);
    /// Called before an item's solutions page is opened.
    fn item_started(&self, item: &WorkItem, current: usize, total: usize);
    /// Called after each block has its annotation.
    fn block_annotated(&self, item: &WorkItem, block: &AnnotatedBlock);
    /// Called when every item has been processed.
    fn done(&self, results: &[AnnotatedResult]);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: Stage) {}
    fn item_started(&self, _item: &WorkItem, _current: usize, _total: usize) {}
    fn block_annotated(&self, _item: &WorkItem, _block: &AnnotatedBlock) {}
    fn done(&self, _results: &[AnnotatedResult]) {}
}

/// Reports [`Stage::AwaitingHuman`] before delegating.
struct StagedCheckpoint<'a, C> {
    inner: &'a C,
    progress: &'a dyn ProgressReporter,
}

impl<C: Checkpoint> Checkpoint for StagedCheckpoint<'_, C> {
    async fn wait(&self, prompt: &str) -> Result<()> {
        self.progress.stage(Stage::AwaitingHuman);
        self.inner.wait(prompt).await
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Discover work items, then extract and annotate each one in turn.
///
/// Per-item and per-block failures degrade into empty or placeholder
/// entries; only a failure to open the listing is returned as an error.
#[instrument(skip_all, fields(max_pages = config.scrape.max_pages))]
pub async fn run_pipeline<B, G>(
    browser: &B,
    enricher: &Enricher<G>,
    config: &SessionConfig,
    progress: &dyn ProgressReporter,
) -> Result<Vec<AnnotatedResult>>
where
    B: Browser,
    G: TextGenerator,
{
    progress.stage(Stage::Discovery);
    let items = discover(browser, &config.profile, &config.scrape).await?;

    progress.stage(Stage::Processing);
    let total = items.len();
    let mut results = Vec::with_capacity(total);

    for (offset, item) in items.into_iter().enumerate() {
        progress.item_started(&item, offset + 1, total);
        let blocks = extract_blocks(browser, &config.profile, &item, &config.scrape).await;

        let mut result = AnnotatedResult::new(item);
        for block in blocks {
            let annotation = enricher.annotate(&block).await;
            result.push(block, annotation);
            if let Some(last) = result.blocks.last() {
                progress.block_annotated(&result.work_item, last);
            }
        }
        info!(title = %result.work_item.title, blocks = result.blocks.len(), "processed problem");
        results.push(result);
    }

    progress.done(&results);
    Ok(results)
}

/// Run a whole session over `browser`, closing it before returning.
///
/// Login (unless [`LoginPolicy::Skip`]) must end in
/// [`AuthOutcome::Authenticated`], otherwise the run stops with
/// [`LeetscribeError::Authentication`]. Whatever happens, the shutdown
/// checkpoint is awaited and the browser closed; errors from that cleanup are
/// logged and never replace the session's own result.
#[instrument(skip_all, fields(login = ?config.login))]
pub async fn run_session<B, G, C>(
    browser: B,
    enricher: &Enricher<G>,
    config: &SessionConfig,
    checkpoint: &C,
    progress: &dyn ProgressReporter,
) -> Result<SessionReport>
where
    B: Browser,
    G: TextGenerator,
    C: Checkpoint,
{
    let outcome = run_stages(&browser, enricher, config, checkpoint, progress).await;
    if let Err(e) = &outcome {
        warn!(error = %e, "session ended with an error");
    }

    progress.stage(Stage::Shutdown);
    if let Err(e) = checkpoint.wait(SHUTDOWN_PROMPT).await {
        warn!(error = %e, "shutdown confirmation failed; closing anyway");
    }
    if let Err(e) = browser.close().await {
        warn!(error = %e, "failed to close browser");
    }

    outcome
}

async fn run_stages<B, G, C>(
    browser: &B,
    enricher: &Enricher<G>,
    config: &SessionConfig,
    checkpoint: &C,
    progress: &dyn ProgressReporter,
) -> Result<SessionReport>
where
    B: Browser,
    G: TextGenerator,
    C: Checkpoint,
{
    let auth = match config.login {
        LoginPolicy::Skip => {
            info!("login skipped; scraping anonymously");
            None
        }
        LoginPolicy::Required => {
            progress.stage(Stage::Bootstrap);
            let staged = StagedCheckpoint {
                inner: checkpoint,
                progress,
            };
            let outcome = bootstrap(
                browser,
                &config.profile,
                config.credentials.as_ref(),
                &staged,
                &config.pacing,
            )
            .await?;

            if !outcome.is_authenticated() {
                return Err(LeetscribeError::authentication(outcome.to_string()));
            }
            Some(outcome)
        }
    };

    let results = run_pipeline(browser, enricher, config, progress).await?;
    Ok(SessionReport { auth, results })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use leetscribe_browser::{AutoResume, StaticBrowser};
    use leetscribe_shared::{Annotation, BlockStatus, EnrichmentMode, EnrichmentSettings};

    use crate::generator::GenerationRequest;

    const LISTING: &str = "https://leetcode.com/problemset/all/";
    const LOGIN: &str = "https://leetcode.com/accounts/login/";

    struct AlwaysOk;

    impl TextGenerator for AlwaysOk {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
            Ok("O(n) time, O(1) space".into())
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        stages: Mutex<Vec<Stage>>,
        blocks: Mutex<usize>,
    }

    impl ProgressReporter for RecordingProgress {
        fn stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }
        fn item_started(&self, _item: &WorkItem, _current: usize, _total: usize) {}
        fn block_annotated(&self, _item: &WorkItem, _block: &AnnotatedBlock) {
            *self.blocks.lock().unwrap() += 1;
        }
        fn done(&self, _results: &[AnnotatedResult]) {}
    }

    fn enricher() -> Enricher<AlwaysOk> {
        Enricher::new(
            AlwaysOk,
            EnrichmentSettings {
                mode: EnrichmentMode::Complexity,
                language: "C++".into(),
                target_language: "C++".into(),
                model: "gpt-3.5-turbo".into(),
                temperature: 0.0,
            },
        )
    }

    fn config(login: LoginPolicy) -> SessionConfig {
        SessionConfig {
            profile: SiteProfile::default(),
            scrape: ScrapeConfig::immediate(),
            login,
            credentials: Some(SiteCredentials {
                username: "alice".into(),
                password: "pw".into(),
            }),
            pacing: LoginPacing::immediate(),
        }
    }

    fn solutions(slug: &str) -> String {
        format!("https://leetcode.com/problems/{slug}/solutions/?tab=solutions")
    }

    fn site() -> StaticBrowser {
        StaticBrowser::new()
            .with_page(
                LISTING,
                r#"<a href="/problems/two-sum/">Two Sum</a>
                   <a href="/problems/add-two-numbers/">Add Two Numbers</a>"#,
            )
            .with_page(
                solutions("two-sum"),
                r#"<div class="relative solution"><pre>two-sum #1</pre></div>
                   <div class="relative solution"><pre>two-sum #2</pre></div>"#,
            )
            .with_page(
                solutions("add-two-numbers"),
                r#"<div class="relative solution"><pre>add #1</pre></div>
                   <div class="relative solution"><pre>add #2</pre></div>"#,
            )
    }

    async fn run_unauthenticated(browser: &StaticBrowser) -> Vec<AnnotatedResult> {
        let config = config(LoginPolicy::Skip);
        run_pipeline(browser, &enricher(), &config, &SilentProgress)
            .await
            .unwrap()
    }

    fn login_page(submit_to: &str) -> String {
        format!(
            r#"<input id="id_login"><input id="id_password">
               <button id="signin_btn" data-href="{submit_to}">Sign In</button>"#
        )
    }

    #[tokio::test]
    async fn two_items_two_blocks_each() {
        let browser = site();
        let results = run_unauthenticated(&browser).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].work_item.title, "Two Sum");
        assert_eq!(results[1].work_item.title, "Add Two Numbers");
        for result in &results {
            assert_eq!(result.blocks.len(), 2);
            let indices: Vec<_> = result.blocks.iter().map(|b| b.block.sequence_index).collect();
            assert_eq!(indices, vec![1, 2]);
            assert!(result.blocks.iter().all(|b| b.annotation.is_generated()));
        }
        assert_eq!(results[0].blocks[1].block.raw_text, "two-sum #2");
    }

    #[tokio::test]
    async fn item_that_never_renders_does_not_stop_the_next() {
        let browser = StaticBrowser::new()
            .with_page(
                LISTING,
                r#"<a href="/problems/slow/">Slow</a>
                   <a href="/problems/fast/">Fast</a>"#,
            )
            .with_page(solutions("slow"), "<p>Loading...</p>")
            .with_page(
                solutions("fast"),
                r#"<div class="relative solution"><p>prose</p></div>"#,
            );

        let results = run_unauthenticated(&browser).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].blocks.is_empty());
        assert_eq!(results[1].blocks.len(), 1);
        assert_eq!(results[1].blocks[0].block.status, BlockStatus::NoContent);
        assert_eq!(results[1].blocks[0].annotation, Annotation::Skipped);
    }

    #[tokio::test]
    async fn broken_block_is_skipped_between_annotated_neighbours() {
        let browser = StaticBrowser::new()
            .with_page(LISTING, r#"<a href="/problems/two-sum/">Two Sum</a>"#)
            .with_page(
                solutions("two-sum"),
                r#"<div class="relative solution"><pre>first</pre></div>
                   <div class="relative solution detached"><pre>second</pre></div>
                   <div class="relative solution"><pre>third</pre></div>"#,
            )
            .with_broken("div.detached");

        let results = run_unauthenticated(&browser).await;

        assert_eq!(results.len(), 1);
        let blocks = &results[0].blocks;
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].block.sequence_index, 2);
        assert_eq!(blocks[1].block.status, BlockStatus::Failed);
        assert_eq!(blocks[1].annotation, Annotation::Skipped);
        assert!(blocks[0].annotation.is_generated());
        assert!(blocks[2].annotation.is_generated());
        assert_eq!(blocks[2].block.raw_text, "third");
    }

    #[tokio::test]
    async fn authenticated_session_runs_and_closes() {
        let browser = site()
            .with_page(LOGIN, login_page("/"))
            .with_page("https://leetcode.com/", "<p>home</p>");
        let probe = browser.probe();
        let progress = RecordingProgress::default();

        let config = config(LoginPolicy::Required);
        let report = run_session(browser, &enricher(), &config, &AutoResume, &progress)
            .await
            .unwrap();

        assert_eq!(report.auth, Some(AuthOutcome::Authenticated));
        assert_eq!(report.results.len(), 2);
        assert!(probe.closed());
        assert_eq!(*progress.blocks.lock().unwrap(), 4);
        assert_eq!(
            *progress.stages.lock().unwrap(),
            vec![
                Stage::Bootstrap,
                Stage::AwaitingHuman,
                Stage::Discovery,
                Stage::Processing,
                Stage::Shutdown,
            ]
        );
    }

    #[tokio::test]
    async fn rejected_login_stops_before_discovery_but_still_closes() {
        let browser = site().with_page(LOGIN, login_page(LOGIN));
        let probe = browser.probe();

        let config = config(LoginPolicy::Required);
        let err = run_session(browser, &enricher(), &config, &AutoResume, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, LeetscribeError::Authentication { .. }));
        assert!(probe.closed());
        assert!(!probe.visits().iter().any(|url| url == LISTING));
    }

    #[tokio::test]
    async fn missing_credentials_fail_the_gate() {
        let browser = site().with_page(LOGIN, login_page("/"));
        let probe = browser.probe();
        let config = SessionConfig {
            credentials: None,
            ..config(LoginPolicy::Required)
        };

        let err = run_session(browser, &enricher(), &config, &AutoResume, &SilentProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("credentials"));
        assert!(probe.closed());
    }

    #[tokio::test]
    async fn skipped_login_never_opens_the_form() {
        let browser = site().with_page(LOGIN, login_page("/"));
        let probe = browser.probe();

        let config = config(LoginPolicy::Skip);
        let report = run_session(browser, &enricher(), &config, &AutoResume, &SilentProgress)
            .await
            .unwrap();

        assert!(report.auth.is_none());
        assert!(!probe.visits().iter().any(|url| url == LOGIN));
        assert!(probe.closed());
    }

    #[tokio::test]
    async fn pipeline_error_still_closes_the_browser() {
        let browser = StaticBrowser::new();
        let probe = browser.probe();

        let config = config(LoginPolicy::Skip);
        let result =
            run_session(browser, &enricher(), &config, &AutoResume, &SilentProgress).await;

        assert!(result.is_err());
        assert!(probe.closed());
    }
}
