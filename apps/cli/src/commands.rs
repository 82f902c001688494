//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

use leetscribe_browser::{AutoResume, Checkpoint, HumanTyping, StdinCheckpoint, WebDriverBrowser};
use leetscribe_core::{
    Enricher, LoginPolicy, OpenAiClient, ProgressReporter, SessionConfig, SessionReport, Stage,
    render_json, render_text, run_session,
};
use leetscribe_crawler::{LoginPacing, SiteProfile};
use leetscribe_shared::{
    AnnotatedBlock, AnnotatedResult, Annotation, AppConfig, EnrichmentMode, EnrichmentSettings,
    ScrapeConfig, WorkItem, init_config, load_config, load_credentials, load_dotenv,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Leetscribe: scrape coding-problem solutions and annotate them.
#[derive(Parser)]
#[command(
    name = "leetscribe",
    version,
    about = "Scrape coding-problem solutions and annotate them with an LLM.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub(crate) enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Flags of `leetscribe run`. Unset flags fall back to the config file.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunArgs {
    /// Listing pages to walk.
    #[arg(long)]
    pub pages: Option<u32>,

    /// Process at most this many problems.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Solution category to filter to before extracting (e.g. "C++").
    #[arg(long)]
    pub filter: Option<String>,

    /// What to ask for: complexity or convert.
    #[arg(long)]
    pub mode: Option<EnrichmentMode>,

    /// Language of the scraped snippets.
    #[arg(long)]
    pub language: Option<String>,

    /// Target language in convert mode.
    #[arg(long)]
    pub target_language: Option<String>,

    /// Skip the login form and scrape anonymously.
    #[arg(long)]
    pub skip_login: bool,

    /// Do not wait for Enter at checkpoints.
    #[arg(long)]
    pub auto_resume: bool,

    /// Run the browser without a window.
    #[arg(long)]
    pub headless: bool,

    /// WebDriver server URL.
    #[arg(long)]
    pub webdriver: Option<String>,

    /// Report format printed at the end of the run.
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Log in, scrape solutions and annotate them.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "leetscribe=info",
        1 => "leetscribe=debug",
        _ => "leetscribe=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Overlay CLI flags onto the loaded config.
fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if let Some(pages) = args.pages {
        config.scrape.max_pages = pages;
    }
    if let Some(filter) = &args.filter {
        config.scrape.filter_category = Some(filter.clone());
    }
    if let Some(mode) = args.mode {
        config.llm.mode = mode;
    }
    if let Some(language) = &args.language {
        config.llm.language = Some(language.clone());
    }
    if let Some(target) = &args.target_language {
        config.llm.target_language = target.clone();
    }
    if let Some(url) = &args.webdriver {
        config.browser.webdriver_url = url.clone();
    }
    if args.headless {
        config.browser.headless = true;
    }
}

async fn cmd_run(args: RunArgs) -> Result<()> {
    if let Some(path) = load_dotenv()? {
        info!(path = %path.display(), "loaded environment file");
    }

    let mut config = load_config()?;
    apply_overrides(&mut config, &args);

    // Fails before anything is launched when the API key is missing.
    let credentials = load_credentials(&config)?;

    let mut scrape = ScrapeConfig::from(&config);
    scrape.limit = args.limit;

    let settings = EnrichmentSettings::from(&config);
    info!(
        mode = %settings.mode,
        language = %settings.language,
        model = %settings.model,
        "enrichment configured"
    );
    let generator = OpenAiClient::from_config(&config.llm, credentials.api_key.clone())?;
    let enricher = Enricher::new(generator, settings);

    let session = SessionConfig {
        profile: SiteProfile::from(&config.site),
        pacing: LoginPacing::new(HumanTyping::from(&config.browser), scrape.login_settle_delay),
        scrape,
        login: if args.skip_login {
            LoginPolicy::Skip
        } else {
            LoginPolicy::Required
        },
        credentials: credentials.site,
    };

    let browser = WebDriverBrowser::launch(&config.browser).await?;
    let progress = CliProgress::new();

    let outcome = if args.auto_resume {
        run_session(browser, &enricher, &session, &AutoResume, &progress).await
    } else {
        let checkpoint = SpinnerCheckpoint {
            spinner: progress.spinner.clone(),
        };
        run_session(browser, &enricher, &session, &checkpoint, &progress).await
    };
    progress.spinner.finish_and_clear();

    let report: SessionReport = outcome.wrap_err("scrape session failed")?;
    print_report(&report, args.format)
}

fn print_report(report: &SessionReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => {
            println!("[*] Scraping done. Solutions data:");
            print!("{}", render_text(&report.results));
        }
        ReportFormat::Json => println!("{}", render_json(&report.results)?),
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, stage: Stage) {
        if stage != Stage::AwaitingHuman {
            self.spinner.println(format!("[*] {stage}"));
        }
        self.spinner.set_message(stage.to_string());
    }

    fn item_started(&self, item: &WorkItem, current: usize, total: usize) {
        self.spinner
            .println(format!("[*] [{current}/{total}] {}", item.title));
        self.spinner
            .set_message(format!("Processing [{current}/{total}] {}", item.title));
    }

    fn block_annotated(&self, _item: &WorkItem, block: &AnnotatedBlock) {
        let index = block.block.sequence_index;
        let line = match &block.annotation {
            Annotation::Generated(_) => format!("[+] Solution #{index} annotated"),
            Annotation::Failed => format!("[-] Solution #{index}: annotation failed"),
            Annotation::Skipped => format!("[-] Solution #{index}: no code captured"),
        };
        self.spinner.println(line);
    }

    fn done(&self, results: &[AnnotatedResult]) {
        let blocks: usize = results.iter().map(|r| r.blocks.len()).sum();
        self.spinner.println(format!(
            "[+] Processed {} problems, {blocks} solutions",
            results.len()
        ));
    }
}

/// Waits for Enter with the spinner hidden so the prompt stays readable.
struct SpinnerCheckpoint {
    spinner: ProgressBar,
}

impl Checkpoint for SpinnerCheckpoint {
    async fn wait(&self, prompt: &str) -> leetscribe_shared::Result<()> {
        self.spinner.set_draw_target(ProgressDrawTarget::hidden());
        let result = StdinCheckpoint.wait(prompt).await;
        self.spinner.set_draw_target(ProgressDrawTarget::stderr());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "leetscribe",
            "run",
            "--pages",
            "3",
            "--limit",
            "5",
            "--filter",
            "C++",
            "--mode",
            "convert",
            "--skip-login",
            "--format",
            "json",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.pages, Some(3));
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.mode, Some(EnrichmentMode::Convert));
        assert!(args.skip_login);
        assert!(matches!(args.format, ReportFormat::Json));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["leetscribe", "run", "--mode", "summarize"]).is_err());
    }

    #[test]
    fn overrides_win_over_config() {
        let mut config = AppConfig::default();
        let args = RunArgs {
            pages: Some(4),
            filter: Some("Java".into()),
            mode: Some(EnrichmentMode::Convert),
            webdriver: Some("http://127.0.0.1:4444".into()),
            headless: true,
            ..RunArgs::default()
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.scrape.max_pages, 4);
        assert_eq!(config.scrape.filter_category.as_deref(), Some("Java"));
        assert_eq!(config.llm.mode, EnrichmentMode::Convert);
        assert_eq!(config.browser.webdriver_url, "http://127.0.0.1:4444");
        assert!(config.browser.headless);
        assert_eq!(EnrichmentSettings::from(&config).language, "Python");
    }

    #[test]
    fn unset_flags_keep_config_values() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &RunArgs::default());
        assert_eq!(config.scrape.max_pages, 1);
        assert!(!config.browser.headless);
    }
}
