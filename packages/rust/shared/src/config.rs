//! Application configuration for Leetscribe.
//!
//! User config lives at `~/.leetscribe/leetscribe.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file: it only names the environment variables
//! that hold them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LeetscribeError, Result};
use crate::types::EnrichmentMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leetscribe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leetscribe";

/// Desktop Chrome user agent presented instead of the automation default.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.6998.89 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching leetscribe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target site locations and credential variable names.
    #[serde(default)]
    pub site: SiteConfig,

    /// Browser launch profile.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Scrape pacing and behavior.
    #[serde(default)]
    pub scrape: ScrapeSection,

    /// Generation service settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site origin, e.g. `https://leetcode.com`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the login form.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Path of the first problem listing page.
    #[serde(default = "default_listing_path")]
    pub listing_path: String,

    /// Suffix appended to a problem URL to reach its solutions tab.
    #[serde(default = "default_solutions_suffix")]
    pub solutions_suffix: String,

    /// Env var holding the site username.
    #[serde(default = "default_username_env")]
    pub username_env: String,

    /// Env var holding the site password.
    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            listing_path: default_listing_path(),
            solutions_suffix: default_solutions_suffix(),
            username_env: default_username_env(),
            password_env: default_password_env(),
        }
    }
}

fn default_base_url() -> String {
    "https://leetcode.com".into()
}
fn default_login_path() -> String {
    "/accounts/login/".into()
}
fn default_listing_path() -> String {
    "/problemset/all/".into()
}
fn default_solutions_suffix() -> String {
    "/solutions/?tab=solutions".into()
}
fn default_username_env() -> String {
    "LEETCODE_USERNAME".into()
}
fn default_password_env() -> String {
    "LEETCODE_PASSWORD".into()
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver server endpoint (e.g. a running `chromedriver`).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// User agent presented to the site.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Run without a visible window. Manual challenge solving needs a window.
    #[serde(default)]
    pub headless: bool,

    /// Real Chrome profile directory to reuse (`--user-data-dir`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_dir: Option<String>,

    /// Profile name inside `user_data_dir` (`--profile-directory`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_directory: Option<String>,

    /// Browser executable to launch instead of the driver's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Lower bound of the per-keystroke typing delay.
    #[serde(default = "default_min_key_delay")]
    pub min_key_delay_ms: u64,

    /// Upper bound of the per-keystroke typing delay.
    #[serde(default = "default_max_key_delay")]
    pub max_key_delay_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            user_agent: default_user_agent(),
            headless: false,
            user_data_dir: None,
            profile_directory: None,
            binary: None,
            min_key_delay_ms: default_min_key_delay(),
            max_key_delay_ms: default_max_key_delay(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_min_key_delay() -> u64 {
    100
}
fn default_max_key_delay() -> u64 {
    300
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeSection {
    /// Listing pages to walk.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Solution category to narrow to (e.g. "C++"). Unset = no filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_category: Option<String>,

    /// Click every "Show more" control before extracting.
    #[serde(default = "default_true")]
    pub expand_sections: bool,

    /// Viewport scrolls per solutions page to trigger lazy loading.
    #[serde(default)]
    pub scroll_passes: u32,

    /// Pause after listing loads and pagination clicks.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Pause between submitting the login form and checking the URL.
    #[serde(default = "default_login_settle_ms")]
    pub login_settle_ms: u64,

    /// Bound on waiting for listing anchors and solution containers.
    #[serde(default = "default_content_timeout")]
    pub content_timeout_secs: u64,

    /// Pause after clicking the category filter.
    #[serde(default = "default_filter_pause_ms")]
    pub filter_pause_ms: u64,

    /// Pause after scrolling each block into view.
    #[serde(default = "default_block_delay_ms")]
    pub block_delay_ms: u64,
}

impl Default for ScrapeSection {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            filter_category: None,
            expand_sections: true,
            scroll_passes: 0,
            settle_ms: default_settle_ms(),
            login_settle_ms: default_login_settle_ms(),
            content_timeout_secs: default_content_timeout(),
            filter_pause_ms: default_filter_pause_ms(),
            block_delay_ms: default_block_delay_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_max_pages() -> u32 {
    1
}
fn default_settle_ms() -> u64 {
    5_000
}
fn default_login_settle_ms() -> u64 {
    3_000
}
fn default_content_timeout() -> u64 {
    10
}
fn default_filter_pause_ms() -> u64 {
    2_000
}
fn default_block_delay_ms() -> u64 {
    1_000
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API root (the client appends `/chat/completions`).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; 0.0 is the most deterministic setting.
    #[serde(default)]
    pub temperature: f32,

    /// What to ask for each snippet.
    #[serde(default)]
    pub mode: EnrichmentMode,

    /// Declared language of scraped snippets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Target language in convert mode.
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Per-request timeout.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: 0.0,
            mode: EnrichmentMode::default(),
            language: None,
            target_language: default_target_language(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_target_language() -> String {
    "C++".into()
}
fn default_llm_timeout() -> u64 {
    60
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scrape configuration: merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub max_pages: u32,
    /// Cap on processed items after deduplication.
    pub limit: Option<usize>,
    pub filter_category: Option<String>,
    pub expand_sections: bool,
    pub scroll_passes: u32,
    pub settle_delay: Duration,
    pub login_settle_delay: Duration,
    pub content_timeout: Duration,
    pub filter_pause: Duration,
    pub block_delay: Duration,
}

impl ScrapeConfig {
    /// Settings with every pause at zero and short waits, for tests and replays.
    pub fn immediate() -> Self {
        Self {
            max_pages: 1,
            limit: None,
            filter_category: None,
            expand_sections: true,
            scroll_passes: 0,
            settle_delay: Duration::ZERO,
            login_settle_delay: Duration::ZERO,
            content_timeout: Duration::from_millis(200),
            filter_pause: Duration::ZERO,
            block_delay: Duration::ZERO,
        }
    }
}

impl From<&AppConfig> for ScrapeConfig {
    fn from(config: &AppConfig) -> Self {
        let s = &config.scrape;
        Self {
            max_pages: s.max_pages,
            limit: None,
            filter_category: s.filter_category.clone(),
            expand_sections: s.expand_sections,
            scroll_passes: s.scroll_passes,
            settle_delay: Duration::from_millis(s.settle_ms),
            login_settle_delay: Duration::from_millis(s.login_settle_ms),
            content_timeout: Duration::from_secs(s.content_timeout_secs),
            filter_pause: Duration::from_millis(s.filter_pause_ms),
            block_delay: Duration::from_millis(s.block_delay_ms),
        }
    }
}

/// Runtime enrichment configuration.
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    pub mode: EnrichmentMode,
    /// Declared language of the snippets.
    pub language: String,
    /// Target language in convert mode.
    pub target_language: String,
    pub model: String,
    pub temperature: f32,
}

impl EnrichmentSettings {
    /// Language assumed for snippets when none is configured.
    pub fn default_language(mode: EnrichmentMode) -> &'static str {
        match mode {
            EnrichmentMode::Complexity => "C++",
            EnrichmentMode::Convert => "Python",
        }
    }
}

impl From<&AppConfig> for EnrichmentSettings {
    fn from(config: &AppConfig) -> Self {
        let llm = &config.llm;
        Self {
            mode: llm.mode,
            language: llm
                .language
                .clone()
                .unwrap_or_else(|| Self::default_language(llm.mode).to_string()),
            target_language: llm.target_language.clone(),
            model: llm.model.clone(),
            temperature: llm.temperature,
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Generation service API key. `Debug` never prints the value.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Target-site login. `Debug` never prints the password.
#[derive(Clone)]
pub struct SiteCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SiteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Everything read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// `None` when either the username or password is unset or empty.
    pub site: Option<SiteCredentials>,
    pub api_key: ApiKey,
}

/// Load credentials from the process environment.
///
/// A missing API key is fatal; missing site credentials are not.
pub fn load_credentials(config: &AppConfig) -> Result<Credentials> {
    load_credentials_with(config, |name| std::env::var(name).ok())
}

/// Load credentials through an arbitrary variable lookup.
pub fn load_credentials_with<F>(config: &AppConfig, lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let var_name = &config.llm.api_key_env;
    let api_key = non_empty(var_name).map(ApiKey::new).ok_or_else(|| {
        LeetscribeError::config(format!(
            "{var_name} is missing! Set it in the environment or a .env file."
        ))
    })?;

    let site = match (
        non_empty(&config.site.username_env),
        non_empty(&config.site.password_env),
    ) {
        (Some(username), Some(password)) => Some(SiteCredentials { username, password }),
        _ => {
            tracing::debug!(
                username_env = %config.site.username_env,
                password_env = %config.site.password_env,
                "site credentials not set"
            );
            None
        }
    };

    Ok(Credentials { site, api_key })
}

/// Check that the API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    load_credentials(config).map(|_| ())
}

/// Load a `.env` file from the working directory (or a parent) if one exists.
/// Returns the path that was loaded.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(?path, "loaded .env file");
            Ok(Some(path))
        }
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(LeetscribeError::config(format!("failed to load .env: {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leetscribe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LeetscribeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leetscribe/leetscribe.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeetscribeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        LeetscribeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    url::Url::parse(&config.site.base_url).map_err(|e| {
        LeetscribeError::config(format!("invalid site.base_url '{}': {e}", config.site.base_url))
    })?;

    if config.browser.min_key_delay_ms > config.browser.max_key_delay_ms {
        return Err(LeetscribeError::config(
            "browser.min_key_delay_ms must not exceed browser.max_key_delay_ms",
        ));
    }

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeetscribeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeetscribeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeetscribeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
