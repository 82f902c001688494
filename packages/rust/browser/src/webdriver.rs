//! WebDriver backend built on `thirtyfour`.
//!
//! Talks to an already-running driver server (e.g. `chromedriver --port=9515`)
//! and launches Chrome with a profile that hides the usual automation markers.

use thirtyfour::prelude::*;
use thirtyfour::{ChromeCapabilities, ChromiumLikeCapabilities};
use tracing::{debug, info, instrument, warn};

use leetscribe_shared::{BrowserConfig, LeetscribeError, Result};

use crate::{Browser, Locator};

/// Hides `navigator.webdriver` from page scripts.
const WEBDRIVER_FLAG_PATCH: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// Chrome switches that disable the usual automation fingerprints.
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-popup-blocking",
    "--disable-dev-shm-usage",
    "--no-sandbox",
];

fn driver_err(e: WebDriverError) -> LeetscribeError {
    LeetscribeError::Browser(e.to_string())
}

/// A live WebDriver session.
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Start a Chrome session through the configured WebDriver server.
    #[instrument(skip_all, fields(webdriver = %config.webdriver_url))]
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let caps = chrome_capabilities(config)?;

        info!(headless = config.headless, "starting browser session");
        let driver = WebDriver::new(config.webdriver_url.as_str(), caps)
            .await
            .map_err(|e| {
                LeetscribeError::Browser(format!(
                    "failed to start session at {}: {e}. Is chromedriver running?",
                    config.webdriver_url
                ))
            })?;

        hide_automation(Self { driver }).await
    }

    async fn filter_by_text(
        &self,
        candidates: Vec<WebElement>,
        locator: &Locator,
    ) -> Result<Vec<WebElement>> {
        if !locator.filters_text() {
            return Ok(candidates);
        }

        let mut matched = Vec::new();
        for element in candidates {
            // Candidates can detach while we read them; skip those.
            match element.text().await {
                Ok(text) if locator.accepts_text(&text) => matched.push(element),
                Ok(_) => {}
                Err(e) => debug!(%locator, error = %e, "skipping unreadable candidate"),
            }
        }
        Ok(matched)
    }
}

/// Patch the automation flag, closing the session if the patch is rejected.
async fn hide_automation<B: Browser>(browser: B) -> Result<B> {
    if let Err(e) = browser.execute(WEBDRIVER_FLAG_PATCH).await {
        if let Err(close_err) = browser.close().await {
            warn!(error = %close_err, "could not close session after failed launch");
        }
        return Err(e);
    }
    Ok(browser)
}

/// Build Chrome capabilities from the browser config.
fn chrome_capabilities(config: &BrowserConfig) -> Result<ChromeCapabilities> {
    let mut caps = DesiredCapabilities::chrome();

    let mut args: Vec<String> = STEALTH_ARGS.iter().map(|a| a.to_string()).collect();
    args.push(format!("--user-agent={}", config.user_agent));
    if let Some(dir) = &config.user_data_dir {
        args.push(format!("--user-data-dir={dir}"));
    }
    if let Some(profile) = &config.profile_directory {
        args.push(format!("--profile-directory={profile}"));
    }
    if config.headless {
        args.push("--headless=new".to_string());
    }

    for arg in &args {
        caps.add_arg(arg).map_err(driver_err)?;
    }
    caps.add_exclude_switch("enable-automation")
        .map_err(driver_err)?;
    if let Some(binary) = &config.binary {
        caps.set_binary(binary).map_err(driver_err)?;
    }

    Ok(caps)
}

impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "navigating");
        self.driver.goto(url).await.map_err(driver_err)
    }

    async fn current_url(&self) -> Result<String> {
        let url = self.driver.current_url().await.map_err(driver_err)?;
        Ok(url.to_string())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>> {
        let candidates = self
            .driver
            .find_all(By::Css(locator.selector()))
            .await
            .map_err(driver_err)?;
        self.filter_by_text(candidates, locator).await
    }

    async fn find_within(&self, parent: &WebElement, locator: &Locator) -> Result<Vec<WebElement>> {
        let candidates = parent
            .find_all(By::Css(locator.selector()))
            .await
            .map_err(driver_err)?;
        self.filter_by_text(candidates, locator).await
    }

    async fn text(&self, element: &WebElement) -> Result<String> {
        element.text().await.map_err(driver_err)
    }

    async fn attr(&self, element: &WebElement, name: &str) -> Result<Option<String>> {
        element.attr(name).await.map_err(driver_err)
    }

    async fn click(&self, element: &WebElement) -> Result<()> {
        element.click().await.map_err(driver_err)
    }

    async fn script_click(&self, element: &WebElement) -> Result<()> {
        let arg = element.to_json().map_err(driver_err)?;
        self.driver
            .execute("arguments[0].click();", vec![arg])
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &WebElement) -> Result<()> {
        element.scroll_into_view().await.map_err(driver_err)
    }

    async fn send_keys(&self, element: &WebElement, keys: &str) -> Result<()> {
        element.send_keys(keys).await.map_err(driver_err)
    }

    async fn execute(&self, script: &str) -> Result<()> {
        self.driver
            .execute(script, Vec::new())
            .await
            .map_err(driver_err)?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        info!("closing browser session");
        self.driver.quit().await.map_err(driver_err)
    }
}
