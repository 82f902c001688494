//! Login bootstrap.
//!
//! The flow opens the login page, hands control to a person to clear any
//! bot challenge, then fills and submits the form with human-paced typing.
//! The result is classified by where the browser lands afterwards.

use std::fmt;
use std::time::Duration;

use tracing::{info, instrument, warn};

use leetscribe_browser::{Browser, Checkpoint, HumanTyping, Locator};
use leetscribe_shared::{LeetscribeError, Result, SiteCredentials};

use crate::profile::{PASSWORD_INPUT, SIGN_IN_BUTTON, SiteProfile, USERNAME_INPUT};

/// Prompt shown while the login page waits for a person.
pub const CHALLENGE_PROMPT: &str = "Solve any CAPTCHA in the browser and then press Enter here...";

// ---------------------------------------------------------------------------
// AuthOutcome
// ---------------------------------------------------------------------------

/// How a login attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The browser left the login page.
    Authenticated,
    /// The browser is still on a login URL after submitting.
    Rejected { url: String },
    /// The form could not be filled or submitted.
    Incomplete { reason: String },
}

impl AuthOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => f.write_str("logged in"),
            Self::Rejected { url } => write!(f, "still on login page ({url})"),
            Self::Incomplete { reason } => write!(f, "login incomplete: {reason}"),
        }
    }
}

/// Classify the URL the browser settled on after submitting the form.
pub fn classify_landing(url: &str) -> AuthOutcome {
    if url.to_lowercase().contains("login") {
        AuthOutcome::Rejected {
            url: url.to_string(),
        }
    } else {
        AuthOutcome::Authenticated
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Timing of the login form interaction.
#[derive(Debug, Clone, Copy)]
pub struct LoginPacing {
    pub typing: HumanTyping,
    /// Pause between submitting and reading the landing URL.
    pub settle: Duration,
}

impl LoginPacing {
    pub fn new(typing: HumanTyping, settle: Duration) -> Self {
        Self { typing, settle }
    }

    /// No typing delay, no settle pause.
    pub fn immediate() -> Self {
        Self::new(HumanTyping::instant(), Duration::ZERO)
    }
}

/// Log in to the site.
///
/// Missing credentials and missing form elements are reported as
/// [`AuthOutcome::Incomplete`]; navigation and checkpoint failures are errors.
#[instrument(skip_all, fields(login_url = %profile.login_url()))]
pub async fn bootstrap<B, C>(
    browser: &B,
    profile: &SiteProfile,
    credentials: Option<&SiteCredentials>,
    checkpoint: &C,
    pacing: &LoginPacing,
) -> Result<AuthOutcome>
where
    B: Browser,
    C: Checkpoint,
{
    let Some(credentials) = credentials else {
        warn!("site credentials are not set; skipping login form");
        return Ok(AuthOutcome::Incomplete {
            reason: "site credentials are not set".into(),
        });
    };

    info!("navigating to login page");
    browser.goto(&profile.login_url()).await?;

    checkpoint.wait(CHALLENGE_PROMPT).await?;

    match submit_form(browser, credentials, &pacing.typing).await {
        Ok(()) => {}
        Err(LeetscribeError::ElementNotFound { locator }) => {
            warn!(%locator, "login form element missing");
            return Ok(AuthOutcome::Incomplete {
                reason: format!("could not locate {locator}"),
            });
        }
        Err(e) => return Err(e),
    }

    if !pacing.settle.is_zero() {
        tokio::time::sleep(pacing.settle).await;
    }

    let landed = browser.current_url().await?;
    let outcome = classify_landing(&landed);
    match &outcome {
        AuthOutcome::Authenticated => info!(url = %landed, "logged in"),
        other => warn!(%other, "login not confirmed; CAPTCHA or credentials issue"),
    }
    Ok(outcome)
}

async fn submit_form<B: Browser>(
    browser: &B,
    credentials: &SiteCredentials,
    typing: &HumanTyping,
) -> Result<()> {
    let username = browser.find(&Locator::css(USERNAME_INPUT)).await?;
    typing
        .type_into(browser, &username, &credentials.username)
        .await?;
    info!("entered username");

    let password = browser.find(&Locator::css(PASSWORD_INPUT)).await?;
    typing
        .type_into(browser, &password, &credentials.password)
        .await?;
    info!("entered password");

    let sign_in = browser.find(&Locator::css(SIGN_IN_BUTTON)).await?;
    browser.script_click(&sign_in).await?;
    info!("clicked sign-in button");
    Ok(())
}
