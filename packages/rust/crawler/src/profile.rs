//! Where things live on the target site.

use leetscribe_browser::Locator;
use leetscribe_shared::{SiteConfig, WorkItem};

/// Username input on the login form.
pub const USERNAME_INPUT: &str = "#id_login";
/// Password input on the login form.
pub const PASSWORD_INPUT: &str = "#id_password";
/// Sign-in button on the login form.
pub const SIGN_IN_BUTTON: &str = "#signin_btn";
/// Anchors on listing pages that point at problems.
pub const PROBLEM_ANCHORS: &str = "a[href*='/problems/']";
/// Pagination controls on listing pages.
pub const PAGINATION_CONTROLS: &str = "button";
/// Label of the pagination control that advances a page.
pub const NEXT_LABEL: &str = "Next";
/// One solution card on a solutions page.
pub const SOLUTION_CONTAINER: &str = "div.relative.solution";
/// Code region inside a solution card.
pub const CODE_REGION: &str = "pre";
/// Clickable elements that may carry a category filter label.
pub const FILTER_CONTROLS: &str = "button, span, div[role='button'], a";
/// Clickable elements that may expand collapsed content.
pub const EXPAND_CONTROLS: &str = "button, span, a";
/// Label of the expansion controls.
pub const EXPAND_LABEL: &str = "Show more";

/// Resolved site locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    base_url: String,
    login_path: String,
    listing_path: String,
    solutions_suffix: String,
}

impl SiteProfile {
    pub fn new(
        base_url: impl Into<String>,
        login_path: impl Into<String>,
        listing_path: impl Into<String>,
        solutions_suffix: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login_path: login_path.into(),
            listing_path: listing_path.into(),
            solutions_suffix: solutions_suffix.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_path)
    }

    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url, self.listing_path)
    }

    /// Solutions tab of a problem: its URL without trailing `/`, then the suffix.
    pub fn solutions_url(&self, item: &WorkItem) -> String {
        format!("{}{}", item.url.trim_end_matches('/'), self.solutions_suffix)
    }

    pub fn problem_anchors() -> Locator {
        Locator::css(PROBLEM_ANCHORS)
    }

    pub fn next_control() -> Locator {
        Locator::text_contains(PAGINATION_CONTROLS, NEXT_LABEL)
    }

    pub fn solution_containers() -> Locator {
        Locator::css(SOLUTION_CONTAINER)
    }

    pub fn filter_control(category: &str) -> Locator {
        Locator::text_exact(FILTER_CONTROLS, category)
    }

    pub fn expand_controls() -> Locator {
        Locator::text_contains_ignore_case(EXPAND_CONTROLS, EXPAND_LABEL)
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::from(&SiteConfig::default())
    }
}

impl From<&SiteConfig> for SiteProfile {
    fn from(config: &SiteConfig) -> Self {
        Self::new(
            config.base_url.as_str(),
            config.login_path.as_str(),
            config.listing_path.as_str(),
            config.solutions_suffix.as_str(),
        )
    }
}
