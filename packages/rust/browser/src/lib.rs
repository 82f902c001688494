//! Browser automation surface for Leetscribe.
//!
//! This crate provides:
//! - [`Browser`]: the element-level operations the scraper consumes
//! - [`Locator`]: CSS selectors, optionally narrowed by visible text
//! - [`WebDriverBrowser`]: production backend over a WebDriver server (`thirtyfour`)
//! - `StaticBrowser`: offline backend over registered HTML documents (`scraper`),
//!   built for tests and behind the `test-util` feature elsewhere
//! - [`wait_for_elements`], [`HumanTyping`], [`Checkpoint`]: pacing and
//!   synchronization capabilities layered on any backend

pub mod checkpoint;
#[cfg(any(test, feature = "test-util"))]
pub mod static_page;
pub mod typing;
pub mod wait;
pub mod webdriver;

use std::fmt;

use leetscribe_shared::{LeetscribeError, Result};

pub use checkpoint::{AutoResume, Checkpoint, StdinCheckpoint};
#[cfg(any(test, feature = "test-util"))]
pub use static_page::{StaticBrowser, StaticElement, StaticProbe};
pub use typing::HumanTyping;
pub use wait::wait_for_elements;
pub use webdriver::WebDriverBrowser;

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

/// How a [`Locator::Text`] compares an element's visible text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Exact,
    Contains,
    ContainsIgnoreCase,
}

/// Identifies elements on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Plain CSS selector.
    Css(String),
    /// CSS candidates filtered by their whitespace-normalized visible text.
    Text {
        css: String,
        text: String,
        mode: TextMatch,
    },
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self::Css(css.into())
    }

    pub fn text_exact(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            css: css.into(),
            text: text.into(),
            mode: TextMatch::Exact,
        }
    }

    pub fn text_contains(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            css: css.into(),
            text: text.into(),
            mode: TextMatch::Contains,
        }
    }

    pub fn text_contains_ignore_case(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            css: css.into(),
            text: text.into(),
            mode: TextMatch::ContainsIgnoreCase,
        }
    }

    /// The CSS selector that yields candidate elements.
    pub fn selector(&self) -> &str {
        match self {
            Self::Css(css) | Self::Text { css, .. } => css,
        }
    }

    /// Whether an element with this visible text satisfies the locator.
    pub fn accepts_text(&self, visible: &str) -> bool {
        match self {
            Self::Css(_) => true,
            Self::Text { text, mode, .. } => {
                let visible = normalize_text(visible);
                let wanted = normalize_text(text);
                match mode {
                    TextMatch::Exact => visible == wanted,
                    TextMatch::Contains => visible.contains(&wanted),
                    TextMatch::ContainsIgnoreCase => {
                        visible.to_lowercase().contains(&wanted.to_lowercase())
                    }
                }
            }
        }
    }

    /// Whether candidates need their text read before matching.
    pub fn filters_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => f.write_str(css),
            Self::Text { css, text, mode } => {
                let op = match mode {
                    TextMatch::Exact => "=",
                    TextMatch::Contains => "~=",
                    TextMatch::ContainsIgnoreCase => "~=i",
                };
                write!(f, "{css}[text{op}{text:?}]")
            }
        }
    }
}

/// Collapse runs of whitespace and trim, the way rendered text reads.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Browser trait
// ---------------------------------------------------------------------------

/// Element-level browser operations, one call at a time.
///
/// Implementations are driven by a single logical thread of control; no
/// method is ever awaited concurrently with another.
#[allow(async_fn_in_trait)]
pub trait Browser {
    /// Handle to an element on the current page.
    type Element: Clone;

    /// Navigate the session to `url`.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Address of the current document.
    async fn current_url(&self) -> Result<String>;

    /// Every element on the page matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>>;

    /// Descendants of `parent` matching `locator`, in document order.
    async fn find_within(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Vec<Self::Element>>;

    /// Visible text of an element.
    async fn text(&self, element: &Self::Element) -> Result<String>;

    /// Attribute value, `None` when absent.
    async fn attr(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    /// Native click.
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Click dispatched from page script, bypassing overlay interception.
    async fn script_click(&self, element: &Self::Element) -> Result<()>;

    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;

    /// Send key events to an element.
    async fn send_keys(&self, element: &Self::Element, keys: &str) -> Result<()>;

    /// Run a script in the page context, discarding its return value.
    async fn execute(&self, script: &str) -> Result<()>;

    /// End the session.
    async fn close(self) -> Result<()>
    where
        Self: Sized;

    /// First element matching `locator`, or [`LeetscribeError::ElementNotFound`].
    async fn find(&self, locator: &Locator) -> Result<Self::Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LeetscribeError::not_found(locator.to_string()))
    }

    /// First descendant of `parent` matching `locator`, if any.
    async fn find_first_within(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Option<Self::Element>> {
        Ok(self.find_within(parent, locator).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  Show\n   more \t"), "Show more");
    }

    #[test]
    fn text_locator_modes() {
        let exact = Locator::text_exact("button", "C++");
        assert!(exact.accepts_text(" C++ "));
        assert!(!exact.accepts_text("C++ (42)"));

        let contains = Locator::text_contains("button", "Next");
        assert!(contains.accepts_text("Next page"));
        assert!(!contains.accepts_text("next page"));

        let loose = Locator::text_contains_ignore_case("button", "Show more");
        assert!(loose.accepts_text("SHOW   MORE"));

        assert!(Locator::css("pre").accepts_text("anything"));
    }

    #[test]
    fn locator_display() {
        assert_eq!(Locator::css("div.solution").to_string(), "div.solution");
        assert_eq!(
            Locator::text_contains("button", "Next").to_string(),
            r#"button[text~="Next"]"#
        );
    }
}
