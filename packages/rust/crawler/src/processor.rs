//! Per-item extraction from a problem's solutions page.
//!
//! Every failure here degrades instead of propagating: a page that never
//! renders yields no blocks, a broken block yields a placeholder, and the
//! optional filter/expand actions only log when they miss.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use leetscribe_browser::{Browser, Locator, wait_for_elements};
use leetscribe_shared::{ExtractedBlock, LeetscribeError, Result, ScrapeConfig, WorkItem};

use crate::profile::{CODE_REGION, SiteProfile};

/// Scrolls the window down by one viewport.
const SCROLL_SCRIPT: &str = "window.scrollBy(0, window.innerHeight);";

/// Failure of an optional page action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("no control labelled '{label}'")]
    NotFound { label: String },

    #[error("could not interact with '{label}': {source}")]
    Interaction {
        label: String,
        #[source]
        source: LeetscribeError,
    },
}

/// Outcome of clicking every expansion control on a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandReport {
    pub expanded: usize,
    pub failed: usize,
}

/// Narrow the solutions list to `category` (e.g. "C++").
pub async fn apply_filter<B: Browser>(
    browser: &B,
    category: &str,
    pause: Duration,
) -> std::result::Result<(), ActionError> {
    let interaction = |source| ActionError::Interaction {
        label: category.to_string(),
        source,
    };

    let control = match browser.find(&SiteProfile::filter_control(category)).await {
        Ok(control) => control,
        Err(LeetscribeError::ElementNotFound { .. }) => {
            return Err(ActionError::NotFound {
                label: category.to_string(),
            });
        }
        Err(e) => return Err(interaction(e)),
    };

    browser.scroll_into_view(&control).await.map_err(interaction)?;
    browser.click(&control).await.map_err(interaction)?;
    info!(category, "applied solution filter");

    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }
    Ok(())
}

/// Click every "Show more" control once. Each click succeeds or fails on its own.
///
/// A label nested in its control (`<button><span>Show more</span></button>`)
/// matches twice, so only the innermost match is clicked and the click bubbles
/// up to the wrapper. A second click would collapse the section again.
pub async fn expand_sections<B: Browser>(browser: &B) -> ExpandReport {
    let mut report = ExpandReport::default();
    let locator = SiteProfile::expand_controls();

    let controls = match browser.find_all(&locator).await {
        Ok(controls) => controls,
        Err(e) => {
            warn!(error = %e, "could not look up 'Show more' controls");
            return report;
        }
    };

    for control in &controls {
        // A control that cannot be searched still gets its click attempt.
        if let Ok(Some(_)) = browser.find_first_within(control, &locator).await {
            debug!("skipping wrapper of a nested 'Show more' label");
            continue;
        }
        match browser.click(control).await {
            Ok(()) => report.expanded += 1,
            Err(e) => {
                debug!(error = %e, "'Show more' click failed");
                report.failed += 1;
            }
        }
    }
    report
}

/// Scroll the window `passes` times, pausing after each.
pub async fn scroll_page<B: Browser>(browser: &B, passes: u32, pause: Duration) {
    for pass in 0..passes {
        if let Err(e) = browser.execute(SCROLL_SCRIPT).await {
            warn!(pass, error = %e, "scrolling failed");
            return;
        }
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
    if passes > 0 {
        debug!(passes, "scrolled through the solutions page");
    }
}

/// Extract every solution block for one work item.
///
/// Returns an empty list when the solutions page cannot be opened or no
/// container appears within `config.content_timeout`.
#[instrument(skip_all, fields(title = %item.title))]
pub async fn extract_blocks<B: Browser>(
    browser: &B,
    profile: &SiteProfile,
    item: &WorkItem,
    config: &ScrapeConfig,
) -> Vec<ExtractedBlock> {
    let url = profile.solutions_url(item);
    info!(%url, "navigating to solutions");
    if let Err(e) = browser.goto(&url).await {
        warn!(error = %e, "could not open solutions page");
        return Vec::new();
    }

    let containers = SiteProfile::solution_containers();
    if let Err(e) = wait_for_elements(browser, &containers, config.content_timeout).await {
        warn!(error = %e, "no solutions found");
        return Vec::new();
    }
    debug!("solutions are visible");

    if let Some(category) = &config.filter_category {
        if let Err(e) = apply_filter(browser, category, config.filter_pause).await {
            warn!(error = %e, "filter not applied; continuing unfiltered");
        }
    }

    if config.expand_sections {
        let report = expand_sections(browser).await;
        debug!(expanded = report.expanded, failed = report.failed, "expanded sections");
    }

    scroll_page(browser, config.scroll_passes, config.block_delay).await;

    // Filtering and expansion re-render the list, so look the containers up again.
    let found = match browser.find_all(&containers).await {
        Ok(found) => found,
        Err(e) => {
            warn!(error = %e, "solutions disappeared after page actions");
            return Vec::new();
        }
    };
    info!(count = found.len(), "found solutions");

    let mut blocks = Vec::with_capacity(found.len());
    for (offset, container) in found.iter().enumerate() {
        let index = offset + 1;
        let block = match read_block(browser, container, config.block_delay).await {
            Ok(Some(text)) => ExtractedBlock::captured(index, text),
            Ok(None) => ExtractedBlock::no_content(index),
            Err(e) => {
                warn!(index, error = %e, "failed to extract solution");
                ExtractedBlock::failed(index, e)
            }
        };
        blocks.push(block);
    }
    blocks
}

/// Code text of one container, `None` when it has none.
///
/// The card is clicked to open it before the code is read. Cards that ignore
/// the click are still read as they are.
async fn read_block<B: Browser>(
    browser: &B,
    container: &B::Element,
    delay: Duration,
) -> Result<Option<String>> {
    browser.scroll_into_view(container).await?;
    if let Err(e) = browser.click(container).await {
        debug!(error = %e, "solution card did not take the click");
    }
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let Some(code) = browser
        .find_first_within(container, &Locator::css(CODE_REGION))
        .await?
    else {
        return Ok(None);
    };

    let text = browser.text(&code).await?;
    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use leetscribe_browser::StaticBrowser;
    use leetscribe_shared::{BlockStatus, NO_CONTENT_TEXT};

    const SOLUTIONS: &str = "https://leetcode.com/problems/two-sum/solutions/?tab=solutions";

    fn two_sum() -> WorkItem {
        WorkItem::new("Two Sum", "https://leetcode.com/problems/two-sum/").unwrap()
    }

    async fn extract(browser: &StaticBrowser) -> Vec<ExtractedBlock> {
        let config = ScrapeConfig::immediate();
        extract_blocks(browser, &SiteProfile::default(), &two_sum(), &config).await
    }

    fn solutions_page(cards: &str) -> String {
        format!(
            r#"<html><body>
                 <button>All</button><button>C++</button><button>Python</button>
                 {cards}
               </body></html>"#
        )
    }

    #[tokio::test]
    async fn extracts_blocks_in_document_order() {
        let browser = StaticBrowser::new().with_page(
            SOLUTIONS,
            solutions_page(
                r#"<div class="relative solution"><pre>  int a = 1;  </pre></div>
                   <div class="relative solution"><pre>int b = 2;</pre></div>"#,
            ),
        );

        let blocks = extract(&browser).await;

        assert_eq!(
            blocks,
            vec![
                ExtractedBlock::captured(1, "int a = 1;"),
                ExtractedBlock::captured(2, "int b = 2;"),
            ]
        );
    }

    #[tokio::test]
    async fn one_broken_block_does_not_sink_the_rest() {
        let browser = StaticBrowser::new()
            .with_page(
                SOLUTIONS,
                solutions_page(
                    r#"<div class="relative solution"><pre>first</pre></div>
                       <div class="relative solution detached"><pre>second</pre></div>
                       <div class="relative solution"><pre>third</pre></div>"#,
                ),
            )
            .with_broken("div.detached");

        let blocks = extract(&browser).await;

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].status, BlockStatus::Captured);
        assert_eq!(blocks[1].status, BlockStatus::Failed);
        assert_eq!(blocks[1].sequence_index, 2);
        assert!(blocks[1].raw_text.starts_with("Extraction failed:"));
        assert_eq!(blocks[2], ExtractedBlock::captured(3, "third"));
    }

    #[tokio::test]
    async fn container_without_code_is_no_content() {
        let browser = StaticBrowser::new().with_page(
            SOLUTIONS,
            solutions_page(
                r#"<div class="relative solution"><p>prose only</p></div>
                   <div class="relative solution"><pre>   </pre></div>"#,
            ),
        );

        let blocks = extract(&browser).await;

        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.status == BlockStatus::NoContent));
        assert_eq!(blocks[0].raw_text, NO_CONTENT_TEXT);
    }

    #[tokio::test]
    async fn timeout_yields_empty_list() {
        let browser = StaticBrowser::new().with_page(SOLUTIONS, "<p>Loading...</p>");
        let blocks = extract(&browser).await;
        assert!(blocks.is_empty());
    }

    #[tokio::test]
    async fn navigation_error_yields_empty_list() {
        let browser = StaticBrowser::new();
        let blocks = extract(&browser).await;
        assert!(blocks.is_empty());
    }

    #[tokio::test]
    async fn filter_matches_exact_label_only() {
        let browser = StaticBrowser::new().with_page(
            SOLUTIONS,
            solutions_page(r#"<button>C++ Tips</button>"#),
        );
        browser.goto(SOLUTIONS).await.unwrap();

        apply_filter(&browser, "C++", Duration::ZERO).await.unwrap();
        assert!(matches!(
            apply_filter(&browser, "Rust", Duration::ZERO).await,
            Err(ActionError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn filter_click_failure_is_an_interaction_error() {
        let browser = StaticBrowser::new()
            .with_page(SOLUTIONS, r#"<button class="covered">C++</button>"#)
            .with_broken("button.covered");
        browser.goto(SOLUTIONS).await.unwrap();

        let err = apply_filter(&browser, "C++", Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, ActionError::Interaction { .. }));
    }

    #[tokio::test]
    async fn nested_label_expands_its_section_once() {
        let browser = StaticBrowser::new().with_page(
            SOLUTIONS,
            r#"<div class="relative solution">
                 <button><span>Show more</span></button>
                 <pre>int a = 1;</pre>
               </div>"#,
        );
        browser.goto(SOLUTIONS).await.unwrap();

        let report = expand_sections(&browser).await;
        assert_eq!(report, ExpandReport { expanded: 1, failed: 0 });
    }

    #[tokio::test]
    async fn each_card_is_clicked_before_reading() {
        let browser = StaticBrowser::new().with_page(
            SOLUTIONS,
            solutions_page(
                r#"<div class="relative solution"><pre>first</pre></div>
                   <div class="relative solution"><pre>second</pre></div>"#,
            ),
        );
        let probe = browser.probe();

        let blocks = extract(&browser).await;

        assert_eq!(blocks.len(), 2);
        assert_eq!(probe.clicks(), 2);
        assert!(blocks.iter().all(|b| b.status == BlockStatus::Captured));
    }

    #[tokio::test]
    async fn expansion_counts_each_click() {
        let browser = StaticBrowser::new()
            .with_page(
                SOLUTIONS,
                r#"<button>Show more</button>
                   <span>SHOW MORE</span>
                   <button class="gone">show more</button>
                   <button>Show less</button>"#,
            )
            .with_broken("button.gone");
        browser.goto(SOLUTIONS).await.unwrap();

        let report = expand_sections(&browser).await;
        assert_eq!(report, ExpandReport { expanded: 2, failed: 1 });
    }

    #[tokio::test]
    async fn scroll_passes_run_the_scroll_script() {
        let browser = StaticBrowser::new();
        let probe = browser.probe();

        scroll_page(&browser, 3, Duration::ZERO).await;

        assert_eq!(probe.scripts(), vec![SCROLL_SCRIPT.to_string(); 3]);
    }
}
