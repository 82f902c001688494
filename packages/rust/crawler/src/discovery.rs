//! Listing walk.
//!
//! Reads problem anchors from each listing page, following the "Next"
//! pagination control until it disappears or the page budget runs out.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};
use url::Url;

use leetscribe_browser::{Browser, wait_for_elements};
use leetscribe_shared::{Result, ScrapeConfig, WorkItem};

use crate::profile::SiteProfile;

/// Drop repeated work items, keeping the first occurrence of each.
pub fn dedup_work_items(items: impl IntoIterator<Item = WorkItem>) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Collect work items from up to `config.max_pages` listing pages.
///
/// Only the initial navigation can fail; an empty page or a missing "Next"
/// control ends the walk with whatever was found.
#[instrument(skip_all, fields(max_pages = config.max_pages))]
pub async fn discover<B: Browser>(
    browser: &B,
    profile: &SiteProfile,
    config: &ScrapeConfig,
) -> Result<Vec<WorkItem>> {
    let mut found: Vec<WorkItem> = Vec::new();
    if config.max_pages == 0 {
        return Ok(found);
    }

    info!(url = %profile.listing_url(), "navigating to problems page");
    browser.goto(&profile.listing_url()).await?;

    for page in 1..=config.max_pages {
        settle(config).await;

        let page_items = scan_page(browser, config).await;
        if page_items.is_empty() {
            warn!(page, "no problems found on this page; the selector may have changed");
            break;
        }
        info!(page, count = page_items.len(), "collected problems");
        found.extend(page_items);

        if let Some(limit) = config.limit {
            if dedup_work_items(found.iter().cloned()).len() >= limit {
                debug!(limit, "item limit reached; not paginating further");
                break;
            }
        }

        if page == config.max_pages || !advance(browser).await {
            break;
        }
    }

    let mut items = dedup_work_items(found);
    if let Some(limit) = config.limit {
        items.truncate(limit);
    }
    info!(total = items.len(), "discovery finished");
    Ok(items)
}

async fn settle(config: &ScrapeConfig) {
    if !config.settle_delay.is_zero() {
        tokio::time::sleep(config.settle_delay).await;
    }
}

/// Read every problem anchor on the current page.
async fn scan_page<B: Browser>(browser: &B, config: &ScrapeConfig) -> Vec<WorkItem> {
    let locator = SiteProfile::problem_anchors();
    let anchors = match wait_for_elements(browser, &locator, config.content_timeout).await {
        Ok(anchors) => anchors,
        Err(e) => {
            debug!(error = %e, "problem anchors never appeared");
            return Vec::new();
        }
    };

    let base = match browser.current_url().await {
        Ok(url) => Url::parse(&url).ok(),
        Err(e) => {
            debug!(error = %e, "could not read current URL");
            None
        }
    };

    let mut items = Vec::with_capacity(anchors.len());
    for anchor in &anchors {
        let title = match browser.text(anchor).await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "skipping unreadable anchor");
                continue;
            }
        };
        let href = match browser.attr(anchor, "href").await {
            Ok(Some(href)) => href,
            Ok(None) => continue,
            Err(e) => {
                debug!(error = %e, "skipping anchor without readable href");
                continue;
            }
        };

        let url = resolve(base.as_ref(), href.trim());
        if let Some(item) = WorkItem::new(title, url) {
            debug!(title = %item.title, url = %item.url, "found problem");
            items.push(item);
        }
    }
    items
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    base.and_then(|base| base.join(href).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| href.to_string())
}

/// Click "Next". Returns whether a new page should be read.
async fn advance<B: Browser>(browser: &B) -> bool {
    let next = match browser.find(&SiteProfile::next_control()).await {
        Ok(next) => next,
        Err(_) => {
            info!("no more pages or 'Next' button not found");
            return false;
        }
    };
    match browser.click(&next).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "could not click 'Next'; stopping pagination");
            false
        }
    }
}
