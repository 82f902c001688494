//! Bounded poll-until-present waits.
//!
//! Pages render their content after the load event fires, so reads are
//! preceded by polling for the elements they need. Polling starts at 100ms,
//! doubles each attempt and caps at 1s; the total wait never exceeds the
//! caller's timeout.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use leetscribe_shared::{LeetscribeError, Result};

use crate::{Browser, Locator};

const INITIAL_POLL: Duration = Duration::from_millis(100);
const MAX_POLL: Duration = Duration::from_secs(1);

/// Wait until at least one element matches `locator`, returning all matches.
///
/// Lookup errors while polling (the document is often mid-render) count as
/// "not yet". Gives up with [`LeetscribeError::Timeout`].
pub async fn wait_for_elements<B: Browser>(
    browser: &B,
    locator: &Locator,
    timeout: Duration,
) -> Result<Vec<B::Element>> {
    let start = Instant::now();
    let mut poll = INITIAL_POLL;

    loop {
        match browser.find_all(locator).await {
            Ok(found) if !found.is_empty() => {
                debug!(
                    %locator,
                    count = found.len(),
                    waited_ms = start.elapsed().as_millis(),
                    "elements present"
                );
                return Ok(found);
            }
            Ok(_) => trace!(%locator, "no match yet"),
            Err(e) => trace!(%locator, error = %e, "lookup failed while polling"),
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(LeetscribeError::Timeout {
                what: locator.to_string(),
                waited_ms: elapsed.as_millis(),
            });
        }

        tokio::time::sleep(poll.min(timeout - elapsed)).await;
        poll = (poll * 2).min(MAX_POLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticBrowser;

    fn browser() -> StaticBrowser {
        StaticBrowser::new().with_page(
            "https://leetcode.com/",
            r#"<div class="relative solution"><pre>x</pre></div>"#,
        )
    }

    #[tokio::test]
    async fn returns_immediately_when_present() {
        let b = browser();
        b.goto("https://leetcode.com/").await.unwrap();
        let found = wait_for_elements(&b, &Locator::css("div.solution"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn times_out_when_absent() {
        let b = browser();
        b.goto("https://leetcode.com/").await.unwrap();
        let err = wait_for_elements(&b, &Locator::css("table"), Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("table"));
    }

    #[tokio::test]
    async fn zero_timeout_checks_once() {
        let b = browser();
        b.goto("https://leetcode.com/").await.unwrap();
        assert!(wait_for_elements(&b, &Locator::css("p"), Duration::ZERO).await.is_err());
    }
}
