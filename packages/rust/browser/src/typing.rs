//! Human-paced typing.
//!
//! Login forms on the target site watch keystroke timing, so credentials are
//! sent one character at a time with a randomized delay between keys. This
//! is the only place in the codebase that paces input.

use std::time::Duration;

use leetscribe_shared::{BrowserConfig, Result};

use crate::Browser;

/// Types text one character at a time with a jittered inter-key delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanTyping {
    min_ms: u64,
    max_ms: u64,
}

impl HumanTyping {
    /// Delay drawn uniformly from `[min_delay, max_delay]` after each key.
    /// Bounds are swapped if given in the wrong order.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        let (lo, hi) = (millis(min_delay), millis(max_delay));
        Self {
            min_ms: lo.min(hi),
            max_ms: lo.max(hi),
        }
    }

    /// No delay between keys.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn next_delay(&self) -> Duration {
        Duration::from_millis(fastrand::u64(self.min_ms..=self.max_ms))
    }

    /// Send `text` to `element` key by key.
    pub async fn type_into<B: Browser>(
        &self,
        browser: &B,
        element: &B::Element,
        text: &str,
    ) -> Result<()> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            browser.send_keys(element, ch.encode_utf8(&mut buf)).await?;
            let delay = self.next_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl From<&BrowserConfig> for HumanTyping {
    fn from(config: &BrowserConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_key_delay_ms),
            Duration::from_millis(config.max_key_delay_ms),
        )
    }
}
