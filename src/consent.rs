//! Cookie-consent handling and page settling.
//!
//! Runs after navigation has already reached network quiescence: dismiss a
//! consent banner when one is present, and only then walk the page to the
//! bottom so content that is lazy-loaded behind the banner gets fetched,
//! then wait for the network to go quiet again.

use std::time::Duration;

use tracing::debug;

use crate::engine::{Page, SelectorOutcome};
use crate::error::Result;

/// Clickable "Accept All"-style consent controls, most common labels first.
pub const CONSENT_SELECTOR: &str = r#"button:has-text("Accept all"), button:has-text("Accept All"), button:has-text("I agree"), [id*="onetrust-accept"]"#;

/// Incremental scroll to the bottom of the page, then back to the top.
///
/// Fixed step and interval; the scroll height is re-read every tick so
/// content that grows while scrolling is still traversed to its real end.
pub const AUTO_SCROLL_SCRIPT: &str = r#"
(() => new Promise((resolve) => {
  const step = 400;
  const pause = 120;
  let travelled = 0;
  const timer = setInterval(() => {
    window.scrollBy(0, step);
    travelled += step;
    if (travelled >= document.body.scrollHeight) {
      clearInterval(timer);
      window.scrollTo(0, 0);
      resolve(true);
    }
  }, pause);
}))()
"#;

pub const DEFAULT_CONSENT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SettleOptions {
    /// Bound on the wait for a consent control to appear.
    pub consent_timeout: Duration,
    /// Bound on the final network-quiescence wait; `None` waits unbounded.
    pub settle_timeout: Option<Duration>,
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self {
            consent_timeout: DEFAULT_CONSENT_TIMEOUT,
            settle_timeout: Some(DEFAULT_SETTLE_TIMEOUT),
        }
    }
}

/// Dismiss a consent prompt if one shows up, scroll lazy content into
/// existence when it does, and wait for the network to settle.
///
/// Returns whether a consent control was found and clicked. Absence of the
/// control within the bound is the normal case on most pages and is not an
/// error; a failure of the final quiescence wait is, and propagates to the
/// caller as a task-level failure.
pub async fn settle_page(page: &dyn Page, options: &SettleOptions) -> Result<bool> {
    let consent_handled = match page
        .wait_for_selector(CONSENT_SELECTOR, options.consent_timeout)
        .await?
    {
        SelectorOutcome::Found => {
            page.click(CONSENT_SELECTOR).await?;
            page.evaluate(AUTO_SCROLL_SCRIPT).await?;
            true
        }
        SelectorOutcome::NotFound => {
            debug!("no consent control appeared; skipping scroll");
            false
        }
    };

    page.wait_for_network_idle(options.settle_timeout).await?;
    Ok(consent_handled)
}
