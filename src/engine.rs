//! The browser automation capability, as traits.
//!
//! Capture tasks talk to the browser only through these traits: one shared
//! [`BrowserEngine`] per run spawns an isolated [`BrowsingContext`] per
//! task, and each context owns its [`Page`]. The production implementation
//! lives in [`crate::playwright`]; tests substitute [`crate::mock`].

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::viewport::Viewport;

/// Options for opening an isolated browsing context.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub viewport: Viewport,
    pub user_agent: String,
}

/// Outcome of a bounded wait for an optional element.
///
/// `NotFound` is a value, not an error: a missing consent banner is the
/// common case and must not surface as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOutcome {
    Found,
    NotFound,
}

impl SelectorOutcome {
    pub fn is_found(self) -> bool {
        matches!(self, SelectorOutcome::Found)
    }
}

/// One shared browser process for a whole run.
///
/// The engine is only used to spawn contexts; it must tolerate concurrent
/// `new_context` calls from interleaved capture tasks.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn new_context(&self, options: ContextOptions) -> Result<Box<dyn BrowsingContext>>;

    /// Shut the shared browser down. Best-effort; called once per run.
    async fn close(&self) -> Result<()>;
}

/// An isolated cookie/storage/viewport sandbox owned by exactly one task.
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn Page>>;

    async fn close(&self) -> Result<()>;
}

/// A page bound to one context.
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate and wait for network quiescence, bounded by `timeout`.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Wait up to `timeout` for a visible element matching `selector`.
    /// Expiry of the bound yields `NotFound`, never an error.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<SelectorOutcome>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// Evaluate a script expression; a returned promise is awaited.
    async fn evaluate(&self, expression: &str) -> Result<serde_json::Value>;

    /// Wait for network quiescence. `None` waits without a bound.
    async fn wait_for_network_idle(&self, timeout: Option<Duration>) -> Result<()>;

    /// Capture a full-page raster screenshot to `path`.
    async fn screenshot_full_page(&self, path: &Path, timeout: Duration) -> Result<()>;
}

/// Launches the run's single shared engine.
///
/// The orchestrator validates inputs and creates the run directory before
/// calling this, so a launcher implementation must not have side effects at
/// construction time.
#[async_trait]
pub trait EngineLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>>;
}
