//! The per-(URL, device) capture task.
//!
//! `capture_one` is the unit of work the orchestrator fans out. It owns
//! exactly one browsing context for its lifetime and never raises: every
//! failure is folded into a [`TaskOutcome`] so a bad page cannot take the
//! rest of the batch down with it.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::artifact::artifact_stem;
use crate::consent::{settle_page, SettleOptions, DEFAULT_CONSENT_TIMEOUT, DEFAULT_SETTLE_TIMEOUT};
use crate::device::{resolve_user_agent, DeviceProfile};
use crate::encode::{encode_webp, DEFAULT_WEBP_QUALITY};
use crate::engine::{BrowserEngine, BrowsingContext, ContextOptions};
use crate::error::Result;

pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(45);
pub const DEFAULT_SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Bound on navigation reaching network quiescence.
    pub nav_timeout: Duration,
    /// Bound on the wait for a consent control.
    pub consent_timeout: Duration,
    /// Bound on the post-settle quiescence wait; `None` waits unbounded.
    pub settle_timeout: Option<Duration>,
    /// Bound on the full-page screenshot.
    pub screenshot_timeout: Duration,
    /// WebP quality for the final artifact.
    pub quality: u8,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            nav_timeout: DEFAULT_NAVIGATION_TIMEOUT,
            consent_timeout: DEFAULT_CONSENT_TIMEOUT,
            settle_timeout: Some(DEFAULT_SETTLE_TIMEOUT),
            screenshot_timeout: DEFAULT_SCREENSHOT_TIMEOUT,
            quality: DEFAULT_WEBP_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Failure,
}

/// Terminal record of one capture task. Created exactly once, never
/// retried or mutated.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub status: TaskStatus,
    pub url: String,
    pub device_name: String,
    pub error: Option<String>,
}

impl TaskOutcome {
    fn success(url: &str, device: &DeviceProfile) -> Self {
        Self {
            status: TaskStatus::Success,
            url: url.to_string(),
            device_name: device.name.clone(),
            error: None,
        }
    }

    fn failure(url: &str, device: &DeviceProfile, message: String) -> Self {
        Self {
            status: TaskStatus::Failure,
            url: url.to_string(),
            device_name: device.name.clone(),
            error: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

/// Capture one URL on one device. Never raises; failures become outcomes.
pub async fn capture_one(
    engine: &dyn BrowserEngine,
    url: &str,
    device: &DeviceProfile,
    run_dir: &Path,
    options: &CaptureOptions,
) -> TaskOutcome {
    match capture_inner(engine, url, device, run_dir, options).await {
        Ok(()) => {
            debug!(url, device = %device.name, "capture succeeded");
            TaskOutcome::success(url, device)
        }
        Err(err) => {
            let message = first_line(&err.to_string());
            warn!(url, device = %device.name, "capture failed: {message}");
            TaskOutcome::failure(url, device, message)
        }
    }
}

async fn capture_inner(
    engine: &dyn BrowserEngine,
    url: &str,
    device: &DeviceProfile,
    run_dir: &Path,
    options: &CaptureOptions,
) -> Result<()> {
    let user_agent = resolve_user_agent(device).to_string();
    let context = engine
        .new_context(ContextOptions {
            viewport: device.viewport,
            user_agent,
        })
        .await?;

    let result = capture_in_context(context.as_ref(), url, device, run_dir, options).await;

    // The context closes on every exit path; a close failure must not
    // overwrite whatever happened inside it.
    if let Err(close_err) = context.close().await {
        warn!(url, device = %device.name, "failed to close context: {close_err}");
    }

    result
}

async fn capture_in_context(
    context: &dyn BrowsingContext,
    url: &str,
    device: &DeviceProfile,
    run_dir: &Path,
    options: &CaptureOptions,
) -> Result<()> {
    let page = context.new_page().await?;
    page.goto(url, options.nav_timeout).await?;

    settle_page(
        page.as_ref(),
        &SettleOptions {
            consent_timeout: options.consent_timeout,
            settle_timeout: options.settle_timeout,
        },
    )
    .await?;

    let stem = artifact_stem(url, device);
    let raster = run_dir.join(format!("{stem}.png"));
    page.screenshot_full_page(&raster, options.screenshot_timeout).await?;

    let artifact = raster.with_extension("webp");
    encode_webp(&raster, &artifact, options.quality)?;

    // A failure between screenshot and here leaves the raster behind;
    // orphans are accepted, not cleaned up.
    std::fs::remove_file(&raster)?;
    Ok(())
}

/// Only the first line of an error reaches the summary; Playwright
/// messages routinely trail multi-line call logs.
pub(crate) fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or(message).trim().to_string()
}
