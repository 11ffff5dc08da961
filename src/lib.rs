//! Gridshot Library
//!
//! Captures full-page screenshots of a list of URLs across a list of
//! device viewports, re-encodes them to WebP, and files them under a
//! timestamped run directory. One shared headless browser serves the whole
//! run; every (URL, device) pair gets its own isolated browsing context,
//! and a failing page only ever costs its own screenshot.
//!
//! # Module Overview
//!
//! - [`batch`] - batch orchestration: cross product, fan-out, summary
//! - [`capture`] - the per-(URL, device) capture task
//! - [`consent`] - cookie-consent dismissal and page settling
//! - [`device`] - device profiles and user-agent resolution
//! - [`engine`] - the browser capability as traits
//! - [`playwright`] - production engine over a Node.js Playwright driver
//! - [`mock`] - scripted engine for browserless runs and tests
//! - [`artifact`] - run directories and output naming
//! - [`encode`] - WebP re-encoding
//! - [`config`] - the JSON capture config
//!
//! # Example
//!
//! ```no_run
//! use gridshot_lib::{run_batch, BatchOptions, DeviceProfile, PlaywrightLauncher};
//!
//! # async fn example() -> gridshot_lib::Result<()> {
//! let launcher = PlaywrightLauncher::default();
//! let urls = vec!["https://example.com".to_string()];
//! let devices = vec![DeviceProfile::new("desktop", 1280, 800)];
//! let report = run_batch(&launcher, &urls, &devices, &BatchOptions::default()).await?;
//! println!("captured {} of {}", report.summary.succeeded, report.summary.total);
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod batch;
pub mod capture;
pub mod config;
pub mod consent;
pub mod device;
pub mod encode;
pub mod engine;
pub mod error;
pub mod mock;
pub mod playwright;
pub mod viewport;

pub use artifact::{artifact_stem, init_run_dir, run_dir_name, url_slug};
pub use batch::{run_batch, BatchOptions, BatchReport, Summary};
pub use capture::{
    capture_one, CaptureOptions, TaskOutcome, TaskStatus, DEFAULT_NAVIGATION_TIMEOUT,
    DEFAULT_SCREENSHOT_TIMEOUT,
};
pub use config::{CaptureConfig, CaptureSettings};
pub use consent::{
    settle_page, SettleOptions, AUTO_SCROLL_SCRIPT, CONSENT_SELECTOR, DEFAULT_CONSENT_TIMEOUT,
    DEFAULT_SETTLE_TIMEOUT,
};
pub use device::{
    resolve_user_agent, DeviceProfile, DESKTOP_USER_AGENT, MOBILE_USER_AGENT, TABLET_USER_AGENT,
};
pub use encode::{encode_webp, EncodeError, DEFAULT_WEBP_QUALITY};
pub use engine::{
    BrowserEngine, BrowsingContext, ContextOptions, EngineLauncher, Page, SelectorOutcome,
};
pub use error::{Result, ShotError};
pub use mock::{MockBehavior, MockLauncher, MOCK_BROWSER_ENV};
pub use playwright::{EngineOptions, PlaywrightEngine, PlaywrightLauncher};
pub use viewport::Viewport;
