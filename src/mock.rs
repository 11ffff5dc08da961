//! Scripted stand-in for the browser engine.
//!
//! Used by integration tests and, via `GRIDSHOT_MOCK_BROWSER`, by the
//! binary itself so end-to-end runs work without Node or Playwright
//! installed. Screenshots are written as real PNGs so the WebP re-encode
//! step still runs against actual image data.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbaImage;
use serde_json::Value;

use crate::engine::{
    BrowserEngine, BrowsingContext, ContextOptions, EngineLauncher, Page, SelectorOutcome,
};
use crate::error::{Result, ShotError};
use crate::viewport::Viewport;

/// Environment variable the binary checks to swap in the mock engine.
pub const MOCK_BROWSER_ENV: &str = "GRIDSHOT_MOCK_BROWSER";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MockBehavior {
    /// Every step succeeds; screenshots are solid-color PNGs.
    #[default]
    Succeed,
    /// Navigation fails the way a timed-out goto does.
    FailNavigation,
    /// The screenshot call "succeeds" but leaves an undecodable file, so
    /// the task dies between capture and cleanup.
    CorruptScreenshot,
}

/// Everything the mock observed, for assertions on sequencing and cleanup.
#[derive(Debug, Default)]
pub struct MockLog {
    pub contexts_opened: usize,
    pub contexts_closed: usize,
    pub user_agents: Vec<String>,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub evaluated: Vec<String>,
    pub screenshots: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct MockLauncher {
    behavior: MockBehavior,
    consent_present: bool,
    log: Arc<Mutex<MockLog>>,
}

impl MockLauncher {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            consent_present: false,
            log: Arc::default(),
        }
    }

    pub fn with_consent(mut self) -> Self {
        self.consent_present = true;
        self
    }

    /// Shared observation log; stays valid after the engine is gone.
    pub fn log(&self) -> Arc<Mutex<MockLog>> {
        self.log.clone()
    }

    /// Launcher selected by `GRIDSHOT_MOCK_BROWSER` (`ok` or `fail-nav`),
    /// if the variable is set to a recognized value.
    pub fn from_env() -> Option<Self> {
        match std::env::var(MOCK_BROWSER_ENV).ok()?.as_str() {
            "ok" => Some(Self::new(MockBehavior::Succeed)),
            "fail-nav" => Some(Self::new(MockBehavior::FailNavigation)),
            _ => None,
        }
    }
}

#[async_trait]
impl EngineLauncher for MockLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserEngine>> {
        Ok(Box::new(MockEngine {
            behavior: self.behavior,
            consent_present: self.consent_present,
            log: self.log.clone(),
        }))
    }
}

pub struct MockEngine {
    behavior: MockBehavior,
    consent_present: bool,
    log: Arc<Mutex<MockLog>>,
}

#[async_trait]
impl BrowserEngine for MockEngine {
    async fn new_context(&self, options: ContextOptions) -> Result<Box<dyn BrowsingContext>> {
        let mut log = self.log.lock().unwrap();
        log.contexts_opened += 1;
        log.user_agents.push(options.user_agent);
        Ok(Box::new(MockContext {
            behavior: self.behavior,
            consent_present: self.consent_present,
            viewport: options.viewport,
            log: self.log.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct MockContext {
    behavior: MockBehavior,
    consent_present: bool,
    viewport: Viewport,
    log: Arc<Mutex<MockLog>>,
}

#[async_trait]
impl BrowsingContext for MockContext {
    async fn new_page(&self) -> Result<Box<dyn Page>> {
        Ok(Box::new(MockPage {
            behavior: self.behavior,
            consent_present: self.consent_present,
            viewport: self.viewport,
            log: self.log.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.log.lock().unwrap().contexts_closed += 1;
        Ok(())
    }
}

struct MockPage {
    behavior: MockBehavior,
    consent_present: bool,
    viewport: Viewport,
    log: Arc<Mutex<MockLog>>,
}

#[async_trait]
impl Page for MockPage {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        if self.behavior == MockBehavior::FailNavigation {
            return Err(ShotError::browser(format!(
                "Timeout 30000ms exceeded.\n=========================== logs ===========================\nnavigating to \"{url}\", waiting until \"networkidle\""
            )));
        }
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        _selector: &str,
        _timeout: Duration,
    ) -> Result<SelectorOutcome> {
        Ok(if self.consent_present {
            SelectorOutcome::Found
        } else {
            SelectorOutcome::NotFound
        })
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.log.lock().unwrap().clicks.push(selector.to_string());
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.log
            .lock()
            .unwrap()
            .evaluated
            .push(expression.to_string());
        Ok(Value::Bool(true))
    }

    async fn wait_for_network_idle(&self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }

    async fn screenshot_full_page(&self, path: &Path, _timeout: Duration) -> Result<()> {
        self.log.lock().unwrap().screenshots.push(path.to_path_buf());
        if self.behavior == MockBehavior::CorruptScreenshot {
            std::fs::write(path, b"not a png")?;
            return Ok(());
        }
        let image = RgbaImage::from_pixel(
            self.viewport.width,
            self.viewport.height,
            image::Rgba([230, 230, 250, 255]),
        );
        image
            .save(path)
            .map_err(|e| ShotError::browser(format!("mock screenshot failed: {e}")))?;
        Ok(())
    }
}
