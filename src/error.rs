use thiserror::Error;
use url::ParseError;

use crate::encode::EncodeError;

#[derive(Debug, Error)]
pub enum ShotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ParseError),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

impl ShotError {
    pub fn config(message: impl Into<String>) -> Self {
        ShotError::Config(message.into())
    }

    pub fn browser(message: impl Into<String>) -> Self {
        ShotError::Browser(message.into())
    }

    /// Actionable hint printed under a fatal error message, when one applies.
    pub fn remediation(&self) -> Option<&'static str> {
        let message = match self {
            ShotError::Config(msg) | ShotError::Browser(msg) => msg,
            ShotError::Io(_) => return Some("Check file paths and permissions."),
            _ => return None,
        };
        let lower = message.to_ascii_lowercase();
        if lower.contains("playwright npm package is missing") {
            Some("Install Playwright (e.g., `npm install playwright` and `npx playwright install chromium`).")
        } else if lower.contains("chromium executable") {
            Some("Run `npx playwright install chromium` to download the browser.")
        } else if lower.contains("not found on path") || lower.contains("node command") {
            Some("Install Node.js and ensure the node binary is on PATH.")
        } else if lower.contains("timeout") {
            Some("Try increasing --nav-timeout/--settle-timeout or ensure the page loads without blocking.")
        } else if matches!(self, ShotError::Config(_)) {
            Some("Check the config file: urlList and deviceSizes must be non-empty, every device needs a name and nonzero width/height.")
        } else {
            None
        }
    }
}

impl From<EncodeError> for ShotError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Decode(e) => ShotError::Image(e),
            EncodeError::NotFound(path) => {
                ShotError::Config(format!("Screenshot file not found: {}", path))
            }
            EncodeError::Write(e) => ShotError::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShotError>;
