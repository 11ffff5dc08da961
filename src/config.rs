//! Capture config: the JSON file naming target URLs and device sizes.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::DeviceProfile;
use crate::error::{Result, ShotError};

/// Top-level capture configuration.
///
/// ```json
/// {
///   "urlList": ["https://example.com"],
///   "deviceSizes": [{"name": "desktop", "width": 1280, "height": 800}],
///   "capture": {"navTimeout": "45s", "quality": 80}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaptureConfig {
    pub url_list: Vec<String>,
    pub device_sizes: Vec<DeviceProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureSettings>,
}

/// Optional per-run capture overrides; CLI flags take precedence when
/// explicitly passed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaptureSettings {
    #[serde(default, with = "humantime_serde::option")]
    pub nav_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde::option")]
    pub consent_timeout: Option<Duration>,
    /// Bound on the final network-quiescence wait. Omit to use the default;
    /// set `"0s"` to wait without a bound.
    #[serde(default, with = "humantime_serde::option")]
    pub settle_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde::option")]
    pub screenshot_timeout: Option<Duration>,
    /// WebP quality, 1-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

impl CaptureConfig {
    /// Load and validate a config file. Any failure here is fatal to the
    /// run and happens before a browser or output directory exists.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            ShotError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: CaptureConfig = serde_json::from_str(&data).map_err(|e| {
            ShotError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.url_list.is_empty() {
            return Err(ShotError::config("urlList must not be empty"));
        }
        if self.device_sizes.is_empty() {
            return Err(ShotError::config("deviceSizes must not be empty"));
        }
        for url in &self.url_list {
            let parsed = url::Url::parse(url)
                .map_err(|e| ShotError::Config(format!("Invalid URL {:?}: {}", url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ShotError::Config(format!(
                    "Invalid URL {:?}: expected http or https",
                    url
                )));
            }
        }
        let mut seen = HashSet::new();
        for device in &self.device_sizes {
            device.validate()?;
            if !seen.insert(device.name.as_str()) {
                return Err(ShotError::Config(format!(
                    "duplicate device name {:?}; names key output files and must be unique",
                    device.name
                )));
            }
        }
        if let Some(capture) = &self.capture {
            if let Some(quality) = capture.quality {
                if quality == 0 || quality > 100 {
                    return Err(ShotError::Config(format!(
                        "quality must be between 1 and 100, got {}",
                        quality
                    )));
                }
            }
        }
        Ok(())
    }
}
