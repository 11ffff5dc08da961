//! Device profiles and user-agent resolution.
//!
//! A device profile names a viewport and optionally pins a user agent.
//! When no user agent is set, one is derived from the viewport width so
//! that phone-sized viewports get served mobile markup.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShotError};
use crate::viewport::Viewport;

/// Default user agent for widths up to [`MOBILE_MAX_WIDTH`].
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";

/// Default user agent for widths between the mobile and tablet breakpoints.
pub const TABLET_USER_AGENT: &str = "Mozilla/5.0 (iPad; CPU OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1";

/// Default user agent for widths above the tablet breakpoint.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Widths up to and including this are treated as mobile.
pub const MOBILE_MAX_WIDTH: u32 = 600;

/// Widths above the mobile breakpoint up to and including this are tablets.
pub const TABLET_MAX_WIDTH: u32 = 1024;

/// A named viewport with an optional explicit user agent.
///
/// Loaded from the `deviceSizes` list of the capture config. The name is
/// part of the output filename and must be unique within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub name: String,
    #[serde(flatten)]
    pub viewport: Viewport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            viewport: Viewport { width, height },
            user_agent: None,
        }
    }

    /// Fail-fast validation: name, width and height must all be present
    /// and nonzero before any capture starts.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ShotError::config("device entry is missing a name"));
        }
        if self.viewport.width == 0 {
            return Err(ShotError::config(format!(
                "device {:?} has zero width",
                self.name
            )));
        }
        if self.viewport.height == 0 {
            return Err(ShotError::config(format!(
                "device {:?} has zero height",
                self.name
            )));
        }
        Ok(())
    }
}

/// Resolves the effective user agent for a device.
///
/// An explicit `userAgent` always wins; otherwise the viewport width picks
/// one of the built-in defaults. Both breakpoints are inclusive on their
/// upper bound: 600 is still mobile, 1024 is still tablet.
pub fn resolve_user_agent(device: &DeviceProfile) -> &str {
    if let Some(ua) = device.user_agent.as_deref() {
        return ua;
    }
    match device.viewport.width {
        w if w <= MOBILE_MAX_WIDTH => MOBILE_USER_AGENT,
        w if w <= TABLET_MAX_WIDTH => TABLET_USER_AGENT,
        _ => DESKTOP_USER_AGENT,
    }
}
