//! Output naming: run directories and per-capture artifact paths.
//!
//! One run writes into `<root>/<YYYY-MM-DD_HHMM>/`; within it every
//! (URL, device) pair owns the stem `<urlSlug>_<deviceName>_<width>`, so
//! concurrent tasks never contend for a path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::device::DeviceProfile;
use crate::error::Result;

/// Derive a filename-safe slug from a URL: the scheme is stripped and
/// every non-alphanumeric character becomes an underscore.
pub fn url_slug(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The collision-free stem shared by a capture's intermediate and final
/// artifact: `<slug>_<deviceName>_<width>`.
pub fn artifact_stem(url: &str, device: &DeviceProfile) -> String {
    format!(
        "{}_{}_{}",
        url_slug(url),
        device.name,
        device.viewport.width
    )
}

/// Run directory name at minute resolution.
pub fn run_dir_name(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d_%H%M").to_string()
}

/// Create the run-scoped output directory under `root`.
///
/// Called by the orchestrator only after input validation has passed; a
/// second run within the same minute reuses the same directory, which is
/// expected rather than an error.
pub fn init_run_dir(root: &Path, now: DateTime<Local>) -> Result<PathBuf> {
    let dir = root.join(run_dir_name(now));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
