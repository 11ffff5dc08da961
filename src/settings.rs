use std::time::Duration;

use gridshot_lib::{CaptureOptions, CaptureSettings};

/// Tracks which CLI flags were explicitly provided vs. defaulted.
#[derive(Debug, Default)]
pub struct CaptureFlagSources {
    pub nav_timeout: bool,
    pub consent_timeout: bool,
    pub settle_timeout: bool,
    pub screenshot_timeout: bool,
    pub quality: bool,
}

impl CaptureFlagSources {
    pub fn from_args(args: &[String]) -> Self {
        Self {
            nav_timeout: flag_present(args, "--nav-timeout"),
            consent_timeout: flag_present(args, "--consent-timeout"),
            settle_timeout: flag_present(args, "--settle-timeout"),
            screenshot_timeout: flag_present(args, "--screenshot-timeout"),
            quality: flag_present(args, "--quality"),
        }
    }
}

/// Checks if a flag was present in the command-line arguments.
pub fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter()
        .any(|arg| arg == flag || arg.starts_with(&format!("{flag}=")))
}

/// Merge CLI arguments with the config file's `capture` block, preferring
/// CLI values only when their flags were explicitly passed. A settle bound
/// of zero seconds (from either source) means "wait without a bound".
pub fn resolve_capture_options(
    cli_nav_timeout: u64,
    cli_consent_timeout: u64,
    cli_settle_timeout: u64,
    cli_screenshot_timeout: u64,
    cli_quality: u8,
    config: Option<&CaptureSettings>,
    flags: &CaptureFlagSources,
) -> CaptureOptions {
    let defaults = CaptureOptions::default();

    let nav_timeout = if flags.nav_timeout {
        Duration::from_secs(cli_nav_timeout)
    } else {
        config
            .and_then(|c| c.nav_timeout)
            .unwrap_or(defaults.nav_timeout)
    };

    let consent_timeout = if flags.consent_timeout {
        Duration::from_secs(cli_consent_timeout)
    } else {
        config
            .and_then(|c| c.consent_timeout)
            .unwrap_or(defaults.consent_timeout)
    };

    let settle_timeout = if flags.settle_timeout {
        settle_bound(Duration::from_secs(cli_settle_timeout))
    } else if let Some(bound) = config.and_then(|c| c.settle_timeout) {
        settle_bound(bound)
    } else {
        defaults.settle_timeout
    };

    let screenshot_timeout = if flags.screenshot_timeout {
        Duration::from_secs(cli_screenshot_timeout)
    } else {
        config
            .and_then(|c| c.screenshot_timeout)
            .unwrap_or(defaults.screenshot_timeout)
    };

    let quality = if flags.quality {
        cli_quality
    } else {
        config.and_then(|c| c.quality).unwrap_or(defaults.quality)
    };

    CaptureOptions {
        nav_timeout,
        consent_timeout,
        settle_timeout,
        screenshot_timeout,
        quality,
    }
}

fn settle_bound(bound: Duration) -> Option<Duration> {
    if bound.is_zero() {
        None
    } else {
        Some(bound)
    }
}
