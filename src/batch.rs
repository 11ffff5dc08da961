//! The batch orchestrator: cross product, concurrent dispatch, settle-all
//! join, summary.

use std::path::PathBuf;

use chrono::Local;
use futures::future::join_all;
use tracing::{info, warn};

use crate::artifact::init_run_dir;
use crate::capture::{capture_one, CaptureOptions, TaskOutcome};
use crate::device::DeviceProfile;
use crate::engine::EngineLauncher;
use crate::error::{Result, ShotError};

/// Aggregate counts over one run. `succeeded + failed == total` always.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn tally(outcomes: &[TaskOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        Self {
            total: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }
}

/// Everything a caller needs to report on a finished run.
#[derive(Debug)]
pub struct BatchReport {
    pub run_dir: PathBuf,
    pub outcomes: Vec<TaskOutcome>,
    pub summary: Summary,
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Root under which the timestamped run directory is created.
    pub output_root: PathBuf,
    pub capture: CaptureOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("screenshots"),
            capture: CaptureOptions::default(),
        }
    }
}

/// Run the full batch: one capture task per (URL, device) pair, all
/// dispatched at once against a single shared browser.
///
/// Tasks interleave cooperatively at their await points; there is no
/// concurrency cap and no cross-task ordering. One task failing never
/// cancels or blocks a sibling — `capture_one` is infallible, so the join
/// always collects exactly `urls.len() * devices.len()` outcomes.
pub async fn run_batch(
    launcher: &dyn EngineLauncher,
    urls: &[String],
    devices: &[DeviceProfile],
    options: &BatchOptions,
) -> Result<BatchReport> {
    // Fail fast before any directory or browser side effect.
    if urls.is_empty() {
        return Err(ShotError::config("urlList must not be empty"));
    }
    if devices.is_empty() {
        return Err(ShotError::config("deviceSizes must not be empty"));
    }

    let run_dir = init_run_dir(&options.output_root, Local::now())?;
    let engine = launcher.launch().await?;

    info!(
        urls = urls.len(),
        devices = devices.len(),
        run_dir = %run_dir.display(),
        "dispatching capture tasks"
    );

    let tasks: Vec<_> = urls
        .iter()
        .flat_map(|url| devices.iter().map(move |device| (url, device)))
        .map(|(url, device)| capture_one(engine.as_ref(), url, device, &run_dir, &options.capture))
        .collect();
    let outcomes = join_all(tasks).await;

    // Guaranteed shutdown; a close failure must not disturb the outcomes
    // already collected.
    if let Err(err) = engine.close().await {
        warn!("failed to close browser: {err}");
    }

    let summary = Summary::tally(&outcomes);
    Ok(BatchReport {
        run_dir,
        outcomes,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::TaskStatus;
    use crate::engine::BrowserEngine;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn outcome(status: TaskStatus) -> TaskOutcome {
        TaskOutcome {
            status,
            url: "https://a.test".into(),
            device_name: "desktop".into(),
            error: None,
        }
    }

    #[test]
    fn tally_counts_add_up() {
        let outcomes = vec![
            outcome(TaskStatus::Success),
            outcome(TaskStatus::Failure),
            outcome(TaskStatus::Failure),
        ];
        let summary = Summary::tally(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded + summary.failed, summary.total);
    }

    #[test]
    fn tally_of_empty_is_zeroes() {
        assert_eq!(Summary::tally(&[]), Summary::default());
    }

    struct TrackingLauncher {
        launched: AtomicBool,
    }

    #[async_trait]
    impl EngineLauncher for TrackingLauncher {
        async fn launch(&self) -> crate::error::Result<Box<dyn BrowserEngine>> {
            self.launched.store(true, Ordering::SeqCst);
            Err(ShotError::browser("launch should not be reached"))
        }
    }

    #[tokio::test]
    async fn empty_inputs_abort_before_the_browser_is_touched() {
        let launcher = TrackingLauncher {
            launched: AtomicBool::new(false),
        };
        let options = BatchOptions::default();

        let no_urls = run_batch(&launcher, &[], &[DeviceProfile::new("d", 1, 1)], &options).await;
        assert!(no_urls.is_err());

        let no_devices =
            run_batch(&launcher, &["https://a.test".to_string()], &[], &options).await;
        assert!(no_devices.is_err());

        assert!(
            !launcher.launched.load(Ordering::SeqCst),
            "validation failures must not launch the browser"
        );
    }
}
