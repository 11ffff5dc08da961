//! End-to-end batch behavior over the scripted mock engine.

use gridshot_lib::{
    run_batch, BatchOptions, DeviceProfile, MockBehavior, MockLauncher, BatchReport,
    DESKTOP_USER_AGENT, MOBILE_USER_AGENT, TABLET_USER_AGENT,
};
use tempfile::TempDir;

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|u| u.to_string()).collect()
}

async fn run(
    launcher: &MockLauncher,
    urls: &[String],
    devices: &[DeviceProfile],
    out_root: &TempDir,
) -> BatchReport {
    let options = BatchOptions {
        output_root: out_root.path().to_path_buf(),
        ..BatchOptions::default()
    };
    run_batch(launcher, urls, devices, &options)
        .await
        .expect("batch run")
}

#[tokio::test]
async fn produces_one_outcome_per_url_device_pair() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::Succeed);
    let urls = urls(&["https://a.test", "https://b.test", "https://c.test"]);
    let devices = vec![
        DeviceProfile::new("mobile", 375, 812),
        DeviceProfile::new("desktop", 1280, 800),
    ];

    let report = run(&launcher, &urls, &devices, &out).await;

    assert_eq!(report.outcomes.len(), 6);
    assert_eq!(report.summary.total, 6);
    assert_eq!(report.summary.succeeded, 6);
    assert_eq!(report.summary.failed, 0);
    assert_eq!(
        report.summary.succeeded + report.summary.failed,
        report.summary.total
    );
}

#[tokio::test]
async fn all_failures_still_settle_the_whole_batch() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::FailNavigation);
    let urls = urls(&["https://a.test", "https://b.test"]);
    let devices = vec![
        DeviceProfile::new("mobile", 375, 812),
        DeviceProfile::new("desktop", 1280, 800),
    ];

    let report = run(&launcher, &urls, &devices, &out).await;

    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.failed, 4);
    assert_eq!(report.summary.succeeded, 0);
    for outcome in &report.outcomes {
        assert!(!outcome.is_success());
        let error = outcome.error.as_deref().expect("failure carries a message");
        assert!(
            !error.contains('\n'),
            "only the first line may surface: {error:?}"
        );
        assert!(error.contains("Timeout 30000ms exceeded"));
    }
}

#[tokio::test]
async fn success_writes_webp_and_removes_intermediate_raster() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::Succeed);
    let urls = urls(&["https://a.test"]);
    let devices = vec![DeviceProfile::new("desktop", 1280, 800)];

    let report = run(&launcher, &urls, &devices, &out).await;

    assert_eq!(report.summary.succeeded, 1);
    let artifact = report.run_dir.join("a_test_desktop_1280.webp");
    assert!(artifact.exists(), "missing artifact {artifact:?}");
    assert!(
        !report.run_dir.join("a_test_desktop_1280.png").exists(),
        "intermediate raster must be deleted after conversion"
    );

    let decoded = image::open(&artifact).expect("decode webp");
    assert_eq!(
        image::GenericImageView::dimensions(&decoded),
        (1280, 800),
        "artifact keeps the device viewport width/height"
    );
}

#[tokio::test]
async fn failed_navigation_reports_url_and_device_and_writes_nothing() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::FailNavigation);
    let urls = urls(&["https://a.test"]);
    let devices = vec![DeviceProfile::new("desktop", 1280, 800)];

    let report = run(&launcher, &urls, &devices, &out).await;

    assert_eq!(report.summary.failed, 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.url, "https://a.test");
    assert_eq!(outcome.device_name, "desktop");

    let entries: Vec<_> = std::fs::read_dir(&report.run_dir)
        .expect("run dir exists")
        .collect();
    assert!(entries.is_empty(), "no artifacts for a failed navigation");
}

#[tokio::test]
async fn consent_click_triggers_exactly_one_scroll() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::Succeed).with_consent();
    let urls = urls(&["https://a.test"]);
    let devices = vec![DeviceProfile::new("desktop", 1280, 800)];

    run(&launcher, &urls, &devices, &out).await;

    let log = launcher.log();
    let log = log.lock().unwrap();
    assert_eq!(log.clicks.len(), 1);
    assert_eq!(log.evaluated.len(), 1, "scroll runs exactly once");
    assert!(log.evaluated[0].contains("scrollBy"));
}

#[tokio::test]
async fn scroll_never_runs_without_a_consent_banner() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::Succeed);
    let urls = urls(&["https://a.test", "https://b.test"]);
    let devices = vec![DeviceProfile::new("desktop", 1280, 800)];

    run(&launcher, &urls, &devices, &out).await;

    let log = launcher.log();
    let log = log.lock().unwrap();
    assert!(log.clicks.is_empty());
    assert!(log.evaluated.is_empty());
}

#[tokio::test]
async fn every_context_is_closed_even_when_all_tasks_fail() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::FailNavigation);
    let urls = urls(&["https://a.test", "https://b.test"]);
    let devices = vec![
        DeviceProfile::new("mobile", 375, 812),
        DeviceProfile::new("desktop", 1280, 800),
    ];

    run(&launcher, &urls, &devices, &out).await;

    let log = launcher.log();
    let log = log.lock().unwrap();
    assert_eq!(log.contexts_opened, 4);
    assert_eq!(log.contexts_closed, 4);
}

#[tokio::test]
async fn failure_after_capture_leaves_the_raster_behind() {
    // Orphaned intermediate files are accepted, not cleaned up.
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::CorruptScreenshot);
    let urls = urls(&["https://a.test"]);
    let devices = vec![DeviceProfile::new("desktop", 1280, 800)];

    let report = run(&launcher, &urls, &devices, &out).await;

    assert_eq!(report.summary.failed, 1);
    assert!(
        report.run_dir.join("a_test_desktop_1280.png").exists(),
        "orphan raster remains when the task dies before cleanup"
    );
    assert!(!report.run_dir.join("a_test_desktop_1280.webp").exists());
}

#[tokio::test]
async fn each_device_gets_its_resolved_user_agent() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::Succeed);
    let urls = urls(&["https://a.test"]);
    let mut pinned = DeviceProfile::new("kiosk", 1920, 1080);
    pinned.user_agent = Some("X".to_string());
    let devices = vec![
        DeviceProfile::new("mobile", 375, 812),
        DeviceProfile::new("tablet", 800, 1280),
        DeviceProfile::new("desktop", 1440, 900),
        pinned,
    ];

    run(&launcher, &urls, &devices, &out).await;

    let log = launcher.log();
    let log = log.lock().unwrap();
    assert_eq!(log.user_agents.len(), 4);
    assert!(log.user_agents.contains(&MOBILE_USER_AGENT.to_string()));
    assert!(log.user_agents.contains(&TABLET_USER_AGENT.to_string()));
    assert!(log.user_agents.contains(&DESKTOP_USER_AGENT.to_string()));
    assert!(log.user_agents.contains(&"X".to_string()));
}

#[tokio::test]
async fn outcomes_keep_cross_product_order() {
    let out = TempDir::new().expect("tempdir");
    let launcher = MockLauncher::new(MockBehavior::Succeed);
    let urls = urls(&["https://a.test", "https://b.test"]);
    let devices = vec![
        DeviceProfile::new("mobile", 375, 812),
        DeviceProfile::new("desktop", 1280, 800),
    ];

    let report = run(&launcher, &urls, &devices, &out).await;

    let keys: Vec<_> = report
        .outcomes
        .iter()
        .map(|o| (o.url.as_str(), o.device_name.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("https://a.test", "mobile"),
            ("https://a.test", "desktop"),
            ("https://b.test", "mobile"),
            ("https://b.test", "desktop"),
        ]
    );
}
