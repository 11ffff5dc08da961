mod cli;
mod settings;

use std::process::ExitCode;

use gridshot_lib::{
    run_batch, BatchOptions, CaptureConfig, EngineOptions, MockLauncher, PlaywrightLauncher,
    ShotError,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    let args = cli::parse();

    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    run(&raw_args, args).await
}

async fn run(raw_args: &[String], args: cli::Cli) -> ExitCode {
    let config = match CaptureConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => return fatal(err),
    };

    let flags = settings::CaptureFlagSources::from_args(raw_args);
    let capture = settings::resolve_capture_options(
        args.nav_timeout,
        args.consent_timeout,
        args.settle_timeout,
        args.screenshot_timeout,
        args.quality,
        config.capture.as_ref(),
        &flags,
    );
    let options = BatchOptions {
        output_root: args.out_dir.clone(),
        capture,
    };

    let report = if let Some(mock) = MockLauncher::from_env() {
        run_batch(&mock, &config.url_list, &config.device_sizes, &options).await
    } else {
        let launcher = PlaywrightLauncher::new(EngineOptions {
            node_command: args.node_command.clone(),
            headless: !args.headed,
            ..EngineOptions::default()
        });
        run_batch(&launcher, &config.url_list, &config.device_sizes, &options).await
    };

    let report = match report {
        Ok(report) => report,
        Err(err) => return fatal(err),
    };

    // Partial failure is reported, not fatal: the run still exits zero.
    println!(
        "Captured {} of {} ({} failed) -> {}",
        report.summary.succeeded,
        report.summary.total,
        report.summary.failed,
        report.run_dir.display()
    );
    ExitCode::SUCCESS
}

fn fatal(err: ShotError) -> ExitCode {
    eprintln!("error: {err}");
    if let Some(hint) = err.remediation() {
        eprintln!("hint: {hint}");
    }
    ExitCode::FAILURE
}
