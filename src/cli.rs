use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gridshot")]
#[command(
    version,
    about = "Capture full-page screenshots of every configured URL across every configured device viewport",
    long_about = "Gridshot\n\nReads a JSON config with a urlList and deviceSizes, captures every\nURL x device combination concurrently against one shared headless\nbrowser, converts each screenshot to WebP, and files the results under\na timestamped directory. Individual page failures are reported and\ncounted; they never abort the batch."
)]
pub struct Cli {
    /// Capture config file (JSON with urlList and deviceSizes)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    #[arg(
        long,
        default_value = "screenshots",
        value_name = "PATH",
        help = "Root directory for timestamped run output"
    )]
    pub out_dir: PathBuf,

    #[arg(
        long,
        default_value = "45",
        help = "Navigation timeout (seconds) per page"
    )]
    pub nav_timeout: u64,

    #[arg(
        long,
        default_value = "5",
        help = "Wait (seconds) for a cookie-consent control before assuming there is none"
    )]
    pub consent_timeout: u64,

    #[arg(
        long,
        default_value = "10",
        help = "Final network-quiescence wait (seconds); 0 waits without a bound"
    )]
    pub settle_timeout: u64,

    #[arg(
        long,
        default_value = "30",
        help = "Full-page screenshot timeout (seconds)"
    )]
    pub screenshot_timeout: u64,

    #[arg(
        long,
        default_value = "80",
        value_parser = clap::value_parser!(u8).range(1..=100),
        help = "WebP quality (1-100)"
    )]
    pub quality: u8,

    #[arg(long, help = "Run the browser with a visible window")]
    pub headed: bool,

    #[arg(
        long,
        default_value = "node",
        value_name = "CMD",
        help = "Node.js command used to drive Playwright"
    )]
    pub node_command: String,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::parse_from(["gridshot", "capture.json"]);
        assert_eq!(cli.config.to_str(), Some("capture.json"));
        assert_eq!(cli.out_dir.to_str(), Some("screenshots"));
        assert_eq!(cli.nav_timeout, 45);
        assert_eq!(cli.consent_timeout, 5);
        assert_eq!(cli.settle_timeout, 10);
        assert_eq!(cli.screenshot_timeout, 30);
        assert_eq!(cli.quality, 80);
        assert!(!cli.headed);
        assert_eq!(cli.node_command, "node");
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "gridshot",
            "sites.json",
            "--out-dir",
            "shots",
            "--nav-timeout",
            "60",
            "--consent-timeout",
            "3",
            "--settle-timeout",
            "0",
            "--screenshot-timeout",
            "20",
            "--quality",
            "65",
            "--headed",
            "--node-command",
            "nodejs",
            "-vv",
        ]);
        assert_eq!(cli.out_dir.to_str(), Some("shots"));
        assert_eq!(cli.nav_timeout, 60);
        assert_eq!(cli.consent_timeout, 3);
        assert_eq!(cli.settle_timeout, 0);
        assert_eq!(cli.screenshot_timeout, 20);
        assert_eq!(cli.quality, 65);
        assert!(cli.headed);
        assert_eq!(cli.node_command, "nodejs");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn quality_must_stay_in_range() {
        assert!(Cli::try_parse_from(["gridshot", "c.json", "--quality", "0"]).is_err());
        assert!(Cli::try_parse_from(["gridshot", "c.json", "--quality", "101"]).is_err());
    }

    #[test]
    fn config_argument_is_required() {
        assert!(Cli::try_parse_from(["gridshot"]).is_err());
    }
}
