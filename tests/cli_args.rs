// tests/cli_args.rs

use std::time::Duration;

use clap::Parser;
use sitevisor::cli::{parse_duration, CliArgs};
use sitevisor::config::model::{DEFAULT_MAX_RESTARTS, DEFAULT_RESTART_DELAY};

#[test]
fn durations_accept_common_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert_eq!(parse_duration("1500"), Ok(Duration::from_millis(1500)));
    assert_eq!(parse_duration(" 5 S "), Ok(Duration::from_secs(5)));
}

#[test]
fn durations_reject_garbage() {
    assert!(parse_duration("").is_err());
    assert!(parse_duration("s").is_err());
    assert!(parse_duration("3d").unwrap_err().contains("unsupported duration unit"));
}

#[test]
fn defaults_match_restart_policy() {
    let args = CliArgs::try_parse_from(["sitevisor", "--worker", "renderer"]).unwrap();

    assert_eq!(args.config, "sites.json");
    assert!(!args.dry_run);
    assert!(!args.no_console);

    let settings = args.supervisor_config();
    assert_eq!(settings.max_restarts, DEFAULT_MAX_RESTARTS);
    assert_eq!(settings.restart_delay, DEFAULT_RESTART_DELAY);
    assert_eq!(DEFAULT_RESTART_DELAY, Duration::from_millis(3000));
}

#[test]
fn worker_args_are_kept_in_order() {
    let args = CliArgs::try_parse_from([
        "sitevisor",
        "--worker",
        "node",
        "--worker-arg",
        "--experimental",
        "--worker-arg",
        "worker.js",
        "--max-restarts",
        "2",
        "--restart-delay",
        "500ms",
        "--no-console",
    ])
    .unwrap();

    let launcher = args.launcher().expect("worker given");
    assert_eq!(launcher.program, "node");
    assert_eq!(launcher.args, vec!["--experimental", "worker.js"]);

    let settings = args.supervisor_config();
    assert_eq!(settings.max_restarts, 2);
    assert_eq!(settings.restart_delay, Duration::from_millis(500));
    assert!(args.no_console);
}

#[test]
fn worker_is_required_unless_dry_run() {
    assert!(CliArgs::try_parse_from(["sitevisor"]).is_err());

    let args = CliArgs::try_parse_from(["sitevisor", "--dry-run", "--config", "x.json"]).unwrap();
    assert!(args.dry_run);
    assert!(args.launcher().is_none());
    assert_eq!(args.config, "x.json");
}
