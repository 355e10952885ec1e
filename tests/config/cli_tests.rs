use crate::common::{create_temp_dir, IsolatedEnv};
use alertr::cli::Cli;
use alertr::config::{FileConfig, Settings};
use clap::Parser;
use serial_test::serial;
use std::fs;
use std::time::Duration;

#[test]
#[serial]
fn test_env_vars_fill_unset_flags() {
    let env = IsolatedEnv::new();
    env.set("SLACK_WEBHOOK_URL", "https://hooks.example/env");
    env.set("ENDPOINTS", "https://a/,https://b/");
    env.set("TEST_TIMEOUT", "45s");
    env.set("MENTION", "@here");

    let cli = Cli::try_parse_from(["alertr"]).unwrap();

    assert_eq!(cli.webhook.as_deref(), Some("https://hooks.example/env"));
    assert_eq!(cli.mention.as_deref(), Some("@here"));
    assert!(!cli.check);

    let settings = Settings::resolve(&cli, &FileConfig::default()).unwrap();
    assert_eq!(settings.targets.len(), 2);
    assert_eq!(settings.test_timeout, Duration::from_secs(45));
}

#[test]
#[serial]
fn test_flag_overrides_env() {
    let env = IsolatedEnv::new();
    env.set("SLACK_CHANNEL", "#env");
    env.set("TEST_VIA", "10.0.0.1:1080");

    let cli = Cli::try_parse_from([
        "alertr",
        "--channel",
        "#flag",
        "--test-via",
        "socks5h://127.0.0.1:9050",
        "--check",
    ])
    .unwrap();

    assert_eq!(cli.channel.as_deref(), Some("#flag"));
    assert_eq!(cli.test_via.as_deref(), Some("socks5h://127.0.0.1:9050"));
    assert!(cli.check);
}

#[test]
#[serial]
fn test_config_path_from_env_is_loaded() {
    let env = IsolatedEnv::new();
    let dir = create_temp_dir();
    let path = dir.path().join("alertr.toml");
    fs::write(
        &path,
        "webhook = \"https://hooks.example/file\"\nendpoints = \"https://a/\"\nchannel = \"#file\"\n",
    )
    .unwrap();
    env.set("ALERTR_CONFIG", path.to_str().unwrap());
    env.set("SLACK_CHANNEL", "#env");

    let cli = Cli::try_parse_from(["alertr"]).unwrap();
    let settings = Settings::from_cli(&cli).unwrap();

    assert_eq!(settings.webhook_url, "https://hooks.example/file");
    assert_eq!(settings.channel, "#env");
}

#[test]
#[serial]
fn test_missing_default_config_is_not_an_error() {
    let env = IsolatedEnv::new();
    let home = create_temp_dir();
    env.set_temp_home(home.path());

    assert_eq!(FileConfig::discover(None).unwrap(), FileConfig::default());
}
