//! Environment-driven configuration tests.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use discourse_kb_scraper::config::{Config, ConfigError};
use serial_test::serial;

const VARS: &[&str] = &[
    "DISCOURSE_BASE_URL",
    "CATEGORY_SLUG",
    "CATEGORY_ID",
    "DATE_FROM",
    "DATE_TO",
    "OUTPUT_DIR",
    "SESSION_STATE_PATH",
    "REQUEST_TIMEOUT_SECS",
    "PROBE_TIMEOUT_SECS",
    "CHROME_PATH",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults() {
    clear_env();
    let config = Config::from_env().unwrap();

    assert_eq!(config.base_url, "https://discourse.onlinedegree.iitm.ac.in");
    assert_eq!(config.category_slug, "courses/tds-kb");
    assert_eq!(config.category_id, 34);
    assert_eq!(
        config.date_range.from,
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        config.date_range.to,
        Utc.with_ymd_and_hms(2025, 4, 14, 0, 0, 0).unwrap()
    );
    assert_eq!(config.output_dir.to_str(), Some("downloaded_threads"));
    assert_eq!(config.session_state_path.to_str(), Some("auth.json"));
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.probe_timeout, Duration::from_secs(10));
    assert!(config.chrome_path.is_none());
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_overrides() {
    clear_env();
    std::env::set_var("DISCOURSE_BASE_URL", "https://forum.example.com/");
    std::env::set_var("CATEGORY_SLUG", "/support/faq/");
    std::env::set_var("CATEGORY_ID", "7");
    std::env::set_var("DATE_FROM", "2024-06-01");
    std::env::set_var("DATE_TO", "2024-06-30T23:59:59Z");
    std::env::set_var("CHROME_PATH", "/usr/bin/chromium");

    let config = Config::from_env().unwrap();
    clear_env();

    assert_eq!(config.base_url, "https://forum.example.com");
    assert_eq!(
        config.category_json_url(),
        "https://forum.example.com/c/support/faq/7.json"
    );
    assert_eq!(
        config.date_range.to,
        Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap()
    );
    assert_eq!(config.chrome_path.as_deref(), Some("/usr/bin/chromium"));
}

#[test]
#[serial]
fn test_invalid_values() {
    clear_env();
    std::env::set_var("CATEGORY_ID", "abc");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseInt { .. })
    ));

    clear_env();
    std::env::set_var("DATE_FROM", "01/01/2025");
    assert!(matches!(
        Config::from_env(),
        Err(ConfigError::ParseDate { .. })
    ));

    clear_env();
    std::env::set_var("DATE_FROM", "2025-05-01");
    std::env::set_var("DATE_TO", "2025-04-01");
    let config = Config::from_env().unwrap();
    assert!(config.validate().is_err());

    clear_env();
}
