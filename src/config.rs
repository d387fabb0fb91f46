use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_SLUG, DEFAULT_DATE_FROM,
    DEFAULT_DATE_TO,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as a date: {value}")]
    ParseDate { name: String, value: String },
}

/// Inclusive range of topic creation times to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    #[must_use]
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Inclusive on both bounds.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Scraper configuration loaded from environment variables.
///
/// Built once at startup and passed by reference into every stage; nothing
/// reads the environment after this point.
#[derive(Debug, Clone)]
pub struct Config {
    // Forum
    pub base_url: String,
    pub category_slug: String,
    pub category_id: u64,

    // Scope
    pub date_range: DateRange,

    // Storage
    pub output_dir: PathBuf,
    pub session_state_path: PathBuf,

    // Transport
    pub request_timeout: Duration,
    pub probe_timeout: Duration,

    // Browser (interactive login)
    pub chrome_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let from = parse_env_date("DATE_FROM", DEFAULT_DATE_FROM)?;
        let to = parse_env_date("DATE_TO", DEFAULT_DATE_TO)?;

        Ok(Self {
            // Forum
            base_url: env_or_default("DISCOURSE_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            category_slug: env_or_default("CATEGORY_SLUG", DEFAULT_CATEGORY_SLUG)
                .trim_matches('/')
                .to_string(),
            category_id: parse_env_u64("CATEGORY_ID", DEFAULT_CATEGORY_ID)?,

            // Scope
            date_range: DateRange::new(from, to),

            // Storage
            output_dir: PathBuf::from(env_or_default("OUTPUT_DIR", "downloaded_threads")),
            session_state_path: PathBuf::from(env_or_default("SESSION_STATE_PATH", "auth.json")),

            // Transport
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 30)?),
            probe_timeout: Duration::from_secs(parse_env_u64("PROBE_TIMEOUT_SECS", 10)?),

            // Browser
            chrome_path: optional_env("CHROME_PATH"),
        })
    }

    /// Configuration pointing at an arbitrary forum, with defaults for the rest.
    ///
    /// Ignores the environment; used to aim the crawler at a local mock forum.
    ///
    /// # Panics
    ///
    /// Panics if the built-in default dates fail to parse.
    #[doc(hidden)]
    #[must_use]
    pub fn for_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            category_slug: DEFAULT_CATEGORY_SLUG.to_string(),
            category_id: DEFAULT_CATEGORY_ID,
            date_range: DateRange::new(
                parse_date_value(DEFAULT_DATE_FROM).expect("Invalid default start date"),
                parse_date_value(DEFAULT_DATE_TO).expect("Invalid default end date"),
            ),
            output_dir: PathBuf::from("downloaded_threads"),
            session_state_path: PathBuf::from("auth.json"),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
            chrome_path: None,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.base_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => {
                return Err(ConfigError::InvalidValue {
                    name: "DISCOURSE_BASE_URL".to_string(),
                    message: format!("unsupported scheme '{}'", u.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    name: "DISCOURSE_BASE_URL".to_string(),
                    message: e.to_string(),
                });
            }
        }
        if self.category_slug.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "CATEGORY_SLUG".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.date_range.from > self.date_range.to {
            return Err(ConfigError::InvalidValue {
                name: "DATE_FROM".to_string(),
                message: format!(
                    "must not be after DATE_TO ({} > {})",
                    self.date_range.from, self.date_range.to
                ),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "REQUEST_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "PROBE_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Category listing endpoint, without a page parameter.
    #[must_use]
    pub fn category_json_url(&self) -> String {
        format!(
            "{}/c/{}/{}.json",
            self.base_url, self.category_slug, self.category_id
        )
    }

    #[must_use]
    pub fn category_page_url(&self, page: u32) -> String {
        format!("{}?page={page}", self.category_json_url())
    }

    /// Canonical topic URL, formed from slug and id.
    #[must_use]
    pub fn topic_url(&self, slug: &str, topic_id: u64) -> String {
        format!("{}/t/{slug}/{topic_id}", self.base_url)
    }

    #[must_use]
    pub fn topic_json_url(&self, slug: &str, topic_id: u64) -> String {
        format!("{}.json", self.topic_url(slug, topic_id))
    }

    #[must_use]
    pub fn post_url(&self, slug: &str, topic_id: u64, post_number: u64) -> String {
        format!("{}/{post_number}", self.topic_url(slug, topic_id))
    }

    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_date(name: &str, default: &str) -> Result<DateTime<Utc>, ConfigError> {
    let value = env_or_default(name, default);
    parse_date_value(&value).ok_or_else(|| ConfigError::ParseDate {
        name: name.to_string(),
        value,
    })
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
fn parse_date_value(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_value() {
        assert_eq!(
            parse_date_value("2025-01-01").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date_value("2025-04-14T12:30:00Z").unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 14, 12, 30, 0).unwrap()
        );
        assert_eq!(
            parse_date_value("2025-04-14T12:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 14, 10, 30, 0).unwrap()
        );
        assert!(parse_date_value("14/04/2025").is_none());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 4, 14, 0, 0, 0).unwrap();
        let range = DateRange::new(from, to);

        assert!(range.contains(from));
        assert!(range.contains(to));
        assert!(!range.contains(from - chrono::Duration::seconds(1)));
        assert!(!range.contains(to + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_for_base_url_uses_default_range() {
        let config = Config::for_base_url("http://127.0.0.1:8080");
        assert_eq!(config.date_range.from, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(config.date_range.to, Utc.with_ymd_and_hms(2025, 4, 14, 0, 0, 0).unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_urls() {
        let config = Config::for_base_url("https://forum.example.com/");
        assert_eq!(
            config.category_json_url(),
            "https://forum.example.com/c/courses/tds-kb/34.json"
        );
        assert_eq!(
            config.category_page_url(2),
            "https://forum.example.com/c/courses/tds-kb/34.json?page=2"
        );
        assert_eq!(
            config.topic_json_url("hello-world", 7),
            "https://forum.example.com/t/hello-world/7.json"
        );
        assert_eq!(
            config.post_url("hello-world", 7, 3),
            "https://forum.example.com/t/hello-world/7/3"
        );
        assert_eq!(config.login_url(), "https://forum.example.com/login");
    }

    #[test]
    fn test_validate() {
        let config = Config::for_base_url("https://forum.example.com");
        assert!(config.validate().is_ok());

        let bad_scheme = Config::for_base_url("ftp://forum.example.com");
        assert!(bad_scheme.validate().is_err());

        let mut inverted = Config::for_base_url("https://forum.example.com");
        std::mem::swap(&mut inverted.date_range.from, &mut inverted.date_range.to);
        assert!(inverted.validate().is_err());

        let zero_timeout = Config {
            request_timeout: Duration::ZERO,
            ..Config::for_base_url("https://forum.example.com")
        };
        assert!(zero_timeout.validate().is_err());
    }
}
