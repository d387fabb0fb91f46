//! Shared constants used across the application.

/// User agent string sent with every forum request.
///
/// Matches a desktop Chromium build so the session cookies captured from the
/// interactive browser login are replayed from a consistent client identity.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_BASE_URL: &str = "https://discourse.onlinedegree.iitm.ac.in";
pub const DEFAULT_CATEGORY_SLUG: &str = "courses/tds-kb";
pub const DEFAULT_CATEGORY_ID: u64 = 34;
pub const DEFAULT_DATE_FROM: &str = "2025-01-01";
pub const DEFAULT_DATE_TO: &str = "2025-04-14";

/// Combined corpus of every emitted post.
pub const COMBINED_FILE_NAME: &str = "discourse_posts.json";

/// Run summary.
pub const SUMMARY_FILE_NAME: &str = "scrape_summary.json";

/// File name for a single topic's metadata and posts.
#[must_use]
pub fn topic_file_name(topic_id: u64) -> String {
    format!("topic_{topic_id}.json")
}
