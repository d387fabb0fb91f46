//! Persisted record shapes.
//!
//! Field order is the serialized order, so unchanged input yields
//! byte-identical files across runs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::constants::COMBINED_FILE_NAME;

/// One post flattened with its topic's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub topic_id: u64,
    pub topic_title: String,
    pub category_id: Option<u64>,
    pub tags: Vec<String>,
    pub post_id: u64,
    pub post_number: u64,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
    pub reply_to_post_number: Option<u64>,
    pub is_reply: bool,
    pub reply_count: u64,
    pub like_count: u64,
    pub is_accepted_answer: bool,
    pub mentioned_users: Vec<String>,
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub topic_id: u64,
    pub title: String,
    pub slug: String,
    pub category_id: Option<u64>,
    pub tags: Vec<String>,
    pub created_at: String,
    /// Posts that survived normalization, not the upstream count.
    pub posts_count: usize,
    pub views: u64,
    pub like_count: u64,
    pub url: String,
}

/// A processed topic, as written to its per-topic file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedTopic {
    pub topic_metadata: TopicMetadata,
    pub posts: Vec<NormalizedPost>,
}

/// Run-level metadata written once at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub scrape_metadata: ScrapeMetadata,
    pub files_created: FilesCreated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeMetadata {
    pub scraped_at: String,
    pub date_range: DateRangeRecord,
    pub total_topics: usize,
    pub total_posts: usize,
    pub category_id: u64,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeRecord {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesCreated {
    pub combined_posts: String,
    pub individual_topics: Vec<String>,
}

impl RunSummary {
    #[must_use]
    pub fn new(
        config: &Config,
        scraped_at: DateTime<Utc>,
        topic_files: Vec<String>,
        total_posts: usize,
    ) -> Self {
        Self {
            scrape_metadata: ScrapeMetadata {
                scraped_at: scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                date_range: DateRangeRecord {
                    from: iso(config.date_range.from),
                    to: iso(config.date_range.to),
                },
                total_topics: topic_files.len(),
                total_posts,
                category_id: config.category_id,
                base_url: config.base_url.clone(),
            },
            files_created: FilesCreated {
                combined_posts: COMBINED_FILE_NAME.to_string(),
                individual_topics: topic_files,
            },
        }
    }
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_run_summary_shape() {
        let config = Config::for_base_url("https://forum.example.com");
        let at = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        let summary = RunSummary::new(
            &config,
            at,
            vec!["topic_1.json".to_string(), "topic_2.json".to_string()],
            9,
        );

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["scrape_metadata"]["scraped_at"], "2025-05-01T12:00:00.000Z");
        assert_eq!(json["scrape_metadata"]["date_range"]["from"], "2025-01-01T00:00:00Z");
        assert_eq!(json["scrape_metadata"]["date_range"]["to"], "2025-04-14T00:00:00Z");
        assert_eq!(json["scrape_metadata"]["total_topics"], 2);
        assert_eq!(json["scrape_metadata"]["total_posts"], 9);
        assert_eq!(json["scrape_metadata"]["category_id"], 34);
        assert_eq!(json["scrape_metadata"]["base_url"], "https://forum.example.com");
        assert_eq!(json["files_created"]["combined_posts"], "discourse_posts.json");
        assert_eq!(
            json["files_created"]["individual_topics"],
            serde_json::json!(["topic_1.json", "topic_2.json"])
        );
    }
}
