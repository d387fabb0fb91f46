//! Crawl-and-normalize pipeline.
//!
//! Lists every topic in the category, keeps those created within the
//! configured date range, normalizes each topic's posts and writes the
//! per-topic, combined and summary files. Everything runs sequentially.

pub mod dates;
pub mod lister;
pub mod processor;
pub mod records;
pub mod text;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::fetcher::ContentFetcher;
use crate::output::OutputWriter;

pub use dates::{in_range, parse_timestamp, select_in_range};
pub use lister::{list_topics, topic_pages};
pub use processor::{fetch_topic_detail, normalize_topic, process_topic};
pub use records::{NormalizedPost, ProcessedTopic, RunSummary, TopicMetadata};

/// Run the full scrape and return the summary that was written.
///
/// Topic- and post-level failures are logged and skipped. Listing failures,
/// malformed topic timestamps and output write failures abort the run.
///
/// # Errors
///
/// Returns an error if listing fails, a timestamp is malformed, or a file cannot be written.
pub async fn run(
    config: &Config,
    fetcher: &dyn ContentFetcher,
    writer: &OutputWriter,
) -> Result<RunSummary> {
    info!("Starting scrape using saved session");

    let all_topics = list_topics(fetcher, config)
        .await
        .context("Failed to list topics")?;
    let selected = select_in_range(all_topics, &config.date_range)?;
    info!(in_range = selected.len(), "Topics within date range");

    let mut all_posts: Vec<NormalizedPost> = Vec::new();
    let mut topic_files: Vec<String> = Vec::new();

    for (index, topic) in selected.iter().enumerate() {
        let title = if topic.title.is_empty() {
            "Untitled"
        } else {
            topic.title.as_str()
        };
        info!(n = index + 1, topic_id = topic.id, title = %title, "Processing topic");

        let processed = match process_topic(fetcher, config, topic).await {
            Ok(Some(processed)) => processed,
            Ok(None) => continue,
            Err(e) => {
                error!("{e}");
                continue;
            }
        };

        if processed.posts.is_empty() {
            debug!(topic_id = topic.id, "No posts survived normalization, skipping topic");
            continue;
        }

        let file_name = writer.write_topic_file(&processed).await?;
        info!(
            topic_id = topic.id,
            posts = processed.posts.len(),
            file = %file_name,
            "Saved topic"
        );

        topic_files.push(file_name);
        all_posts.extend(processed.posts);
    }

    let combined_path = writer.write_combined_file(&all_posts).await?;

    let summary = RunSummary::new(config, Utc::now(), topic_files, all_posts.len());
    let summary_path = writer.write_summary_file(&summary).await?;

    info!(
        posts = summary.scrape_metadata.total_posts,
        topics = summary.scrape_metadata.total_topics,
        "Scrape complete"
    );
    info!(path = %combined_path.display(), "Combined data saved");
    info!(dir = %writer.dir().display(), "Individual topics saved as topic_[ID].json");
    info!(path = %summary_path.display(), "Summary saved");
    info!(
        from = %config.date_range.from.date_naive(),
        to = %config.date_range.to.date_naive(),
        "Date range"
    );

    Ok(summary)
}
