use std::collections::HashSet;

use anyhow::{Context, Result};
use async_stream::try_stream;
use futures_util::{pin_mut, Stream, StreamExt};
use tracing::{debug, info};

use crate::config::Config;
use crate::discourse::{CategoryPage, TopicSummary};
use crate::fetcher::ContentFetcher;

/// Lazily page through the category listing, yielding each non-empty page of topics.
///
/// Requests `?page=0`, `?page=1`, ... and ends at the first page with no
/// topics. A page that fails to fetch or parse ends the stream with an error.
pub fn topic_pages<'a>(
    fetcher: &'a dyn ContentFetcher,
    config: &'a Config,
) -> impl Stream<Item = Result<Vec<TopicSummary>>> + 'a {
    try_stream! {
        let mut page_num: u32 = 0;
        loop {
            let url = config.category_page_url(page_num);
            info!(page = page_num, "Fetching topic list page");

            let page = fetcher
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch topic list page {page_num}"))?;
            let parsed: CategoryPage = page
                .parse_json()
                .with_context(|| format!("Failed to parse topic list page {page_num}"))?;

            let topics = parsed.topic_list.topics;
            if topics.is_empty() {
                debug!(page = page_num, "Empty topic list page, end of listing");
                break;
            }

            debug!(page = page_num, count = topics.len(), "Topic list page fetched");
            yield topics;
            page_num += 1;
        }
    }
}

/// Collect every topic in the category listing.
///
/// A topic bumped while paging can show up on more than one page; only its
/// first appearance is kept.
///
/// # Errors
///
/// Returns an error if any listing page cannot be fetched or parsed.
pub async fn list_topics(fetcher: &dyn ContentFetcher, config: &Config) -> Result<Vec<TopicSummary>> {
    let pages = topic_pages(fetcher, config);
    pin_mut!(pages);

    let mut all_topics = Vec::new();
    let mut seen = HashSet::new();
    while let Some(topics) = pages.next().await {
        for topic in topics? {
            if seen.insert(topic.id) {
                all_topics.push(topic);
            } else {
                debug!(topic_id = topic.id, "Topic listed again on a later page, skipping");
            }
        }
    }

    info!(total = all_topics.len(), "Found topics across all pages");
    Ok(all_topics)
}
