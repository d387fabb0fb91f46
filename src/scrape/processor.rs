use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::discourse::{AcceptedAnswer, Post, TopicDetail, TopicSummary};
use crate::error::ScrapeError;
use crate::fetcher::ContentFetcher;
use crate::scrape::records::{NormalizedPost, ProcessedTopic, TopicMetadata};
use crate::scrape::text::cooked_to_text;

/// Fetch a topic's full detail via its canonical JSON URL.
///
/// # Errors
///
/// Returns [`ScrapeError::TopicFetch`] on any transport or parse failure.
pub async fn fetch_topic_detail(
    fetcher: &dyn ContentFetcher,
    config: &Config,
    topic: &TopicSummary,
) -> Result<TopicDetail, ScrapeError> {
    let url = config.topic_json_url(&topic.slug, topic.id);
    let page = fetcher
        .fetch(&url)
        .await
        .map_err(|e| ScrapeError::TopicFetch {
            topic_id: topic.id,
            reason: format!("{e:#}"),
        })?;
    page.parse_json().map_err(|e| ScrapeError::TopicFetch {
        topic_id: topic.id,
        reason: e.to_string(),
    })
}

/// Fetch and normalize one topic.
///
/// Returns `Ok(None)` when the topic has an empty post stream.
///
/// # Errors
///
/// Returns [`ScrapeError::TopicFetch`] if the detail cannot be loaded; callers
/// skip the topic and carry on.
pub async fn process_topic(
    fetcher: &dyn ContentFetcher,
    config: &Config,
    topic: &TopicSummary,
) -> Result<Option<ProcessedTopic>, ScrapeError> {
    let detail = fetch_topic_detail(fetcher, config, topic).await?;
    if detail.post_stream.posts.is_empty() {
        debug!(topic_id = topic.id, "Topic has no posts, skipping");
        return Ok(None);
    }
    Ok(Some(normalize_topic(config, topic, &detail)))
}

/// Normalize every post in `detail`, skipping empty or malformed posts.
#[must_use]
pub fn normalize_topic(config: &Config, topic: &TopicSummary, detail: &TopicDetail) -> ProcessedTopic {
    let raw_posts = &detail.post_stream.posts;
    let reply_counts = reply_counts(raw_posts);
    let accepted_post_id = detail
        .accepted_answer()
        .and_then(|answer| resolve_accepted_post_id(answer, raw_posts));

    let mut posts = Vec::with_capacity(raw_posts.len());
    for raw in raw_posts {
        match normalize_post(config, topic, raw, &reply_counts, accepted_post_id) {
            Ok(Some(post)) => posts.push(post),
            Ok(None) => {}
            Err(e) => warn!(topic_id = topic.id, "{e}"),
        }
    }

    let topic_metadata = TopicMetadata {
        topic_id: topic.id,
        title: topic.title.clone(),
        slug: topic.slug.clone(),
        category_id: topic.category_id,
        tags: topic.tags.clone(),
        created_at: topic.created_at.clone(),
        posts_count: posts.len(),
        views: topic.views,
        like_count: topic.like_count,
        url: config.topic_url(&topic.slug, topic.id),
    };

    ProcessedTopic {
        topic_metadata,
        posts,
    }
}

/// Number of posts replying to each post number.
///
/// Read from the raw stream so posts that later fail to normalize still count
/// as replies.
fn reply_counts(raw_posts: &[Value]) -> HashMap<u64, u64> {
    let mut counts = HashMap::new();
    for target in raw_posts
        .iter()
        .filter_map(|p| p.get("reply_to_post_number").and_then(Value::as_u64))
    {
        *counts.entry(target).or_insert(0) += 1;
    }
    counts
}

fn resolve_accepted_post_id(answer: AcceptedAnswer, raw_posts: &[Value]) -> Option<u64> {
    match answer {
        AcceptedAnswer::PostId(id) => Some(id),
        AcceptedAnswer::PostNumber(number) => raw_posts
            .iter()
            .find(|p| p.get("post_number").and_then(Value::as_u64) == Some(number))
            .and_then(|p| p.get("id").and_then(Value::as_u64)),
    }
}

/// Build one record, or `Ok(None)` if the post has no text content.
fn normalize_post(
    config: &Config,
    topic: &TopicSummary,
    raw: &Value,
    reply_counts: &HashMap<u64, u64>,
    accepted_post_id: Option<u64>,
) -> Result<Option<NormalizedPost>, ScrapeError> {
    let post: Post = serde_json::from_value(raw.clone()).map_err(|e| ScrapeError::PostProcessing {
        post_id: raw
            .get("id")
            .map_or_else(|| "unknown".to_string(), ToString::to_string),
        reason: e.to_string(),
    })?;

    let content = cooked_to_text(&post.cooked);
    if content.is_empty() {
        debug!(topic_id = topic.id, post_id = post.id, "Skipping post with empty content");
        return Ok(None);
    }

    Ok(Some(NormalizedPost {
        topic_id: topic.id,
        topic_title: topic.title.clone(),
        category_id: topic.category_id,
        tags: topic.tags.clone(),
        post_id: post.id,
        post_number: post.post_number,
        author: post.username.unwrap_or_else(|| "unknown".to_string()),
        created_at: post.created_at.unwrap_or_default(),
        updated_at: post.updated_at.unwrap_or_default(),
        reply_to_post_number: post.reply_to_post_number,
        is_reply: post.reply_to_post_number.is_some(),
        reply_count: reply_counts.get(&post.post_number).copied().unwrap_or(0),
        like_count: post.like_count,
        is_accepted_answer: accepted_post_id == Some(post.id),
        mentioned_users: post.mentioned_users.into_iter().map(|u| u.username).collect(),
        url: config.post_url(&topic.slug, topic.id, post.post_number),
        content,
    }))
}
