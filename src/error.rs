use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while crawling and persisting forum content.
///
/// `TopicFetch` and `PostProcessing` are contained by the caller at the scope
/// of one topic or one post. The rest terminate the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("malformed timestamp: {value:?}")]
    MalformedTimestamp { value: String },

    #[error("failed to load topic {topic_id}: {reason}")]
    TopicFetch { topic_id: u64, reason: String },

    #[error("failed to process post {post_id}: {reason}")]
    PostProcessing { post_id: String, reason: String },

    #[error("failed to write {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no parse strategy succeeded for {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("session error: {0}")]
    Session(String),
}
