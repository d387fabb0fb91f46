//! JSON artifacts written to the output directory.
//!
//! Every write replaces the whole file. Failures are fatal to the run.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::constants::{topic_file_name, COMBINED_FILE_NAME, SUMMARY_FILE_NAME};
use crate::error::ScrapeError;
use crate::scrape::records::{NormalizedPost, ProcessedTopic, RunSummary};

#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    /// Create the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::OutputWrite`] if the directory cannot be created.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| ScrapeError::OutputWrite {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `topic_{id}.json` and return its file name.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::OutputWrite`] if the file cannot be written.
    pub async fn write_topic_file(&self, topic: &ProcessedTopic) -> Result<String, ScrapeError> {
        let name = topic_file_name(topic.topic_metadata.topic_id);
        self.write_json(&name, topic).await?;
        Ok(name)
    }

    /// Write every normalized post from the run to the combined file.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::OutputWrite`] if the file cannot be written.
    pub async fn write_combined_file(&self, posts: &[NormalizedPost]) -> Result<PathBuf, ScrapeError> {
        self.write_json(COMBINED_FILE_NAME, posts).await
    }

    /// # Errors
    ///
    /// Returns [`ScrapeError::OutputWrite`] if the file cannot be written.
    pub async fn write_summary_file(&self, summary: &RunSummary) -> Result<PathBuf, ScrapeError> {
        self.write_json(SUMMARY_FILE_NAME, summary).await
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, ScrapeError> {
        let path = self.dir.join(name);
        let json = serde_json::to_vec_pretty(value).map_err(|e| ScrapeError::OutputWrite {
            path: path.clone(),
            source: e.into(),
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| ScrapeError::OutputWrite {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Wrote output file");
        Ok(path)
    }
}
