use std::time::Duration;

use thiserror::Error;

use crate::domain::{TopicInfo, TopicResult};
use crate::state::Diagnosis;

#[derive(Error, Debug)]
pub enum ScraperError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid topic URL: {0}")]
    InvalidUrl(String),

    // Page lifecycle errors
    #[error("Timed out after {after:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        after: Duration,
    },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Browser error: {0}")]
    Browser(String),

    // State extraction errors
    #[error("Topic info not found: {0}")]
    MissingField(Diagnosis),

    #[error("Topic \"{}\" has no feeds: {diagnosis}", .topic.name)]
    NoFeeds {
        topic: Box<TopicInfo>,
        diagnosis: Diagnosis,
    },

    #[error("Failed to decode {shape} (payload starts with: {excerpt})")]
    Decode {
        shape: String,
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScraperError {
    /// A topic without a feed list is an expected outcome some callers accept
    pub fn is_no_feeds(&self) -> bool {
        matches!(self, ScraperError::NoFeeds { .. })
    }

    /// Turn [`ScraperError::NoFeeds`] into a result with no feeds, handing
    /// any other error back unchanged.
    pub fn into_empty_result(self) -> Result<TopicResult, ScraperError> {
        match self {
            ScraperError::NoFeeds { topic, .. } => Ok(TopicResult::new(*topic, Vec::new())),
            other => Err(other),
        }
    }

    /// Structural diagnosis attached to the error, if any
    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        match self {
            ScraperError::MissingField(diagnosis) | ScraperError::NoFeeds { diagnosis, .. } => {
                Some(diagnosis)
            }
            _ => None,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for ScraperError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScraperError::Browser(err.to_string())
    }
}

pub type ScraperResult<T> = Result<T, ScraperError>;
