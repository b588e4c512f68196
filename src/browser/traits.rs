use async_trait::async_trait;

use crate::errors::ScraperResult;

/// One browser page, used exclusively by a single extraction at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` into the page
    async fn navigate(&self, url: &str) -> ScraperResult<()>;

    /// Wait for the page's navigation and network activity to settle
    async fn wait_stable(&self) -> ScraperResult<()>;

    /// Evaluate a JS expression in the page.
    ///
    /// Strings come back verbatim, other values as JSON text, and
    /// `undefined` as empty text.
    async fn evaluate(&self, script: &str) -> ScraperResult<String>;
}
