use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::browser::PageDriver;
use crate::errors::{ScraperError, ScraperResult};

/// Default predicate: the page has hydrated its state global
pub const STATE_DEFINED: &str = "window.__INITIAL_STATE__ !== undefined";

/// Holds extraction back until the page state exists, then gives in-flight
/// rendering a fixed grace period.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    predicate: String,
    timeout: Duration,
    settle: Duration,
    poll_interval: Duration,
}

impl ReadinessGate {
    pub fn new(timeout: Duration, settle: Duration, poll_interval: Duration) -> Self {
        Self {
            predicate: STATE_DEFINED.to_string(),
            timeout,
            settle,
            poll_interval,
        }
    }

    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = predicate.into();
        self
    }

    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// Block until the predicate holds and the settle delay has passed.
    pub async fn wait<D: PageDriver + ?Sized>(
        &self,
        driver: &D,
        cancel: &CancellationToken,
    ) -> ScraperResult<()> {
        tokio::select! {
            _ = cancel.cancelled() => return Err(ScraperError::Cancelled),
            ready = tokio::time::timeout(self.timeout, self.poll(driver)) => {
                if ready.is_err() {
                    tracing::warn!(
                        predicate = %self.predicate,
                        timeout = ?self.timeout,
                        "Page never became ready"
                    );
                    return Err(ScraperError::Timeout {
                        waiting_for: self.predicate.clone(),
                        after: self.timeout,
                    });
                }
            }
        }

        tracing::debug!(settle = ?self.settle, "Page ready, settling");

        tokio::select! {
            _ = cancel.cancelled() => Err(ScraperError::Cancelled),
            _ = tokio::time::sleep(self.settle) => Ok(()),
        }
    }

    async fn poll<D: PageDriver + ?Sized>(&self, driver: &D) {
        loop {
            match driver.evaluate(&self.predicate).await {
                Ok(result) if result.trim() == "true" => return,
                Ok(_) => {}
                // The page may still be navigating; keep polling until the bound
                Err(e) => tracing::debug!(error = %e, "Readiness check failed"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
