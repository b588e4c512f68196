use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::browser::PageDriver;
use crate::errors::{ScraperError, ScraperResult};

/// Length of the rendered body once the document has loaded, -1 before that
const DOM_SIZE_SCRIPT: &str = "document.readyState === 'complete' && document.body \
    ? document.body.innerHTML.length : -1";

const STABLE_POLL: Duration = Duration::from_millis(250);
const STABLE_LIMIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub executable: Option<PathBuf>,
    pub headless: bool,
}

/// Chromium over CDP, holding a single page.
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumDriver {
    pub async fn launch(options: &LaunchOptions) -> ScraperResult<Self> {
        let mut builder = BrowserConfig::builder();
        if let Some(ref bin) = options.executable {
            builder = builder.chrome_executable(bin);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        if std::env::var("CI").is_ok() || std::env::var("NO_SANDBOX").is_ok() {
            builder = builder.arg("--no-sandbox");
        }

        let config = builder
            .build()
            .map_err(|e| ScraperError::Browser(format!("Invalid browser config: {}", e)))?;

        tracing::info!(
            executable = ?options.executable,
            headless = options.headless,
            "Launching chromium"
        );

        let (browser, mut handler) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            tracing::debug!("Chromium event loop exited");
        });

        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Close the browser and wait for its event loop to finish
    pub async fn close(mut self) -> ScraperResult<()> {
        self.browser.close().await?;
        if let Err(e) = self.handler.await {
            tracing::warn!(error = %e, "Chromium event loop task failed");
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> ScraperResult<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    /// Wait for the navigation to commit, then until the loaded document's
    /// markup stops changing between two polls. Gives up quietly after
    /// `STABLE_LIMIT`; readiness is decided by the gate.
    async fn wait_stable(&self) -> ScraperResult<()> {
        self.page.wait_for_navigation().await?;

        let settled = tokio::time::timeout(STABLE_LIMIT, async {
            let mut last = None;
            loop {
                let size = self.evaluate(DOM_SIZE_SCRIPT).await?;
                if is_settled(last.as_deref(), &size) {
                    return Ok::<(), ScraperError>(());
                }
                last = Some(size);
                tokio::time::sleep(STABLE_POLL).await;
            }
        })
        .await;

        match settled {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(limit = ?STABLE_LIMIT, "Page markup still changing");
                Ok(())
            }
        }
    }

    async fn evaluate(&self, script: &str) -> ScraperResult<String> {
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(ScraperError::Browser)?;

        let result = self.page.evaluate_expression(params).await?;
        Ok(render_value(result.value()))
    }
}

/// Two equal readings of a loaded document
fn is_settled(previous: Option<&str>, current: &str) -> bool {
    current != "-1" && previous == Some(current)
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
