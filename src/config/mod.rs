use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{ScraperError, ScraperResult};

pub const DEFAULT_TOPIC_BASE_URL: &str = "https://www.xiaohongshu.com/topic/normal/";

#[derive(Debug, Clone)]
pub struct Config {
    pub topic_base_url: String,
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    /// Bound on one whole extraction, navigation included
    pub page_timeout: Duration,
    pub ready_timeout: Duration,
    pub settle_delay: Duration,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            topic_base_url: DEFAULT_TOPIC_BASE_URL.to_string(),
            chrome_path: None,
            headless: true,
            page_timeout: Duration::from_secs(60),
            ready_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> ScraperResult<Self> {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> ScraperResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let topic_base_url = get("TOPIC_BASE_URL").unwrap_or(defaults.topic_base_url);
        let chrome_path = get("CHROME_PATH").map(PathBuf::from);

        let headless = match get("BROWSER_HEADLESS") {
            Some(v) => parse_bool("BROWSER_HEADLESS", &v)?,
            None => defaults.headless,
        };

        let page_timeout = parse_number::<u64>("PAGE_TIMEOUT_SECS", get("PAGE_TIMEOUT_SECS"))?
            .map(Duration::from_secs)
            .unwrap_or(defaults.page_timeout);
        let ready_timeout = parse_number::<u64>("READY_TIMEOUT_SECS", get("READY_TIMEOUT_SECS"))?
            .map(Duration::from_secs)
            .unwrap_or(defaults.ready_timeout);
        let settle_delay = parse_number::<u64>("SETTLE_DELAY_MS", get("SETTLE_DELAY_MS"))?
            .map(Duration::from_millis)
            .unwrap_or(defaults.settle_delay);
        let poll_interval = parse_number::<u64>("POLL_INTERVAL_MS", get("POLL_INTERVAL_MS"))?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        if poll_interval.is_zero() {
            return Err(ScraperError::Config(
                "POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            topic_base_url,
            chrome_path,
            headless,
            page_timeout,
            ready_timeout,
            settle_delay,
            poll_interval,
        })
    }
}

fn parse_number<T: FromStr>(key: &str, value: Option<String>) -> ScraperResult<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| ScraperError::Config(format!("{} is not a valid number: {}", key, v)))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> ScraperResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ScraperError::Config(format!(
            "{} must be true or false, got: {}",
            key, value
        ))),
    }
}
