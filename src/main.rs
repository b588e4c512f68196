use std::fs;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use topicfeed::browser::{ChromiumDriver, LaunchOptions};
use topicfeed::cli::{Cli, Commands};
use topicfeed::config::Config;
use topicfeed::domain::TopicResult;
use topicfeed::errors::ScraperResult;
use topicfeed::services::{extract_topic, TopicService};
use topicfeed::state::PageSnapshot;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "topicfeed=debug" } else { "topicfeed=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// How to print a finished extraction
struct Output {
    json: bool,
    file: Option<String>,
    allow_empty: bool,
}

async fn run(cli: Cli) -> ScraperResult<()> {
    // Load configuration
    let config = Config::from_env()?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Topic {
            topic_id,
            json,
            output,
            save_state,
            allow_empty,
        } => {
            let out = Output {
                json,
                file: output,
                allow_empty,
            };
            cmd_topic(&config, &topic_id, save_state, &out, &cancel).await
        }
        Commands::Replay {
            state_file,
            json,
            allow_empty,
        } => {
            let out = Output {
                json,
                file: None,
                allow_empty,
            };
            cmd_replay(&state_file, &out)
        }
    }
}

async fn cmd_topic(
    config: &Config,
    topic_id: &str,
    save_state: Option<String>,
    out: &Output,
    cancel: &CancellationToken,
) -> ScraperResult<()> {
    let options = LaunchOptions {
        executable: config.chrome_path.clone(),
        headless: config.headless,
    };
    let driver = ChromiumDriver::launch(&options).await?;
    let service = TopicService::from_config(driver, config)?;

    let outcome = match service.capture(topic_id, cancel).await {
        Ok(snapshot) => save_snapshot(&snapshot, save_state.as_deref())
            .and_then(|()| extract_topic(&snapshot)),
        Err(e) => Err(e),
    };

    if let Err(e) = service.into_driver().close().await {
        tracing::warn!(error = %e, "Failed to close browser");
    }

    report(outcome, out)
}

fn cmd_replay(state_file: &str, out: &Output) -> ScraperResult<()> {
    let content = fs::read_to_string(state_file)?;
    let snapshot = PageSnapshot::from_json(&content)?;

    report(extract_topic(&snapshot), out)
}

fn save_snapshot(snapshot: &PageSnapshot, path: Option<&str>) -> ScraperResult<()> {
    if let Some(path) = path {
        fs::write(path, snapshot.to_json_pretty()?)?;
        eprintln!("Saved page state to {}", path);
    }
    Ok(())
}

fn report(outcome: ScraperResult<TopicResult>, out: &Output) -> ScraperResult<()> {
    let result = match outcome {
        Err(e) if e.is_no_feeds() && out.allow_empty => {
            eprintln!("{}", e);
            e.into_empty_result()?
        }
        other => other?,
    };

    let json = serde_json::to_string_pretty(&result)?;

    if let Some(ref path) = out.file {
        fs::write(path, &json)?;
        eprintln!("Wrote {} feeds to {}", result.count(), path);
    }

    if out.json {
        println!("{}", json);
    } else {
        println!("{}", result.summary());
    }

    Ok(())
}
