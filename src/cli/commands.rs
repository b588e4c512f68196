use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "topicfeed")]
#[command(about = "Extract topic info and feeds from a topic page's hydrated state")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a topic page in Chromium and extract its feeds
    Topic {
        /// Topic ID as it appears in the topic page URL
        topic_id: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Also write the JSON result to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Write the captured page state to this file for later replay
        #[arg(long)]
        save_state: Option<String>,

        /// Treat a topic without a feed list as an empty result
        #[arg(long)]
        allow_empty: bool,
    },

    /// Extract feeds from a previously saved page state file
    Replay {
        /// Path to a state file written with --save-state
        state_file: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Treat a topic without a feed list as an empty result
        #[arg(long)]
        allow_empty: bool,
    },
}
