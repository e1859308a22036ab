use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::task::{Priority, Status};
use crate::view::SortKey;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskdeck",
    version,
    about = "Taskdeck: task dashboard CLI over a remote task API",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config override, e.g. --rc gateway.url=http://127.0.0.1:8080
    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "deckrc", global = true)]
    pub deckrc: Option<PathBuf>,

    /// Gateway base URL, shadowing gateway.url from the deckrc.
    #[arg(long = "url", global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the task list, filtered and sorted.
    List {
        #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Status>()))]
        status: Option<Status>,

        #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Priority>()))]
        priority: Option<Priority>,

        /// Exact due date to match (YYYY-MM-DD).
        #[arg(long)]
        due: Option<String>,

        #[arg(
            long,
            default_value = "due-date",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<SortKey>())
        )]
        sort: SortKey,
    },

    /// Show one task in full.
    Show { id: String },

    /// Create a task; the gateway assigns the id.
    Add {
        #[arg(long)]
        title: String,

        #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Status>()))]
        status: Option<Status>,

        #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Priority>()))]
        priority: Option<Priority>,

        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: String,

        #[arg(long = "member", action = ArgAction::Append)]
        members: Vec<String>,
    },

    /// Change any fields of a task (full-record update under the hood).
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Status>()))]
        status: Option<Status>,

        #[arg(long, value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Priority>()))]
        priority: Option<Priority>,

        #[arg(long)]
        due: Option<String>,

        #[arg(long = "member", action = ArgAction::Append)]
        members: Option<Vec<String>>,
    },

    /// Move a not-started task to in-progress (no-op otherwise).
    Start { id: String },

    /// Flip a task between done and in-progress.
    Toggle { id: String },

    /// Delete a task.
    Delete { id: String },

    /// Task counts by status and by priority.
    Chart,

    /// Print the resolved configuration.
    Config,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = match (quiet, verbose) {
        (q, _) if q >= 2 => "error",
        (1, _) => "warn",
        (_, v) if v >= 3 => "trace",
        (_, 2) => "debug",
        (_, 1) => "info",
        _ => "warn",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
