pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::TaskStatus;

#[derive(Parser)]
#[command(name = "pagemeta")]
#[command(about = "Queue URLs and scrape their page metadata", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/pagemeta/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configured path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate URLs and queue them for scraping
    Submit {
        /// Owner the tasks belong to
        #[arg(short, long)]
        owner: String,

        /// Read URLs from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// URLs to submit
        urls: Vec<String>,
    },
    /// List an owner's tasks, newest first
    List {
        #[arg(short, long)]
        owner: String,

        /// Only show tasks in this state (pending, completed, failed)
        #[arg(short, long)]
        status: Option<TaskStatus>,

        /// Print tasks as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single task
    Show {
        id: i64,
    },
    /// Show task counts and average processing time for an owner
    Stats {
        #[arg(short, long)]
        owner: String,
    },
    /// Delete an owner's completed or failed tasks
    Clear {
        #[arg(short, long)]
        owner: String,

        #[arg(short, long, default_value = "completed")]
        status: TaskStatus,
    },
    /// Run the scraper worker
    Worker {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Maximum tasks per cycle
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Pause between cycles (e.g., "5s", "2m", "1h")
        #[arg(short, long)]
        interval: Option<String>,

        /// Hosts scraped in parallel within a batch
        #[arg(long)]
        concurrency: Option<usize>,

        /// Claim tasks so several workers can share the database
        #[arg(long)]
        claim: bool,

        /// Count the interval from batch start instead of batch end
        #[arg(long)]
        fixed_rate: bool,
    },
}
