//! Command-line interface definitions.
//!
//! Every flag is optional; anything not given here falls back to the YAML
//! config file (if any) and then to built-in defaults.

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the notification service.
///
/// # Examples
///
/// ```sh
/// # Defaults: listen on 127.0.0.1:5000, databases in the working directory
/// jk_notifications
///
/// # Custom config and an immediate first scrape
/// jk_notifications -c /etc/jk_notifications.yaml --scrape-on-start
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "JK_NOTIFY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address the JSON API listens on (e.g. 0.0.0.0:5000)
    #[arg(short, long, env = "JK_NOTIFY_BIND")]
    pub bind: Option<String>,

    /// Directory holding one SQLite database per source
    #[arg(short, long, env = "JK_NOTIFY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Run every source's scrape once right after startup
    #[arg(long)]
    pub scrape_on_start: bool,
}
