//! Error types for each layer of the scrape → persist → serve pipeline.
//!
//! Scrape failures ([`ExtractError`]) and storage failures ([`StorageError`])
//! are kept apart so the scheduler can log them per cycle while the API only
//! ever surfaces storage problems.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure while fetching or parsing one source's listing page.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: StatusCode },
    #[error("expected element `{selector}` not found on {url}")]
    MissingElement { url: String, selector: String },
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

impl ExtractError {
    pub(crate) fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                source,
            }
        } else {
            Self::Fetch {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Network, timeout or non-success status.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Timeout { .. } | Self::Status { .. }
        )
    }

    /// The page arrived but did not have the expected structure.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::MissingElement { .. } | Self::Selector { .. })
    }
}

/// Failure reading or writing a source partition.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite failure on partition {partition}: {source}")]
    Sqlite {
        partition: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to prepare storage at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("partition {0} lock poisoned by a panicked writer")]
    Poisoned(&'static str),
    #[error("partition {0} was never opened")]
    MissingPartition(&'static str),
    #[error("storage task aborted: {0}")]
    Task(String),
}

/// Failure of one scheduled cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PipelineError {
    /// Failure class for log fields: `fetch`, `parse` or `storage`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extract(e) if e.is_fetch() => "fetch",
            Self::Extract(e) if e.is_parse() => "parse",
            Self::Extract(_) => "extract",
            Self::Storage(_) => "storage",
        }
    }
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("config file is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("schedule {hour:02}:{minute:02} is not a valid wall-clock time")]
    InvalidSchedule { hour: u32, minute: u32 },
    #[error("fetch timeout must be at least one second")]
    InvalidTimeout,
}
