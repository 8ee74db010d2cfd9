//! Data models shared by the extractors, the store and the API.
//!
//! - [`NotificationRecord`]: one normalized notification (title + absolute url)
//! - [`NotificationsResponse`]: the JSON envelope served by every API route
//! - [`AppendOutcome`] / [`RunReport`]: bookkeeping for a single pipeline cycle

use serde::{Deserialize, Serialize};
use url::Url;

use crate::sources::Source;

/// A single recruitment notification as scraped from a source.
///
/// Two records are the same notification when both `title` and `url` match;
/// there is no other identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct NotificationRecord {
    /// Normalized link text, never empty.
    pub title: String,
    /// Absolute http(s) url of the notice.
    pub url: String,
}

impl NotificationRecord {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// Whether the record satisfies the storage invariants: a non-blank,
    /// trimmed title and an absolute http(s) url.
    pub fn is_valid(&self) -> bool {
        let title_ok = !self.title.is_empty() && self.title.trim() == self.title;
        let url_ok = Url::parse(&self.url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        title_ok && url_ok
    }
}

/// Response body for the `/fetch-*-notifications` routes.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationRecord>,
}

/// Counts reported by one `Store::append` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Rows actually written.
    pub inserted: usize,
    /// Records already present in the partition.
    pub duplicates: usize,
    /// Records that failed validation and were skipped.
    pub rejected: usize,
}

/// Summary of one successful fetch → parse → persist cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub source: Source,
    pub extracted: usize,
    pub inserted: usize,
    pub duplicates: usize,
}
