//! Notification board scrapers.
//!
//! Every source is scraped by the same two-step routine:
//!
//! 1. **Fetching**: one GET of the source's listing page ([`fetch::fetch_listing`])
//! 2. **Parsing**: apply the source's [`ExtractionRule`] ([`extract::parse_listing`])
//!
//! # Supported Sources
//!
//! | Source | Listing page | Container | Entry | Link |
//! |--------|--------------|-----------|-------|------|
//! | JKPSC | `https://www.jkpsc.nic.in/` | `ul.notificationnews` | `li a[visible="true"]` | entry |
//! | JKSSB | `https://jkssb.nic.in/Whatsnew.html` | whole document | `a.linkText` | entry |
//! | JKBOPEE | `https://www.jkbopee.gov.in/` | `div#Div1` | `table tbody tr` | `a.title` |
//!
//! The per-site differences live entirely in [`rules`]; no source has its own
//! control flow.
//!
//! # Common Patterns
//!
//! - A missing container aborts the cycle with a parse error
//! - Entries without a usable title or link are skipped, siblings are kept
//! - Relative links are resolved against the source's base url

pub mod extract;
pub mod fetch;
pub mod rules;

pub use extract::parse_listing;
pub use fetch::{build_client, extract};

/// Data-described description of where notifications sit in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionRule {
    /// Element that must be present; `None` means the whole document.
    pub container: Option<&'static str>,
    /// Notification entries, matched inside each container.
    pub entry: &'static str,
    /// Anchor inside an entry; `None` when the entry is the anchor itself.
    pub link: Option<&'static str>,
}
