//! The fixed set of notification boards this service scrapes.
//!
//! Every source is bound at compile time to its listing page, its extraction
//! rule, its API route and its storage partition. Nothing here is derived
//! from user input.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::scrapers::{ExtractionRule, rules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// J&K Public Service Commission.
    Jkpsc,
    /// J&K Services Selection Board.
    Jkssb,
    /// J&K Board of Professional Entrance Examinations.
    Jkbopee,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Jkpsc, Source::Jkssb, Source::Jkbopee];

    /// Short lowercase key used in logs, config and partition names.
    pub fn key(self) -> &'static str {
        match self {
            Source::Jkpsc => "jkpsc",
            Source::Jkssb => "jkssb",
            Source::Jkbopee => "jkbopee",
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Source::Jkpsc => "https://www.jkpsc.nic.in/",
            Source::Jkssb => "https://jkssb.nic.in/",
            Source::Jkbopee => "https://www.jkbopee.gov.in/",
        }
    }

    pub fn listing_url(self) -> &'static str {
        match self {
            Source::Jkpsc => "https://www.jkpsc.nic.in/",
            Source::Jkssb => "https://jkssb.nic.in/Whatsnew.html",
            Source::Jkbopee => "https://www.jkbopee.gov.in/",
        }
    }

    /// API route serving this source's partition.
    pub fn route(self) -> &'static str {
        match self {
            Source::Jkpsc => "/fetch-notifications",
            Source::Jkssb => "/fetch-jkssb-notifications",
            Source::Jkbopee => "/fetch-jkbopee-notifications",
        }
    }

    /// SQLite file holding this source's partition.
    pub fn database_file(self) -> &'static str {
        match self {
            Source::Jkpsc => "jkpsc_data.db",
            Source::Jkssb => "jkssb_data.db",
            Source::Jkbopee => "jkbopee_data.db",
        }
    }

    pub fn rule(self) -> &'static ExtractionRule {
        match self {
            Source::Jkpsc => &rules::JKPSC,
            Source::Jkssb => &rules::JKSSB,
            Source::Jkbopee => &rules::JKBOPEE,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where a source's listing page actually lives for this process.
///
/// Defaults to the compiled-in urls; config may point a source elsewhere
/// (a mirror, or a local fixture server in tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTarget {
    pub source: Source,
    /// Base that relative links are resolved against.
    pub base_url: Url,
    /// Page fetched on each cycle.
    pub listing_url: Url,
}

impl SourceTarget {
    pub fn new(source: Source) -> Result<Self, url::ParseError> {
        Self::with_overrides(source, None, None)
    }

    pub fn with_overrides(
        source: Source,
        base_url: Option<Url>,
        listing_url: Option<Url>,
    ) -> Result<Self, url::ParseError> {
        let base_url = match base_url {
            Some(url) => url,
            None => Url::parse(source.base_url())?,
        };
        let listing_url = match listing_url {
            Some(url) => url,
            None => Url::parse(source.listing_url())?,
        };
        Ok(Self {
            source,
            base_url,
            listing_url,
        })
    }
}
