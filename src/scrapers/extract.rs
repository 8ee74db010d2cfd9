//! Generic listing-page parser driven by an [`ExtractionRule`].

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::errors::ExtractError;
use crate::models::NotificationRecord;
use crate::sources::SourceTarget;
use crate::utils::truncate_for_log;

use super::ExtractionRule;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse a fetched listing page into normalized notification records.
///
/// The rule comes from `target.source`; relative links are resolved against
/// `target.base_url`. Entries without a non-empty title or a resolvable
/// http(s) link are dropped without affecting their siblings, and exact
/// duplicates on the same page are collapsed.
///
/// # Errors
///
/// [`ExtractError::MissingElement`] when the rule's container is absent,
/// [`ExtractError::Selector`] when a rule selector does not compile.
#[instrument(level = "debug", skip_all, fields(source = %target.source))]
pub fn parse_listing(
    html: &str,
    target: &SourceTarget,
) -> Result<Vec<NotificationRecord>, ExtractError> {
    let rule: &ExtractionRule = target.source.rule();
    let document = Html::parse_document(html);
    let entry_selector = compile(rule.entry)?;
    let link_selector = rule.link.map(compile).transpose()?;

    let containers: Vec<ElementRef<'_>> = match rule.container {
        Some(container) => {
            let selector = compile(container)?;
            let found: Vec<_> = document.select(&selector).collect();
            if found.is_empty() {
                debug!(page = %truncate_for_log(html, 200), "Container missing from page");
                return Err(ExtractError::MissingElement {
                    url: target.listing_url.to_string(),
                    selector: container.to_string(),
                });
            }
            found
        }
        None => vec![document.root_element()],
    };

    let mut skipped = 0usize;
    let records: Vec<NotificationRecord> = containers
        .iter()
        .flat_map(|container| container.select(&entry_selector))
        .filter_map(|entry| {
            let record = entry_to_record(entry, link_selector.as_ref(), &target.base_url);
            if record.is_none() {
                skipped += 1;
            }
            record
        })
        .unique()
        .collect();

    if records.is_empty() {
        warn!(
            url = %target.listing_url,
            skipped,
            "Listing page yielded no notifications; layout may have changed"
        );
    } else {
        debug!(count = records.len(), skipped, "Parsed listing page");
    }
    Ok(records)
}

fn compile(selector: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn entry_to_record(
    entry: ElementRef<'_>,
    link_selector: Option<&Selector>,
    base: &Url,
) -> Option<NotificationRecord> {
    let anchor = match link_selector {
        Some(selector) => entry.select(selector).next()?,
        None => entry,
    };
    let title = normalize_title(&anchor.text().collect::<String>());
    if title.is_empty() {
        return None;
    }
    let url = resolve_link(base, anchor.value().attr("href")?)?;
    Some(NotificationRecord::new(title, url.to_string()))
}

/// Trim the title and collapse internal whitespace runs to a single space.
pub(crate) fn normalize_title(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Resolve `href` against `base`, keeping only http(s) targets.
pub(crate) fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
