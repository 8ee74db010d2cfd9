//! HTTP side of the scrapers: one GET per source per cycle.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::errors::ExtractError;
use crate::models::NotificationRecord;
use crate::sources::SourceTarget;

use super::parse_listing;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by every scheduled job.
///
/// `timeout` bounds the whole request (connect + headers + body), which in
/// turn bounds the worst-case duration of a cycle.
pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .user_agent(user_agent)
        .build()
}

/// Fetch a source's listing page and return its body.
///
/// Non-2xx responses are errors; there is no retry.
#[instrument(level = "info", skip_all, fields(source = %target.source, url = %target.listing_url))]
pub async fn fetch_listing(client: &Client, target: &SourceTarget) -> Result<String, ExtractError> {
    let url = target.listing_url.as_str();
    let response = client
        .get(target.listing_url.clone())
        .send()
        .await
        .map_err(|e| ExtractError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| ExtractError::from_reqwest(url, e))?;
    debug!(bytes = body.len(), %status, "Fetched listing page");
    Ok(body)
}

/// Fetch and parse one source, returning its normalized notifications.
#[instrument(level = "info", skip_all, fields(source = %target.source))]
pub async fn extract(
    client: &Client,
    target: &SourceTarget,
) -> Result<Vec<NotificationRecord>, ExtractError> {
    let html = fetch_listing(client, target).await?;
    let records = parse_listing(&html, target)?;
    info!(
        count = records.len(),
        url = %target.listing_url,
        "Extracted notifications"
    );
    Ok(records)
}
