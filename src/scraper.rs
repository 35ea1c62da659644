use reqwest::{Client, StatusCode};
use scraper::Html;
use once_cell::sync::Lazy;
use crate::error::Result;

// Create a static client to reuse connections. Default configuration:
// no timeout, default redirect handling, no extra headers.
static CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// Fetches the raw body of a page.
///
/// Yields the body only when the response status is exactly 200; any other
/// status is treated as "no content". Transport failures (DNS, connect, TLS)
/// surface as errors.
pub async fn get_web_content(url: &str) -> Result<Option<String>> {
    let response = CLIENT.get(url).send().await?;
    if response.status() != StatusCode::OK {
        return Ok(None);
    }
    let body = response.text().await?;
    Ok(Some(body))
}

/// Strips all markup from an HTML document and returns the visible text,
/// whitespace-normalized with a single space between text runs.
pub fn parse_content(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
