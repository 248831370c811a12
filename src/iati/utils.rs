//! Utility functions for common operations

use crate::iati::config::COUNTRY_PLACEHOLDER;
use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

pub const USER_AGENT: &str = "hdx-scraper-iati";

/// Build the HTTP client shared by all downloads
pub fn http_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(300)) // 5 min timeout, d-portal queries are slow
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download a text body via HTTP
pub async fn http_get_text(client: &Client, url: &str) -> Result<String> {
    info!("Downloading from {}", url);

    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(anyhow::anyhow!("HTTP request failed: {}", status));
    }

    let text = response.text().await?;
    info!("Downloaded {} bytes", text.len());
    Ok(text)
}

/// Replace the `(country)` token in a configured template
pub fn substitute_country(template: &str, country_name: &str) -> String {
    template.replace(COUNTRY_PLACEHOLDER, country_name)
}
