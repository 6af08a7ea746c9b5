use crate::config::EngineSettings;
use crate::error::FetchError;
use reqwest::Client;
use std::time::Duration;

/// One client per registry build, shared by every collector it creates.
pub fn build_client(settings: &EngineSettings) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_millis(settings.collector_timeout_ms))
        .cookie_store(true)
        .build()
        .map_err(FetchError::HttpRequest)
}

async fn get(client: &Client, url: &str) -> Result<reqwest::Response, FetchError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .send()
        .await
        .map_err(FetchError::HttpRequest)?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }
    Ok(response)
}

pub async fn fetch_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = get(client, url).await?;
    response.text().await.map_err(FetchError::HttpRequest)
}

pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = get(client, url).await?;
    let bytes = response.bytes().await.map_err(FetchError::HttpRequest)?;
    Ok(bytes.to_vec())
}
