use crate::error::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

const USER_AGENT: &str = concat!(
    "xssprobe/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/trapdoorsec/xssprobe)"
);

/// Builds the single client shared by the crawl and probe phases.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let timeout = Duration::from_secs(timeout_secs.max(1));
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout)
        .cookie_store(true)
        .pool_idle_timeout(Duration::from_secs(90))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;

    Ok(client)
}

/// A fetched page. Dropped as soon as links or forms have been pulled out.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub async fn fetch_page(client: &Client, url: &str) -> Result<Page> {
    debug!("Fetching {}", url);

    let response = client.get(url).send().await?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let body = response.text().await?;

    Ok(Page {
        url: url.to_string(),
        status,
        content_type,
        body,
    })
}
