// src/ingest/fetch.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::ingest::types::{FetchOptions, PageFetcher, PageSession};

/// Extra time the HTTP request gets on top of the navigation timeout,
/// so the browser side reports the timeout instead of the socket.
const REQUEST_GRACE: Duration = Duration::from_secs(10);

/// Fetch one page inside its own session. The session is closed on every
/// path; a close failure is logged and does not mask the fetch result.
pub async fn fetch_page(fetcher: &dyn PageFetcher, url: &str, opts: &FetchOptions) -> Result<String> {
    let mut session = fetcher.open_session().await.context("opening page session")?;
    let res = session.content(url, opts).await;
    if let Err(e) = session.close().await {
        tracing::warn!(error = ?e, url, "closing page session failed");
    }
    res
}

/// Renders pages through a Browserless `/content` endpoint.
pub struct BrowserlessFetcher {
    base_url: String,
    token: Option<String>,
}

impl BrowserlessFetcher {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    pub fn content_endpoint(&self) -> String {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }
        endpoint
    }
}

#[async_trait]
impl PageFetcher for BrowserlessFetcher {
    async fn open_session(&self) -> Result<Box<dyn PageSession>> {
        let client = reqwest::Client::builder()
            .build()
            .context("building browserless http client")?;
        Ok(Box::new(BrowserlessSession {
            endpoint: self.content_endpoint(),
            client,
        }))
    }
}

/// One rendering context. Owns its HTTP client (and connection pool) until closed.
struct BrowserlessSession {
    endpoint: String,
    client: reqwest::Client,
}

pub fn content_request_body(url: &str, opts: &FetchOptions) -> serde_json::Value {
    serde_json::json!({
        "url": url,
        "userAgent": opts.user_agent,
        "gotoOptions": {
            "waitUntil": opts.wait_until,
            "timeout": opts.navigation_timeout.as_millis() as u64,
        },
    })
}

#[async_trait]
impl PageSession for BrowserlessSession {
    async fn content(&mut self, url: &str, opts: &FetchOptions) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(opts.navigation_timeout + REQUEST_GRACE)
            .json(&content_request_body(url, opts))
            .send()
            .await
            .with_context(|| format!("browserless request for {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(anyhow!("browserless error (status {status}): {message}"));
        }
        resp.text().await.context("browserless .text()")
    }

    async fn close(self: Box<Self>) -> Result<()> {
        // dropping the client tears down its pooled connections
        drop(self.client);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_token() {
        let f = BrowserlessFetcher::new("http://browser:3000/", Some("abc"));
        assert_eq!(f.content_endpoint(), "http://browser:3000/content?token=abc");
        let f = BrowserlessFetcher::new("http://browser:3000", None);
        assert_eq!(f.content_endpoint(), "http://browser:3000/content");
    }

    #[test]
    fn request_body_carries_navigation_policy() {
        let body = content_request_body("https://example.test/r", &FetchOptions::default());
        assert_eq!(body["url"], "https://example.test/r");
        assert_eq!(body["gotoOptions"]["waitUntil"], "networkidle2");
        assert_eq!(body["gotoOptions"]["timeout"], 60_000);
        assert!(body["userAgent"].as_str().unwrap().contains("Chrome/110"));
    }
}
