// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use std::{env, time::Duration};

use crate::ingest::sources::load_sources_default;
use crate::ingest::types::{FetchOptions, Source, DEFAULT_USER_AGENT};

fn default_table() -> String {
    "resultados".to_string()
}
fn default_browserless_url() -> String {
    "http://127.0.0.1:3000".to_string()
}
const DEFAULT_NAV_TIMEOUT_SECS: u64 = 60;

/// Everything the job needs from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_key: String,
    pub table: String,
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub nav_timeout: Duration,
    pub user_agent: String,
    pub sources: Vec<Source>,
}

impl AppConfig {
    /// Read config from env vars. Missing store credentials are an error.
    pub fn from_env() -> Result<Self> {
        let supabase_url = required("SUPABASE_URL")?;
        let supabase_key = required("SUPABASE_SERVICE_KEY")?;

        let nav_timeout_secs = match optional("NAV_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| anyhow!("NAV_TIMEOUT_SECS must be a positive integer, got {v:?}"))?,
            None => DEFAULT_NAV_TIMEOUT_SECS,
        };

        let sources = load_sources_default().context("loading source list")?;

        Ok(Self {
            supabase_url,
            supabase_key,
            table: optional("RESULTS_TABLE").unwrap_or_else(default_table),
            browserless_url: optional("BROWSERLESS_URL").unwrap_or_else(default_browserless_url),
            browserless_token: optional("BROWSERLESS_TOKEN"),
            nav_timeout: Duration::from_secs(nav_timeout_secs),
            user_agent: optional("SCRAPE_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            sources,
        })
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            navigation_timeout: self.nav_timeout,
            ..FetchOptions::default()
        }
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| anyhow!("Missing {key} env var"))
}

/// Unset and blank values are treated the same.
fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
