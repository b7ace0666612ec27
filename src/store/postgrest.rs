// src/store/postgrest.rs
//! Supabase (PostgREST) backed [`ResultStore`].

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use super::{collapse_by_key, ResultStore};
use crate::ingest::types::ResultRecord;

/// Conflict target; must match the table's unique constraint.
pub const CONFLICT_COLUMNS: &str = "loteria,horario,posicao,data_sorteio";

#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    table_url: String,
    service_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, service_key: &str, table: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building postgrest http client")?;
        Ok(Self {
            client,
            table_url: table_url(base_url, table),
            service_key: service_key.to_string(),
        })
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

pub fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

/// Row count from a `Content-Range` header such as `0-11/12` or `*/0`.
pub fn parse_content_range_total(v: &str) -> Option<u64> {
    v.rsplit('/').next()?.trim().parse().ok()
}

async fn check(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(anyhow!("{what} failed (status {status}): {message}"))
}

#[async_trait]
impl ResultStore for PostgrestStore {
    async fn delete_older_than(&self, threshold: NaiveDate) -> Result<u64> {
        let filter = format!("lt.{}", threshold.format("%Y-%m-%d"));
        let resp = self
            .authed(self.client.delete(&self.table_url))
            .query(&[("data_sorteio", filter.as_str())])
            .header("Prefer", "return=minimal,count=exact")
            .send()
            .await
            .context("postgrest delete")?;
        let resp = check(resp, "retention delete").await?;

        Ok(resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0))
    }

    async fn upsert(&self, records: &[ResultRecord]) -> Result<()> {
        // one batch may not touch the same conflict row twice
        let rows = collapse_by_key(records);
        let resp = self
            .authed(self.client.post(&self.table_url))
            .query(&[("on_conflict", CONFLICT_COLUMNS)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&rows)
            .send()
            .await
            .context("postgrest upsert")?;
        check(resp, "upsert").await?;
        Ok(())
    }
}
