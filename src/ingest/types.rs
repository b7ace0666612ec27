// src/ingest/types.rs
use anyhow::Result;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Draw time used when a block heading carries no time token.
pub const UNKNOWN_DRAW_TIME: &str = "N/A";

/// One normalized draw result, shaped like a row of the `resultados` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    #[serde(rename = "loteria")]
    pub source: String, // e.g., "LOOK", "FEDERAL"
    #[serde(rename = "horario")]
    pub draw_time: String, // "HH:MM" or UNKNOWN_DRAW_TIME
    #[serde(rename = "posicao")]
    pub position: String, // free text, e.g. "1º"
    #[serde(rename = "milhar")]
    pub number: String, // always 4 ASCII digits
    #[serde(rename = "grupo")]
    pub group: u8, // 1..=25
    #[serde(rename = "bicho")]
    pub label: String,
    #[serde(rename = "data_sorteio")]
    pub draw_date: NaiveDate,
}

impl ResultRecord {
    pub fn from_fields(source: &str, draw_time: &str, draw_date: NaiveDate, f: RowFields) -> Self {
        Self {
            source: source.to_string(),
            draw_time: draw_time.to_string(),
            position: f.position,
            number: f.number,
            group: f.group,
            label: f.label,
            draw_date,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            source: self.source.clone(),
            draw_time: self.draw_time.clone(),
            position: self.position.clone(),
            draw_date: self.draw_date,
        }
    }
}

/// Natural key the store resolves conflicts on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey {
    pub source: String,
    pub draw_time: String,
    pub position: String,
    pub draw_date: NaiveDate,
}

/// The per-row part of a record, as produced by the field extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFields {
    pub position: String,
    pub number: String,
    pub group: u8,
    pub label: String,
}

/// Weekly activity schedule of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Always,
    Weekdays(Vec<Weekday>),
}

impl Schedule {
    pub fn is_active(&self, day: NaiveDate) -> bool {
        match self {
            Schedule::Always => true,
            Schedule::Weekdays(days) => days.contains(&day.weekday()),
        }
    }
}

/// One results page to scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub schedule: Schedule,
}

impl Source {
    pub fn always(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            schedule: Schedule::Always,
        }
    }

    pub fn on_days(name: &str, url: &str, days: &[Weekday]) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            schedule: Schedule::Weekdays(days.to_vec()),
        }
    }
}

/// Navigation settings handed to the page fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub user_agent: String,
    pub navigation_timeout: Duration,
    pub wait_until: String,
}

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(60),
            wait_until: "networkidle2".to_string(),
        }
    }
}

/// Opens exclusive rendering sessions. Every opened session must be closed.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn PageSession>>;
}

#[async_trait::async_trait]
pub trait PageSession: Send {
    /// Render `url` and return the resulting HTML.
    async fn content(&mut self, url: &str, opts: &FetchOptions) -> Result<String>;
    async fn close(self: Box<Self>) -> Result<()>;
}
