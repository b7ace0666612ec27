//! # Scrape job
//! Retention, then scrape, then one batched upsert.
//!
//! Failure policy: store errors (retention or upsert) are logged and
//! reported, and the run still completes; a source error only empties that
//! source's contribution. Only setup errors raised before the job starts
//! make the process exit non-zero.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use metrics::{counter, gauge};

use crate::ingest::{self, types::FetchOptions, types::PageFetcher, types::Source};
use crate::store::{collapse_by_key, ResultStore};

/// Records older than this many days are purged on every run.
pub const RETENTION_DAYS: u64 = 30;

/// Draw dates strictly before this value are expired.
pub fn retention_threshold(today: NaiveDate) -> NaiveDate {
    today - Days::new(RETENTION_DAYS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub today: NaiveDate,
    pub retention_threshold: NaiveDate,
    pub deleted: u64,
    pub retention_ok: bool,
    pub sources_attempted: usize,
    pub sources_skipped: usize,
    pub sources_failed: usize,
    pub extracted: usize,
    /// Rows sent to the store after same-key records were collapsed;
    /// 0 when the upsert failed.
    pub written: usize,
    /// `None` when there was nothing to write.
    pub upsert_ok: Option<bool>,
}

/// Run the whole job once for `today`.
pub async fn run_job(
    store: &dyn ResultStore,
    fetcher: &dyn PageFetcher,
    sources: &[Source],
    opts: &FetchOptions,
    today: NaiveDate,
) -> Result<RunReport> {
    ingest::ensure_metrics_described();
    tracing::info!(%today, sources = sources.len(), "scrape job starting");

    let threshold = retention_threshold(today);
    let (deleted, retention_ok) = match store.delete_older_than(threshold).await {
        Ok(n) => {
            counter!("retention_runs_total").increment(1);
            tracing::info!(%threshold, deleted = n, "retention applied");
            (n, true)
        }
        Err(e) => {
            tracing::error!(error = ?e, %threshold, "retention delete failed; continuing");
            counter!("retention_failures_total").increment(1);
            (0, false)
        }
    };

    let outcome = ingest::run_once(sources, fetcher, opts, today).await;
    tracing::info!(
        total = outcome.records.len(),
        attempted = outcome.attempted,
        failed = outcome.failed,
        skipped = outcome.skipped,
        "scrape finished"
    );

    let batch = collapse_by_key(&outcome.records);
    let (upsert_ok, written) = if batch.is_empty() {
        (None, 0)
    } else {
        match store.upsert(&batch).await {
            Ok(()) => {
                tracing::info!(records = batch.len(), "results saved");
                (Some(true), batch.len())
            }
            Err(e) => {
                tracing::error!(error = ?e, "upsert failed; batch not persisted");
                counter!("upsert_failures_total").increment(1);
                (Some(false), 0)
            }
        }
    };
    gauge!("scrape_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    Ok(RunReport {
        today,
        retention_threshold: threshold,
        deleted,
        retention_ok,
        sources_attempted: outcome.attempted,
        sources_skipped: outcome.skipped,
        sources_failed: outcome.failed,
        extracted: outcome.records.len(),
        written,
        upsert_ok,
    })
}
