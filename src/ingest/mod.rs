// src/ingest/mod.rs
pub mod blocks;
pub mod extract;
pub mod fetch;
pub mod sources;
pub mod types;

use crate::ingest::types::{FetchOptions, PageFetcher, ResultRecord, Source};
use anyhow::Result;
use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_pages_total", "Result pages fetched and parsed.");
        describe_counter!(
            "scrape_source_errors_total",
            "Sources whose page fetch failed."
        );
        describe_counter!(
            "scrape_records_total",
            "Records extracted from result pages."
        );
        describe_histogram!("scrape_parse_ms", "Page parse time in milliseconds.");
        describe_counter!("retention_runs_total", "Retention deletes issued.");
        describe_counter!(
            "retention_failures_total",
            "Retention deletes rejected by the store."
        );
        describe_counter!("upsert_failures_total", "Batch upserts rejected by the store.");
        describe_gauge!("scrape_last_run_ts", "Unix ts when the scrape job last ran.");
    });
}

/// What one pass over the source list produced.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub records: Vec<ResultRecord>,
    pub attempted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Fetch and parse a single source. Any error here is scoped to this source.
pub async fn scrape_source(
    fetcher: &dyn PageFetcher,
    source: &Source,
    opts: &FetchOptions,
    today: NaiveDate,
) -> Result<Vec<ResultRecord>> {
    let html = fetch::fetch_page(fetcher, &source.url, opts).await?;

    let t0 = std::time::Instant::now();
    let records = blocks::parse_page(&html, &source.name, today);
    histogram!("scrape_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("scrape_pages_total").increment(1);
    counter!("scrape_records_total").increment(records.len() as u64);
    Ok(records)
}

/// Walk the sources in order, one at a time, and collect every record.
/// Sources inactive on `today` are skipped; a failing source contributes
/// nothing and the walk continues.
pub async fn run_once(
    sources: &[Source],
    fetcher: &dyn PageFetcher,
    opts: &FetchOptions,
    today: NaiveDate,
) -> IngestOutcome {
    ensure_metrics_described();

    let mut out = IngestOutcome::default();
    for source in sources {
        if !source.schedule.is_active(today) {
            tracing::debug!(source = %source.name, %today, "source inactive today");
            out.skipped += 1;
            continue;
        }
        out.attempted += 1;
        tracing::info!(source = %source.name, "scraping");

        match scrape_source(fetcher, source, opts, today).await {
            Ok(mut v) => {
                tracing::debug!(source = %source.name, records = v.len(), "source done");
                out.records.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = %source.name, "source error");
                counter!("scrape_source_errors_total").increment(1);
                out.failed += 1;
            }
        }
    }
    out
}
