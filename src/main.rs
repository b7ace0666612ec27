//! Scrape job entrypoint: runs one retention + scrape + upsert pass and exits.
//! A non-zero exit status means the run failed before its results were settled.

use bicho_scraper::config::AppConfig;
use bicho_scraper::ingest::fetch::BrowserlessFetcher;
use bicho_scraper::job::{run_job, RunReport};
use bicho_scraper::store::postgrest::PostgrestStore;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON lines with LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bicho_scraper=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn run() -> anyhow::Result<RunReport> {
    let cfg = AppConfig::from_env()?;
    tracing::info!(
        table = %cfg.table,
        sources = cfg.sources.len(),
        browserless = %cfg.browserless_url,
        key_len = cfg.supabase_key.len(),
        "config loaded"
    );

    let store = PostgrestStore::new(&cfg.supabase_url, &cfg.supabase_key, &cfg.table)?;
    let fetcher = BrowserlessFetcher::new(&cfg.browserless_url, cfg.browserless_token.as_deref());
    let today = chrono::Local::now().date_naive();

    run_job(&store, &fetcher, &cfg.sources, &cfg.fetch_options(), today).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(report) => {
            tracing::info!(?report, "scrape job done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}
