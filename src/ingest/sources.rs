// src/ingest/sources.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::Weekday;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::{Schedule, Source};

pub const ENV_SOURCES_PATH: &str = "SOURCES_PATH";

/// The boards scraped by default, in scrape order.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::always("LOOK", "https://bichocerto.com/resultados/lk/look/"),
        Source::always("LOTEP", "https://bichocerto.com/resultados/pb/pt-lotep/"),
        Source::always("LOTECE", "https://bichocerto.com/resultados/lce/lotece/"),
        Source::always("LBR", "https://bichocerto.com/resultados/lbr/brasilia/"),
        Source::always("MALUCA", "https://bichocerto.com/resultados/mba/maluquinha-bahia/"),
        // Federal draws happen Wednesdays and Saturdays only
        Source::on_days(
            "FEDERAL",
            "https://bichocerto.com/resultados/fd/loteria-federal/",
            &[Weekday::Wed, Weekday::Sat],
        ),
        Source::always("RIO", "https://bichocerto.com/resultados/rj/para-todos/"),
        Source::always("SP/BAND", "https://bichocerto.com/resultados/sp/pt-band/"),
        Source::always("NACIONAL", "https://bichocerto.com/resultados/ln/loteria-nacional/"),
    ]
}

/// Load a source list from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// $SOURCES_PATH when set, the built-in list otherwise.
pub fn load_sources_default() -> Result<Vec<Source>> {
    match std::env::var(ENV_SOURCES_PATH) {
        Ok(p) => {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("SOURCES_PATH points to non-existent path"));
            }
            load_sources_from(&pb)
        }
        Err(_) => Ok(default_sources()),
    }
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    name: String,
    url: String,
    /// Weekday names; absent or empty means "every day".
    #[serde(default)]
    days: Vec<String>,
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<Source>> {
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return build_sources(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return build_sources(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return build_sources(v);
        }
    }
    Err(anyhow!("unsupported sources file format"))
}

fn parse_toml(s: &str) -> Result<Vec<SourceEntry>> {
    #[derive(Deserialize)]
    struct TomlSources {
        sources: Vec<SourceEntry>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(v.sources)
}

fn parse_json(s: &str) -> Result<Vec<SourceEntry>> {
    Ok(serde_json::from_str(s)?)
}

fn build_sources(entries: Vec<SourceEntry>) -> Result<Vec<Source>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for e in entries {
        let name = e.name.trim().to_string();
        let url = e.url.trim().to_string();
        if name.is_empty() || url.is_empty() {
            bail!("source entry needs both name and url");
        }
        if !seen.insert(name.clone()) {
            bail!("duplicate source name: {name}");
        }
        let schedule = if e.days.is_empty() {
            Schedule::Always
        } else {
            let days = e
                .days
                .iter()
                .map(|d| {
                    d.trim()
                        .parse::<Weekday>()
                        .map_err(|_| anyhow!("unknown weekday {d:?} for source {name}"))
                })
                .collect::<Result<Vec<_>>>()?;
            Schedule::Weekdays(days)
        };
        out.push(Source { name, url, schedule });
    }
    if out.is_empty() {
        bail!("sources file lists no sources");
    }
    Ok(out)
}
