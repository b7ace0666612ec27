//! # Block Parser
//! Splits a results page into per-draw blocks and turns their rows into
//! [`ResultRecord`]s.
//!
//! Block containers are located with an ordered list of selectors; the first
//! selector that matches anything is used for the whole page. Each block's
//! heading provides the draw time, and only its first [`MAX_ROWS_PER_BLOCK`]
//! rows are read.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::ingest::extract::{element_text, extract_row, RowView};
use crate::ingest::types::{ResultRecord, UNKNOWN_DRAW_TIME};

/// Block container selectors, most specific layout first.
const BLOCK_SELECTORS: &[&str] = &["div.col-lg-4.mb-4", "article.result"];
const HEADING_SELECTOR: &str = "h5.card-title, header h3";
const ROW_SELECTOR: &str = "table tbody tr, .result-group-item";

/// Prizes beyond the 7th are never published as results.
pub const MAX_ROWS_PER_BLOCK: usize = 7;

/// Parse a full page. `source` and `draw_date` are stamped on every record.
pub fn parse_page(html: &str, source: &str, draw_date: NaiveDate) -> Vec<ResultRecord> {
    let document = Html::parse_document(html);
    let blocks = find_blocks(&document);
    if blocks.is_empty() {
        tracing::debug!(source, "no result blocks on page");
    }

    let mut out = Vec::new();
    for block in blocks {
        let heading = block
            .select(sel_heading())
            .next()
            .map(element_text)
            .unwrap_or_default();
        let draw_time = draw_time_from_heading(&heading);

        for (i, row) in block
            .select(sel_row())
            .take(MAX_ROWS_PER_BLOCK)
            .enumerate()
        {
            let view = RowView::from_element(row);
            if let Some(fields) = extract_row(&view, i) {
                out.push(ResultRecord::from_fields(source, &draw_time, draw_date, fields));
            }
        }
    }
    out
}

/// First selector with at least one match wins; layouts are never mixed.
fn find_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    sel_blocks()
        .iter()
        .map(|sel| document.select(sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default()
}

/// `"Sorteio 09:30"` -> `"09:30"`, `"Resultado 14h"` -> `"14:00"`,
/// anything else -> [`UNKNOWN_DRAW_TIME`].
pub fn draw_time_from_heading(heading: &str) -> String {
    static RE_HHMM: OnceCell<Regex> = OnceCell::new();
    static RE_HH: OnceCell<Regex> = OnceCell::new();
    let re_hhmm = RE_HHMM.get_or_init(|| Regex::new(r"(\d{2}:\d{2})").unwrap());
    let re_hh = RE_HH.get_or_init(|| Regex::new(r"(?i)(\d{2})h").unwrap());

    if let Some(c) = re_hhmm.captures(heading) {
        return c[1].to_string();
    }
    if let Some(c) = re_hh.captures(heading) {
        return format!("{}:00", &c[1]);
    }
    UNKNOWN_DRAW_TIME.to_string()
}

fn sel_blocks() -> &'static [Selector] {
    static S: OnceCell<Vec<Selector>> = OnceCell::new();
    S.get_or_init(|| {
        BLOCK_SELECTORS
            .iter()
            .map(|s| Selector::parse(s).unwrap())
            .collect()
    })
}

fn sel_heading() -> &'static Selector {
    static S: OnceCell<Selector> = OnceCell::new();
    S.get_or_init(|| Selector::parse(HEADING_SELECTOR).unwrap())
}

fn sel_row() -> &'static Selector {
    static S: OnceCell<Selector> = OnceCell::new();
    S.get_or_init(|| Selector::parse(ROW_SELECTOR).unwrap())
}
