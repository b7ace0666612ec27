//! # Field Extractor
//! Recovers position / number / group / label from one result row.
//!
//! A row is first flattened into a [`RowView`] (plain trimmed text), then an
//! ordered list of layout strategies runs over it; the first strategy that
//! recognizes the row wins. Column order is not trusted: the table strategy
//! looks for a cell *shaped* like a number (3-4 digits) instead of reading a
//! fixed offset, and takes the group from the cell right after it.

use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::ingest::types::RowFields;

const CELL_SELECTOR: &str = "td";
const PRIZE_SELECTOR: &str = ".prize";
const NUMBER_SELECTOR: &str = ".number";
const ANIMAL_SELECTOR: &str = ".animal-name";

/// Minimum cell count for a row to be read as a table row.
const MIN_TABLE_CELLS: usize = 4;

/// Text content of a single row, detached from the DOM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowView {
    pub cells: Vec<String>,
    pub prize: Option<String>,
    pub number: Option<String>,
    pub animal: Option<String>,
}

impl RowView {
    /// Flatten a `<tr>` or list item into its text parts.
    pub fn from_element(row: ElementRef<'_>) -> Self {
        let cells = row.select(sel_cell()).map(element_text).collect();
        let first = |sel: &Selector| row.select(sel).next().map(element_text);
        Self {
            cells,
            prize: first(sel_prize()),
            number: first(sel_number()),
            animal: first(sel_animal()),
        }
    }

    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn list_item(prize: Option<&str>, number: Option<&str>, animal: Option<&str>) -> Self {
        Self {
            cells: Vec::new(),
            prize: prize.map(str::to_string),
            number: number.map(str::to_string),
            animal: animal.map(str::to_string),
        }
    }
}

/// Fields as found on the page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawFields {
    position: String,
    number: String,
    group: Option<String>,
    label: String,
}

type Strategy = fn(&RowView) -> Option<RawFields>;

/// Layout strategies in priority order.
const STRATEGIES: &[Strategy] = &[table_layout, list_item_layout];

/// Extract one record fragment from a row, or `None` when the row does not
/// carry a complete, valid result. `index` is the row's 0-based position
/// inside its block.
pub fn extract_row(row: &RowView, index: usize) -> Option<RowFields> {
    let raw = STRATEGIES.iter().find_map(|strategy| strategy(row))?;
    normalize(raw, index)
}

/// `>= 4` cells: first cell is the position, the first 3-4 digit cell is the
/// number, a 1-2 digit cell right after it is the group, last cell is the label.
fn table_layout(row: &RowView) -> Option<RawFields> {
    if row.cells.len() < MIN_TABLE_CELLS {
        return None;
    }
    let num_idx = row
        .cells
        .iter()
        .position(|c| is_number_token(&strip_punctuation(c)))?;
    let group = row
        .cells
        .get(num_idx + 1)
        .map(|c| strip_punctuation(c))
        .filter(|g| is_group_token(g));

    Some(RawFields {
        position: row.cells[0].trim().to_string(),
        number: strip_punctuation(&row.cells[num_idx]),
        group,
        label: row.cells.last().map(|s| s.trim().to_string()).unwrap_or_default(),
    })
}

/// Card/list layout: only considered when the row has no table cells.
fn list_item_layout(row: &RowView) -> Option<RawFields> {
    if !row.cells.is_empty() {
        return None;
    }
    let number = strip_punctuation(row.number.as_deref()?);
    let (label, group) = split_animal(row.animal.as_deref()?);

    Some(RawFields {
        position: row.prize.as_deref().unwrap_or_default().trim().to_string(),
        number,
        group,
        label,
    })
}

/// `"Tigre (22)"` -> `("Tigre", Some("22"))`.
fn split_animal(text: &str) -> (String, Option<String>) {
    static RE_GROUP: OnceCell<Regex> = OnceCell::new();
    let re = RE_GROUP.get_or_init(|| Regex::new(r"\(\s*(\d{1,2})\s*\)").unwrap());

    let group = re.captures(text).map(|c| c[1].to_string());
    let label = re.replace_all(text, " ");
    let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
    (label, group)
}

fn normalize(raw: RawFields, index: usize) -> Option<RowFields> {
    // empty-string check only: "000" is a real number
    let digits = strip_punctuation(&raw.number);
    if digits.is_empty() || !is_number_token(&digits) {
        return None;
    }
    let group: u8 = raw.group.as_deref()?.parse().ok()?;
    if !(1..=25).contains(&group) {
        return None;
    }
    // no letters: the last column is a number or group, not a label
    if !is_label_text(&raw.label) {
        return None;
    }

    let position = if raw.position.is_empty() {
        format!("{}º", index + 1)
    } else {
        raw.position
    };

    Some(RowFields {
        position,
        number: format!("{digits:0>4}"),
        group,
        label: raw.label,
    })
}

/// Drop separators and other punctuation (`"1.234"` -> `"1234"`).
pub fn strip_punctuation(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

fn is_number_token(s: &str) -> bool {
    (3..=4).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// A label has to carry at least one letter.
fn is_label_text(s: &str) -> bool {
    s.chars().any(char::is_alphabetic)
}

fn is_group_token(s: &str) -> bool {
    (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Trimmed text of an element with inner whitespace collapsed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn sel_cell() -> &'static Selector {
    static S: OnceCell<Selector> = OnceCell::new();
    S.get_or_init(|| Selector::parse(CELL_SELECTOR).unwrap())
}

fn sel_prize() -> &'static Selector {
    static S: OnceCell<Selector> = OnceCell::new();
    S.get_or_init(|| Selector::parse(PRIZE_SELECTOR).unwrap())
}

fn sel_number() -> &'static Selector {
    static S: OnceCell<Selector> = OnceCell::new();
    S.get_or_init(|| Selector::parse(NUMBER_SELECTOR).unwrap())
}

fn sel_animal() -> &'static Selector {
    static S: OnceCell<Selector> = OnceCell::new();
    S.get_or_init(|| Selector::parse(ANIMAL_SELECTOR).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn fields(position: &str, number: &str, group: u8, label: &str) -> RowFields {
        RowFields {
            position: position.into(),
            number: number.into(),
            group,
            label: label.into(),
        }
    }

    #[test]
    fn table_row_in_canonical_order() {
        let row = RowView::from_cells(["1º", "4681", "21", "Touro"]);
        assert_eq!(extract_row(&row, 0), Some(fields("1º", "4681", 21, "Touro")));
    }

    #[test]
    fn three_digit_number_is_zero_padded() {
        let row = RowView::from_cells(["2º", "681", "21", "Touro"]);
        assert_eq!(extract_row(&row, 1).unwrap().number, "0681");
    }

    #[test]
    fn number_is_found_away_from_the_second_column() {
        // position, label, number, group
        let row = RowView::from_cells(["3º", "Vaca", "9.925", "25", "Vaca"]);
        assert_eq!(extract_row(&row, 2), Some(fields("3º", "9925", 25, "Vaca")));
    }

    #[test]
    fn group_before_number_is_not_taken_for_position() {
        // group sits left of the number, so there is no group after it
        let row = RowView::from_cells(["1º", "05", "1218", "Cachorro"]);
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn all_zero_number_is_kept() {
        let row = RowView::from_cells(["5º", "000", "25", "Vaca"]);
        assert_eq!(extract_row(&row, 4).unwrap().number, "0000");
    }

    #[test]
    fn short_number_drops_row() {
        let row = RowView::from_cells(["1º", "0", "1", "Avestruz"]);
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn missing_group_drops_row() {
        let row = RowView::from_cells(["1º", "4681", "-", "Touro"]);
        assert_eq!(extract_row(&row, 0), None);
        let row = RowView::from_cells(["1º", "4681", "", "Touro"]);
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn out_of_range_group_drops_row() {
        let row = RowView::from_cells(["1º", "4681", "26", "?"]);
        assert_eq!(extract_row(&row, 0), None);
        let row = RowView::from_cells(["1º", "4681", "0", "?"]);
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn too_few_cells_yield_nothing() {
        let row = RowView::from_cells(["1º", "4681", "21"]);
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn empty_position_falls_back_to_row_index() {
        let row = RowView::from_cells(["", "4681", "21", "Touro"]);
        assert_eq!(extract_row(&row, 2).unwrap().position, "3º");
    }

    #[test]
    fn list_item_with_parenthesized_group() {
        let row = RowView::list_item(Some("1º"), Some("0.681"), Some("Tigre (22)"));
        assert_eq!(extract_row(&row, 0), Some(fields("1º", "0681", 22, "Tigre")));
    }

    #[test]
    fn group_in_last_column_is_not_taken_for_label() {
        let row = RowView::from_cells(["1º", "Touro", "4681", "21"]);
        assert_eq!(extract_row(&row, 0), None);
        let row = RowView::from_cells(["1º", "4681", "21", "-"]);
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn list_item_with_only_a_group_is_dropped() {
        let row = RowView::list_item(Some("1º"), Some("4681"), Some("(21)"));
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn list_item_without_group_is_dropped() {
        let row = RowView::list_item(Some("1º"), Some("4681"), Some("Tigre"));
        assert_eq!(extract_row(&row, 0), None);
    }

    #[test]
    fn split_animal_keeps_label_text() {
        assert_eq!(
            split_animal("  Jacaré ( 15 ) "),
            ("Jacaré".to_string(), Some("15".to_string()))
        );
        assert_eq!(split_animal("Leão"), ("Leão".to_string(), None));
    }

    #[test]
    fn row_view_reads_dom_row() {
        let html = Html::parse_fragment(
            "<table><tbody><tr><td> 1º </td><td>1.218</td><td>05</td><td>Cachorro\n </td></tr></tbody></table>",
        );
        let tr = html.select(&Selector::parse("tr").unwrap()).next().unwrap();
        let view = RowView::from_element(tr);
        assert_eq!(view.cells, vec!["1º", "1.218", "05", "Cachorro"]);
        assert_eq!(extract_row(&view, 0), Some(fields("1º", "1218", 5, "Cachorro")));
    }

    #[test]
    fn row_view_reads_list_item() {
        let html = Html::parse_fragment(
            r#"<div class="result-group-item"><span class="prize">2º</span><span class="number">7 504</span><span class="animal-name">Galo (13)</span></div>"#,
        );
        let item = html
            .select(&Selector::parse(".result-group-item").unwrap())
            .next()
            .unwrap();
        let view = RowView::from_element(item);
        assert!(view.cells.is_empty());
        assert_eq!(extract_row(&view, 1), Some(fields("2º", "7504", 13, "Galo")));
    }
}
