// tests/block_parser.rs
use bicho_scraper::ingest::blocks::parse_page;
use bicho_scraper::ResultRecord;
use chrono::NaiveDate;

const CARDS_HTML: &str = include_str!("fixtures/cards_table.html");
const ARTICLES_HTML: &str = include_str!("fixtures/articles_list.html");

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
}

fn summary(records: &[ResultRecord]) -> Vec<(&str, &str, &str, u8, &str)> {
    records
        .iter()
        .map(|r| {
            (
                r.draw_time.as_str(),
                r.position.as_str(),
                r.number.as_str(),
                r.group,
                r.label.as_str(),
            )
        })
        .collect()
}

#[test]
fn card_layout_with_tables() {
    let out = parse_page(CARDS_HTML, "LOOK", day());
    assert_eq!(
        summary(&out),
        vec![
            ("09:20", "1º", "4681", 21, "Touro"),
            ("09:20", "2º", "0681", 21, "Touro"),
            ("09:20", "3º", "0000", 25, "Vaca"),
            ("09:20", "4º", "1218", 5, "Cachorro"),
            // 5º has no group and is dropped; 8º and 9º are past the cap
            ("09:20", "6º", "7504", 1, "Avestruz"),
            ("09:20", "7º", "9016", 4, "Borboleta"),
            // label column ahead of the number
            ("14:00", "1º", "5350", 13, "Galo"),
            ("14:00", "2º", "0863", 16, "Leão"),
            ("N/A", "1º", "6025", 7, "Carneiro"),
        ]
    );
    assert!(out.iter().all(|r| r.source == "LOOK" && r.draw_date == day()));
}

#[test]
fn article_layout_with_list_items() {
    let out = parse_page(ARTICLES_HTML, "RIO", day());
    assert_eq!(
        summary(&out),
        vec![
            ("11:20", "1º", "0457", 22, "Tigre"),
            ("11:20", "2º", "8836", 15, "Jacaré"),
            ("11:20", "4º", "0330", 8, "Camelo"),
            ("16:00", "1º", "2099", 24, "Veado"),
        ]
    );
}

#[test]
fn every_number_is_four_digits_and_group_in_range() {
    for html in [CARDS_HTML, ARTICLES_HTML] {
        for r in parse_page(html, "X", day()) {
            assert_eq!(r.number.len(), 4, "{r:?}");
            assert!(r.number.bytes().all(|b| b.is_ascii_digit()), "{r:?}");
            assert!((1..=25).contains(&r.group), "{r:?}");
        }
    }
}
