mod common;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::io::Write;

use common::SNAPSHOT;
use doener_ranking::{
    error::{AppError, AppResult},
    models::{SortDirection, SortKey},
    ranking::{FileSnapshot, RankingTable, SnapshotSource, SortState},
};

struct Unreachable;

#[async_trait]
impl SnapshotSource for Unreachable {
    async fn fetch(&self) -> AppResult<String> {
        Err(AppError::Transport("connection refused".to_string()))
    }
}

fn table() -> RankingTable {
    RankingTable::from_records(RankingTable::parse(SNAPSHOT).unwrap())
}

fn names(table: &RankingTable) -> Vec<String> {
    table.visible().map(|record| record.name.clone()).collect()
}

#[test]
fn test_overall_descending_puts_absent_last() {
    let snapshot = r#"[
        {"name": "A", "gesamt": 8.2},
        {"name": "B", "gesamt": null},
        {"name": "C", "gesamt": 9.1}
    ]"#;
    let mut table = RankingTable::from_records(RankingTable::parse(snapshot).unwrap());
    table.sort_by(SortState {
        key: SortKey::Overall,
        direction: SortDirection::Descending,
    });
    assert_eq!(names(&table), vec!["C", "A", "B"]);
}

#[test]
fn test_absent_values_sink_for_every_key_and_direction() {
    // One vendor with every score, one with none, one with placeholders
    let mut full = Map::new();
    let mut dashes = Map::new();
    full.insert("name".to_string(), json!("Voll"));
    dashes.insert("name".to_string(), json!("Strich"));
    for key in SortKey::ALL.iter().filter(|key| **key != SortKey::Name) {
        full.insert(key.as_str().to_string(), json!(5));
        dashes.insert(key.as_str().to_string(), json!("-"));
    }
    let snapshot = Value::Array(vec![
        json!({"name": "Leer"}),
        Value::Object(dashes),
        Value::Object(full),
    ]);
    let mut table =
        RankingTable::from_records(RankingTable::parse(&snapshot.to_string()).unwrap());

    for key in SortKey::ALL.iter().copied().filter(|key| *key != SortKey::Name) {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            table.sort_by(SortState { key, direction });
            assert_eq!(names(&table)[0], "Voll", "{} {:?}", key, direction);
        }
    }
}

#[test]
fn test_double_toggle_restores_order() {
    let mut table = table();
    table.set_sort(SortKey::Price);
    let before = names(&table);
    assert_eq!(table.sort_state(), SortState::for_key(SortKey::Price));

    table.set_sort(SortKey::Price);
    assert_eq!(table.sort_indicator(SortKey::Price), Some(SortDirection::Ascending));
    table.set_sort(SortKey::Price);

    assert_eq!(names(&table), before);
    assert_eq!(table.sort_indicator(SortKey::Price), Some(SortDirection::Descending));
}

#[test]
fn test_price_ascending_keeps_placeholder_last() {
    let mut table = table();
    table.sort_by(SortState {
        key: SortKey::Price,
        direction: SortDirection::Ascending,
    });
    assert_eq!(
        names(&table),
        vec!["alpha döner", "Imbiss Alpha", "Gamma Kebap", "Beta Grill"]
    );
}

#[test]
fn test_filter_matches_case_insensitively_and_clears() {
    let mut table = table();
    table.apply_filter("ALPHA");
    let filtered = names(&table);
    assert_eq!(filtered, vec!["Imbiss Alpha", "alpha döner"]);
    assert!(filtered.iter().all(|name| name.to_lowercase().contains("alpha")));

    table.apply_filter("");
    assert_eq!(names(&table).len(), 4);
    assert_eq!(names(&table), names(&self::table()));
}

#[test]
fn test_filter_keeps_active_sort() {
    let mut table = table();
    table.set_sort(SortKey::Name);
    table.apply_filter("a");
    assert_eq!(
        names(&table),
        vec!["alpha döner", "Beta Grill", "Gamma Kebap", "Imbiss Alpha"]
    );
    assert_eq!(table.filter(), "a");
}

#[test]
fn test_render_formats_overall_with_one_decimal() {
    let table = table();
    let rows = table.render();
    let gamma = rows.iter().find(|row| row.name == "Gamma Kebap").unwrap();
    assert_eq!(gamma.rank, 1);
    let overall = gamma.cells.iter().find(|cell| cell.key == SortKey::Overall).unwrap();
    assert_eq!(overall.text, "9.1");

    let beta = rows.iter().find(|row| row.name == "Beta Grill").unwrap();
    assert_eq!(beta.rank, 4);
    assert!(beta
        .cells
        .iter()
        .filter(|cell| cell.key != SortKey::Name)
        .all(|cell| cell.text == "-"));
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SNAPSHOT.as_bytes()).unwrap();

    let table = RankingTable::load(&FileSnapshot::new(file.path())).await.unwrap();
    assert_eq!(table.records().len(), 4);
    assert_eq!(table.vendor("Imbiss Alpha").unwrap().kommentar.as_deref(), Some("Solide"));
    assert!(table.vendor("Nirgendwo").is_none());
}

#[tokio::test]
async fn test_load_failures_are_load_errors() {
    let transport = RankingTable::load(&Unreachable).await.unwrap_err();
    assert!(matches!(transport, AppError::Transport(_)));
    assert!(transport.is_load_failure());

    let missing = RankingTable::load(&FileSnapshot::new("/nonexistent/doener.json"))
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::Transport(_)));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"<html>not json</html>").unwrap();
    let parse = RankingTable::load(&FileSnapshot::new(file.path())).await.unwrap_err();
    assert!(matches!(parse, AppError::Parse(_)));
    assert!(parse.is_load_failure());
}
