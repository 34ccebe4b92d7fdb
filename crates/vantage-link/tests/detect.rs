#![allow(missing_docs)]

use chrono::Utc;

use vantage_ingest::profile_table;
use vantage_link::{TableRef, detect_relationships};
use vantage_model::{CellValue, Record, RelationshipStatus, SourceTable, TableProfile};

fn table_from(columns: &[&str], rows: &[Vec<&str>]) -> SourceTable {
    let mut table = SourceTable::new(columns.iter().map(|c| (*c).to_string()).collect());
    for (idx, row) in rows.iter().enumerate() {
        let mut record = Record::new((idx as u64) + 1);
        for (pos, column) in columns.iter().enumerate() {
            record.set(*column, CellValue::from_raw(row[pos]));
        }
        table.push_row(record);
    }
    table
}

fn customers() -> SourceTable {
    let rows: Vec<Vec<String>> = (1..=10)
        .map(|i| vec![format!("C{i}"), format!("Customer {i}"), format!("City {i}")])
        .collect();
    let borrowed: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect();
    table_from(&["customer_id", "name", "city"], &borrowed)
}

fn products() -> SourceTable {
    let rows: Vec<Vec<String>> = (1..=10)
        .map(|i| vec![format!("P{i}"), format!("Product {i}"), format!("{i}.50")])
        .collect();
    let borrowed: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect();
    table_from(&["product_id", "title", "price"], &borrowed)
}

fn sales() -> SourceTable {
    let rows: Vec<Vec<String>> = (1..=20)
        .map(|i| {
            vec![
                format!("S{i}"),
                format!("C{}", (i % 10) + 1),
                format!("P{}", (i % 10) + 1),
                format!("{}", i * 10),
            ]
        })
        .collect();
    let borrowed: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect();
    table_from(&["sale_id", "customer_id", "product_id", "amount"], &borrowed)
}

struct Fixture {
    name: &'static str,
    table: SourceTable,
    profile: TableProfile,
}

fn fixture(name: &'static str, table: SourceTable) -> Fixture {
    let profile = profile_table(&table);
    Fixture {
        name,
        table,
        profile,
    }
}

#[test]
fn star_schema_yields_exactly_two_valid_relationships() {
    let fixtures = [
        fixture("customers", customers()),
        fixture("products", products()),
        fixture("sales", sales()),
    ];
    let refs: Vec<TableRef<'_>> = fixtures
        .iter()
        .map(|f| TableRef {
            name: f.name,
            table: &f.table,
            profile: &f.profile,
            created_at: Utc::now(),
        })
        .collect();

    let detected = detect_relationships(&refs);
    assert_eq!(detected.len(), 2, "{detected:?}");
    for relationship in &detected {
        assert_eq!(relationship.match_rate, 1.0);
        assert_eq!(relationship.status, RelationshipStatus::Valid);
        assert_eq!(relationship.source_table, "sales");
    }
    let targets: Vec<&str> = detected
        .iter()
        .map(|r| r.target_table.as_str())
        .collect();
    assert!(targets.contains(&"customers"));
    assert!(targets.contains(&"products"));
}

#[test]
fn near_miss_match_rate_is_still_valid_at_seventy_percent() {
    // Nine of ten distinct source values resolve: 0.9 is valid.
    let parent_rows: Vec<Vec<String>> = (1..=9).map(|i| vec![format!("K{i}")]).collect();
    let parent_borrowed: Vec<Vec<&str>> = parent_rows
        .iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect();
    let parent = table_from(&["key"], &parent_borrowed);

    let child_rows: Vec<Vec<String>> = (1..=10)
        .flat_map(|i| {
            let key = format!("K{i}");
            vec![vec![key.clone(), "x".to_string()], vec![key, "y".to_string()]]
        })
        .collect();
    let child_borrowed: Vec<Vec<&str>> = child_rows
        .iter()
        .map(|row| row.iter().map(String::as_str).collect())
        .collect();
    let child = table_from(&["key", "note"], &child_borrowed);

    let fixtures = [fixture("parent", parent), fixture("child", child)];
    let refs: Vec<TableRef<'_>> = fixtures
        .iter()
        .map(|f| TableRef {
            name: f.name,
            table: &f.table,
            profile: &f.profile,
            created_at: Utc::now(),
        })
        .collect();
    let detected = detect_relationships(&refs);
    assert_eq!(detected.len(), 1);
    let relationship = &detected[0];
    assert!(relationship.match_rate < 1.0);
    assert!(relationship.match_rate >= 0.7);
    assert_eq!(relationship.status, RelationshipStatus::Valid);
    assert_eq!(relationship.source_table, "child");
    assert_eq!(relationship.target_table, "parent");
}

#[test]
fn unrelated_tables_produce_nothing() {
    let left = table_from(&["alpha"], &[vec!["1"], vec!["2"]]);
    let right = table_from(&["beta"], &[vec!["9"], vec!["8"]]);
    let fixtures = [fixture("left", left), fixture("right", right)];
    let refs: Vec<TableRef<'_>> = fixtures
        .iter()
        .map(|f| TableRef {
            name: f.name,
            table: &f.table,
            profile: &f.profile,
            created_at: Utc::now(),
        })
        .collect();
    assert!(detect_relationships(&refs).is_empty());
}
