//! Candidate key matching and referential validation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use vantage_model::{
    ColumnType, RelationshipKind, RelationshipStatus, SourceTable, TableProfile,
};

/// Match rate at or above which a relationship is valid.
pub const VALID_MATCH_RATE: f64 = 0.7;

/// One cleaned table offered to the detector.
#[derive(Debug, Clone, Copy)]
pub struct TableRef<'a> {
    pub name: &'a str,
    pub table: &'a SourceTable,
    pub profile: &'a TableProfile,
    pub created_at: DateTime<Utc>,
}

/// A detected link, oriented from the referencing side to the referenced
/// side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedRelationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
    pub match_rate: f64,
    pub status: RelationshipStatus,
    pub kind: RelationshipKind,
}

/// Detects relationships across the given tables. At most one candidate
/// per table pair survives (the one with the highest match rate), so the
/// result never contains reverse duplicates.
pub fn detect_relationships(tables: &[TableRef<'_>]) -> Vec<DetectedRelationship> {
    let mut detected = Vec::new();
    for i in 0..tables.len() {
        for j in (i + 1)..tables.len() {
            if let Some(best) = best_candidate(&tables[i], &tables[j]) {
                detected.push(best);
            }
        }
    }
    detected
}

fn best_candidate(
    left: &TableRef<'_>,
    right: &TableRef<'_>,
) -> Option<DetectedRelationship> {
    let mut best: Option<DetectedRelationship> = None;
    for left_column in &left.table.columns {
        for right_column in &right.table.columns {
            if !names_match(left_column, right_column, left.name, right.name) {
                continue;
            }
            let left_type = left.profile.column_type(left_column);
            let right_type = right.profile.column_type(right_column);
            if !joinable(left_type, right_type) {
                continue;
            }
            let Some(candidate) = orient_and_rate(left, left_column, right, right_column) else {
                continue;
            };
            let better = match &best {
                Some(current) => candidate.match_rate > current.match_rate,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }
    }
    if let Some(found) = &best {
        debug!(
            source = %found.source_table,
            target = %found.target_table,
            column = %found.source_column,
            match_rate = found.match_rate,
            status = %found.status,
            "relationship candidate"
        );
    }
    best
}

/// Orients a candidate pair and computes the referential match rate from
/// the referencing side into the referenced side.
fn orient_and_rate(
    left: &TableRef<'_>,
    left_column: &str,
    right: &TableRef<'_>,
    right_column: &str,
) -> Option<DetectedRelationship> {
    let left_values = distinct_values(left.table, left_column);
    let right_values = distinct_values(right.table, right_column);
    if left_values.is_empty() || right_values.is_empty() {
        return None;
    }

    let left_unique = left_values.len() == left.table.height();
    let right_unique = right_values.len() == right.table.height();

    // The unique side is the referenced (one) side.
    let (source, source_column, source_values, target, target_column, target_values) =
        if right_unique && !left_unique {
            (left, left_column, &left_values, right, right_column, &right_values)
        } else if left_unique && !right_unique {
            (right, right_column, &right_values, left, left_column, &left_values)
        } else {
            (left, left_column, &left_values, right, right_column, &right_values)
        };

    let overlap = source_values.intersection(target_values).count();
    let match_rate = overlap as f64 / source_values.len() as f64;
    if match_rate == 0.0 {
        return None;
    }
    let status = if match_rate >= VALID_MATCH_RATE {
        RelationshipStatus::Valid
    } else {
        RelationshipStatus::Invalid
    };
    Some(DetectedRelationship {
        source_table: source.name.to_string(),
        source_column: source_column.to_string(),
        target_table: target.name.to_string(),
        target_column: target_column.to_string(),
        match_rate,
        status,
        kind: RelationshipKind::OneToMany,
    })
}

fn distinct_values(table: &SourceTable, column: &str) -> BTreeSet<String> {
    table
        .column_values(column)
        .filter(|cell| !cell.is_null())
        .map(|cell| cell.display())
        .collect()
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Strips id affixes from a normalised column name: `customerid` and
/// `idcustomer` both reduce to `customer`. Returns `None` when no affix is
/// present.
fn strip_id_affix(normalized: &str) -> Option<String> {
    if normalized.len() > 2 {
        if let Some(base) = normalized.strip_suffix("id") {
            return Some(base.to_string());
        }
        if let Some(base) = normalized.strip_prefix("id") {
            return Some(base.to_string());
        }
    }
    None
}

/// Two columns are candidates when their normalised names are equal, when
/// their id-stripped bases agree, or when one is a plain `id` whose table
/// name matches the other column's base.
fn names_match(left: &str, right: &str, left_table: &str, right_table: &str) -> bool {
    let a = normalize(left);
    let b = normalize(right);
    if a == b {
        return true;
    }
    let a_base = strip_id_affix(&a);
    let b_base = strip_id_affix(&b);
    match (&a_base, &b_base) {
        (Some(base), _) if *base == b => return true,
        (_, Some(base)) if *base == a => return true,
        (Some(left_base), Some(right_base)) if left_base == right_base => return true,
        _ => {}
    }
    // sales.customer_id against customers.id style links.
    if b == "id"
        && let Some(base) = a_base
        && normalize(right_table).starts_with(&base)
    {
        return true;
    }
    if a == "id"
        && let Some(base) = b_base
        && normalize(left_table).starts_with(&base)
    {
        return true;
    }
    false
}

/// Detected-type compatibility. Clearly disjoint types fail fast; textual
/// types stay permissive because identifiers are often mixed-form.
fn joinable(left: Option<ColumnType>, right: Option<ColumnType>) -> bool {
    let (Some(a), Some(b)) = (left, right) else {
        return true;
    };
    if a == b {
        return true;
    }
    fn incompatible(x: ColumnType, y: ColumnType) -> bool {
        matches!(
            (x, y),
            (ColumnType::Date, ColumnType::Numeric)
                | (ColumnType::Date, ColumnType::Boolean)
                | (ColumnType::Date, ColumnType::Phone)
                | (ColumnType::Date, ColumnType::Email)
                | (ColumnType::Phone, ColumnType::Numeric)
                | (ColumnType::Phone, ColumnType::Email)
                | (ColumnType::Phone, ColumnType::Boolean)
                | (ColumnType::Email, ColumnType::Numeric)
                | (ColumnType::Email, ColumnType::Boolean)
        )
    }
    !incompatible(a, b) && !incompatible(b, a)
}
