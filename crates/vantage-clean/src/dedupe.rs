//! Row deduplication.
//!
//! Two rows are equal when their key-column values compare equal after
//! normalisation: string-like columns (text, categorical, identifiers,
//! emails) fold case and trim, everything else compares exactly. Keys are
//! hashed with SHA-256 over a canonical encoding, which is collision-safe
//! for any observed input.

use serde_json::json;
use sha2::{Digest, Sha256};

use vantage_model::{
    CleaningOperation, ColumnType, Record, Result, SourceTable, TableProfile,
};

use crate::stage::{CleaningStage, StageContext, StageOutcome};

pub struct DedupStage;

impl CleaningStage for DedupStage {
    fn operation(&self) -> CleaningOperation {
        CleaningOperation::Deduplication
    }

    fn config_snapshot(&self, ctx: &StageContext<'_>) -> serde_json::Value {
        json!({ "deduplication": ctx.config.deduplication })
    }

    fn apply(&self, table: &mut SourceTable, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::default();
        let settings = &ctx.config.deduplication;
        if !settings.enabled || table.height() == 0 {
            return Ok(outcome);
        }
        let keys: Vec<String> = if settings.key_columns.is_empty() {
            table.columns.clone()
        } else {
            settings
                .key_columns
                .iter()
                .filter(|key| table.columns.contains(key))
                .cloned()
                .collect()
        };
        if keys.is_empty() {
            return Ok(outcome);
        }

        let before = table.height() as u64;
        let mut seen = std::collections::BTreeSet::new();
        // keep_first: the earliest row by row number survives.
        let mut keep = Vec::with_capacity(table.height());
        for row in &table.rows {
            match row_signature(row, &keys, ctx.profile) {
                Some(key) => keep.push(seen.insert(key)),
                // A fully empty key tuple never counts as a duplicate.
                None => keep.push(true),
            }
        }
        let mut keep_iter = keep.into_iter();
        table.rows.retain(|_| keep_iter.next().unwrap_or(false));
        table.renumber();
        outcome.rows_removed = before - table.height() as u64;
        Ok(outcome)
    }
}

fn folds_case(column_type: Option<ColumnType>) -> bool {
    match column_type {
        Some(t) => {
            // Identifier and email columns compare case-insensitively as
            // well as plain text and categories.
            t.is_text_like() || matches!(t, ColumnType::TextId | ColumnType::Email)
        }
        // Unknown columns default to the text comparison.
        None => true,
    }
}

/// Hash of one row's normalised key tuple, or `None` when every key value
/// is empty.
pub fn row_signature(row: &Record, keys: &[String], profile: &TableProfile) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();
    let mut any_value = false;
    for key in keys {
        let raw = row.cell(key).display();
        let normalized = if folds_case(profile.column_type(key)) {
            raw.trim().to_lowercase()
        } else {
            raw
        };
        if !normalized.is_empty() {
            any_value = true;
        }
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        hasher.update(normalized.as_bytes());
        hasher.update([0x1fu8]);
    }
    any_value.then(|| hasher.finalize().into())
}

/// Hex form of a row key, for diagnostics.
pub fn row_key_hex(row: &Record, keys: &[String], profile: &TableProfile) -> Option<String> {
    row_signature(row, keys, profile).map(hex::encode)
}
