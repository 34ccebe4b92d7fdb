//! Synonym resolution of user columns onto canonical names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vantage_standards::SynonymEntry;

/// Outcome of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Canonical name to the original user column that satisfied it.
    pub mapping: BTreeMap<String, String>,
    /// User columns no canonical claimed, in input order.
    pub unresolved: Vec<String>,
}

/// Normalises a column name: lowercase with underscores, dashes and
/// whitespace stripped.
pub fn normalize_column(name: &str) -> String {
    name.chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_' && *ch != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Walks the canonical entries in declaration order; each canonical claims
/// the first user column whose normalised form equals the canonical or one
/// of its synonyms. A user column is claimed at most once, and resolution
/// is idempotent over the produced mapping.
pub fn resolve_columns(entries: &[SynonymEntry], user_columns: &[String]) -> Resolution {
    let normalized: Vec<String> = user_columns.iter().map(|c| normalize_column(c)).collect();
    let mut claimed = vec![false; user_columns.len()];
    let mut mapping = BTreeMap::new();

    for entry in entries {
        let mut accepted: Vec<String> = vec![normalize_column(&entry.canonical)];
        accepted.extend(entry.synonyms.iter().map(|s| normalize_column(s)));

        let matched = normalized.iter().enumerate().find(|(idx, column)| {
            !claimed[*idx] && accepted.iter().any(|candidate| candidate == *column)
        });
        if let Some((idx, _)) = matched {
            claimed[idx] = true;
            mapping.insert(entry.canonical.clone(), user_columns[idx].clone());
        }
    }

    let unresolved = user_columns
        .iter()
        .zip(claimed.iter())
        .filter(|(_, claimed)| !**claimed)
        .map(|(column, _)| column.clone())
        .collect();

    Resolution {
        mapping,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(canonical: &str, synonyms: &[&str]) -> SynonymEntry {
        SynonymEntry {
            canonical: canonical.to_string(),
            synonyms: synonyms.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn canonical_matches_by_normalised_equality() {
        let entries = vec![entry("order_id", &["order_number"])];
        let resolution = resolve_columns(&entries, &columns(&["OrderID", "Junk"]));
        assert_eq!(
            resolution.mapping.get("order_id"),
            Some(&"OrderID".to_string())
        );
        assert_eq!(resolution.unresolved, vec!["Junk"]);
    }

    #[test]
    fn synonyms_match_too() {
        let entries = vec![entry("order_date", &["date", "purchase_date"])];
        let resolution = resolve_columns(&entries, &columns(&["Date"]));
        assert_eq!(
            resolution.mapping.get("order_date"),
            Some(&"Date".to_string())
        );
        assert!(resolution.unresolved.is_empty());
    }

    #[test]
    fn first_match_wins_and_columns_are_claimed_once() {
        let entries = vec![
            entry("customer_id", &["user_id"]),
            entry("account_id", &["user_id"]),
        ];
        let resolution = resolve_columns(&entries, &columns(&["user_id"]));
        assert_eq!(
            resolution.mapping.get("customer_id"),
            Some(&"user_id".to_string())
        );
        assert_eq!(resolution.mapping.get("account_id"), None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let entries = vec![
            entry("order_id", &["order_number"]),
            entry("order_value", &["amount", "total"]),
        ];
        let user = columns(&["order_number", "Amount", "misc"]);
        let first = resolve_columns(&entries, &user);
        let second = resolve_columns(&entries, &user);
        assert_eq!(first, second);
    }

    #[test]
    fn dashes_and_spaces_normalise_away() {
        assert_eq!(normalize_column("Signup-Date"), "signupdate");
        assert_eq!(normalize_column("signup date"), "signupdate");
        assert_eq!(normalize_column("SIGNUP_DATE"), "signupdate");
    }
}
