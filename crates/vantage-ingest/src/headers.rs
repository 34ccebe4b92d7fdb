//! Header normalisation shared by the tabular parsers.

use std::collections::BTreeMap;

/// Trims headers, fills in names for blank ones, and de-duplicates repeats
/// by suffixing `_2`, `_3` and so on. The detector treats the resulting
/// columns independently.
pub fn dedupe_headers(raw: &[String]) -> Vec<String> {
    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (idx, header) in raw.iter().enumerate() {
        let mut name = header.trim().to_string();
        if name.is_empty() {
            name = format!("column_{}", idx + 1);
        }
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            name = format!("{name}_{count}");
        }
        headers.push(name);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dedupe(raw: &[&str]) -> Vec<String> {
        let owned: Vec<String> = raw.iter().map(|s| (*s).to_string()).collect();
        dedupe_headers(&owned)
    }

    #[test]
    fn duplicates_get_numeric_suffixes() {
        assert_eq!(
            dedupe(&["name", "name", "name"]),
            vec!["name", "name_2", "name_3"]
        );
    }

    #[test]
    fn blank_headers_get_positional_names() {
        assert_eq!(dedupe(&["a", "", "c"]), vec!["a", "column_2", "c"]);
    }

    #[test]
    fn headers_are_trimmed() {
        assert_eq!(dedupe(&[" id ", "name"]), vec!["id", "name"]);
    }
}
