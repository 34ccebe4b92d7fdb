//! Per-domain synonym maps.
//!
//! Entries are ordered: resolution walks canonicals in declaration order and
//! the first canonical to claim a user column wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

const SYNONYMS_JSON: &str = include_str!("../data/synonyms.json");

/// One canonical column name with its accepted synonyms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub canonical: String,
    pub synonyms: Vec<String>,
}

/// Ordered synonym entries keyed by domain.
#[derive(Debug, Clone)]
pub struct SynonymLibrary {
    by_domain: BTreeMap<String, Vec<SynonymEntry>>,
}

impl SynonymLibrary {
    pub fn load_default() -> Result<Self> {
        let by_domain: BTreeMap<String, Vec<SynonymEntry>> =
            serde_json::from_str(SYNONYMS_JSON).map_err(|source| LibraryError::Parse {
                name: "synonyms",
                source,
            })?;
        let library = Self { by_domain };
        library.validate()?;
        Ok(library)
    }

    pub fn from_map(by_domain: BTreeMap<String, Vec<SynonymEntry>>) -> Result<Self> {
        let library = Self { by_domain };
        library.validate()?;
        Ok(library)
    }

    fn validate(&self) -> Result<()> {
        for (domain, entries) in &self.by_domain {
            let mut seen = std::collections::BTreeSet::new();
            for entry in entries {
                if !seen.insert(entry.canonical.as_str()) {
                    return Err(LibraryError::Invalid(format!(
                        "duplicate canonical {} in domain {domain}",
                        entry.canonical
                    )));
                }
            }
        }
        Ok(())
    }

    /// Synonym entries for a domain, in declaration order.
    pub fn for_domain(&self, domain: &str) -> Option<&[SynonymEntry]> {
        self.by_domain.get(domain).map(Vec::as_slice)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.by_domain.keys().map(String::as_str)
    }
}
