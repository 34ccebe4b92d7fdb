//! KPI definition library.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

const KPI_JSON: &str = include_str!("../data/kpi_library.json");

/// Priority floor for a KPI to be selectable.
pub const MIN_SELECTABLE_PRIORITY: u8 = 3;

/// One KPI record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub kpi_id: String,
    pub domain: String,
    pub name: String,
    pub category: String,
    pub priority: u8,
    pub formula_expr: String,
    /// Canonical column names the formula needs.
    pub columns_needed: Vec<String>,
    pub time_grain: String,
    pub aggregation_type: String,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub chart_hint: Option<String>,
}

/// KPI lists keyed by domain; list order is the library order used for
/// rank tie-breaking.
#[derive(Debug, Clone)]
pub struct KpiLibrary {
    by_domain: BTreeMap<String, Vec<KpiDefinition>>,
}

impl KpiLibrary {
    pub fn load_default() -> Result<Self> {
        let by_domain: BTreeMap<String, Vec<KpiDefinition>> =
            serde_json::from_str(KPI_JSON).map_err(|source| LibraryError::Parse {
                name: "kpi_library",
                source,
            })?;
        let library = Self { by_domain };
        library.validate()?;
        Ok(library)
    }

    pub fn from_map(by_domain: BTreeMap<String, Vec<KpiDefinition>>) -> Result<Self> {
        let library = Self { by_domain };
        library.validate()?;
        Ok(library)
    }

    fn validate(&self) -> Result<()> {
        for (domain, kpis) in &self.by_domain {
            if kpis.is_empty() {
                return Err(LibraryError::Invalid(format!(
                    "domain {domain} has an empty KPI list"
                )));
            }
            let mut seen = std::collections::BTreeSet::new();
            for kpi in kpis {
                if kpi.domain != *domain {
                    return Err(LibraryError::Invalid(format!(
                        "KPI {} is filed under {domain} but declares domain {}",
                        kpi.kpi_id, kpi.domain
                    )));
                }
                if !(1..=5).contains(&kpi.priority) {
                    return Err(LibraryError::Invalid(format!(
                        "KPI {} has priority {} outside 1..=5",
                        kpi.kpi_id, kpi.priority
                    )));
                }
                if kpi.columns_needed.is_empty() {
                    return Err(LibraryError::Invalid(format!(
                        "KPI {} needs no columns",
                        kpi.kpi_id
                    )));
                }
                if !seen.insert(kpi.kpi_id.as_str()) {
                    return Err(LibraryError::Invalid(format!(
                        "duplicate KPI id {}",
                        kpi.kpi_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// KPI list for a domain, in library order.
    pub fn for_domain(&self, domain: &str) -> Option<&[KpiDefinition]> {
        self.by_domain.get(domain).map(Vec::as_slice)
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.by_domain.keys().map(String::as_str)
    }
}
