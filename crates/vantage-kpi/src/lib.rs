//! KPI extraction.
//!
//! A deterministic three-stage algorithm against the per-domain libraries:
//!
//! 1. **Synonym resolution** maps user columns onto canonical names.
//! 2. **Feasibility** checks each KPI's required canonicals against the
//!    mapping; completeness of at least 0.8 makes a KPI selectable.
//! 3. **Ranking** orders the feasible KPIs and returns the top ten as the
//!    pre-selection.
//!
//! The extractor fails only on an unknown domain; an empty feasible set is
//! a normal outcome with a fully populated infeasible list.

pub mod feasibility;
pub mod rank;
pub mod resolve;
pub mod select;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use vantage_model::{InfeasibleKpi, PipelineError, RankedKpi, Result};
use vantage_standards::StandardsRegistry;

pub use feasibility::{FEASIBILITY_THRESHOLD, check_feasibility};
pub use rank::{RECENCY_BONUS, TOP_KPI_COUNT, rank_feasible};
pub use resolve::{Resolution, normalize_column, resolve_columns};
pub use select::select_kpis;

/// Full result of one extraction pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiExtraction {
    pub domain: String,
    pub total_kpis: u64,
    pub feasible_count: u64,
    pub infeasible_count: u64,
    /// Mean completeness across the whole library.
    pub avg_completeness: f64,
    pub top_kpis: Vec<RankedKpi>,
    pub feasible: Vec<RankedKpi>,
    pub infeasible: Vec<InfeasibleKpi>,
    pub unresolved_columns: Vec<String>,
    pub column_mapping: BTreeMap<String, String>,
}

/// Runs the three stages for a confirmed domain over a set of user column
/// names. `has_date_column` enables the recency bonus in ranking.
pub fn extract_kpis(
    registry: &StandardsRegistry,
    domain: &str,
    user_columns: &[String],
    has_date_column: bool,
) -> Result<KpiExtraction> {
    let Some(kpis) = registry.kpis.for_domain(domain) else {
        return Err(PipelineError::UnknownDomain(domain.to_string()));
    };
    let synonyms = registry
        .synonyms
        .for_domain(domain)
        .ok_or_else(|| PipelineError::UnknownDomain(domain.to_string()))?;

    let resolution = resolve_columns(synonyms, user_columns);
    let (feasible_raw, infeasible) = check_feasibility(kpis, &resolution.mapping);
    let (top_kpis, feasible) = rank_feasible(feasible_raw, has_date_column);

    let total = kpis.len() as u64;
    let completeness_sum: f64 = feasible.iter().map(|kpi| kpi.completeness).sum::<f64>()
        + infeasible.iter().map(|kpi| kpi.completeness).sum::<f64>();
    let avg_completeness = if total == 0 {
        0.0
    } else {
        completeness_sum / total as f64
    };

    info!(
        domain,
        total,
        feasible = feasible.len(),
        infeasible = infeasible.len(),
        "KPI extraction complete"
    );

    Ok(KpiExtraction {
        domain: domain.to_string(),
        total_kpis: total,
        feasible_count: feasible.len() as u64,
        infeasible_count: infeasible.len() as u64,
        avg_completeness,
        top_kpis,
        feasible,
        infeasible,
        unresolved_columns: resolution.unresolved,
        column_mapping: resolution.mapping,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn unknown_domain_is_rejected() {
        let registry = StandardsRegistry::load_default().unwrap();
        let err = extract_kpis(&registry, "gaming", &columns(&["score"]), false).unwrap_err();
        assert_eq!(err.tag(), "UnknownDomain");
    }

    #[test]
    fn counts_always_cover_the_library() {
        let registry = StandardsRegistry::load_default().unwrap();
        let extraction =
            extract_kpis(&registry, "retail", &columns(&["nothing_matches"]), false).unwrap();
        assert_eq!(
            extraction.feasible_count + extraction.infeasible_count,
            extraction.total_kpis
        );
        assert_eq!(extraction.feasible_count, 0);
        assert!(!extraction.infeasible.is_empty());
    }

    #[test]
    fn sparse_retail_columns_cap_feasibility() {
        let registry = StandardsRegistry::load_default().unwrap();
        let extraction = extract_kpis(
            &registry,
            "retail",
            &columns(&["OrderID", "CustomerID", "Date"]),
            true,
        )
        .unwrap();
        assert!(extraction.feasible_count <= 3, "{}", extraction.feasible_count);

        let missing_for = |name: &str| -> Vec<String> {
            extraction
                .infeasible
                .iter()
                .find(|kpi| kpi.name == name)
                .unwrap_or_else(|| panic!("{name} should be infeasible"))
                .missing_columns
                .clone()
        };
        assert_eq!(missing_for("Total Revenue"), vec!["order_value"]);
        assert_eq!(missing_for("Average Order Value"), vec!["order_value"]);
        assert_eq!(missing_for("Conversion Rate"), vec!["session_id"]);
    }

    #[test]
    fn top_kpis_are_a_subset_of_feasible() {
        let registry = StandardsRegistry::load_default().unwrap();
        let extraction = extract_kpis(
            &registry,
            "saas",
            &columns(&[
                "subscription_id",
                "customer_id",
                "mrr",
                "arr",
                "churn",
                "plan",
                "signup_date",
            ]),
            true,
        )
        .unwrap();
        assert!(extraction.top_kpis.len() <= 10);
        assert!(extraction.top_kpis.len() <= extraction.feasible.len());
        for top in &extraction.top_kpis {
            assert!(
                extraction.feasible.iter().any(|kpi| kpi.kpi_id == top.kpi_id),
                "{} missing from feasible",
                top.kpi_id
            );
        }
    }
}
