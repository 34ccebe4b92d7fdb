//! KPI feasibility against a resolved column mapping.

use std::collections::BTreeMap;

use vantage_model::InfeasibleKpi;
use vantage_standards::KpiDefinition;

/// Completeness at or above which a KPI is selectable.
pub const FEASIBILITY_THRESHOLD: f64 = 0.8;

/// A feasible KPI before ranking.
#[derive(Debug, Clone)]
pub struct FeasibleKpi {
    pub definition: KpiDefinition,
    pub completeness: f64,
    /// Canonical name to the user column that satisfied it.
    pub resolved_columns: BTreeMap<String, String>,
    /// Position in the domain's library list, for rank tie-breaking.
    pub library_order: usize,
}

/// Splits a domain's KPI list into feasible and infeasible sets.
///
/// Completeness is the fraction of required canonicals present in the
/// mapping. Infeasible KPIs carry a readable reason naming the missing
/// canonicals.
pub fn check_feasibility(
    kpis: &[KpiDefinition],
    mapping: &BTreeMap<String, String>,
) -> (Vec<FeasibleKpi>, Vec<InfeasibleKpi>) {
    let mut feasible = Vec::new();
    let mut infeasible = Vec::new();

    for (library_order, kpi) in kpis.iter().enumerate() {
        let mut resolved = BTreeMap::new();
        let mut missing = Vec::new();
        for canonical in &kpi.columns_needed {
            match mapping.get(canonical) {
                Some(user_column) => {
                    resolved.insert(canonical.clone(), user_column.clone());
                }
                None => missing.push(canonical.clone()),
            }
        }
        let completeness = resolved.len() as f64 / kpi.columns_needed.len() as f64;

        if completeness >= FEASIBILITY_THRESHOLD {
            feasible.push(FeasibleKpi {
                definition: kpi.clone(),
                completeness,
                resolved_columns: resolved,
                library_order,
            });
        } else {
            infeasible.push(InfeasibleKpi {
                kpi_id: kpi.kpi_id.clone(),
                name: kpi.name.clone(),
                completeness,
                reason: format!(
                    "missing required columns: {}",
                    missing.join(", ")
                ),
                missing_columns: missing,
            });
        }
    }

    (feasible, infeasible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpi(id: &str, needs: &[&str]) -> KpiDefinition {
        KpiDefinition {
            kpi_id: id.to_string(),
            domain: "test".to_string(),
            name: id.to_string(),
            category: "misc".to_string(),
            priority: 4,
            formula_expr: "COUNT(*)".to_string(),
            columns_needed: needs.iter().map(|s| (*s).to_string()).collect(),
            time_grain: "month".to_string(),
            aggregation_type: "count".to_string(),
            description: None,
            unit: None,
            chart_hint: None,
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn threshold_is_inclusive_at_four_fifths() {
        let kpis = vec![kpi("four_of_five", &["a", "b", "c", "d", "e"])];
        let resolved = mapping(&[("a", "A"), ("b", "B"), ("c", "C"), ("d", "D")]);
        let (feasible, infeasible) = check_feasibility(&kpis, &resolved);
        assert_eq!(feasible.len(), 1);
        assert!(infeasible.is_empty());
        assert_eq!(feasible[0].completeness, 0.8);
    }

    #[test]
    fn half_complete_is_infeasible_with_reason() {
        let kpis = vec![kpi("halved", &["present", "absent"])];
        let resolved = mapping(&[("present", "Here")]);
        let (feasible, infeasible) = check_feasibility(&kpis, &resolved);
        assert!(feasible.is_empty());
        assert_eq!(infeasible[0].missing_columns, vec!["absent"]);
        assert!(infeasible[0].reason.contains("absent"));
        assert_eq!(infeasible[0].completeness, 0.5);
    }

    #[test]
    fn totals_partition_the_library() {
        let kpis = vec![
            kpi("a", &["x"]),
            kpi("b", &["y"]),
            kpi("c", &["x", "missing"]),
        ];
        let resolved = mapping(&[("x", "X"), ("y", "Y")]);
        let (feasible, infeasible) = check_feasibility(&kpis, &resolved);
        assert_eq!(feasible.len() + infeasible.len(), 3);
    }
}
