//! User confirmation of extracted KPIs.

use vantage_model::{PipelineError, RankedKpi, Result, SelectedKpi};
use vantage_standards::{KpiLibrary, kpis::MIN_SELECTABLE_PRIORITY};

/// Confirms a subset of the feasible KPIs by id.
///
/// Unknown ids and KPIs below the selectable priority floor are rejected.
pub fn select_kpis(
    library: &KpiLibrary,
    domain: &str,
    feasible: &[RankedKpi],
    selected_ids: &[String],
) -> Result<Vec<SelectedKpi>> {
    let definitions = library
        .for_domain(domain)
        .ok_or_else(|| PipelineError::UnknownDomain(domain.to_string()))?;

    let mut selected = Vec::with_capacity(selected_ids.len());
    for id in selected_ids {
        let Some(ranked) = feasible.iter().find(|kpi| &kpi.kpi_id == id) else {
            return Err(PipelineError::PreconditionFailed(format!(
                "KPI {id} is not in the feasible set"
            )));
        };
        if ranked.priority < MIN_SELECTABLE_PRIORITY {
            return Err(PipelineError::PreconditionFailed(format!(
                "KPI {id} is below the selectable priority floor"
            )));
        }
        let definition = definitions
            .iter()
            .find(|kpi| &kpi.kpi_id == id)
            .ok_or_else(|| PipelineError::NotFound(format!("KPI {id} in the {domain} library")))?;
        selected.push(SelectedKpi {
            kpi_id: ranked.kpi_id.clone(),
            name: ranked.name.clone(),
            formula_expr: ranked.formula_expr.clone(),
            required_columns: definition.columns_needed.clone(),
            resolved_columns: ranked.resolved_columns.clone(),
            priority: ranked.priority,
            category: ranked.category.clone(),
        });
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_kpis;
    use vantage_standards::StandardsRegistry;

    fn saas_extraction() -> (StandardsRegistry, crate::KpiExtraction) {
        let registry = StandardsRegistry::load_default().unwrap();
        let extraction = extract_kpis(
            &registry,
            "saas",
            &[
                "subscription_id".to_string(),
                "customer_id".to_string(),
                "mrr".to_string(),
                "arr".to_string(),
            ],
            false,
        )
        .unwrap();
        (registry, extraction)
    }

    #[test]
    fn selects_feasible_kpis_by_id() {
        let (registry, extraction) = saas_extraction();
        let ids = vec![extraction.feasible[0].kpi_id.clone()];
        let selected = select_kpis(&registry.kpis, "saas", &extraction.feasible, &ids).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].kpi_id, ids[0]);
        assert!(!selected[0].required_columns.is_empty());
    }

    #[test]
    fn rejects_ids_outside_the_feasible_set() {
        let (registry, extraction) = saas_extraction();
        let err = select_kpis(
            &registry.kpis,
            "saas",
            &extraction.feasible,
            &["saas_churn_rate".to_string()],
        )
        .unwrap_err();
        assert_eq!(err.tag(), "PreconditionFailed");
    }
}
