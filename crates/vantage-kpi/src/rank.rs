//! Priority ranking of feasible KPIs.

use std::cmp::Ordering;

use vantage_model::RankedKpi;

use crate::feasibility::FeasibleKpi;

/// Bonus applied when the user's universe contains a date column.
pub const RECENCY_BONUS: f64 = 0.1;

/// Size of the pre-selection.
pub const TOP_KPI_COUNT: usize = 10;

/// Scores and orders the feasible KPIs.
///
/// `score = priority * (1 + completeness) + recency bonus`; ties fall back
/// to priority, then to library order. Returns the top ten alongside the
/// full ranked feasible list.
pub fn rank_feasible(
    feasible: Vec<FeasibleKpi>,
    has_date_column: bool,
) -> (Vec<RankedKpi>, Vec<RankedKpi>) {
    let bonus = if has_date_column { RECENCY_BONUS } else { 0.0 };

    let mut scored: Vec<(FeasibleKpi, f64)> = feasible
        .into_iter()
        .map(|kpi| {
            let score = f64::from(kpi.definition.priority) * (1.0 + kpi.completeness) + bonus;
            (kpi, score)
        })
        .collect();
    scored.sort_by(|(a, score_a), (b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(Ordering::Equal)
            .then(b.definition.priority.cmp(&a.definition.priority))
            .then(a.library_order.cmp(&b.library_order))
    });

    let ranked: Vec<RankedKpi> = scored
        .into_iter()
        .map(|(kpi, score)| RankedKpi {
            kpi_id: kpi.definition.kpi_id,
            name: kpi.definition.name,
            category: kpi.definition.category,
            priority: kpi.definition.priority,
            formula_expr: kpi.definition.formula_expr,
            completeness: kpi.completeness,
            score,
            resolved_columns: kpi.resolved_columns,
            chart_hint: kpi.definition.chart_hint,
            unit: kpi.definition.unit,
            description: kpi.definition.description,
        })
        .collect();

    let top = ranked.iter().take(TOP_KPI_COUNT).cloned().collect();
    (top, ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use vantage_standards::KpiDefinition;

    fn feasible(id: &str, priority: u8, completeness: f64, library_order: usize) -> FeasibleKpi {
        FeasibleKpi {
            definition: KpiDefinition {
                kpi_id: id.to_string(),
                domain: "test".to_string(),
                name: id.to_string(),
                category: "misc".to_string(),
                priority,
                formula_expr: "SUM(x)".to_string(),
                columns_needed: vec!["x".to_string()],
                time_grain: "month".to_string(),
                aggregation_type: "sum".to_string(),
                description: None,
                unit: None,
                chart_hint: None,
            },
            completeness,
            resolved_columns: BTreeMap::new(),
            library_order,
        }
    }

    #[test]
    fn higher_priority_and_completeness_rank_first() {
        let (top, all) = rank_feasible(
            vec![
                feasible("low", 3, 0.8, 0),
                feasible("high", 5, 1.0, 1),
                feasible("mid", 4, 1.0, 2),
            ],
            false,
        );
        let order: Vec<&str> = all.iter().map(|kpi| kpi.kpi_id.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low"]);
        assert_eq!(top.len(), 3);
        // 5 * (1 + 1.0) = 10.
        assert_eq!(all[0].score, 10.0);
    }

    #[test]
    fn recency_bonus_applies_uniformly() {
        let (_, without) = rank_feasible(vec![feasible("a", 4, 1.0, 0)], false);
        let (_, with) = rank_feasible(vec![feasible("a", 4, 1.0, 0)], true);
        assert_eq!(with[0].score - without[0].score, RECENCY_BONUS);
    }

    #[test]
    fn ties_fall_back_to_library_order() {
        let (_, all) = rank_feasible(
            vec![
                feasible("second", 4, 1.0, 5),
                feasible("first", 4, 1.0, 2),
            ],
            false,
        );
        let order: Vec<&str> = all.iter().map(|kpi| kpi.kpi_id.as_str()).collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[test]
    fn top_list_caps_at_ten() {
        let many: Vec<FeasibleKpi> = (0..15)
            .map(|i| feasible(&format!("kpi{i}"), 4, 1.0, i))
            .collect();
        let (top, all) = rank_feasible(many, false);
        assert_eq!(top.len(), 10);
        assert_eq!(all.len(), 15);
    }
}
