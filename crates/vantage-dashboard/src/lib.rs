//! Dashboard assembly.
//!
//! The assembler turns confirmed KPIs into a presentation plan: one KPI
//! card per selection plus typed chart specifications. Chart kinds come
//! from the library's `chart_hint` first and otherwise fall back to shape
//! rules over the resolved columns' detected types. No aggregation happens
//! here; grouping and sums are pushed to the query layer through the view
//! SQL.

use chrono::Utc;
use tracing::debug;

use vantage_model::entities::{
    ChartSpec, DashboardConfig, DashboardMetadata, DatasetSpec, KpiCardSpec,
};
use vantage_model::{ChartKind, ColumnType, RankedKpi, SelectedKpi, TableProfile};

/// Fixed six-colour palette applied to chart datasets.
pub const PALETTE: [&str; 6] = [
    "#01B8AA", "#374649", "#FD625E", "#F2C80F", "#5F6B6D", "#8AD4EB",
];

/// Categorical columns up to this cardinality render as pie shares.
const PIE_MAX_CARDINALITY: u64 = 6;

/// Everything the assembler needs for one dashboard.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInput<'a> {
    pub domain: &'a str,
    /// Unified view feeding the dashboard, when one exists.
    pub source_view: Option<&'a str>,
    pub selected: &'a [SelectedKpi],
    /// Ranked descriptors carrying chart hints and units, keyed by id via
    /// lookup.
    pub ranked: &'a [RankedKpi],
    /// Profile of the table the resolved columns come from.
    pub profile: &'a TableProfile,
}

/// Assembles the dashboard configuration document.
pub fn assemble_dashboard(input: &AssemblyInput<'_>) -> DashboardConfig {
    let mut cards = Vec::with_capacity(input.selected.len());
    let mut charts = Vec::new();

    for kpi in input.selected {
        let ranked = input.ranked.iter().find(|r| r.kpi_id == kpi.kpi_id);
        cards.push(KpiCardSpec {
            kpi_id: kpi.kpi_id.clone(),
            title: kpi.name.clone(),
            formula_expr: kpi.formula_expr.clone(),
            unit: ranked.and_then(|r| r.unit.clone()),
        });

        let hint = ranked.and_then(|r| r.chart_hint.as_deref());
        let kind = chart_kind(hint, kpi, input.profile);
        debug!(kpi_id = %kpi.kpi_id, kind = %kind, "chart kind chosen");
        if kind == ChartKind::KpiCard {
            continue;
        }
        charts.push(build_chart(kind, kpi, input.profile));
    }

    DashboardConfig {
        kpis: cards,
        charts,
        metadata: DashboardMetadata {
            generated_at: Utc::now(),
            domain: input.domain.to_string(),
            source_view: input.source_view.map(str::to_string),
        },
    }
}

/// Resolved user columns of a KPI split by shape role.
struct ColumnShape {
    date: Vec<String>,
    numeric: Vec<String>,
    category: Vec<String>,
    category_max_cardinality: u64,
}

fn column_shape(kpi: &SelectedKpi, profile: &TableProfile) -> ColumnShape {
    let mut shape = ColumnShape {
        date: Vec::new(),
        numeric: Vec::new(),
        category: Vec::new(),
        category_max_cardinality: 0,
    };
    for user_column in kpi.resolved_columns.values() {
        match profile.column_type(user_column) {
            Some(ColumnType::Date) => shape.date.push(user_column.clone()),
            Some(ColumnType::Numeric) => shape.numeric.push(user_column.clone()),
            Some(ColumnType::Categorical) | Some(ColumnType::Text) => {
                let cardinality = profile
                    .get(user_column)
                    .map(|p| p.unique_count)
                    .unwrap_or(u64::MAX);
                shape.category_max_cardinality =
                    shape.category_max_cardinality.max(cardinality);
                shape.category.push(user_column.clone());
            }
            _ => {}
        }
    }
    shape
}

fn chart_kind(hint: Option<&str>, kpi: &SelectedKpi, profile: &TableProfile) -> ChartKind {
    match hint {
        Some("timeseries") => return ChartKind::Line,
        Some("distribution") | Some("category") => return ChartKind::Bar,
        Some("share") => return ChartKind::Pie,
        _ => {}
    }
    let shape = column_shape(kpi, profile);
    if !shape.date.is_empty() && !shape.numeric.is_empty() {
        ChartKind::Line
    } else if !shape.category.is_empty() && !shape.numeric.is_empty() {
        if shape.category_max_cardinality <= PIE_MAX_CARDINALITY {
            ChartKind::Pie
        } else {
            ChartKind::Bar
        }
    } else if shape.numeric.len() == 1 {
        ChartKind::KpiCard
    } else if shape.numeric.len() == 2 {
        ChartKind::Scatter
    } else {
        ChartKind::KpiCard
    }
}

fn build_chart(kind: ChartKind, kpi: &SelectedKpi, profile: &TableProfile) -> ChartSpec {
    let shape = column_shape(kpi, profile);
    let labels = if !shape.date.is_empty() {
        shape.date.clone()
    } else {
        shape.category.clone()
    };
    let value_columns: Vec<String> = if shape.numeric.is_empty() {
        // Count-style charts draw the label column itself.
        kpi.resolved_columns.values().cloned().collect()
    } else {
        shape.numeric.clone()
    };
    let datasets = value_columns
        .into_iter()
        .enumerate()
        .map(|(idx, column)| DatasetSpec {
            label: column.clone(),
            source_column: column,
            color: PALETTE[idx % PALETTE.len()].to_string(),
        })
        .collect();
    ChartSpec {
        kind,
        title: kpi.name.clone(),
        labels,
        datasets,
    }
}
