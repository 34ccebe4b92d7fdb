//! Deterministic unified view SQL synthesis.
//!
//! Tables become nodes and valid relationships undirected edges. The fact
//! table is the node referencing the most other tables, with row count and
//! creation time as tie-breaks. Dimensions attach with LEFT JOINs so fact
//! rows survive failed lookups, and every dimension column is aliased with
//! its table name to avoid collisions. A disconnected relationship graph
//! yields one view per connected component.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use vantage_model::{PipelineError, Result};

/// One cleaned table available to the view generator.
#[derive(Debug, Clone)]
pub struct ViewTable {
    pub name: String,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub created_at: DateTime<Utc>,
}

/// One validated join edge, oriented from the referencing side to the
/// referenced side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinEdge {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

/// One synthesised view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedView {
    pub view_name: String,
    pub sql: String,
    pub fact_table: String,
    pub tables: Vec<String>,
}

/// Rejects manual edge sets that would make a join column appear twice on
/// the same side of a join, or join the same table pair twice.
pub fn validate_manual_edges(edges: &[JoinEdge]) -> Result<()> {
    let mut pairs = BTreeSet::new();
    let mut source_sides = BTreeSet::new();
    for edge in edges {
        let mut pair = [edge.source_table.clone(), edge.target_table.clone()];
        pair.sort();
        if !pairs.insert(pair.clone()) {
            return Err(PipelineError::PreconditionFailed(format!(
                "tables {} and {} are joined more than once",
                pair[0], pair[1]
            )));
        }
        if !source_sides.insert((edge.source_table.clone(), edge.source_column.clone())) {
            return Err(PipelineError::PreconditionFailed(format!(
                "join column {}.{} appears twice on the same side",
                edge.source_table, edge.source_column
            )));
        }
    }
    Ok(())
}

/// Builds one view per connected component of the relationship graph.
///
/// `timestamp_millis` seeds the view names; additional components advance
/// it so every name stays unique within the project.
pub fn build_views(
    tables: &[ViewTable],
    edges: &[JoinEdge],
    timestamp_millis: i64,
) -> Result<Vec<GeneratedView>> {
    if edges.is_empty() {
        return Err(PipelineError::NoRelationshipsFound);
    }
    let table_lookup: BTreeMap<&str, &ViewTable> =
        tables.iter().map(|table| (table.name.as_str(), table)).collect();
    for edge in edges {
        for name in [&edge.source_table, &edge.target_table] {
            if !table_lookup.contains_key(name.as_str()) {
                return Err(PipelineError::NotFound(format!(
                    "cleaned table {name} referenced by a relationship"
                )));
            }
        }
    }

    let components = connected_components(edges);
    let mut views = Vec::with_capacity(components.len());
    for (index, component) in components.into_iter().enumerate() {
        let fact = pick_fact_table(&component, edges, &table_lookup);
        let view_name = format!("unified_view_{}", timestamp_millis + index as i64);
        let view = synthesize_view(view_name, &fact, &component, edges, &table_lookup);
        info!(
            view = %view.view_name,
            fact = %view.fact_table,
            tables = view.tables.len(),
            "unified view generated"
        );
        views.push(view);
    }
    Ok(views)
}

/// Connected components over the undirected edge set, each sorted for
/// deterministic output.
fn connected_components(edges: &[JoinEdge]) -> Vec<Vec<String>> {
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source_table.as_str())
            .or_default()
            .insert(edge.target_table.as_str());
        adjacency
            .entry(edge.target_table.as_str())
            .or_default()
            .insert(edge.source_table.as_str());
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut components = Vec::new();
    for node in adjacency.keys().copied().collect::<Vec<_>>() {
        if seen.contains(node) {
            continue;
        }
        let mut component = Vec::new();
        let mut queue = VecDeque::from([node]);
        seen.insert(node);
        while let Some(current) = queue.pop_front() {
            component.push(current.to_string());
            if let Some(neighbors) = adjacency.get(current) {
                for neighbor in neighbors {
                    if seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}

/// The fact table references the most other tables; ties go to the larger
/// table, then the earliest created, then the name.
fn pick_fact_table(
    component: &[String],
    edges: &[JoinEdge],
    tables: &BTreeMap<&str, &ViewTable>,
) -> String {
    let mut out_degree: BTreeMap<&str, usize> = BTreeMap::new();
    for edge in edges {
        if component.contains(&edge.source_table) {
            *out_degree.entry(edge.source_table.as_str()).or_insert(0) += 1;
        }
    }
    component
        .iter()
        .max_by(|a, b| {
            let degree_a = out_degree.get(a.as_str()).copied().unwrap_or(0);
            let degree_b = out_degree.get(b.as_str()).copied().unwrap_or(0);
            let rows_a = tables.get(a.as_str()).map_or(0, |t| t.row_count);
            let rows_b = tables.get(b.as_str()).map_or(0, |t| t.row_count);
            let created_a = tables.get(a.as_str()).map(|t| t.created_at);
            let created_b = tables.get(b.as_str()).map(|t| t.created_at);
            degree_a
                .cmp(&degree_b)
                .then(rows_a.cmp(&rows_b))
                // Earlier creation wins, so compare reversed.
                .then_with(|| created_b.cmp(&created_a))
                .then_with(|| b.cmp(a))
        })
        .cloned()
        .expect("components are never empty")
}

fn synthesize_view(
    view_name: String,
    fact: &str,
    component: &[String],
    edges: &[JoinEdge],
    tables: &BTreeMap<&str, &ViewTable>,
) -> GeneratedView {
    // Breadth-first join order from the fact table; neighbor order is the
    // sorted component order, so output is deterministic. Edges closing a
    // cycle are skipped.
    let mut joined: Vec<(String, JoinEdge)> = Vec::new();
    let mut visited: BTreeSet<String> = BTreeSet::from([fact.to_string()]);
    let mut queue = VecDeque::from([fact.to_string()]);
    while let Some(current) = queue.pop_front() {
        for edge in edges {
            let other = if edge.source_table == current && component.contains(&edge.target_table)
            {
                edge.target_table.clone()
            } else if edge.target_table == current && component.contains(&edge.source_table) {
                edge.source_table.clone()
            } else {
                continue;
            };
            if visited.insert(other.clone()) {
                joined.push((other.clone(), edge.clone()));
                queue.push_back(other);
            }
        }
    }

    let mut select_items = vec![format!("{fact}.*")];
    for (table_name, edge) in &joined {
        let Some(table) = tables.get(table_name.as_str()) else {
            continue;
        };
        // The dimension's join column duplicates the fact side, so it is
        // dropped from the projection.
        let join_column = if &edge.target_table == table_name {
            &edge.target_column
        } else {
            &edge.source_column
        };
        for column in &table.columns {
            if column == join_column {
                continue;
            }
            select_items.push(format!("{table_name}.{column} AS {table_name}_{column}"));
        }
    }

    let mut sql = format!("CREATE VIEW {view_name} AS\nSELECT {}", select_items.join(",\n       "));
    sql.push_str(&format!("\nFROM {fact}"));
    for (table_name, edge) in &joined {
        sql.push_str(&format!(
            "\nLEFT JOIN {table_name} ON {}.{} = {}.{}",
            edge.source_table, edge.source_column, edge.target_table, edge.target_column
        ));
    }

    let mut all_tables: Vec<String> = component.to_vec();
    all_tables.sort();
    GeneratedView {
        view_name,
        sql,
        fact_table: fact.to_string(),
        tables: all_tables,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, columns: &[&str], rows: usize) -> ViewTable {
        ViewTable {
            name: name.to_string(),
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            row_count: rows,
            created_at: Utc::now(),
        }
    }

    fn edge(source: (&str, &str), target: (&str, &str)) -> JoinEdge {
        JoinEdge {
            source_table: source.0.to_string(),
            source_column: source.1.to_string(),
            target_table: target.0.to_string(),
            target_column: target.1.to_string(),
        }
    }

    fn star_schema() -> (Vec<ViewTable>, Vec<JoinEdge>) {
        let tables = vec![
            table("customers", &["customer_id", "name", "city"], 10),
            table("products", &["product_id", "title", "price"], 10),
            table(
                "sales",
                &["sale_id", "customer_id", "product_id", "amount"],
                20,
            ),
        ];
        let edges = vec![
            edge(("sales", "customer_id"), ("customers", "customer_id")),
            edge(("sales", "product_id"), ("products", "product_id")),
        ];
        (tables, edges)
    }

    #[test]
    fn fact_is_the_most_referencing_table() {
        let (tables, edges) = star_schema();
        let views = build_views(&tables, &edges, 1_700_000_000_000).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].fact_table, "sales");
    }

    #[test]
    fn view_sql_is_deterministic() {
        let (tables, edges) = star_schema();
        let views = build_views(&tables, &edges, 1_700_000_000_000).unwrap();
        insta::assert_snapshot!(views[0].sql, @r"
        CREATE VIEW unified_view_1700000000000 AS
        SELECT sales.*,
               customers.name AS customers_name,
               customers.city AS customers_city,
               products.title AS products_title,
               products.price AS products_price
        FROM sales
        LEFT JOIN customers ON sales.customer_id = customers.customer_id
        LEFT JOIN products ON sales.product_id = products.product_id
        ");
    }

    #[test]
    fn projection_drops_each_dimension_join_column() {
        let (tables, edges) = star_schema();
        let views = build_views(&tables, &edges, 0).unwrap();
        let select_columns = views[0]
            .sql
            .lines()
            .filter(|line| line.contains(" AS "))
            .count();
        // customers and products each contribute all columns but the key.
        assert_eq!(select_columns, 4);
        assert_eq!(views[0].sql.matches("LEFT JOIN").count(), 2);
    }

    #[test]
    fn disconnected_graph_yields_one_view_per_component() {
        let tables = vec![
            table("a", &["x_id", "v"], 5),
            table("b", &["x_id", "w"], 5),
            table("c", &["y_id", "v"], 5),
            table("d", &["y_id", "w"], 5),
        ];
        let edges = vec![
            edge(("a", "x_id"), ("b", "x_id")),
            edge(("c", "y_id"), ("d", "y_id")),
        ];
        let views = build_views(&tables, &edges, 100).unwrap();
        assert_eq!(views.len(), 2);
        assert_ne!(views[0].view_name, views[1].view_name);
    }

    #[test]
    fn empty_edge_set_is_an_error() {
        let err = build_views(&[table("a", &["x"], 1)], &[], 0).unwrap_err();
        assert_eq!(err.tag(), "NoRelationshipsFound");
    }

    #[test]
    fn cycle_edges_are_skipped_not_fatal() {
        let tables = vec![
            table("a", &["k", "va"], 3),
            table("b", &["k", "vb"], 3),
            table("c", &["k", "vc"], 3),
        ];
        let edges = vec![
            edge(("a", "k"), ("b", "k")),
            edge(("b", "k"), ("c", "k")),
            edge(("c", "k"), ("a", "k")),
        ];
        let views = build_views(&tables, &edges, 0).unwrap();
        assert_eq!(views.len(), 1);
        // Three nodes need exactly two joins; the cycle edge is dropped.
        assert_eq!(views[0].sql.matches("LEFT JOIN").count(), 2);
    }

    #[test]
    fn manual_validation_rejects_repeated_join_columns() {
        let edges = vec![
            edge(("s", "customer_id"), ("c", "customer_id")),
            edge(("s", "customer_id"), ("d", "customer_id")),
        ];
        let err = validate_manual_edges(&edges).unwrap_err();
        assert_eq!(err.tag(), "PreconditionFailed");

        let duplicate_pair = vec![
            edge(("s", "a"), ("c", "a")),
            edge(("c", "b"), ("s", "b")),
        ];
        let err = validate_manual_edges(&duplicate_pair).unwrap_err();
        assert_eq!(err.tag(), "PreconditionFailed");
    }
}
