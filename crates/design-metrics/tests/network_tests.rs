//! Co-authorship graphs, communities and centrality.

use design_metrics::Table;
use design_metrics::graphs::{CoauthorGraph, CommunityOptions, coauthors, communities, stats};
use design_metrics::net::{betweenness_centrality, centrality_table, degree_centrality};
use petgraph::graph::UnGraph;
use serde_json::{Value, json};

fn cycle(n: u32) -> UnGraph<(), ()> {
    UnGraph::from_edges((0..n).map(|i| (i, (i + 1) % n)))
}

fn path(n: u32) -> UnGraph<(), ()> {
    UnGraph::from_edges((0..n - 1).map(|i| (i, i + 1)))
}

fn make_authorships(rows: &[(&str, &str)]) -> Table {
    Table::from_rows(
        ["paper_id", "author_id"],
        rows.iter().map(|(p, a)| vec![json!(p), json!(a)]).collect(),
    )
    .unwrap()
}

/// Two triangles of authors joined by one shared paper.
fn two_groups() -> CoauthorGraph {
    let table = make_authorships(&[
        ("P1", "A"),
        ("P1", "B"),
        ("P1", "C"),
        ("P2", "A"),
        ("P2", "B"),
        ("P3", "D"),
        ("P3", "E"),
        ("P3", "F"),
        ("P4", "E"),
        ("P4", "F"),
        ("P5", "C"),
        ("P5", "D"),
    ]);
    coauthors(&table, "paper_id", "author_id").unwrap()
}

// =============================================================================
// Centrality
// =============================================================================

#[test]
fn test_cycle_degree_centrality_is_one() {
    let degree = degree_centrality(&cycle(3));
    assert_eq!(degree.len(), 3);
    assert!(degree.iter().all(|d| (d - 1.0).abs() < 1e-12));
}

#[test]
fn test_path_betweenness_center_dominates() {
    let betweenness = betweenness_centrality(&path(3), true);
    assert!(betweenness[1] > betweenness[0]);
    assert!((betweenness[1] - 1.0).abs() < 1e-12);
    assert!(betweenness[0].abs() < 1e-12);
}

#[test]
fn test_path_betweenness_unnormalized() {
    let betweenness = betweenness_centrality(&path(5), false);
    // Pairs (i, j) with i < node < j.
    assert!((betweenness[2] - 4.0).abs() < 1e-12);
    assert!((betweenness[1] - 3.0).abs() < 1e-12);
}

#[test]
fn test_cycle_betweenness_splits_paths() {
    let betweenness = betweenness_centrality(&cycle(4), false);
    // Opposite corners have two shortest paths, each through one node.
    assert!(betweenness.iter().all(|b| (b - 0.5).abs() < 1e-12));
}

#[test]
fn test_empty_graph_centrality() {
    let graph = UnGraph::<(), ()>::new_undirected();
    assert!(degree_centrality(&graph).is_empty());
    assert!(betweenness_centrality(&graph, true).is_empty());
}

#[test]
fn test_centrality_table_sorted_by_node() {
    let table = centrality_table(&two_groups(), true).unwrap();
    assert_eq!(table.len(), 6);
    let nodes: Vec<String> = table.rows().map(|r| r.text("node")).collect();
    assert_eq!(nodes, ["A", "B", "C", "D", "E", "F"]);
}

// =============================================================================
// Graph construction and statistics
// =============================================================================

#[test]
fn test_coauthor_weights_count_shared_papers() {
    let graph = two_groups();
    assert_eq!(graph.collaboration("A", "B").unwrap().weight, 2);
    assert_eq!(graph.collaboration("B", "A").unwrap().weight, 2);
    assert_eq!(graph.collaboration("C", "D").unwrap().weight, 1);
    assert!(graph.collaboration("A", "F").is_none());
}

#[test]
fn test_duplicate_authorship_rows_count_once() {
    let table = make_authorships(&[("P1", "A"), ("P1", "A"), ("P1", "B")]);
    let graph = coauthors(&table, "paper_id", "author_id").unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.collaboration("A", "B").unwrap().weight, 1);
}

#[test]
fn test_stats_on_known_network() {
    let s = stats(&two_groups());
    assert_eq!(s.nodes, 6);
    assert_eq!(s.edges, 7);
    assert_eq!(s.components, 1);
    assert!((s.density - 7.0 / 15.0).abs() < 1e-12);
    assert!((s.average_degree - 14.0 / 6.0).abs() < 1e-12);
    assert!((s.largest_component_fraction - 1.0).abs() < 1e-12);
}

#[test]
fn test_stats_serializes() {
    let value = serde_json::to_value(stats(&two_groups())).unwrap();
    assert_eq!(value["nodes"], 6);
    assert!(value.get("largest_component_fraction").is_some());
}

// =============================================================================
// Communities
// =============================================================================

#[test]
fn test_louvain_finds_two_groups() {
    let table = communities(&two_groups(), &CommunityOptions::default()).unwrap();
    assert_eq!(table.columns(), &["node".to_string(), "community".to_string()]);
    let label = |node: &str| -> Value {
        table.rows().find(|r| r.text("node") == node).and_then(|r| r.get("community").cloned()).unwrap()
    };
    assert_eq!(label("A"), label("B"));
    assert_eq!(label("B"), label("C"));
    assert_eq!(label("D"), label("E"));
    assert_eq!(label("E"), label("F"));
    assert_ne!(label("A"), label("D"));
}

#[test]
fn test_unweighted_louvain_is_deterministic() {
    let options = CommunityOptions { weighted: false, ..CommunityOptions::default() };
    let first = communities(&two_groups(), &options).unwrap();
    let second = communities(&two_groups(), &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_invalid_resolution() {
    let options = CommunityOptions { resolution: 0.0, ..CommunityOptions::default() };
    assert!(communities(&two_groups(), &options).is_err());
}
