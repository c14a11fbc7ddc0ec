use std::collections::VecDeque;

use petgraph::graph::{NodeIndex, UnGraph};
use serde_json::Value;

use crate::error::MetricsResult;
use crate::graphs::CoauthorGraph;
use crate::table::Table;

/// Degree divided by `n - 1`, indexed by node. A lone node scores 1.
#[must_use]
pub fn degree_centrality<N, E>(graph: &UnGraph<N, E>) -> Vec<f64> {
    let n = graph.node_count();
    if n <= 1 {
        return vec![1.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    graph
        .node_indices()
        .map(|node| graph.edges(node).count() as f64 * scale)
        .collect()
}

/// Shortest-path betweenness by Brandes' algorithm on unit edge lengths,
/// indexed by node.
///
/// Normalised scores divide by `(n - 1)(n - 2) / 2`, the number of pairs
/// that exclude the node; otherwise each unordered pair is counted once.
#[must_use]
pub fn betweenness_centrality<N, E>(graph: &UnGraph<N, E>, normalized: bool) -> Vec<f64> {
    let n = graph.node_count();
    let mut centrality = vec![0.0; n];

    for source in graph.node_indices() {
        let mut stack: Vec<NodeIndex> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
        let mut paths = vec![0.0f64; n];
        let mut distance = vec![-1i64; n];
        paths[source.index()] = 1.0;
        distance[source.index()] = 0;

        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in graph.neighbors(v) {
                if distance[w.index()] < 0 {
                    distance[w.index()] = distance[v.index()] + 1;
                    queue.push_back(w);
                }
                if distance[w.index()] == distance[v.index()] + 1 {
                    paths[w.index()] += paths[v.index()];
                    predecessors[w.index()].push(v);
                }
            }
        }

        let mut dependency = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w.index()] {
                dependency[v.index()] += paths[v.index()] / paths[w.index()] * (1.0 + dependency[w.index()]);
            }
            if w != source {
                centrality[w.index()] += dependency[w.index()];
            }
        }
    }

    // Every unordered pair was visited from both ends.
    let scale = match n {
        n if normalized && n > 2 => 1.0 / ((n - 1) * (n - 2)) as f64,
        _ => 0.5,
    };
    centrality.iter_mut().for_each(|c| *c *= scale);
    centrality
}

/// `node`, `degree`, `betweenness` for every author, sorted by node.
pub fn centrality_table(graph: &CoauthorGraph, normalized: bool) -> MetricsResult<Table> {
    let g = graph.graph();
    let degree = degree_centrality(g);
    let betweenness = betweenness_centrality(g, normalized);

    let mut rows: Vec<(&str, f64, f64)> = g
        .node_indices()
        .map(|node| (g[node].as_str(), degree[node.index()], betweenness[node.index()]))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut table = Table::new(["node", "degree", "betweenness"]);
    for (node, d, b) in rows {
        table.push_row(vec![Value::String(node.to_string()), Value::from(d), Value::from(b)])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_degree() {
        let graph = UnGraph::<(), ()>::from_edges([(0u32, 1), (0, 2), (0, 3)]);
        let degree = degree_centrality(&graph);
        assert!((degree[0] - 1.0).abs() < 1e-12);
        assert!((degree[1] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_node_degree_is_one() {
        let mut graph = UnGraph::<(), ()>::new_undirected();
        graph.add_node(());
        assert_eq!(degree_centrality(&graph), vec![1.0]);
    }

    #[test]
    fn test_star_betweenness() {
        let graph = UnGraph::<(), ()>::from_edges([(0u32, 1), (0, 2), (0, 3)]);
        let raw = betweenness_centrality(&graph, false);
        assert!((raw[0] - 3.0).abs() < 1e-12);
        let normalized = betweenness_centrality(&graph, true);
        assert!((normalized[0] - 1.0).abs() < 1e-12);
        assert!(normalized[1].abs() < 1e-12);
    }
}
