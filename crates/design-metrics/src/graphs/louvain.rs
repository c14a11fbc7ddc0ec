//! Louvain modularity optimisation.
//!
//! Nodes are visited in index order and a node only moves for a strictly
//! positive gain, so the partition is deterministic for a given graph.

use std::collections::HashMap;

const EPSILON: f64 = 1e-12;

/// Weighted undirected graph with self-loops, as adjacency lists.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    neighbours: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl WeightedGraph {
    /// A graph of `nodes` isolated nodes.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        Self { neighbours: vec![Vec::new(); nodes], self_loops: vec![0.0; nodes] }
    }

    /// Add (or accumulate) an undirected edge.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        if a == b {
            self.self_loops[a] += weight;
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            match self.neighbours[from].iter_mut().find(|(n, _)| *n == to) {
                Some(slot) => slot.1 += weight,
                None => self.neighbours[from].push((to, weight)),
            }
        }
    }

    fn len(&self) -> usize {
        self.neighbours.len()
    }

    /// Weighted degree; a self-loop counts twice.
    fn degree(&self, node: usize) -> f64 {
        self.neighbours[node].iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[node]
    }

    fn total_weight(&self) -> f64 {
        (0..self.len()).map(|n| self.degree(n)).sum::<f64>() / 2.0
    }
}

/// Community label of every node, numbered from zero in order of first
/// appearance.
#[must_use]
pub fn louvain(graph: &WeightedGraph, resolution: f64) -> Vec<usize> {
    let n = graph.len();
    let mut membership: Vec<usize> = (0..n).collect();
    if graph.total_weight() <= 0.0 {
        return membership;
    }

    let mut current = graph.clone();
    loop {
        let (partition, moved) = one_level(&current, resolution);
        if !moved {
            break;
        }
        let (relabelled, communities) = renumber(&partition);
        for label in &mut membership {
            *label = relabelled[*label];
        }
        if communities == current.len() {
            break;
        }
        current = aggregate(&current, &relabelled, communities);
    }

    renumber(&membership).0
}

fn one_level(graph: &WeightedGraph, resolution: f64) -> (Vec<usize>, bool) {
    let n = graph.len();
    let m2 = 2.0 * graph.total_weight();
    let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
    let mut community: Vec<usize> = (0..n).collect();
    let mut totals = degrees.clone();
    let mut moved_any = false;

    loop {
        let mut moved = false;
        for node in 0..n {
            let current = community[node];
            let k = degrees[node];

            let mut links: HashMap<usize, f64> = HashMap::new();
            for &(neighbour, weight) in &graph.neighbours[node] {
                *links.entry(community[neighbour]).or_default() += weight;
            }

            totals[current] -= k;
            let gain = |c: usize, w: f64| w - resolution * totals[c] * k / m2;
            let mut best = current;
            let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));

            let mut candidates: Vec<(usize, f64)> = links.into_iter().collect();
            candidates.sort_by_key(|(c, _)| *c);
            for (c, w) in candidates {
                let g = gain(c, w);
                if g > best_gain + EPSILON {
                    best = c;
                    best_gain = g;
                }
            }

            totals[best] += k;
            if best != current {
                community[node] = best;
                moved = true;
                moved_any = true;
            }
        }
        if !moved {
            break;
        }
    }

    (community, moved_any)
}

fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let relabelled = labels
        .iter()
        .map(|l| {
            let next = mapping.len();
            *mapping.entry(*l).or_insert(next)
        })
        .collect();
    (relabelled, mapping.len())
}

fn aggregate(graph: &WeightedGraph, community: &[usize], communities: usize) -> WeightedGraph {
    let mut next = WeightedGraph::new(communities);
    for node in 0..graph.len() {
        let c = community[node];
        next.self_loops[c] += graph.self_loops[node];
        for &(neighbour, weight) in &graph.neighbours[node] {
            // Each undirected edge is seen from both ends.
            if node < neighbour {
                next.add_edge(c, community[neighbour], weight);
            }
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_triangles_joined_by_bridge() {
        let mut graph = WeightedGraph::new(6);
        for (a, b) in [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
            graph.add_edge(a, b, 1.0);
        }
        let labels = louvain(&graph, 1.0);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_edgeless_graph_keeps_singletons() {
        let labels = louvain(&WeightedGraph::new(3), 1.0);
        assert_eq!(labels, vec![0, 1, 2]);
    }
}
