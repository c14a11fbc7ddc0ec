//! Co-authorship networks built with `petgraph`.

mod louvain;

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::Serialize;
use serde_json::Value;

use crate::error::{MetricsError, MetricsResult};
use crate::models::CommunityMethod;
use crate::table::{Table, compare_values, value_to_text};
pub use louvain::{WeightedGraph, louvain};

/// Edge payload: how often two authors wrote together, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Collaboration {
    /// Number of shared papers.
    pub weight: u32,
    /// Ids of the shared papers.
    pub papers: BTreeSet<String>,
}

/// Undirected co-authorship graph keyed by author name.
#[derive(Debug, Clone, Default)]
pub struct CoauthorGraph {
    graph: UnGraph<String, Collaboration>,
    index: HashMap<String, NodeIndex>,
}

impl CoauthorGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying `petgraph` graph.
    #[must_use]
    pub fn graph(&self) -> &UnGraph<String, Collaboration> {
        &self.graph
    }

    /// Node for `author`, inserting it if needed.
    pub fn add_author(&mut self, author: &str) -> NodeIndex {
        if let Some(&node) = self.index.get(author) {
            return node;
        }
        let node = self.graph.add_node(author.to_string());
        self.index.insert(author.to_string(), node);
        node
    }

    /// Record that `a` and `b` co-wrote `paper`.
    pub fn add_collaboration(&mut self, a: &str, b: &str, paper: &str) {
        let (a, b) = (self.add_author(a), self.add_author(b));
        let edge = match self.graph.find_edge(a, b) {
            Some(edge) => edge,
            None => self.graph.add_edge(a, b, Collaboration::default()),
        };
        let collaboration = &mut self.graph[edge];
        if collaboration.papers.insert(paper.to_string()) {
            collaboration.weight += 1;
        }
    }

    /// Node of `author`, if present.
    #[must_use]
    pub fn node(&self, author: &str) -> Option<NodeIndex> {
        self.index.get(author).copied()
    }

    /// Edge payload between two authors.
    #[must_use]
    pub fn collaboration(&self, a: &str, b: &str) -> Option<&Collaboration> {
        let edge = self.graph.find_edge(self.node(a)?, self.node(b)?)?;
        self.graph.edge_weight(edge)
    }

    /// Number of authors.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct author pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Author names in insertion order.
    pub fn authors(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }
}

/// Build the co-authorship graph from an authorship table.
///
/// Papers are visited in sorted id order and each paper's authors in row
/// order; rows with a missing paper or author are skipped.
pub fn coauthors(authorships: &Table, paper_column: &str, author_column: &str) -> MetricsResult<CoauthorGraph> {
    let paper_index = authorships.require_column(paper_column, "authorship data")?;
    let author_index = authorships.require_column(author_column, "authorship data")?;

    let mut groups: Vec<(Value, Vec<String>)> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for row in authorships.rows() {
        let paper = &row.values()[paper_index];
        let author = &row.values()[author_index];
        if paper.is_null() || author.is_null() {
            continue;
        }
        let slot = *lookup.entry(value_to_text(paper)).or_insert_with(|| {
            groups.push((paper.clone(), Vec::new()));
            groups.len() - 1
        });
        let name = value_to_text(author);
        if !groups[slot].1.contains(&name) {
            groups[slot].1.push(name);
        }
    }
    groups.sort_by(|a, b| compare_values(&a.0, &b.0));

    let mut graph = CoauthorGraph::new();
    for (paper, authors) in &groups {
        let paper = value_to_text(paper);
        if let [single] = authors.as_slice() {
            graph.add_author(single);
        }
        for (i, a) in authors.iter().enumerate() {
            for b in &authors[i + 1..] {
                graph.add_collaboration(a, b, &paper);
            }
        }
    }

    tracing::debug!(
        papers = groups.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Built co-authorship graph"
    );
    Ok(graph)
}

/// Summary statistics of a network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NetworkStats {
    /// Node count.
    pub nodes: usize,
    /// Edge count.
    pub edges: usize,
    /// `2m / (n (n - 1))`; zero below two nodes.
    pub density: f64,
    /// Mean node degree.
    pub average_degree: f64,
    /// Connected components.
    pub components: usize,
    /// Share of nodes in the largest component.
    pub largest_component_fraction: f64,
}

/// Node, edge, density and component statistics; all zero for an empty graph.
#[must_use]
pub fn stats(graph: &CoauthorGraph) -> NetworkStats {
    let g = graph.graph();
    let n = g.node_count();
    if n == 0 {
        return NetworkStats::default();
    }
    let m = g.edge_count();

    let mut sets = UnionFind::<usize>::new(n);
    for edge in g.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }
    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for label in sets.into_labeling() {
        *sizes.entry(label).or_default() += 1;
    }
    let largest = sizes.values().copied().max().unwrap_or(0);

    NetworkStats {
        nodes: n,
        edges: m,
        density: if n > 1 { 2.0 * m as f64 / (n * (n - 1)) as f64 } else { 0.0 },
        average_degree: 2.0 * m as f64 / n as f64,
        components: sizes.len(),
        largest_component_fraction: largest as f64 / n as f64,
    }
}

/// Community detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommunityOptions {
    /// Algorithm.
    pub method: CommunityMethod,
    /// Use edge weights (shared paper counts) instead of unit weights.
    pub weighted: bool,
    /// Modularity resolution.
    pub resolution: f64,
}

impl Default for CommunityOptions {
    fn default() -> Self {
        Self { method: CommunityMethod::Louvain, weighted: true, resolution: 1.0 }
    }
}

/// Partition the graph into communities.
///
/// Returns a `node`, `community` table. Communities are numbered from zero
/// in order of their first node, and rows are sorted by community then node.
pub fn communities(graph: &CoauthorGraph, options: &CommunityOptions) -> MetricsResult<Table> {
    if options.method == CommunityMethod::Leiden {
        return Err(MetricsError::unsupported("Leiden community detection is not supported; use louvain"));
    }
    if !(options.resolution.is_finite() && options.resolution > 0.0) {
        return Err(MetricsError::validation("resolution", "must be a positive number"));
    }

    let g = graph.graph();
    let mut weighted = WeightedGraph::new(g.node_count());
    for edge in g.edge_references() {
        let weight = if options.weighted { f64::from(edge.weight().weight) } else { 1.0 };
        weighted.add_edge(edge.source().index(), edge.target().index(), weight);
    }
    let labels = louvain(&weighted, options.resolution);

    let mut members: Vec<(usize, &str)> = g
        .node_indices()
        .map(|node| (labels[node.index()], g[node].as_str()))
        .collect();
    members.sort_by(|a, b| match a.0.cmp(&b.0) {
        Ordering::Equal => a.1.cmp(b.1),
        other => other,
    });

    let mut table = Table::new(["node", "community"]);
    for (community, node) in members {
        table.push_row(vec![Value::String(node.to_string()), Value::from(community)])?;
    }
    tracing::debug!(
        nodes = table.len(),
        communities = labels.iter().copied().max().map_or(0, |c| c + 1),
        "Detected communities"
    );
    Ok(table)
}
