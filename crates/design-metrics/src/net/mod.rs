//! Node centrality measures.

mod centrality;

pub use centrality::{betweenness_centrality, centrality_table, degree_centrality};
