//! Design Metrics
//!
//! Analytics for design-research corpora: effect sizes and reliability for
//! human-subjects studies, keyword extraction and embeddings for texts, and
//! bibliometrics over paper, author and authorship tables.
//!
//! # Features
//!
//! - **Statistics**: Cohen's d, Hedges' g, Cronbach's alpha
//! - **Text**: RAKE keywords, pluggable embedding models, PCA and t-SNE
//! - **Ingestion**: BibTeX, PDF text, CSV/JSON corpus tables
//! - **Bibliometrics**: keyword filters, rule labels, trends, topics,
//!   co-authorship networks, affiliations and in-corpus citations
//! - **Reports**: HTML summaries of captured results
//!
//! # Example
//!
//! ```no_run
//! use design_metrics::{bib, graphs, metrics};
//!
//! fn main() -> anyhow::Result<()> {
//!     let records = bib::load_records(std::path::Path::new("corpus"))?;
//!     let trend = metrics::trend(&records.papers, "year", &["venue"], None)?;
//!     let network = graphs::coauthors(&records.authorships, "paper_id", "author_id")?;
//!
//!     println!("{} trend rows, {} authors", trend.len(), graphs::stats(&network).nodes);
//!     Ok(())
//! }
//! ```

pub mod bib;
pub mod clean;
pub mod config;
pub mod error;
pub mod filter;
pub mod formatters;
pub mod geo;
pub mod graphs;
pub mod hsr;
pub mod io;
pub mod metrics;
pub mod models;
pub mod net;
pub mod refs;
pub mod report;
pub mod stats;
pub mod table;
pub mod text;
pub mod topics;
pub mod utils;
pub mod viz;

pub use config::Config;
pub use error::{MetricsError, MetricsResult};
pub use table::Table;
pub use utils::Matrix;
