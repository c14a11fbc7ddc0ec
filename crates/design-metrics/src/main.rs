//! Design Metrics - command-line entry point.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use design_metrics::config::{Config, defaults};
use design_metrics::formatters::{json as json_fmt, markdown};
use design_metrics::models::{ExportFormat, Paper, ResponseFormat};
use design_metrics::report::{ReportRegistry, notebook};
use design_metrics::text::{RakeOptions, rake_keywords_with};
use design_metrics::{Table, bib, geo, graphs, hsr, io, metrics, net, stats, topics};

#[derive(Parser, Debug)]
#[command(name = "design-metrics")]
#[command(about = "Analytics for design-research corpora")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(long, global = true, default_value = "markdown")]
    format: ResponseFormat,

    /// TOML configuration file (defaults to DESIGN_METRICS_* variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract RAKE keywords from text or a text file
    Keywords {
        /// Text to analyse
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// File whose contents are analysed
        #[arg(long)]
        file: Option<PathBuf>,
        /// Number of phrases (defaults to the configured value)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Parse a BibTeX file and list or export its entries
    Bibtex {
        /// BibTeX file
        path: PathBuf,
        /// Re-export entries in a reference manager format
        #[arg(long)]
        export: Option<ExportFormat>,
        /// Include abstracts in exports
        #[arg(long)]
        include_abstract: bool,
    },
    /// Standardised mean difference between two samples
    EffectSize {
        /// First sample, comma-separated
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
        a: Vec<f64>,
        /// Second sample, comma-separated
        #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
        b: Vec<f64>,
    },
    /// Cronbach's alpha of survey items in a CSV file
    Alpha {
        /// CSV with one row per participant
        path: PathBuf,
        /// Item columns (defaults to every column)
        #[arg(long, value_delimiter = ',')]
        items: Vec<String>,
    },
    /// Co-authorship network statistics from an authorship CSV or JSON table
    Network {
        /// Authorship table
        path: PathBuf,
        /// Paper id column
        #[arg(long, default_value = "paper_id")]
        paper_column: String,
        /// Author column
        #[arg(long, default_value = "author_id")]
        author_column: String,
        /// Authors listed by degree centrality
        #[arg(long, default_value = "5")]
        top: usize,
    },
    /// Extract text from a PDF file or every PDF under a directory
    Pdf {
        /// File or directory
        path: PathBuf,
    },
    /// Render an HTML report for a corpus directory
    Report {
        /// Directory with papers, authors and authorships tables
        corpus: PathBuf,
        /// Output HTML file
        #[arg(long, default_value = "report.html")]
        out: PathBuf,
        /// Report title
        #[arg(long, default_value = "corpus")]
        name: String,
    },
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries command output.
    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr)).init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), command = ?cli.command, "Starting design-metrics");

    let config = match &cli.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::from_env()?,
    };

    let output = run(cli.command, cli.format, &config)
        .inspect_err(|e| tracing::error!(error = %e, "Command failed"))?;
    println!("{output}");
    Ok(())
}

fn run(command: Command, format: ResponseFormat, config: &Config) -> anyhow::Result<String> {
    match command {
        Command::Keywords { text, file, top_k } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => {
                    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
                }
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            let options = RakeOptions { top_k: top_k.unwrap_or(config.rake_top_k), ..RakeOptions::default() };
            let keywords = rake_keywords_with(&text, &options);
            Ok(match format {
                ResponseFormat::Markdown => markdown::format_keywords_markdown(&keywords),
                ResponseFormat::Json => render_json(&json_fmt::compact_keywords(&keywords))?,
            })
        }
        Command::Bibtex { path, export, include_abstract } => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let entries = io::parse_bibtex_entries(&text)?;
            let papers: Vec<Paper> = entries.iter().map(io::BibEntry::to_paper).collect();
            if let Some(export) = export {
                return Ok(io::export_papers(&papers, export, include_abstract)?);
            }
            Ok(match format {
                ResponseFormat::Markdown => markdown::format_papers_markdown(&papers),
                ResponseFormat::Json => {
                    render_json(&papers.iter().map(json_fmt::compact_paper).collect::<serde_json::Value>())?
                }
            })
        }
        Command::EffectSize { a, b } => {
            let d = stats::cohen_d(&a, &b)?;
            let g = stats::hedges_g(&a, &b)?;
            Ok(match format {
                ResponseFormat::Markdown => {
                    format!("# Effect size\n\n**Cohen's d**: {d:.4} | **Hedges' g**: {g:.4}\n")
                }
                ResponseFormat::Json => render_json(&json!({ "cohen_d": d, "hedges_g": g }))?,
            })
        }
        Command::Alpha { path, items } => {
            let table = Table::read_csv(&path)?;
            let columns: Vec<&str> = if items.is_empty() {
                table.columns().iter().map(String::as_str).collect()
            } else {
                items.iter().map(String::as_str).collect()
            };
            let alpha = hsr::cronbach_alpha_table(&table, &columns)?;
            Ok(match format {
                ResponseFormat::Markdown => format!(
                    "# Reliability\n\n**Cronbach's alpha**: {alpha:.4} ({} items, {} participants)\n",
                    columns.len(),
                    table.len()
                ),
                ResponseFormat::Json => {
                    render_json(&json!({ "cronbach_alpha": alpha, "items": columns, "participants": table.len() }))?
                }
            })
        }
        Command::Network { path, paper_column, author_column, top } => {
            let table = read_table(&path)?;
            let network = graphs::coauthors(&table, &paper_column, &author_column)?;
            let summary = graphs::stats(&network);
            let ranking = top_degree(&network, top);
            Ok(match format {
                ResponseFormat::Markdown => {
                    let mut output = markdown::format_stats_markdown(&summary);
                    if !ranking.is_empty() {
                        let centrality = net::centrality_table(&network, true)?;
                        let mut rows = centrality.empty_like();
                        for (node, _) in &ranking {
                            if let Some(row) = centrality.rows().find(|row| row.text("node") == *node) {
                                rows.push_row(row.values().to_vec())?;
                            }
                        }
                        output.push_str("\n## Most connected authors\n\n");
                        output.push_str(&markdown::format_table_markdown(&rows));
                    }
                    output
                }
                ResponseFormat::Json => render_json(&json_fmt::compact_stats(&summary, &ranking))?,
            })
        }
        Command::Pdf { path } => {
            let texts = if path.is_dir() {
                io::iter_pdf_texts(&path)?
            } else {
                vec![(path.clone(), io::extract_text_from_pdf(&path)?)]
            };
            Ok(match format {
                ResponseFormat::Markdown => texts
                    .iter()
                    .map(|(path, text)| format!("## {}\n\n{text}\n", path.display()))
                    .collect::<Vec<_>>()
                    .join("\n---\n\n"),
                ResponseFormat::Json => render_json(
                    &texts
                        .iter()
                        .map(|(path, text)| json!({ "path": path.display().to_string(), "text": text }))
                        .collect::<serde_json::Value>(),
                )?,
            })
        }
        Command::Report { corpus, out, name } => {
            let records = bib::load_records(&corpus)?;
            let mut registry = ReportRegistry::new();
            registry.capture("trend", metrics::trend(&records.papers, "year", &[], None)?);
            let network = graphs::coauthors(&records.authorships, "paper_id", "author_id")?;
            registry.capture("coauthor_stats", serde_json::to_value(graphs::stats(&network))?);
            let texts: Vec<String> = records
                .papers
                .rows()
                .map(|row| format!("{} {}", row.text("title"), row.text("abstract")).trim().to_string())
                .filter(|text| !text.is_empty())
                .collect();
            if !texts.is_empty() {
                let options = topics::TopicOptions {
                    k: config.topic_count,
                    max_features: config.topic_max_features,
                    random_state: config.random_state,
                    ..topics::TopicOptions::default()
                };
                match topics::fit(&texts, &options) {
                    Ok(model) => registry.capture("topics", topics::describe(&model, defaults::TOPIC_TOP_N)?),
                    Err(e) => tracing::warn!(error = %e, "Skipping topics section"),
                }
            }
            if records.papers.has_column("affiliations") {
                let options = geo::AffiliationOptions {
                    separator: config.affiliation_separator.clone(),
                    ..geo::AffiliationOptions::default()
                };
                let affiliations = geo::parse_affiliations(&records.papers, &options)?;
                if !affiliations.is_empty() {
                    registry.capture("geo", geo::aggregate(&affiliations, "country")?);
                }
            }
            let path = notebook(&name).render(&registry, &out, None)?;
            Ok(match format {
                ResponseFormat::Markdown => format!("Report written to {}", path.display()),
                ResponseFormat::Json => render_json(&json!({ "path": path.display().to_string() }))?,
            })
        }
    }
}

fn read_table(path: &Path) -> anyhow::Result<Table> {
    let table = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Table::read_json(path)?,
        _ => Table::read_csv(path)?,
    };
    Ok(table)
}

/// The `top` authors by degree centrality, ties broken by name.
fn top_degree(network: &graphs::CoauthorGraph, top: usize) -> Vec<(String, f64)> {
    let graph = network.graph();
    let degree = net::degree_centrality(graph);
    let mut ranking: Vec<(String, f64)> =
        graph.node_indices().map(|node| (graph[node].clone(), degree[node.index()])).collect();
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranking.truncate(top);
    ranking
}

fn render_json(value: &serde_json::Value) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
