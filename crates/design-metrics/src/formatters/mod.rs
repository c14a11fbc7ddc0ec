//! Output formatting for the command-line front end.

pub mod json;
pub mod markdown;

pub use json::{compact_keywords, compact_paper, compact_stats};
pub use markdown::{
    format_keywords_markdown, format_paper_markdown, format_papers_markdown, format_stats_markdown,
    format_table_markdown,
};
