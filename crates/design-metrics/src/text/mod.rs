//! Text analytics: keyword extraction, normalisation and embeddings.

mod embedding;
mod keywords;
mod normalize;

pub use embedding::{DEFAULT_MODEL_NAME, EmbeddingModel, HashingEmbedder, specter2_embed};
pub use keywords::{Keyword, RakeOptions, StopwordSet, rake_keywords, rake_keywords_with};
pub use normalize::{lemmatise, lemmatise_tokens, normalise_text, tokenize};
