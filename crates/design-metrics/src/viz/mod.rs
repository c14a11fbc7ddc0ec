//! Two-dimensional projections of embedding matrices for plotting.

mod embeddings;

pub use embeddings::{LearningRate, TsneInit, TsneOptions, reduce_embeddings_pca, reduce_embeddings_tsne};
