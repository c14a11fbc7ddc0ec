//! Embedding reducers.

use design_metrics::Matrix;
use design_metrics::viz::{LearningRate, TsneInit, TsneOptions, reduce_embeddings_pca, reduce_embeddings_tsne};

/// Two well separated clusters of five points each in four dimensions.
fn clusters() -> Matrix {
    let mut rows = Vec::new();
    for i in 0..5 {
        let jitter = f64::from(i) * 0.01;
        rows.push(vec![jitter, 0.0, 0.02 - jitter, 0.0]);
        rows.push(vec![10.0 + jitter, 10.0, 10.0, 10.0 - jitter]);
    }
    Matrix::from_rows(&rows).unwrap()
}

fn distance(m: &Matrix, a: usize, b: usize) -> f64 {
    m.row(a).iter().zip(m.row(b)).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

// =============================================================================
// PCA
// =============================================================================

#[test]
fn test_pca_preserves_row_count() {
    let reduced = reduce_embeddings_pca(&clusters(), 2).unwrap();
    assert_eq!(reduced.shape(), (10, 2));
}

#[test]
fn test_pca_output_is_centred() {
    let reduced = reduce_embeddings_pca(&clusters(), 2).unwrap();
    for mean in reduced.column_means() {
        assert!(mean.abs() < 1e-9);
    }
}

#[test]
fn test_pca_first_component_separates_clusters() {
    let reduced = reduce_embeddings_pca(&clusters(), 1).unwrap();
    let even: Vec<f64> = (0..10).step_by(2).map(|r| reduced.get(r, 0)).collect();
    let odd: Vec<f64> = (1..10).step_by(2).map(|r| reduced.get(r, 0)).collect();
    let signs_even = even.iter().all(|v| *v > 0.0) || even.iter().all(|v| *v < 0.0);
    assert!(signs_even);
    assert!(even[0].signum() != odd[0].signum());
}

#[test]
fn test_pca_is_deterministic() {
    let a = reduce_embeddings_pca(&clusters(), 2).unwrap();
    let b = reduce_embeddings_pca(&clusters(), 2).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_pca_rejects_bad_component_counts() {
    assert!(reduce_embeddings_pca(&clusters(), 0).is_err());
    assert!(reduce_embeddings_pca(&clusters(), 5).is_err());
}

#[test]
fn test_pca_rejects_non_finite() {
    let data = Matrix::from_rows(&[[1.0, f64::INFINITY], [0.0, 1.0]]).unwrap();
    assert!(reduce_embeddings_pca(&data, 1).is_err());
}

// =============================================================================
// t-SNE
// =============================================================================

fn small_options() -> TsneOptions {
    TsneOptions { perplexity: 3.0, n_iter: 300, ..TsneOptions::default() }
}

#[test]
fn test_tsne_output_shape() {
    let reduced = reduce_embeddings_tsne(&clusters(), &small_options()).unwrap();
    assert_eq!(reduced.shape(), (10, 2));
    assert!(reduced.as_slice().iter().all(|v| v.is_finite()));
}

#[test]
fn test_tsne_keeps_clusters_apart() {
    let reduced = reduce_embeddings_tsne(&clusters(), &small_options()).unwrap();
    let within = distance(&reduced, 0, 2);
    let between = distance(&reduced, 0, 1);
    assert!(between > within);
}

#[test]
fn test_tsne_random_init_is_seeded() {
    let options = TsneOptions { init: TsneInit::Random, random_state: 7, ..small_options() };
    let a = reduce_embeddings_tsne(&clusters(), &options).unwrap();
    let b = reduce_embeddings_tsne(&clusters(), &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_tsne_validates_parameters() {
    let data = clusters();
    let too_perplexed = TsneOptions { perplexity: 10.0, ..small_options() };
    assert!(reduce_embeddings_tsne(&data, &too_perplexed).is_err());
    let bad_rate = TsneOptions { learning_rate: LearningRate::Fixed(0.0), ..small_options() };
    assert!(reduce_embeddings_tsne(&data, &bad_rate).is_err());
    let single = Matrix::from_rows(&[[1.0, 2.0]]).unwrap();
    assert!(reduce_embeddings_tsne(&single, &small_options()).is_err());
}
