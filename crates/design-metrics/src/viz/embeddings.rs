use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::defaults;
use crate::error::{MetricsError, MetricsResult};
use crate::utils::{Matrix, symmetric_eigen};

const EARLY_EXAGGERATION: f64 = 12.0;
const EXAGGERATION_ITERATIONS: usize = 250;
const MIN_GAIN: f64 = 0.01;
const MIN_GRAD_NORM: f64 = 1e-7;
const MACHINE_EPSILON: f64 = f64::EPSILON;

/// Project rows onto the leading `n_components` principal axes.
///
/// Columns are centred first. Each output column is oriented so that its
/// largest-magnitude entry is positive, which makes the result
/// deterministic.
///
/// # Errors
///
/// Fails when `n_components` is zero or exceeds `min(rows, cols)`, or on
/// non-finite input.
pub fn reduce_embeddings_pca(embeddings: &Matrix, n_components: usize) -> MetricsResult<Matrix> {
    let (rows, cols) = embeddings.shape();
    if n_components == 0 {
        return Err(MetricsError::validation("n_components", "n_components must be positive."));
    }
    if n_components > rows.min(cols) {
        return Err(MetricsError::validation(
            "n_components",
            format!("n_components={n_components} must be at most min(rows, cols)={}", rows.min(cols)),
        ));
    }
    embeddings.ensure_finite("embeddings")?;

    let mut centred = embeddings.clone();
    centred.center_columns();

    let mut scores = Matrix::zeros(rows, n_components);
    if cols <= rows {
        let (_, vectors) = symmetric_eigen(&centred.gram_columns());
        for r in 0..rows {
            let row = centred.row(r);
            for k in 0..n_components {
                let projection = row.iter().enumerate().map(|(c, v)| v * vectors.get(c, k)).sum();
                scores.set(r, k, projection);
            }
        }
    } else {
        let (values, vectors) = symmetric_eigen(&centred.gram_rows());
        for k in 0..n_components {
            let singular = values[k].max(0.0).sqrt();
            for r in 0..rows {
                scores.set(r, k, vectors.get(r, k) * singular);
            }
        }
    }

    for k in 0..n_components {
        let pivot = (0..rows)
            .map(|r| scores.get(r, k))
            .max_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if pivot < 0.0 {
            for r in 0..rows {
                scores.set(r, k, -scores.get(r, k));
            }
        }
    }

    tracing::debug!(rows, cols, n_components, "Reduced embeddings with PCA");
    Ok(scores)
}

/// t-SNE step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LearningRate {
    /// `max(rows / 12 / 4, 50)`.
    Auto,
    /// A fixed positive rate.
    Fixed(f64),
}

/// Starting layout for t-SNE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsneInit {
    /// Leading principal components, rescaled to a small spread.
    Pca,
    /// Seeded Gaussian noise.
    Random,
}

/// t-SNE parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsneOptions {
    /// Output dimensions.
    pub n_components: usize,
    /// Effective neighbour count; must be below the row count.
    pub perplexity: f64,
    /// Step size.
    pub learning_rate: LearningRate,
    /// Starting layout.
    pub init: TsneInit,
    /// Seed for random initialisation.
    pub random_state: u64,
    /// Gradient steps, including the early exaggeration phase.
    pub n_iter: usize,
}

impl Default for TsneOptions {
    fn default() -> Self {
        Self {
            n_components: defaults::REDUCED_COMPONENTS,
            perplexity: defaults::TSNE_PERPLEXITY,
            learning_rate: LearningRate::Auto,
            init: TsneInit::Pca,
            random_state: defaults::RANDOM_STATE,
            n_iter: 1000,
        }
    }
}

/// Exact t-SNE embedding of the rows of `embeddings`.
///
/// Affinities are Gaussian with per-row bandwidths found by binary search
/// on the perplexity. The layout is optimised by gradient descent with
/// early exaggeration, momentum and adaptive gains.
///
/// # Errors
///
/// Fails on non-finite input, fewer than two rows, `perplexity` outside
/// `(0, rows)`, a non-positive learning rate or zero components.
pub fn reduce_embeddings_tsne(embeddings: &Matrix, options: &TsneOptions) -> MetricsResult<Matrix> {
    let n = embeddings.nrows();
    if n < 2 {
        return Err(MetricsError::validation("embeddings", "t-SNE needs at least two rows"));
    }
    if options.n_components == 0 {
        return Err(MetricsError::validation("n_components", "n_components must be positive."));
    }
    if !(options.perplexity > 0.0 && options.perplexity < n as f64) {
        return Err(MetricsError::validation(
            "perplexity",
            format!("perplexity must be positive and less than the number of rows ({n})"),
        ));
    }
    let learning_rate = match options.learning_rate {
        LearningRate::Auto => (n as f64 / EARLY_EXAGGERATION / 4.0).max(50.0),
        LearningRate::Fixed(rate) if rate > 0.0 && rate.is_finite() => rate,
        LearningRate::Fixed(_) => {
            return Err(MetricsError::validation("learning_rate", "learning rate must be positive"));
        }
    };
    embeddings.ensure_finite("embeddings")?;

    let mut p = joint_probabilities(&squared_distances(embeddings), options.perplexity);
    let mut y = initial_layout(embeddings, options)?;
    let dims = options.n_components;
    let dof = dims.saturating_sub(1).max(1) as f64;

    let mut update = vec![0.0f64; n * dims];
    let mut gains = vec![1.0f64; n * dims];
    let mut gradient = vec![0.0f64; n * dims];

    p.iter_mut().for_each(|v| *v *= EARLY_EXAGGERATION);
    for iteration in 0..options.n_iter {
        if iteration == EXAGGERATION_ITERATIONS {
            p.iter_mut().for_each(|v| *v /= EARLY_EXAGGERATION);
        }
        let momentum = if iteration < EXAGGERATION_ITERATIONS { 0.5 } else { 0.8 };

        compute_gradient(&p, &y, dof, &mut gradient);
        for i in 0..n * dims {
            if update[i] * gradient[i] < 0.0 {
                gains[i] += 0.2;
            } else {
                gains[i] *= 0.8;
            }
            gains[i] = gains[i].max(MIN_GAIN);
            update[i] = momentum * update[i] - learning_rate * gains[i] * gradient[i];
        }
        for (r, chunk) in update.chunks(dims).enumerate() {
            for (v, u) in y.row_mut(r).iter_mut().zip(chunk) {
                *v += u;
            }
        }

        let norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
        if iteration >= EXAGGERATION_ITERATIONS && norm < MIN_GRAD_NORM {
            tracing::debug!(iteration, "t-SNE gradient vanished");
            break;
        }
    }

    tracing::debug!(rows = n, dims, perplexity = options.perplexity, learning_rate, "Reduced embeddings with t-SNE");
    Ok(y)
}

fn squared_distances(data: &Matrix) -> Vec<f64> {
    let n = data.nrows();
    let mut distances = vec![0.0f64; n * n];
    for i in 0..n {
        for j in i + 1..n {
            let d: f64 = data.row(i).iter().zip(data.row(j)).map(|(a, b)| (a - b).powi(2)).sum();
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }
    distances
}

/// Symmetrised affinities `(P + Pᵀ) / sum`, flattened row-major.
fn joint_probabilities(distances: &[f64], perplexity: f64) -> Vec<f64> {
    const STEPS: usize = 100;
    const TOLERANCE: f64 = 1e-5;

    let n = (distances.len() as f64).sqrt() as usize;
    let target = perplexity.ln();
    let mut conditional = vec![0.0f64; n * n];

    for i in 0..n {
        let row = &distances[i * n..(i + 1) * n];
        let (mut beta, mut low, mut high) = (1.0f64, f64::NEG_INFINITY, f64::INFINITY);
        for _ in 0..STEPS {
            let mut sum = 0.0;
            for j in 0..n {
                let value = if j == i { 0.0 } else { (-row[j] * beta).exp() };
                conditional[i * n + j] = value;
                sum += value;
            }
            let sum = if sum == 0.0 { MACHINE_EPSILON } else { sum };
            let mut weighted = 0.0;
            for j in 0..n {
                conditional[i * n + j] /= sum;
                weighted += row[j] * conditional[i * n + j];
            }
            let entropy = sum.ln() + beta * weighted;
            let difference = entropy - target;
            if difference.abs() <= TOLERANCE {
                break;
            }
            if difference > 0.0 {
                low = beta;
                beta = if high.is_infinite() { beta * 2.0 } else { (beta + high) / 2.0 };
            } else {
                high = beta;
                beta = if low.is_infinite() { beta / 2.0 } else { (beta + low) / 2.0 };
            }
        }
    }

    let mut joint = vec![0.0f64; n * n];
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            let value = conditional[i * n + j] + conditional[j * n + i];
            joint[i * n + j] = value;
            total += value;
        }
    }
    let total = total.max(MACHINE_EPSILON);
    for (k, v) in joint.iter_mut().enumerate() {
        *v = if k / n == k % n { 0.0 } else { (*v / total).max(MACHINE_EPSILON) };
    }
    joint
}

fn initial_layout(embeddings: &Matrix, options: &TsneOptions) -> MetricsResult<Matrix> {
    let n = embeddings.nrows();
    match options.init {
        TsneInit::Pca => {
            let mut layout = reduce_embeddings_pca(embeddings, options.n_components)?;
            let first = layout.column(0);
            let mean = first.iter().sum::<f64>() / n as f64;
            let std = (first.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
            if std > 0.0 {
                layout.scale(1e-4 / std);
            }
            Ok(layout)
        }
        TsneInit::Random => {
            let mut rng = StdRng::seed_from_u64(options.random_state);
            let mut layout = Matrix::zeros(n, options.n_components);
            for r in 0..n {
                for v in layout.row_mut(r) {
                    *v = 1e-4 * standard_normal(&mut rng);
                }
            }
            Ok(layout)
        }
    }
}

/// Box-Muller draw.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Kullback-Leibler gradient with a Student-t kernel of `dof` degrees of
/// freedom.
fn compute_gradient(p: &[f64], y: &Matrix, dof: f64, gradient: &mut [f64]) {
    let (n, dims) = y.shape();
    let exponent = (dof + 1.0) / 2.0;
    let mut kernel = vec![0.0f64; n * n];
    let mut total = 0.0;
    for i in 0..n {
        for j in i + 1..n {
            let d: f64 = y.row(i).iter().zip(y.row(j)).map(|(a, b)| (a - b).powi(2)).sum();
            let w = (1.0 + d / dof).powf(-exponent);
            kernel[i * n + j] = w;
            kernel[j * n + i] = w;
            total += 2.0 * w;
        }
    }
    let total = total.max(MACHINE_EPSILON);
    let factor = 2.0 * (dof + 1.0) / dof;

    gradient.iter_mut().for_each(|g| *g = 0.0);
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let w = kernel[i * n + j];
            let q = (w / total).max(MACHINE_EPSILON);
            let coefficient = (p[i * n + j] - q) * w;
            for d in 0..dims {
                gradient[i * dims + d] += factor * coefficient * (y.get(i, d) - y.get(j, d));
            }
        }
    }
}
