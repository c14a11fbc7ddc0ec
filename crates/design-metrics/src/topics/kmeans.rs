//! k-means clustering with k-means++ seeding.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::utils::Matrix;

const MAX_ITERATIONS: usize = 300;

/// Fitted clusters.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// `clusters × features` centroids.
    pub centers: Matrix,
    /// `rows × clusters` Euclidean distances to each centroid.
    pub distances: Matrix,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations run.
    pub iterations: usize,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Cluster the rows of `data` into `k` groups. `k` must not exceed the row count.
#[must_use]
pub fn fit(data: &Matrix, k: usize, seed: u64) -> KMeansFit {
    let (rows, cols) = data.shape();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centers = Matrix::zeros(k, cols);

    let first = rng.random_range(0..rows);
    centers.row_mut(0).copy_from_slice(data.row(first));
    let mut closest: Vec<f64> = (0..rows).map(|r| squared_distance(data.row(r), centers.row(0))).collect();
    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut running = 0.0;
            closest
                .iter()
                .position(|&d| {
                    running += d;
                    target < running
                })
                .unwrap_or(rows - 1)
        } else {
            rng.random_range(0..rows)
        };
        centers.row_mut(c).copy_from_slice(data.row(chosen));
        for r in 0..rows {
            closest[r] = closest[r].min(squared_distance(data.row(r), centers.row(c)));
        }
    }

    let mut labels = vec![usize::MAX; rows];
    let mut iterations = 0;
    for _ in 0..MAX_ITERATIONS {
        iterations += 1;
        let mut changed = false;
        for r in 0..rows {
            let best = (0..k)
                .min_by(|&a, &b| {
                    squared_distance(data.row(r), centers.row(a))
                        .total_cmp(&squared_distance(data.row(r), centers.row(b)))
                })
                .unwrap_or(0);
            if labels[r] != best {
                labels[r] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = Matrix::zeros(k, cols);
        let mut sizes = vec![0usize; k];
        for r in 0..rows {
            sizes[labels[r]] += 1;
            for (s, v) in sums.row_mut(labels[r]).iter_mut().zip(data.row(r)) {
                *s += v;
            }
        }
        for c in 0..k {
            if sizes[c] > 0 {
                for (dst, s) in centers.row_mut(c).iter_mut().zip(sums.row(c)) {
                    *dst = s / sizes[c] as f64;
                }
            }
        }
    }

    let mut distances = Matrix::zeros(rows, k);
    let mut inertia = 0.0;
    for r in 0..rows {
        for c in 0..k {
            let squared = squared_distance(data.row(r), centers.row(c));
            distances.set(r, c, squared.sqrt());
            if labels[r] == c {
                inertia += squared;
            }
        }
    }

    tracing::debug!(clusters = k, rows, iterations, inertia, "Fitted k-means");
    KMeansFit { centers, distances, inertia, iterations }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separates_two_blobs() {
        let data = Matrix::from_rows(&[[0.0, 0.0], [0.1, 0.0], [10.0, 10.0], [10.1, 10.0]]).unwrap();
        let fit = fit(&data, 2, 0);
        let nearest: Vec<usize> = (0..4)
            .map(|r| if fit.distances.get(r, 0) < fit.distances.get(r, 1) { 0 } else { 1 })
            .collect();
        assert_eq!(nearest[0], nearest[1]);
        assert_eq!(nearest[2], nearest[3]);
        assert_ne!(nearest[0], nearest[2]);
        assert!(fit.inertia < 0.1);
    }
}
