//! Dense row-major matrix used for responses, embeddings and topic weights.

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{MetricsError, MetricsResult};

/// A dense `rows × cols` matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// Build from row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> MetricsResult<Self> {
        if data.len() != rows * cols {
            return Err(MetricsError::validation(
                "matrix",
                format!("expected {} values for a {rows}x{cols} matrix, got {}", rows * cols, data.len()),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from a list of rows. Ragged rows are rejected.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> MetricsResult<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MetricsError::validation("matrix", "Expected a two-dimensional array"));
            }
            data.extend_from_slice(row);
        }
        Ok(Self { rows: rows.len(), cols, data })
    }

    /// Number of rows.
    #[must_use]
    pub const fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn ncols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True when the matrix has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell value.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Overwrite a cell.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Mutably borrow one row.
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy one column.
    #[must_use]
    pub fn column(&self, col: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, col)).collect()
    }

    /// Iterate over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Raw row-major data.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Column means.
    #[must_use]
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.cols];
        if self.rows == 0 {
            return means;
        }
        for row in self.iter_rows() {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= self.rows as f64;
        }
        means
    }

    /// Subtract column means in place and return them.
    pub fn center_columns(&mut self) -> Vec<f64> {
        let means = self.column_means();
        for r in 0..self.rows {
            for (v, m) in self.row_mut(r).iter_mut().zip(&means) {
                *v -= m;
            }
        }
        means
    }

    /// Transposed copy.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }

    /// Matrix product `self · other`.
    pub fn matmul(&self, other: &Self) -> MetricsResult<Self> {
        if self.cols != other.rows {
            return Err(MetricsError::validation(
                "matrix",
                format!("cannot multiply {:?} by {:?}", self.shape(), other.shape()),
            ));
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    out.data[i * other.cols + j] += a * other.get(k, j);
                }
            }
        }
        Ok(out)
    }

    /// `selfᵀ · self`, a `cols × cols` symmetric matrix.
    #[must_use]
    pub fn gram_columns(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.cols);
        for row in self.iter_rows() {
            for i in 0..self.cols {
                for j in i..self.cols {
                    out.data[i * self.cols + j] += row[i] * row[j];
                }
            }
        }
        mirror_upper(&mut out);
        out
    }

    /// `self · selfᵀ`, a `rows × rows` symmetric matrix.
    #[must_use]
    pub fn gram_rows(&self) -> Self {
        let mut out = Self::zeros(self.rows, self.rows);
        for i in 0..self.rows {
            for j in i..self.rows {
                let dot = self.row(i).iter().zip(self.row(j)).map(|(a, b)| a * b).sum();
                out.set(i, j, dot);
            }
        }
        mirror_upper(&mut out);
        out
    }

    /// Multiply every cell by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// Ensure all cells are finite.
    pub fn ensure_finite(&self, field: &str) -> MetricsResult<()> {
        crate::utils::array::ensure_finite(&self.data, field)
    }
}

fn mirror_upper(m: &mut Matrix) {
    let n = m.rows;
    for i in 0..n {
        for j in 0..i {
            let v = m.get(j, i);
            m.set(i, j, v);
        }
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows))?;
        for row in self.iter_rows() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

/// Eigen decomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns eigenvalues in descending order and the matching unit
/// eigenvectors as columns of the second matrix.
#[must_use]
pub fn symmetric_eigen(matrix: &Matrix) -> (Vec<f64>, Matrix) {
    const MAX_SWEEPS: usize = 100;
    let n = matrix.nrows();
    let mut a = matrix.clone();
    let mut v = Matrix::zeros(n, n);
    for i in 0..n {
        v.set(i, i, 1.0);
    }

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a.get(i, j).powi(2))
            .sum();
        let scale: f64 = a.as_slice().iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);
        if off <= 1e-22 * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a.get(p, q);
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let app = a.get(p, p);
                let aqq = a.get(q, q);
                let theta = (aqq - app) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + theta.mul_add(theta, 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / t.mul_add(t, 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a.get(k, p);
                    let akq = a.get(k, q);
                    a.set(k, p, c * akp - s * akq);
                    a.set(k, q, s * akp + c * akq);
                }
                for k in 0..n {
                    let apk = a.get(p, k);
                    let aqk = a.get(q, k);
                    a.set(p, k, c * apk - s * aqk);
                    a.set(q, k, s * apk + c * aqk);
                }
                for k in 0..n {
                    let vkp = v.get(k, p);
                    let vkq = v.get(k, q);
                    v.set(k, p, c * vkp - s * vkq);
                    v.set(k, q, s * vkp + c * vkq);
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a.get(j, j).total_cmp(&a.get(i, i)));

    let values = order.iter().map(|&i| a.get(i, i)).collect();
    let mut vectors = Matrix::zeros(n, n);
    for (dst, &src) in order.iter().enumerate() {
        for k in 0..n {
            vectors.set(k, dst, v.get(k, src));
        }
    }
    (values, vectors)
}
