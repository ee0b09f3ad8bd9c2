//! Least squares on faer's Householder QR

use crate::errors::{StatsError, StatsResult};
use faer::linalg::solvers::{Qr, SolveLstsq};
use faer::linalg::triangular_inverse::invert_upper_triangular;
use faer::{Col, Mat, Par};

/// |R_jj| below this fraction of ||x_j|| means column j lies in the span of
/// the columns before it
const RANK_TOLERANCE: f64 = 1e-7;

/// Column-major design columns as an n x p matrix
pub(crate) fn to_mat(columns: &[Vec<f64>], n_rows: usize) -> Mat<f64> {
    Mat::from_fn(n_rows, columns.len(), |i, j| columns[j][i])
}

pub(crate) fn to_col(values: &[f64]) -> Col<f64> {
    Col::from_fn(values.len(), |i| values[i])
}

/// QR factorization of a full-column-rank design
pub(crate) struct QrDecomposition {
    qr: Qr<f64>,
}

impl QrDecomposition {
    /// Factor `x`, naming the first collinear column from `names`
    ///
    /// Columns are checked in order, so the reported column is the first one
    /// that adds nothing to the columns declared before it.
    ///
    /// # Errors
    /// * `InsufficientData` if `x` has fewer rows than columns
    /// * `SingularDesign` if `x` is rank-deficient
    pub(crate) fn new(x: &Mat<f64>, names: &[String]) -> StatsResult<Self> {
        let (n, p) = (x.nrows(), x.ncols());
        if n < p {
            return Err(StatsError::InsufficientData { rows: n, cols: p });
        }

        let qr = x.qr();
        let r = qr.thin_R();
        for j in 0..p {
            let norm = x.col(j).norm_l2();
            if !(norm > 0.0 && r[(j, j)].abs() > RANK_TOLERANCE * norm) {
                return Err(StatsError::SingularDesign {
                    term: names.get(j).cloned().unwrap_or_else(|| format!("column {}", j)),
                });
            }
        }
        Ok(Self { qr })
    }

    /// Coefficients minimizing ||y - Xb||²
    pub(crate) fn solve(&self, y: &Col<f64>) -> Col<f64> {
        self.qr.solve_lstsq(y)
    }

    /// (X'X)^-1 = R^-1 R^-T
    pub(crate) fn unscaled_covariance(&self) -> Mat<f64> {
        let r = self.qr.thin_R();
        let mut r_inv = Mat::<f64>::zeros(r.nrows(), r.ncols());
        invert_upper_triangular(r_inv.as_mut(), r, Par::Seq);
        r_inv.as_ref() * r_inv.as_ref().transpose()
    }

    /// Diagonal of the hat matrix: row sums of squares of the thin Q
    pub(crate) fn leverage(&self) -> Vec<f64> {
        let q = self.qr.compute_thin_Q();
        (0..q.nrows())
            .map(|i| (0..q.ncols()).map(|j| q[(i, j)].powi(2)).sum())
            .collect()
    }
}
