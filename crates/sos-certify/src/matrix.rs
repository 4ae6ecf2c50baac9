//! Gram matrices and the symmetry / positive-semidefiniteness tests.
//!
//! A matrix `M` is accepted as PSD when `‖M − Mᵀ‖_F < matrix_norm` and
//! `λ_min(M) + eigenvalue > 0`. Eigenvalues come from a dense symmetric
//! eigen-decomposition; the matrices involved are at most
//! `(degree + 1)²`-sized, so nothing cleverer is needed.

use nalgebra::{DMatrix, SymmetricEigen};
use serde::Serialize;

use crate::error::CertifyError;
use crate::tolerance::Tolerances;

/// Iteration cap for the eigen-solver. Reaching it is a tooling failure.
const EIGEN_MAX_ITERATIONS: usize = 10_000;

/// A square matrix of finite floats, not yet known to be PSD.
#[derive(Debug, Clone, PartialEq)]
pub struct GramMatrix {
    inner: DMatrix<f64>,
}

/// Why a matrix failed the PSD test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PsdFailure {
    NotSymmetric { defect: f64 },
    NegativeEigenvalue { min_eigenvalue: f64 },
}

impl std::fmt::Display for PsdFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSymmetric { defect } => {
                write!(f, "not symmetric (‖M − Mᵀ‖ = {defect:e})")
            }
            Self::NegativeEigenvalue { min_eigenvalue } => {
                write!(f, "minimum eigenvalue {min_eigenvalue:e} below tolerance")
            }
        }
    }
}

impl GramMatrix {
    /// Build from row-major rows.
    ///
    /// # Errors
    ///
    /// Returns [`CertifyError::Malformed`] if the rows are empty, ragged,
    /// not square, or contain a non-finite entry.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, CertifyError> {
        let n = rows.len();
        if n == 0 {
            return Err(CertifyError::malformed("CERT-013", "gram matrix is empty", "gram_matrices"));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(CertifyError::malformed(
                    "CERT-013",
                    format!("gram matrix is not square: row {i} has {} entries, expected {n}", row.len()),
                    "gram_matrices",
                ));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(CertifyError::malformed(
                    "CERT-014",
                    format!("gram matrix entry [{i}][{j}] is not finite"),
                    "gram_matrices",
                ));
            }
        }
        Ok(Self {
            inner: DMatrix::from_fn(n, n, |i, j| rows[i][j]),
        })
    }

    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.inner[(i, j)]
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.inner
    }

    /// Copy with rows and columns permuted simultaneously: entry `(i, j)`
    /// of the result is entry `(perm[i], perm[j])` of `self`.
    ///
    /// # Panics
    ///
    /// Panics if `perm` is not a permutation of `0..dim`.
    pub fn permuted(&self, perm: &[usize]) -> Self {
        let n = self.dim();
        assert_eq!(perm.len(), n, "permutation length mismatch");
        Self {
            inner: DMatrix::from_fn(n, n, |i, j| self.inner[(perm[i], perm[j])]),
        }
    }

    /// Frobenius norm of `M − Mᵀ`.
    pub fn symmetry_defect(&self) -> f64 {
        (&self.inner - self.inner.transpose()).norm()
    }

    pub fn is_symmetric(&self, tol: &Tolerances) -> bool {
        self.symmetry_defect() < tol.matrix_norm
    }

    /// Smallest eigenvalue of the symmetric part `(M + Mᵀ) / 2`.
    ///
    /// # Errors
    ///
    /// Returns [`CertifyError::Arithmetic`] if the eigen-solver does not
    /// converge or yields a non-finite value.
    pub fn min_eigenvalue(&self) -> Result<f64, CertifyError> {
        let symmetric = (&self.inner + self.inner.transpose()) * 0.5;
        let eigen = SymmetricEigen::try_new(symmetric, f64::EPSILON, EIGEN_MAX_ITERATIONS)
            .ok_or_else(|| {
                CertifyError::Arithmetic(format!(
                    "symmetric eigen-decomposition of a {n}x{n} matrix did not converge \
                     within {EIGEN_MAX_ITERATIONS} iterations",
                    n = self.dim()
                ))
            })?;
        let min = eigen.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            Ok(min)
        } else {
            Err(CertifyError::Arithmetic(
                "eigen-decomposition produced a non-finite eigenvalue".to_string(),
            ))
        }
    }

    /// Full PSD test. `Ok(None)` means the matrix passes.
    ///
    /// The eigenvalue test runs only on matrices that pass the symmetry test.
    ///
    /// # Errors
    ///
    /// Propagates [`CertifyError::Arithmetic`] from the eigen-solver.
    pub fn psd_failure(&self, tol: &Tolerances) -> Result<Option<PsdFailure>, CertifyError> {
        let defect = self.symmetry_defect();
        if defect >= tol.matrix_norm || !defect.is_finite() {
            return Ok(Some(PsdFailure::NotSymmetric { defect }));
        }
        let min_eigenvalue = self.min_eigenvalue()?;
        if min_eigenvalue + tol.eigenvalue > 0.0 {
            Ok(None)
        } else {
            Ok(Some(PsdFailure::NegativeEigenvalue { min_eigenvalue }))
        }
    }

    /// # Errors
    ///
    /// Propagates [`CertifyError::Arithmetic`] from the eigen-solver.
    pub fn is_psd(&self, tol: &Tolerances) -> Result<bool, CertifyError> {
        Ok(self.psd_failure(tol)?.is_none())
    }
}
