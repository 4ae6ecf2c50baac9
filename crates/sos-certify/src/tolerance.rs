//! Numeric tolerances used by the verifier.
//!
//! All three bounds are absolute. They match the constants the upstream
//! SDP pipeline emits with its certificates.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MATRIX_NORM: f64 = 1e-6;
pub const DEFAULT_EIGENVALUE: f64 = 1e-4;
pub const DEFAULT_POLY_COEFF: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Upper bound on the Frobenius norm of `M - Mᵀ`.
    #[serde(default = "default_matrix_norm")]
    pub matrix_norm: f64,
    /// Allowed negativity of the smallest eigenvalue.
    #[serde(default = "default_eigenvalue")]
    pub eigenvalue: f64,
    /// Upper bound on every residual coefficient's magnitude.
    #[serde(default = "default_poly_coeff")]
    pub poly_coeff: f64,
}

fn default_matrix_norm() -> f64 {
    DEFAULT_MATRIX_NORM
}

fn default_eigenvalue() -> f64 {
    DEFAULT_EIGENVALUE
}

fn default_poly_coeff() -> f64 {
    DEFAULT_POLY_COEFF
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            matrix_norm: DEFAULT_MATRIX_NORM,
            eigenvalue: DEFAULT_EIGENVALUE,
            poly_coeff: DEFAULT_POLY_COEFF,
        }
    }
}

impl Tolerances {
    /// Each bound paired with its name, for diagnostics.
    pub fn named(&self) -> [(&'static str, f64, f64); 3] {
        [
            ("matrix_norm", self.matrix_norm, DEFAULT_MATRIX_NORM),
            ("eigenvalue", self.eigenvalue, DEFAULT_EIGENVALUE),
            ("poly_coeff", self.poly_coeff, DEFAULT_POLY_COEFF),
        ]
    }
}
