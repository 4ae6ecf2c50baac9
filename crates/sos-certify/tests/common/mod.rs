//! Shared helpers for certificate integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sos_certify::certificate::{Certificate, Condition, SosSlot};
use sos_certify::matrix::GramMatrix;
use sos_certify::poly::Polynomial;
use sos_certify::schema::{CertificateDocument, parse_document};
use sos_certify::sos::{self, MonomialVector};

pub fn certificates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../certificates")
        .canonicalize()
        .expect("certificates directory must exist")
}

/// The solver-produced quadratic recurrence certificate.
pub fn quadratic_document() -> CertificateDocument {
    let path = certificates_dir().join("quadratic.yaml");
    parse_document(&path).unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()))
}

pub fn gram(rows: &[Vec<f64>]) -> GramMatrix {
    GramMatrix::from_rows(rows).expect("test matrix must be square and finite")
}

/// `B · Bᵀ`, positive semidefinite by construction.
pub fn gram_of_factor(b: &[Vec<f64>]) -> GramMatrix {
    let n = b.len();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| b[i].iter().zip(&b[j]).map(|(x, y)| x * y).sum())
                .collect()
        })
        .collect();
    gram(&rows)
}

/// A one-hypothesis certificate `⊤ ⇒ zᵀ Q z ≥ 0` whose conclusion is the
/// witness's own expansion, so the residual is exactly zero.
pub fn self_witnessing(q: GramMatrix) -> Certificate {
    let basis = MonomialVector::univariate("x", u32::try_from(q.dim() - 1).unwrap());
    let conclusion = sos::build(&basis, &q).unwrap();
    let condition = Condition::new(
        None,
        vec![(Polynomial::constant(1.0), SosSlot::new(0, q))],
        basis,
        conclusion,
    )
    .unwrap();
    Certificate::new(vec![], vec![condition]).unwrap()
}
