//! Sum-of-squares terms `zᵀ · Q · z` from a monomial basis `z` and a Gram
//! matrix `Q`.
//!
//! If `Q` is PSD then `zᵀ Q z = Σ λ_k (v_kᵀ z)²` is non-negative at every
//! real point, which is what lets a condition's identity prove an
//! inequality. The builder itself does not check `Q`; callers validate
//! matrices first.

use crate::error::CertifyError;
use crate::expr::{Expression, Scope};
use crate::matrix::GramMatrix;
use crate::poly::{Monomial, Polynomial};

/// Ordered monomial basis of a quadratic form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonomialVector {
    entries: Vec<Monomial>,
}

impl MonomialVector {
    pub fn new(entries: Vec<Monomial>) -> Self {
        Self { entries }
    }

    /// Dense basis `1, x, x², …, x^degree` in one variable.
    pub fn univariate(var: &str, degree: u32) -> Self {
        Self::new((0..=degree).map(|k| Monomial::from_powers([(var, k)])).collect())
    }

    /// Parse textual entries such as `["1", "x", "x*y"]`. Each entry must
    /// expand to a single monomial with coefficient one.
    ///
    /// # Errors
    ///
    /// Returns [`CertifyError::Expression`] on a syntax or scope error and
    /// [`CertifyError::Malformed`] for an entry that is not a monomial.
    pub fn parse<S: AsRef<str>>(entries: &[S], scope: &Scope<'_>) -> Result<Self, CertifyError> {
        let mut monomials = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let entry = entry.as_ref();
            let p = Expression::parse(entry)?.expand(scope)?;
            match p.as_single_term() {
                Some((m, c)) if (c - 1.0).abs() < f64::EPSILON => monomials.push(m.clone()),
                _ => {
                    return Err(CertifyError::malformed(
                        "CERT-015",
                        format!("monomial vector entry `{entry}` is not a single monomial"),
                        format!("monomial_vector[{i}]"),
                    ));
                }
            }
        }
        Ok(Self::new(monomials))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Monomial] {
        &self.entries
    }
}

/// Expand `zᵀ · gram · z`.
///
/// # Errors
///
/// Returns [`CertifyError::Malformed`] if the matrix dimension differs from
/// the basis length and [`CertifyError::DegreeOverflow`] if `z_i · z_j`
/// overflows a power.
pub fn build(basis: &MonomialVector, gram: &GramMatrix) -> Result<Polynomial, CertifyError> {
    if basis.len() != gram.dim() {
        return Err(CertifyError::malformed(
            "CERT-012",
            format!(
                "gram matrix is {d}x{d} but the monomial vector has {n} entries",
                d = gram.dim(),
                n = basis.len()
            ),
            "gram_matrices",
        ));
    }
    let z = basis.entries();
    let mut terms = Vec::with_capacity(z.len() * z.len());
    for (i, zi) in z.iter().enumerate() {
        for (j, zj) in z.iter().enumerate() {
            let m = zi.checked_mul(zj).ok_or_else(|| {
                CertifyError::DegreeOverflow(format!("basis product [{zi}]*[{zj}]"))
            })?;
            terms.push((m, gram.get(i, j)));
        }
    }
    Ok(Polynomial::from_terms(terms))
}
