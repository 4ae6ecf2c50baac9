//! # sos-certify
//!
//! Independent checker for sum-of-squares (Positivstellensatz) certificates.
//!
//! A certificate claims that a target function with numeric coefficients
//! satisfies a set of polynomial implications. For every implication
//! `h_1 ≥ 0 ∧ … ∧ h_k ≥ 0 ⇒ c ≥ 0` it supplies one Gram matrix per
//! hypothesis. The checker confirms that every matrix is positive
//! semidefinite and that `Σ h_i · (zᵀ Q_i z) − c` vanishes identically, up
//! to fixed floating-point tolerances.
//!
//! ## Modules
//!
//! - [`poly`] — Canonical multivariate polynomials
//! - [`expr`] — Textual expressions, scopes and inequalities
//! - [`matrix`] — Gram matrices, symmetry and PSD tests
//! - [`sos`] — `zᵀ Q z` expansion over a monomial basis
//! - [`certificate`] — Target templates, binding, conditions, certificates
//! - [`condition`] — Residual check for one condition
//! - [`verifier`] — Full / fast / answer-only verification and reports
//! - [`schema`] — Parse and validate YAML certificate documents
//! - [`tolerance`] — Numeric tolerances

pub mod certificate;
pub mod condition;
pub mod error;
pub mod expr;
pub mod matrix;
pub mod poly;
pub mod schema;
pub mod sos;
pub mod tolerance;
pub mod verifier;
