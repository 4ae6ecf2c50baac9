//! Polynomial algebra over `f64` coefficients.
//!
//! [`Polynomial`] is always canonical; unexpanded symbolic input lives in
//! [`crate::expr`] until it is expanded against a scope.

mod monomial;
mod polynomial;

pub use monomial::Monomial;
pub(crate) use polynomial::format_coefficient;
pub use polynomial::Polynomial;

/// Largest total degree an expression may expand to. Exponents above it
/// are rejected while parsing, products and calls while expanding.
pub const MAX_DEGREE: u32 = 64;
