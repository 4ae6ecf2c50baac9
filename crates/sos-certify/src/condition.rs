//! Checks one condition's identity `Σ h_i · s_i − c ≡ 0`.
//!
//! Each `s_i` comes from [`sos::build`] on the hypothesis' own Gram
//! matrix. The evaluator never searches for multipliers; it only expands
//! the residual and compares every coefficient against the tolerance.

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::certificate::Condition;
use crate::error::CertifyError;
use crate::poly::{Polynomial, format_coefficient};
use crate::sos;
use crate::tolerance::Tolerances;

/// A residual coefficient at or above the tolerance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffendingCoefficient {
    pub monomial: String,
    pub value: f64,
}

impl std::fmt::Display for OffendingCoefficient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] = {}", self.monomial, format_coefficient(self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionReport {
    pub index: usize,
    pub label: Option<String>,
    pub passed: bool,
    pub max_abs_coefficient: f64,
    #[serde(serialize_with = "serialize_display")]
    pub residual: Polynomial,
    pub offending: Vec<OffendingCoefficient>,
}

fn serialize_display<S: Serializer>(value: &Polynomial, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Expand `Σ h_i · s_i − c`. The terms are owned by the condition and
/// consumed in hypothesis order.
///
/// # Errors
///
/// Propagates dimension errors from [`sos::build`]; returns
/// [`CertifyError::DegreeOverflow`] if a product overflows a power.
pub fn residual(condition: &Condition) -> Result<Polynomial, CertifyError> {
    let mut sum = Polynomial::zero();
    for hypothesis in condition.hypotheses() {
        let term = sos::build(condition.monomial_vector(), hypothesis.slot.gram())?;
        let product = hypothesis.polynomial.checked_mul(&term).ok_or_else(|| {
            CertifyError::DegreeOverflow(format!(
                "hypothesis `{}` times its SOS term",
                hypothesis.polynomial
            ))
        })?;
        sum = &sum + &product;
    }
    Ok(&sum - condition.conclusion())
}

/// Verify one condition. `index` is its position in the certificate and
/// only labels the report.
///
/// # Errors
///
/// Returns [`CertifyError::Arithmetic`] if a residual coefficient is not
/// finite, and propagates errors from [`residual`].
pub fn evaluate(
    index: usize,
    condition: &Condition,
    tol: &Tolerances,
) -> Result<ConditionReport, CertifyError> {
    let residual = residual(condition)?;

    if let Some((m, c)) = residual.terms().find(|(_, c)| !c.is_finite()) {
        return Err(CertifyError::Arithmetic(format!(
            "condition {index}: residual coefficient of [{m}] is {c}"
        )));
    }

    let offending: Vec<OffendingCoefficient> = residual
        .terms()
        .filter(|(_, c)| c.abs() >= tol.poly_coeff)
        .map(|(m, c)| OffendingCoefficient {
            monomial: m.to_string(),
            value: c,
        })
        .collect();
    let max_abs_coefficient = residual.max_abs_coefficient();

    debug!(
        condition = index,
        max_abs_coefficient,
        terms = residual.len(),
        "condition residual"
    );

    Ok(ConditionReport {
        index,
        label: condition.label().map(str::to_string),
        passed: max_abs_coefficient < tol.poly_coeff,
        max_abs_coefficient,
        residual,
        offending,
    })
}
