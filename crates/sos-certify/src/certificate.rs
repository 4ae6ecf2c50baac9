//! The certificate value the verifier consumes.
//!
//! Construction happens in two stages. A [`TargetTemplate`] is the
//! unbound symbolic target function; [`TargetTemplate::bind`] freezes it
//! into a [`BoundTarget`] with numeric coefficients. Conditions and the
//! [`Certificate`] are built from bound targets only, so a certificate can
//! never be verified against an unbound template.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CertifyError, Violation};
use crate::expr::Scope;
use crate::matrix::GramMatrix;
use crate::poly::Polynomial;
use crate::sos::MonomialVector;

/// Numeric values for named template coefficients.
pub type Binding = BTreeMap<String, f64>;

// ── Target functions ──────────────────────────────────────────────

/// A target function with free symbolic coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetTemplate {
    name: String,
    params: Vec<String>,
    coefficients: Vec<String>,
    body: Polynomial,
}

impl TargetTemplate {
    /// # Errors
    ///
    /// Returns [`CertifyError::Malformed`] if the body mentions a symbol
    /// that is neither a parameter nor a declared coefficient, or if a
    /// name is declared as both.
    pub fn new(
        name: impl Into<String>,
        params: Vec<String>,
        coefficients: Vec<String>,
        body: Polynomial,
    ) -> Result<Self, CertifyError> {
        let name = name.into();
        let location = format!("targets.{name}");
        if let Some(clash) = params.iter().find(|p| coefficients.contains(*p)) {
            return Err(CertifyError::malformed(
                "CERT-004",
                format!("`{clash}` is declared both as a parameter and a coefficient of `{name}`"),
                location,
            ));
        }
        let declared: BTreeSet<&str> = params
            .iter()
            .chain(&coefficients)
            .map(String::as_str)
            .collect();
        if let Some(free) = body.variables().into_iter().find(|v| !declared.contains(v.as_str())) {
            return Err(CertifyError::malformed(
                "CERT-004",
                format!("template of `{name}` mentions undeclared symbol `{free}`"),
                location,
            ));
        }
        Ok(Self {
            name,
            params,
            coefficients,
            body,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn coefficients(&self) -> &[String] {
        &self.coefficients
    }

    pub fn body(&self) -> &Polynomial {
        &self.body
    }

    /// Scope for expanding this template's textual body.
    pub fn scope(&self) -> Scope<'_> {
        Scope::new().with_variables(
            self.params
                .iter()
                .chain(&self.coefficients)
                .map(String::as_str),
        )
    }

    /// Substitute every coefficient with its bound value.
    ///
    /// # Errors
    ///
    /// Returns [`CertifyError::Malformed`] listing every coefficient that
    /// has no value or a non-finite one.
    pub fn bind(&self, binding: &Binding) -> Result<BoundTarget, CertifyError> {
        let mut violations = Vec::new();
        let mut values = BTreeMap::new();
        for coefficient in &self.coefficients {
            match binding.get(coefficient) {
                Some(v) if v.is_finite() => {
                    values.insert(coefficient.clone(), Polynomial::constant(*v));
                }
                Some(v) => violations.push(Violation::error(
                    "CERT-006",
                    format!("coefficient `{coefficient}` of `{}` is bound to non-finite {v}", self.name),
                    Some(format!("binding.{coefficient}")),
                )),
                None => violations.push(Violation::error(
                    "CERT-005",
                    format!("coefficient `{coefficient}` of `{}` is unbound", self.name),
                    Some("binding".to_string()),
                )),
            }
        }
        if !violations.is_empty() {
            return Err(CertifyError::Malformed { violations });
        }
        let body = self.body.substitute_all(&values).ok_or_else(|| {
            CertifyError::DegreeOverflow(format!("binding `{}` overflows a power", self.name))
        })?;
        Ok(BoundTarget {
            name: self.name.clone(),
            params: self.params.clone(),
            body,
        })
    }
}

/// A target function with every coefficient fixed to a number.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTarget {
    name: String,
    params: Vec<String>,
    body: Polynomial,
}

impl BoundTarget {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Closed form in the function's own parameters.
    pub fn body(&self) -> &Polynomial {
        &self.body
    }
}

impl std::fmt::Display for BoundTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}) = {}", self.name, self.params.join(", "), self.body)
    }
}

// ── Conditions ────────────────────────────────────────────────────

/// A Gram matrix together with its position in the certificate's global
/// matrix list (used only for diagnostics).
#[derive(Debug, Clone, PartialEq)]
pub struct SosSlot {
    matrix_index: usize,
    gram: GramMatrix,
}

impl SosSlot {
    pub fn new(matrix_index: usize, gram: GramMatrix) -> Self {
        Self { matrix_index, gram }
    }

    pub fn matrix_index(&self) -> usize {
        self.matrix_index
    }

    pub fn gram(&self) -> &GramMatrix {
        &self.gram
    }
}

/// One hypothesis polynomial paired with the SOS multiplier it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    pub polynomial: Polynomial,
    pub slot: SosSlot,
}

/// `h_1 ≥ 0 ∧ … ∧ h_k ≥ 0 ⇒ c ≥ 0`, witnessed by one Gram matrix per
/// hypothesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    label: Option<String>,
    hypotheses: Vec<Hypothesis>,
    monomial_vector: MonomialVector,
    conclusion: Polynomial,
}

impl Condition {
    /// # Errors
    ///
    /// Returns [`CertifyError::Malformed`] if there are no hypotheses or a
    /// matrix does not match the monomial vector's length.
    pub fn new(
        label: Option<String>,
        hypotheses: Vec<(Polynomial, SosSlot)>,
        monomial_vector: MonomialVector,
        conclusion: Polynomial,
    ) -> Result<Self, CertifyError> {
        let location = label.clone().unwrap_or_else(|| "condition".to_string());
        if hypotheses.is_empty() {
            return Err(CertifyError::malformed(
                "CERT-008",
                "condition has no hypotheses; use `1` for an unconditional SOS term",
                location,
            ));
        }
        let mut violations = Vec::new();
        for (_, slot) in &hypotheses {
            if slot.gram.dim() != monomial_vector.len() {
                violations.push(Violation::error(
                    "CERT-012",
                    format!(
                        "gram matrix {} is {d}x{d} but the monomial vector has {n} entries",
                        slot.matrix_index,
                        d = slot.gram.dim(),
                        n = monomial_vector.len()
                    ),
                    Some(format!("gram_matrices[{}]", slot.matrix_index)),
                ));
            }
        }
        if !violations.is_empty() {
            return Err(CertifyError::Malformed { violations });
        }
        Ok(Self {
            label,
            hypotheses: hypotheses
                .into_iter()
                .map(|(polynomial, slot)| Hypothesis { polynomial, slot })
                .collect(),
            monomial_vector,
            conclusion,
        })
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    pub fn monomial_vector(&self) -> &MonomialVector {
        &self.monomial_vector
    }

    pub fn conclusion(&self) -> &Polynomial {
        &self.conclusion
    }
}

// ── Certificate ───────────────────────────────────────────────────

/// Immutable, fully bound certificate.
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    targets: Vec<BoundTarget>,
    conditions: Vec<Condition>,
}

impl Certificate {
    /// # Errors
    ///
    /// Returns [`CertifyError::Malformed`] if there are no conditions, or
    /// if the matrix indices of all slots are not exactly `0..n`, each
    /// used once.
    pub fn new(targets: Vec<BoundTarget>, conditions: Vec<Condition>) -> Result<Self, CertifyError> {
        if conditions.is_empty() {
            return Err(CertifyError::malformed(
                "CERT-007",
                "certificate has no conditions",
                "conditions",
            ));
        }
        let mut owners: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (c, condition) in conditions.iter().enumerate() {
            for h in &condition.hypotheses {
                owners.entry(h.slot.matrix_index).or_default().push(c);
            }
        }
        let mut violations = Vec::new();
        for (index, users) in &owners {
            if users.len() > 1 {
                violations.push(Violation::error(
                    "CERT-010",
                    format!("gram matrix {index} is assigned {} times", users.len()),
                    Some(format!("gram_matrices[{index}]")),
                ));
            }
        }
        let n = owners.len();
        if let Some(index) = owners.keys().find(|i| **i >= n) {
            violations.push(Violation::error(
                "CERT-011",
                format!("gram matrix indices are not contiguous: {index} used with only {n} distinct matrices"),
                Some(format!("gram_matrices[{index}]")),
            ));
        }
        if !violations.is_empty() {
            return Err(CertifyError::Malformed { violations });
        }
        Ok(Self {
            targets,
            conditions,
        })
    }

    pub fn targets(&self) -> &[BoundTarget] {
        &self.targets
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Every Gram matrix with its global index, in index order.
    pub fn gram_matrices(&self) -> Vec<(usize, &GramMatrix)> {
        let mut all: Vec<(usize, &GramMatrix)> = self
            .conditions
            .iter()
            .flat_map(|c| c.hypotheses.iter().map(|h| (h.slot.matrix_index, &h.slot.gram)))
            .collect();
        all.sort_by_key(|(i, _)| *i);
        all
    }

    pub fn matrix_count(&self) -> usize {
        self.conditions.iter().map(|c| c.hypotheses.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expression;

    fn template() -> TargetTemplate {
        let params = vec!["x".to_string()];
        let coefficients = vec!["a".to_string(), "b".to_string()];
        let scope = Scope::new().with_variables(["x", "a", "b"]);
        let body = Expression::parse("a + b*x").unwrap().expand(&scope).unwrap();
        TargetTemplate::new("f", params, coefficients, body).unwrap()
    }

    fn identity() -> GramMatrix {
        GramMatrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap()
    }

    fn condition(indices: &[usize]) -> Condition {
        let hypotheses = indices
            .iter()
            .map(|i| (Polynomial::constant(1.0), SosSlot::new(*i, identity())))
            .collect();
        Condition::new(
            None,
            hypotheses,
            MonomialVector::univariate("x", 1),
            Polynomial::zero(),
        )
        .unwrap()
    }

    #[test]
    fn bind_substitutes_all_coefficients() {
        let mut binding = Binding::new();
        binding.insert("a".to_string(), 1.0);
        binding.insert("b".to_string(), 2.0);
        let bound = template().bind(&binding).unwrap();
        assert_eq!(bound.body().variables().len(), 1);
        assert_eq!(bound.to_string(), "f(x) = 2*x + 1");
    }

    #[test]
    fn bind_reports_every_unbound_coefficient() {
        let err = template().bind(&Binding::new()).unwrap_err();
        let CertifyError::Malformed { violations } = err else {
            panic!("expected Malformed");
        };
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.rule == "CERT-005"));
    }

    #[test]
    fn bind_rejects_non_finite() {
        let mut binding = Binding::new();
        binding.insert("a".to_string(), f64::INFINITY);
        binding.insert("b".to_string(), 2.0);
        let err = template().bind(&binding).unwrap_err();
        assert!(err.to_string().contains("CERT-006"));
    }

    #[test]
    fn template_rejects_undeclared_symbol() {
        let body = Polynomial::var("z");
        let err = TargetTemplate::new("f", vec!["x".into()], vec![], body).unwrap_err();
        assert!(err.to_string().contains("undeclared symbol `z`"));
    }

    #[test]
    fn template_rejects_param_coefficient_clash() {
        let err = TargetTemplate::new("f", vec!["x".into()], vec!["x".into()], Polynomial::zero())
            .unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn condition_requires_hypotheses() {
        let err = Condition::new(
            Some("empty".into()),
            vec![],
            MonomialVector::univariate("x", 1),
            Polynomial::zero(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("CERT-008"));
    }

    #[test]
    fn condition_checks_matrix_size() {
        let err = Condition::new(
            None,
            vec![(Polynomial::constant(1.0), SosSlot::new(0, identity()))],
            MonomialVector::univariate("x", 2),
            Polynomial::zero(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("CERT-012"));
    }

    #[test]
    fn certificate_accepts_contiguous_ownership() {
        let cert = Certificate::new(vec![], vec![condition(&[0, 1]), condition(&[2])]).unwrap();
        assert_eq!(cert.matrix_count(), 3);
        let indices: Vec<_> = cert.gram_matrices().iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn certificate_rejects_shared_matrix() {
        let err = Certificate::new(vec![], vec![condition(&[0, 1]), condition(&[1])]).unwrap_err();
        assert!(err.to_string().contains("CERT-010"));
    }

    #[test]
    fn certificate_rejects_gap() {
        let err = Certificate::new(vec![], vec![condition(&[0, 2])]).unwrap_err();
        assert!(err.to_string().contains("CERT-011"));
    }

    #[test]
    fn certificate_requires_conditions() {
        assert!(Certificate::new(vec![], vec![]).is_err());
    }
}
