use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tolerance::Tolerances;

/// A complete YAML certificate document.
///
/// Expressions are kept as text here; they are parsed and expanded when
/// the document is turned into a [`Certificate`](crate::certificate::Certificate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateDocument {
    pub metadata: Metadata,
    pub targets: Vec<TargetSpec>,
    /// Numeric value for every template coefficient.
    #[serde(default)]
    pub binding: BTreeMap<String, f64>,
    /// Free variables the hypotheses and conclusions range over.
    #[serde(default)]
    pub variables: Vec<String>,
    /// Default basis for every condition's quadratic forms.
    pub monomial_vector: Vec<String>,
    #[serde(default)]
    pub tolerances: Option<Tolerances>,
    /// Row-major Gram matrices, referenced by index from `conditions`.
    pub gram_matrices: Vec<Vec<Vec<f64>>>,
    pub conditions: Vec<ConditionSpec>,
}

impl CertificateDocument {
    /// The document's tolerances, or the defaults if it carries none.
    pub fn tolerances(&self) -> Tolerances {
        self.tolerances.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Which solver or run produced the certificate.
    #[serde(default)]
    pub source: Option<String>,
}

/// A target function template, e.g. `f(x) = c0 + c1*x + c2*x^2`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub coefficients: Vec<String>,
    pub template: String,
}

/// One implication, with `gram[i]` the matrix owned by `hypotheses[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(default)]
    pub label: Option<String>,
    pub hypotheses: Vec<String>,
    pub conclusion: String,
    pub gram: Vec<usize>,
    /// Overrides the document-level basis for this condition.
    #[serde(default)]
    pub monomial_vector: Option<Vec<String>>,
}

impl ConditionSpec {
    /// Basis to use, falling back to the document's.
    pub fn basis<'a>(&'a self, document: &'a CertificateDocument) -> &'a [String] {
        self.monomial_vector
            .as_deref()
            .unwrap_or(document.monomial_vector.as_slice())
    }
}
