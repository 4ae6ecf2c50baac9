use std::path::Path;

use tracing::debug;

use crate::certificate::{BoundTarget, Certificate, Condition, SosSlot, TargetTemplate};
use crate::error::{CertifyError, Severity, Violation};
use crate::expr::{Expression, Inequality, Scope};
use crate::matrix::GramMatrix;
use crate::schema::parser::parse_document;
use crate::schema::types::CertificateDocument;
use crate::schema::validator::validate_document;
use crate::sos::MonomialVector;

impl Certificate {
    /// Validate a document, bind its targets and freeze it into a
    /// certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CertifyError::Malformed`] carrying every violation if any
    /// has error severity, including expressions that name a variable or
    /// function that is not in scope.
    pub fn from_document(doc: &CertificateDocument) -> Result<Self, CertifyError> {
        let violations = validate_document(doc);
        if violations.iter().any(|v| v.severity == Severity::Error) {
            return Err(CertifyError::Malformed { violations });
        }

        let targets = doc
            .targets
            .iter()
            .map(|spec| {
                let scope = Scope::new().with_variables(
                    spec.params.iter().chain(&spec.coefficients).map(String::as_str),
                );
                let body = Expression::parse(&spec.template)?.expand(&scope)?;
                TargetTemplate::new(
                    spec.name.clone(),
                    spec.params.clone(),
                    spec.coefficients.clone(),
                    body,
                )?
                .bind(&doc.binding)
            })
            .collect::<Result<Vec<BoundTarget>, CertifyError>>()?;

        let mut grams = doc
            .gram_matrices
            .iter()
            .map(|rows| GramMatrix::from_rows(rows).map(Some))
            .collect::<Result<Vec<Option<GramMatrix>>, CertifyError>>()?;

        let conditions = {
            let variables = Scope::new().with_variables(doc.variables.iter().map(String::as_str));
            let scope = targets.iter().fold(variables.clone(), |scope, t| {
                scope.with_function(t.name(), t.params(), t.body())
            });

            let mut conditions = Vec::with_capacity(doc.conditions.len());
            for (i, spec) in doc.conditions.iter().enumerate() {
                let basis = MonomialVector::parse(spec.basis(doc), &variables)?;
                let mut hypotheses = Vec::with_capacity(spec.hypotheses.len());
                for (j, (text, &index)) in spec.hypotheses.iter().zip(&spec.gram).enumerate() {
                    let polynomial = Inequality::parse(text)?.to_nonnegative(&scope)?;
                    let gram = grams.get_mut(index).and_then(Option::take).ok_or_else(|| {
                        CertifyError::Malformed {
                            violations: vec![Violation::error(
                                "CERT-010",
                                format!("gram matrix {index} is not available for this hypothesis"),
                                Some(format!("conditions[{i}].gram[{j}]")),
                            )],
                        }
                    })?;
                    hypotheses.push((polynomial, SosSlot::new(index, gram)));
                }
                let conclusion = Inequality::parse(&spec.conclusion)?.to_nonnegative(&scope)?;
                conditions.push(Condition::new(spec.label.clone(), hypotheses, basis, conclusion)?);
            }
            conditions
        };

        debug!(
            name = %doc.metadata.name,
            targets = targets.len(),
            conditions = conditions.len(),
            "certificate built"
        );
        Certificate::new(targets, conditions)
    }
}

/// Parse, validate and build a certificate file in one step. The document
/// is returned alongside so callers can read its metadata and tolerances.
///
/// # Errors
///
/// Any error from [`parse_document`] or [`Certificate::from_document`].
pub fn load_certificate(path: &Path) -> Result<(CertificateDocument, Certificate), CertifyError> {
    let doc = parse_document(path)?;
    let certificate = Certificate::from_document(&doc)?;
    Ok((doc, certificate))
}
