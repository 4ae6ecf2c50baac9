use std::collections::{BTreeMap, HashSet};

use crate::error::{CertifyError, Violation};
use crate::expr::{Expression, Inequality, Scope};
use crate::poly::Polynomial;
use crate::schema::types::CertificateDocument;
use crate::sos::MonomialVector;

/// Validate a parsed certificate document for completeness and
/// consistency.
///
/// Returns every violation found. If any violation has
/// [`Severity::Error`](crate::error::Severity::Error), the document cannot
/// be turned into a certificate. Hypotheses and conclusions are expanded
/// against the declared variables and target functions, so a document
/// without errors also builds.
pub fn validate_document(doc: &CertificateDocument) -> Vec<Violation> {
    let mut violations = Vec::new();

    validate_metadata(doc, &mut violations);
    validate_targets(doc, &mut violations);
    validate_binding(doc, &mut violations);
    validate_conditions(doc, &mut violations);
    validate_gram_matrices(doc, &mut violations);
    validate_tolerances(doc, &mut violations);

    violations
}

fn validate_metadata(doc: &CertificateDocument, violations: &mut Vec<Violation>) {
    if doc.metadata.name.trim().is_empty() {
        violations.push(Violation::error(
            "CERT-001",
            "metadata.name must not be empty",
            Some("metadata.name".to_string()),
        ));
    }
    if doc.metadata.description.as_deref().is_none_or(|d| d.trim().is_empty()) {
        violations.push(Violation::warning(
            "CERT-016",
            "metadata.description is missing; say what the certificate proves",
            Some("metadata.description".to_string()),
        ));
    }
}

fn validate_targets(doc: &CertificateDocument, violations: &mut Vec<Violation>) {
    if doc.targets.is_empty() {
        violations.push(Violation::error(
            "CERT-002",
            "targets must contain at least one target function",
            Some("targets".to_string()),
        ));
    }

    let mut names = HashSet::new();
    for target in &doc.targets {
        let location = format!("targets.{}", target.name);
        if !names.insert(target.name.as_str()) {
            violations.push(Violation::error(
                "CERT-003",
                format!("Duplicate target function name: {}", target.name),
                Some(location.clone()),
            ));
        }

        let mut symbols = HashSet::new();
        for symbol in target.params.iter().chain(&target.coefficients) {
            if !symbols.insert(symbol.as_str()) {
                violations.push(Violation::error(
                    "CERT-004",
                    format!("`{symbol}` is declared more than once in `{}`", target.name),
                    Some(location.clone()),
                ));
            }
        }

        let scope = Scope::new().with_variables(
            target
                .params
                .iter()
                .chain(&target.coefficients)
                .map(String::as_str),
        );
        if let Err(e) = Expression::parse(&target.template).and_then(|t| t.expand(&scope)) {
            violations.push(Violation::error(
                "CERT-020",
                format!("template of `{}`: {e}", target.name),
                Some(format!("{location}.template")),
            ));
        }
    }
}

fn validate_binding(doc: &CertificateDocument, violations: &mut Vec<Violation>) {
    let declared: HashSet<&str> = doc
        .targets
        .iter()
        .flat_map(|t| &t.coefficients)
        .map(String::as_str)
        .collect();

    for target in &doc.targets {
        for coefficient in &target.coefficients {
            if !doc.binding.contains_key(coefficient) {
                violations.push(Violation::error(
                    "CERT-005",
                    format!(
                        "coefficient `{coefficient}` of `{}` is unbound",
                        target.name
                    ),
                    Some("binding".to_string()),
                ));
            }
        }
    }

    for (key, value) in &doc.binding {
        if !declared.contains(key.as_str()) {
            violations.push(Violation::error(
                "CERT-019",
                format!("binding key `{key}` is not a coefficient of any target"),
                Some(format!("binding.{key}")),
            ));
        }
        if !value.is_finite() {
            violations.push(Violation::error(
                "CERT-006",
                format!("binding value of `{key}` is not finite: {value}"),
                Some(format!("binding.{key}")),
            ));
        }
    }
}

fn validate_conditions(doc: &CertificateDocument, violations: &mut Vec<Violation>) {
    if doc.conditions.is_empty() {
        violations.push(Violation::error(
            "CERT-007",
            "conditions must contain at least one condition",
            Some("conditions".to_string()),
        ));
    }

    let variables = Scope::new().with_variables(doc.variables.iter().map(String::as_str));
    validate_basis(&doc.monomial_vector, &variables, "monomial_vector", violations);

    let bodies = target_bodies(doc);
    let scope = doc
        .targets
        .iter()
        .zip(&bodies)
        .fold(variables.clone(), |scope, (target, body)| {
            scope.with_function(&target.name, &target.params, body)
        });

    for (i, condition) in doc.conditions.iter().enumerate() {
        let location = format!("conditions[{i}]");
        if condition.hypotheses.is_empty() {
            violations.push(Violation::error(
                "CERT-008",
                format!("{location} has no hypotheses; use \"1\" for an unconditional term"),
                Some(format!("{location}.hypotheses")),
            ));
        }
        if condition.hypotheses.len() != condition.gram.len() {
            violations.push(Violation::error(
                "CERT-009",
                format!(
                    "{location} has {} hypotheses but {} gram indices",
                    condition.hypotheses.len(),
                    condition.gram.len()
                ),
                Some(format!("{location}.gram")),
            ));
        }
        for (j, hypothesis) in condition.hypotheses.iter().enumerate() {
            if let Err(e) = Inequality::parse(hypothesis).and_then(|h| h.to_nonnegative(&scope)) {
                violations.push(Violation::error(
                    "CERT-020",
                    e.to_string(),
                    Some(format!("{location}.hypotheses[{j}]")),
                ));
            }
        }
        if condition.conclusion.trim().is_empty() {
            violations.push(Violation::error(
                "CERT-020",
                format!("{location}.conclusion must not be empty"),
                Some(format!("{location}.conclusion")),
            ));
        } else if let Err(e) =
            Inequality::parse(&condition.conclusion).and_then(|c| c.to_nonnegative(&scope))
        {
            violations.push(Violation::error(
                "CERT-020",
                e.to_string(),
                Some(format!("{location}.conclusion")),
            ));
        }
        if let Some(ref basis) = condition.monomial_vector {
            validate_basis(basis, &variables, &format!("{location}.monomial_vector"), violations);
        }
    }
}

/// Each target's body with its coefficients replaced by their bound
/// values (`1` where unbound). A template that does not expand is zero;
/// its own violation is reported by [`validate_targets`].
fn target_bodies(doc: &CertificateDocument) -> Vec<Polynomial> {
    doc.targets
        .iter()
        .map(|target| {
            let scope = Scope::new().with_variables(
                target
                    .params
                    .iter()
                    .chain(&target.coefficients)
                    .map(String::as_str),
            );
            let values: BTreeMap<String, Polynomial> = target
                .coefficients
                .iter()
                .map(|c| {
                    let value = doc.binding.get(c).copied().filter(|v| v.is_finite());
                    (c.clone(), Polynomial::constant(value.unwrap_or(1.0)))
                })
                .collect();
            Expression::parse(&target.template)
                .and_then(|t| t.expand(&scope))
                .ok()
                .and_then(|body| body.substitute_all(&values))
                .unwrap_or_default()
        })
        .collect()
}

fn validate_basis(
    entries: &[String],
    scope: &Scope<'_>,
    location: &str,
    violations: &mut Vec<Violation>,
) {
    if entries.is_empty() {
        violations.push(Violation::error(
            "CERT-015",
            format!("{location} must not be empty"),
            Some(location.to_string()),
        ));
    }
    for (i, entry) in entries.iter().enumerate() {
        match MonomialVector::parse(std::slice::from_ref(entry), scope) {
            Ok(_) => {}
            Err(CertifyError::Malformed { .. }) => violations.push(Violation::error(
                "CERT-015",
                format!("`{entry}` is not a single monomial with coefficient 1"),
                Some(format!("{location}[{i}]")),
            )),
            Err(e) => violations.push(Violation::error(
                "CERT-020",
                e.to_string(),
                Some(format!("{location}[{i}]")),
            )),
        }
    }
}

fn validate_gram_matrices(doc: &CertificateDocument, violations: &mut Vec<Violation>) {
    let n = doc.gram_matrices.len();

    for (k, rows) in doc.gram_matrices.iter().enumerate() {
        let location = Some(format!("gram_matrices[{k}]"));
        if rows.is_empty() {
            violations.push(Violation::error(
                "CERT-013",
                format!("gram matrix {k} is empty"),
                location,
            ));
            continue;
        }
        if let Some(r) = rows.iter().position(|row| row.len() != rows.len()) {
            violations.push(Violation::error(
                "CERT-013",
                format!(
                    "gram matrix {k} is not square: row {r} has {} entries, expected {}",
                    rows[r].len(),
                    rows.len()
                ),
                location.clone(),
            ));
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            violations.push(Violation::error(
                "CERT-014",
                format!("gram matrix {k} has a non-finite entry"),
                location,
            ));
        }
    }

    let mut owners: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    for (i, condition) in doc.conditions.iter().enumerate() {
        let basis_len = condition.basis(doc).len();
        for (j, &index) in condition.gram.iter().enumerate() {
            let Some(slot_owners) = owners.get_mut(index) else {
                violations.push(Violation::error(
                    "CERT-011",
                    format!("gram index {index} is out of range ({n} matrices)"),
                    Some(format!("conditions[{i}].gram[{j}]")),
                ));
                continue;
            };
            slot_owners.push((i, j));
            let dim = doc.gram_matrices[index].len();
            if dim != basis_len {
                violations.push(Violation::error(
                    "CERT-012",
                    format!(
                        "gram matrix {index} has {dim} rows but conditions[{i}] \
                         uses a monomial vector of length {basis_len}"
                    ),
                    Some(format!("gram_matrices[{index}]")),
                ));
            }
        }
    }

    for (index, slot_owners) in owners.iter().enumerate() {
        match slot_owners.as_slice() {
            [] => violations.push(Violation::error(
                "CERT-011",
                format!("gram matrix {index} is not assigned to any hypothesis"),
                Some(format!("gram_matrices[{index}]")),
            )),
            [_] => {}
            many => {
                let users: Vec<String> = many
                    .iter()
                    .map(|(i, j)| format!("conditions[{i}].gram[{j}]"))
                    .collect();
                violations.push(Violation::error(
                    "CERT-010",
                    format!("gram matrix {index} is shared by {}", users.join(", ")),
                    Some(format!("gram_matrices[{index}]")),
                ));
            }
        }
    }
}

fn validate_tolerances(doc: &CertificateDocument, violations: &mut Vec<Violation>) {
    let Some(tolerances) = doc.tolerances else {
        return;
    };
    for (name, value, default) in tolerances.named() {
        let location = Some(format!("tolerances.{name}"));
        if !(value.is_finite() && value > 0.0) {
            violations.push(Violation::error(
                "CERT-017",
                format!("tolerances.{name} must be positive and finite, got {value}"),
                location,
            ));
        } else if value > default {
            violations.push(Violation::warning(
                "CERT-018",
                format!("tolerances.{name} = {value:e} is looser than the default {default:e}"),
                location,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use crate::schema::parse_document_str;

    const VALID: &str = r#"
metadata:
  name: "linear"
  description: "f(x) = 1 + x is at least 1 on x >= 0"
targets:
  - name: f
    params: [x]
    coefficients: [a, b]
    template: "a + b*x"
binding: { a: 1.0, b: 1.0 }
variables: [x]
monomial_vector: ["1"]
gram_matrices:
  - [[1.0]]
  - [[0.0]]
conditions:
  - label: "lower bound"
    hypotheses: ["x >= 0", "1"]
    conclusion: "f(x) >= 1"
    gram: [0, 1]
"#;

    fn errors(violations: &[Violation]) -> Vec<&str> {
        violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .map(|v| v.rule.as_str())
            .collect()
    }

    fn check(yaml: &str) -> Vec<Violation> {
        validate_document(&parse_document_str(yaml).unwrap())
    }

    #[test]
    fn valid_document_has_no_violations() {
        let violations = check(VALID);
        assert!(violations.is_empty(), "unexpected: {violations:?}");
    }

    #[test]
    fn missing_description_warns() {
        let yaml = VALID.replace("  description: \"f(x) = 1 + x is at least 1 on x >= 0\"\n", "");
        let violations = check(&yaml);
        assert!(errors(&violations).is_empty());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "CERT-016");
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[test]
    fn empty_name() {
        let yaml = VALID.replace("name: \"linear\"", "name: \"\"");
        assert_eq!(errors(&check(&yaml)), vec!["CERT-001"]);
    }

    #[test]
    fn unbound_and_unknown_coefficients() {
        let yaml = VALID.replace("{ a: 1.0, b: 1.0 }", "{ a: 1.0, c: 2.0 }");
        let v = check(&yaml);
        let rules = errors(&v);
        assert!(rules.contains(&"CERT-005"));
        assert!(rules.contains(&"CERT-019"));
    }

    #[test]
    fn non_finite_binding() {
        let yaml = VALID.replace("b: 1.0", "b: .nan");
        assert_eq!(errors(&check(&yaml)), vec!["CERT-006"]);
    }

    #[test]
    fn duplicate_target_names() {
        let yaml = VALID.replace(
            "    template: \"a + b*x\"\n",
            "    template: \"a + b*x\"\n  - name: f\n    params: [x]\n    template: \"x\"\n",
        );
        assert_eq!(errors(&check(&yaml)), vec!["CERT-003"]);
    }

    #[test]
    fn template_with_undeclared_symbol() {
        let yaml = VALID.replace("\"a + b*x\"", "\"a + b*y\"");
        assert_eq!(errors(&check(&yaml)), vec!["CERT-020"]);
    }

    #[test]
    fn hypothesis_and_gram_counts_must_agree() {
        let yaml = VALID.replace("gram: [0, 1]", "gram: [0]");
        let v = check(&yaml);
        let rules = errors(&v);
        assert!(rules.contains(&"CERT-009"));
        // matrix 1 is now unowned
        assert!(rules.contains(&"CERT-011"));
    }

    #[test]
    fn shared_matrix() {
        let yaml = VALID.replace("gram: [0, 1]", "gram: [0, 0]");
        let v = check(&yaml);
        let rules = errors(&v);
        assert!(rules.contains(&"CERT-010"));
        assert!(rules.contains(&"CERT-011"));
    }

    #[test]
    fn gram_index_out_of_range() {
        let yaml = VALID.replace("gram: [0, 1]", "gram: [0, 7]");
        let v = check(&yaml);
        assert!(v.iter().any(|v| v.rule == "CERT-011"
            && v.location.as_deref() == Some("conditions[0].gram[1]")));
    }

    #[test]
    fn matrix_shape_rules() {
        let yaml = VALID.replace("  - [[0.0]]\n", "  - [[0.0, 1.0], [1.0]]\n");
        let v = check(&yaml);
        let rules = errors(&v);
        assert!(rules.contains(&"CERT-013"));
        assert!(rules.contains(&"CERT-012"));
    }

    #[test]
    fn non_finite_matrix_entry() {
        let yaml = VALID.replace("  - [[0.0]]\n", "  - [[.inf]]\n");
        assert_eq!(errors(&check(&yaml)), vec!["CERT-014"]);
    }

    #[test]
    fn bad_monomial_entry() {
        let yaml = VALID.replace("monomial_vector: [\"1\"]", "monomial_vector: [\"1 + x\"]");
        assert!(errors(&check(&yaml)).contains(&"CERT-015"));
    }

    #[test]
    fn bad_expression_syntax() {
        let yaml = VALID.replace("\"f(x) >= 1\"", "\"f(x) >= \"");
        let v = check(&yaml);
        assert_eq!(errors(&v), vec!["CERT-020"]);
        assert_eq!(v[0].location.as_deref(), Some("conditions[0].conclusion"));
    }

    #[test]
    fn undeclared_variable_in_conclusion() {
        let yaml = VALID.replace("\"f(x) >= 1\"", "\"f(y) >= 1\"");
        let v = check(&yaml);
        assert_eq!(errors(&v), vec!["CERT-020"]);
        assert!(v[0].message.contains("unknown identifier `y`"), "{}", v[0].message);
        assert_eq!(v[0].location.as_deref(), Some("conditions[0].conclusion"));
    }

    #[test]
    fn unknown_function_and_arity_in_hypotheses() {
        let yaml = VALID.replace("\"x >= 0\", \"1\"", "\"g(x) >= 0\", \"f(x, x)\"");
        let v = check(&yaml);
        assert_eq!(errors(&v), vec!["CERT-020", "CERT-020"]);
        assert!(v[0].message.contains("unknown function `g`"));
        assert!(v[1].message.contains("takes 1 argument(s), 2 given"));
        assert_eq!(v[1].location.as_deref(), Some("conditions[0].hypotheses[1]"));
    }

    #[test]
    fn huge_exponent_is_rejected() {
        let yaml = VALID.replace("\"x >= 0\"", "\"x^4000000000 >= 0\"");
        let v = check(&yaml);
        assert_eq!(errors(&v), vec!["CERT-020"]);
        assert!(v[0].message.contains("maximum degree"), "{}", v[0].message);
    }

    #[test]
    fn call_exceeding_max_degree_is_rejected() {
        let yaml = VALID
            .replace("\"a + b*x\"", "\"a + b*x^40\"")
            .replace("\"f(x) >= 1\"", "\"f(x^2) >= 1\"");
        let v = check(&yaml);
        assert_eq!(errors(&v), vec!["CERT-020"]);
        assert!(v[0].message.contains("degree 80"), "{}", v[0].message);
    }

    #[test]
    fn equality_is_rejected() {
        let yaml = VALID.replace("\"x >= 0\"", "\"x == 0\"");
        assert_eq!(errors(&check(&yaml)), vec!["CERT-020"]);
    }

    #[test]
    fn no_conditions_and_no_targets() {
        let yaml = r#"
metadata: { name: "empty", description: "nothing" }
targets: []
monomial_vector: ["1"]
gram_matrices: []
conditions: []
"#;
        let v = check(yaml);
        let rules = errors(&v);
        assert!(rules.contains(&"CERT-002"));
        assert!(rules.contains(&"CERT-007"));
    }

    #[test]
    fn tolerance_rules() {
        let loose = format!("{VALID}tolerances: {{ poly_coeff: 0.1 }}\n");
        let v = check(&loose);
        assert!(errors(&v).is_empty());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].rule, "CERT-018");

        let negative = format!("{VALID}tolerances: {{ eigenvalue: -1.0 }}\n");
        assert_eq!(errors(&check(&negative)), vec!["CERT-017"]);

        let tighter = format!("{VALID}tolerances: {{ matrix_norm: 1.0e-9 }}\n");
        assert!(check(&tighter).is_empty());
    }

    #[test]
    fn all_violations_are_collected() {
        let yaml = VALID
            .replace("name: \"linear\"", "name: \"\"")
            .replace("gram: [0, 1]", "gram: [0]")
            .replace("b: 1.0", "b: .inf");
        let v = check(&yaml);
        let rules = errors(&v);
        for rule in ["CERT-001", "CERT-006", "CERT-009", "CERT-011"] {
            assert!(rules.contains(&rule), "missing {rule} in {rules:?}");
        }
    }
}
