//! Orchestrates matrix checks and condition checks into a verdict.
//!
//! Recoverable failures (an invalid matrix, a non-vanishing residual) are
//! collected as [`Finding`]s and never stop the remaining checks. Fatal
//! failures ([`CertifyError::Arithmetic`]) propagate.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, warn};

use crate::certificate::Certificate;
use crate::condition::{self, ConditionReport, OffendingCoefficient};
use crate::error::CertifyError;
use crate::matrix::PsdFailure;
use crate::tolerance::Tolerances;

// ── Modes and verdicts ────────────────────────────────────────────

/// Which phases run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Validate every Gram matrix, then every condition.
    #[default]
    Full,
    /// Conditions only. Trusts that the matrices are PSD.
    Fast,
    /// Report the bound target functions; verify nothing.
    AnswerOnly,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "fast" => Ok(Self::Fast),
            "answer" => Ok(Self::AnswerOnly),
            other => Err(format!(
                "Unknown mode: {other} (expected full, fast, or answer)"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Full => "full",
            Self::Fast => "fast",
            Self::AnswerOnly => "answer",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Verification was deliberately skipped.
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Correct => "CORRECT",
            Self::Incorrect => "INCORRECT",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

// ── Findings ──────────────────────────────────────────────────────

/// A recoverable verification failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    NotPositiveSemidefinite {
        matrix: usize,
        #[serde(flatten)]
        failure: PsdFailure,
    },
    ResidualNonZero {
        condition: usize,
        label: Option<String>,
        max_abs_coefficient: f64,
        offending: Vec<OffendingCoefficient>,
    },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositiveSemidefinite { matrix, failure } => {
                write!(f, "gram matrix {matrix}: {failure}")
            }
            Self::ResidualNonZero {
                condition,
                label,
                max_abs_coefficient,
                offending,
            } => {
                write!(f, "condition {condition}")?;
                if let Some(label) = label {
                    write!(f, " ({label})")?;
                }
                write!(f, ": residual max |coeff| = {max_abs_coefficient:e}")?;
                if !offending.is_empty() {
                    let parts: Vec<String> = offending.iter().map(ToString::to_string).collect();
                    write!(f, "; offending {}", parts.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

// ── Report ────────────────────────────────────────────────────────

/// Closed form of one bound target function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetAnswer {
    pub name: String,
    pub params: Vec<String>,
    pub closed_form: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub mode: Mode,
    pub verdict: Verdict,
    pub tolerances: Tolerances,
    pub targets: Vec<TargetAnswer>,
    pub matrices_checked: usize,
    pub conditions: Vec<ConditionReport>,
    pub findings: Vec<Finding>,
}

impl VerificationReport {
    pub fn is_correct(&self) -> bool {
        self.verdict == Verdict::Correct
    }

    /// Indices of conditions whose residual exceeded the tolerance.
    pub fn failed_conditions(&self) -> Vec<usize> {
        self.conditions
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.index)
            .collect()
    }

    /// Indices of matrices that failed the PSD test.
    pub fn failed_matrices(&self) -> Vec<usize> {
        self.findings
            .iter()
            .filter_map(|f| match f {
                Finding::NotPositiveSemidefinite { matrix, .. } => Some(*matrix),
                Finding::ResidualNonZero { .. } => None,
            })
            .collect()
    }
}

// ── Verification ──────────────────────────────────────────────────

fn answers(certificate: &Certificate) -> Vec<TargetAnswer> {
    certificate
        .targets()
        .iter()
        .map(|t| TargetAnswer {
            name: t.name().to_string(),
            params: t.params().to_vec(),
            closed_form: t.body().to_string(),
        })
        .collect()
}

/// Verify `certificate` in the given mode.
///
/// Conditions are evaluated in declared order and every check runs even
/// after a failure, so the report lists all violations.
///
/// # Errors
///
/// Returns [`CertifyError::Arithmetic`] if the eigen-solver fails or a
/// residual is not finite. A false certificate is not an error.
pub fn verify(
    certificate: &Certificate,
    mode: Mode,
    tol: &Tolerances,
) -> Result<VerificationReport, CertifyError> {
    let targets = answers(certificate);
    let mut report = VerificationReport {
        mode,
        verdict: Verdict::Unknown,
        tolerances: *tol,
        targets,
        matrices_checked: 0,
        conditions: Vec::new(),
        findings: Vec::new(),
    };

    if mode == Mode::AnswerOnly {
        info!(targets = report.targets.len(), "answer-only mode, verification skipped");
        return Ok(report);
    }

    info!(
        %mode,
        matrices = certificate.matrix_count(),
        conditions = certificate.conditions().len(),
        "verifying certificate"
    );

    if mode == Mode::Full {
        for (index, gram) in certificate.gram_matrices() {
            report.matrices_checked += 1;
            if let Some(failure) = gram.psd_failure(tol)? {
                warn!(matrix = index, %failure, "gram matrix is not positive semidefinite");
                report.findings.push(Finding::NotPositiveSemidefinite {
                    matrix: index,
                    failure,
                });
            }
        }
    }

    for (index, condition) in certificate.conditions().iter().enumerate() {
        let result = condition::evaluate(index, condition, tol)?;
        if !result.passed {
            warn!(
                condition = index,
                max_abs_coefficient = result.max_abs_coefficient,
                "condition residual exceeds tolerance"
            );
            report.findings.push(Finding::ResidualNonZero {
                condition: index,
                label: result.label.clone(),
                max_abs_coefficient: result.max_abs_coefficient,
                offending: result.offending.clone(),
            });
        }
        report.conditions.push(result);
    }

    report.verdict = if report.findings.is_empty() {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    };
    info!(verdict = %report.verdict, findings = report.findings.len(), "verification finished");
    Ok(report)
}

/// Render a report as text: the verdict line, then one line per finding
/// (or per target in answer-only mode).
pub fn format_text(report: &VerificationReport) -> String {
    let mut out = String::new();
    if report.mode == Mode::AnswerOnly {
        for t in &report.targets {
            out.push_str(&format!("{}({}) = {}\n", t.name, t.params.join(", "), t.closed_form));
        }
        out.push_str(&format!(
            "The certificate status is {}; run without `--mode answer` to check it\n",
            report.verdict
        ));
        return out;
    }

    out.push_str(&format!("The certificate is {}\n", report.verdict));
    for finding in &report.findings {
        out.push_str(&format!("  - {finding}\n"));
    }
    if report.mode == Mode::Fast {
        out.push_str("  (fast mode: gram matrices were not checked for positive semidefiniteness)\n");
    }
    out
}
