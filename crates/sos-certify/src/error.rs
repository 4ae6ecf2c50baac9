use thiserror::Error;

/// Fatal failures: anything that prevents a verdict from being reached.
///
/// A false certificate is *not* an error. Invalid Gram matrices and
/// non-vanishing residuals are reported as
/// [`Finding`](crate::verifier::Finding)s inside the verification report.
#[derive(Debug, Error)]
pub enum CertifyError {
    #[error("Failed to read certificate file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid expression `{input}` at byte {position}: {message}")]
    Expression {
        input: String,
        position: usize,
        message: String,
    },

    #[error("Malformed certificate: {}", summarize(violations))]
    Malformed { violations: Vec<Violation> },

    #[error("Degree overflow: {0}")]
    DegreeOverflow(String),

    #[error("Arithmetic failure: {0}")]
    Arithmetic(String),
}

impl CertifyError {
    /// Shorthand for a single structural error.
    pub fn malformed(rule: &str, message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Malformed {
            violations: vec![Violation::error(rule, message, Some(location.into()))],
        }
    }

    /// `true` when the input must be fixed, `false` when the tooling failed.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Arithmetic(_))
    }
}

fn summarize(violations: &[Violation]) -> String {
    let errors: Vec<String> = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .map(ToString::to_string)
        .collect();
    match errors.len() {
        0 => "no error-level violations".to_string(),
        1 => errors[0].clone(),
        n => format!("{n} violations; first: {}", errors[0]),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub severity: Severity,
    pub rule: String,
    pub message: String,
    pub location: Option<String>,
}

impl Violation {
    pub fn error(rule: &str, message: impl Into<String>, location: Option<String>) -> Self {
        Self {
            severity: Severity::Error,
            rule: rule.to_string(),
            message: message.into(),
            location,
        }
    }

    pub fn warning(rule: &str, message: impl Into<String>, location: Option<String>) -> Self {
        Self {
            severity: Severity::Warning,
            rule: rule.to_string(),
            message: message.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        };
        write!(f, "[{prefix}] {}: {}", self.rule, self.message)?;
        if let Some(ref location) = self.location {
            write!(f, " (at {location})")?;
        }
        Ok(())
    }
}
