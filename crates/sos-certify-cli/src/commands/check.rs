use std::path::Path;
use std::str::FromStr;

use sos_certify::error::CertifyError;
use sos_certify::schema::load_certificate;
use sos_certify::tolerance::Tolerances;
use sos_certify::verifier::{Mode, Verdict, format_text, verify};
use tracing::debug;

use super::Outcome;

/// Output format for the verification report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown format: {other} (expected text or json)")),
        }
    }
}

/// Tolerances given on the command line. They take precedence over the
/// document's own `tolerances:` block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToleranceOverrides {
    pub matrix_norm: Option<f64>,
    pub eigenvalue: Option<f64>,
    pub poly_coeff: Option<f64>,
}

impl ToleranceOverrides {
    fn apply(&self, base: Tolerances) -> Result<Tolerances, CertifyError> {
        let resolved = Tolerances {
            matrix_norm: self.matrix_norm.unwrap_or(base.matrix_norm),
            eigenvalue: self.eigenvalue.unwrap_or(base.eigenvalue),
            poly_coeff: self.poly_coeff.unwrap_or(base.poly_coeff),
        };
        for (name, value, _) in resolved.named() {
            if !(value.is_finite() && value > 0.0) {
                return Err(CertifyError::malformed(
                    "CERT-017",
                    format!("tolerance {name} must be positive and finite, got {value}"),
                    "command line",
                ));
            }
        }
        Ok(resolved)
    }
}

pub fn run(
    path: &Path,
    mode: Mode,
    format: OutputFormat,
    overrides: &ToleranceOverrides,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let (document, certificate) = load_certificate(path)?;
    let tolerances = overrides.apply(document.tolerances())?;
    debug!(?tolerances, name = %document.metadata.name, "resolved tolerances");
    let report = verify(&certificate, mode, &tolerances)?;

    match format {
        OutputFormat::Text => print!("{}", format_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(if report.verdict == Verdict::Incorrect {
        Outcome::Incorrect
    } else {
        Outcome::Passed
    })
}
