use std::path::Path;

use sos_certify::error::Severity;
use sos_certify::schema::{parse_document, validate_document};

use super::Outcome;

pub fn run(path: &Path) -> Result<Outcome, Box<dyn std::error::Error>> {
    let document = parse_document(path)?;
    let violations = validate_document(&document);

    let errors = violations
        .iter()
        .filter(|v| v.severity == Severity::Error)
        .count();
    let warnings = violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .count();

    for v in &violations {
        println!("{v}");
    }

    println!("\n{errors} error(s), {warnings} warning(s)");

    if errors == 0 {
        println!("Certificate is well-formed.");
        Ok(Outcome::Passed)
    } else {
        Ok(Outcome::Malformed)
    }
}
