use std::path::Path;

use sos_certify::schema::parse_document;

use super::Outcome;

pub fn run(path: &Path) -> Result<Outcome, Box<dyn std::error::Error>> {
    let document = parse_document(path)?;

    println!("Certificate: {}", document.metadata.name);
    if let Some(ref description) = document.metadata.description {
        println!("Description: {description}");
    }
    if let Some(ref source) = document.metadata.source {
        println!("Source: {source}");
    }

    println!("Targets: {}", document.targets.len());
    for t in &document.targets {
        println!(
            "  {}({}) = {}  [coefficients: {}]",
            t.name,
            t.params.join(", "),
            t.template,
            t.coefficients.join(", ")
        );
    }
    println!("Variables: {}", document.variables.join(", "));
    println!("Monomial vector: [{}]", document.monomial_vector.join(", "));

    println!("Gram matrices: {}", document.gram_matrices.len());
    for (i, rows) in document.gram_matrices.iter().enumerate() {
        let cols = rows.first().map_or(0, Vec::len);
        println!("  [{i}] {}x{cols}", rows.len());
    }

    println!("Conditions: {}", document.conditions.len());
    for (i, c) in document.conditions.iter().enumerate() {
        let label = c.label.as_deref().unwrap_or("-");
        println!(
            "  [{i}] {label}: {} hypothesis(es) => {}  (gram {:?})",
            c.hypotheses.len(),
            c.conclusion,
            c.gram
        );
    }

    let tolerances = document.tolerances();
    let origin = if document.tolerances.is_some() { "document" } else { "default" };
    println!("Tolerances ({origin}):");
    for (name, value, _) in tolerances.named() {
        println!("  {name}: {value:e}");
    }

    Ok(Outcome::Passed)
}
