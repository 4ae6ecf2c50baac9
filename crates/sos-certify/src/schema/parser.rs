use std::path::Path;

use tracing::debug;

use crate::error::CertifyError;
use crate::schema::types::CertificateDocument;

/// Parse a YAML certificate file into a [`CertificateDocument`].
///
/// Only the document shape is checked here; structural rules are applied
/// by [`validate_document`](super::validate_document).
///
/// # Errors
///
/// Returns [`CertifyError::Io`] if the file cannot be read,
/// or [`CertifyError::Yaml`] if the YAML is malformed.
pub fn parse_document(path: &Path) -> Result<CertificateDocument, CertifyError> {
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), "read certificate");
    parse_document_str(&content)
}

/// Parse a YAML certificate from a string.
///
/// # Errors
///
/// Returns [`CertifyError::Yaml`] if the YAML is malformed or does not
/// match the document schema.
pub fn parse_document_str(yaml: &str) -> Result<CertificateDocument, CertifyError> {
    let document: CertificateDocument = serde_yaml::from_str(yaml)?;
    Ok(document)
}
