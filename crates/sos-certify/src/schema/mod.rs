mod loader;
mod parser;
mod types;
mod validator;

pub use loader::load_certificate;
pub use parser::{parse_document, parse_document_str};
pub use types::*;
pub use validator::validate_document;
