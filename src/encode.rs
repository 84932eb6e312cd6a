//! Canonical serialization of documents

use tracing::debug;

use crate::error::EncodeError;
use crate::parser::Document;

/// Serialize a document to its canonical YAML text.
///
/// Field order follows the model, not the source the document came from,
/// and empty fields are omitted. A document with nothing to write is an
/// error rather than a valid empty template.
pub fn encode(document: &Document) -> Result<String, EncodeError> {
    let text = serde_yaml::to_string(document)?;
    let body = text.trim();
    if body.is_empty() || body == "{}" {
        return Err(EncodeError::Empty);
    }
    debug!(bytes = text.len(), "encoded template");
    Ok(text)
}
