/// Document validation utilities.
use thiserror::Error;

use super::model::Document;
use crate::schema::SchemaType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document _id is required")]
    MissingId,
    #[error("document _type is required")]
    MissingType,
    #[error("document _id cannot be empty")]
    EmptyId,
    #[error("document _type cannot be empty")]
    EmptyType,
    #[error("required field `{0}` is missing")]
    MissingRequiredField(String),
}

/// Validate that a document has the minimum required fields.
pub fn validate_document_fields(
    id: Option<&str>,
    doc_type: Option<&str>,
) -> Result<(), ValidationError> {
    match id {
        None => return Err(ValidationError::MissingId),
        Some("") => return Err(ValidationError::EmptyId),
        _ => {}
    }
    match doc_type {
        None => return Err(ValidationError::MissingType),
        Some("") => return Err(ValidationError::EmptyType),
        _ => {}
    }
    Ok(())
}

/// Check the fields a schema type marks as required.
///
/// A field counts as missing when it is absent, null, or an empty array.
/// Returns every missing field, not just the first.
pub fn validate_required_fields(
    document: &Document,
    schema_type: &SchemaType,
) -> Result<(), Vec<ValidationError>> {
    let missing: Vec<_> = schema_type
        .required
        .iter()
        .filter(|field| match document.get(field) {
            None | Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::Array(items)) => items.is_empty(),
            Some(_) => false,
        })
        .map(|field| ValidationError::MissingRequiredField(field.clone()))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}
