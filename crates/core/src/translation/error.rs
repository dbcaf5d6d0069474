use thiserror::Error;

use crate::document::validate::ValidationError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Failures of the translation engine. Nothing is half-written when one of
/// these is returned: reads fail before any write, and the only write that
/// can fail the operation is the create itself.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// A read failed; retrying is safe.
    #[error("query failed: {0}")]
    QueryFailed(#[source] StoreError),

    #[error("create failed: {0}")]
    CreateFailed(#[source] StoreError),

    /// Only ever logged; the advisory backfill patch never fails an operation.
    #[error("patch failed: {0}")]
    PatchFailed(#[source] StoreError),

    #[error("cannot translate reference with id {0}")]
    UnresolvableReference(String),

    #[error(transparent)]
    SchemaViolation(#[from] SchemaError),

    #[error("language `{0}` is not configured")]
    UnknownLanguage(String),

    #[error("type `{0}` does not support translations")]
    NotTranslatable(String),

    #[error("invalid document: {0}")]
    InvalidDocument(#[from] ValidationError),
}

impl From<serde_json::Error> for TranslationError {
    fn from(err: serde_json::Error) -> Self {
        TranslationError::QueryFailed(StoreError::Decode(err))
    }
}

pub type TranslationResult<T> = Result<T, TranslationError>;
