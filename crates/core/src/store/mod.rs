//! The document store collaborator.
//!
//! The engine reads with GROQ and writes with the mutation protocol; any
//! backend that speaks both can sit behind [`DocumentStore`].

pub mod content_lake;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::document::model::Document;
use crate::mutation::types::PatchMutation;

pub use content_lake::ContentLakeClient;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("content lake responded with {status}: {message}")]
    Status { status: u16, message: String },
    #[error("document `{0}` already exists")]
    Conflict(String),
    #[error("document `{0}` not found")]
    NotFound(String),
    #[error("invalid document: {0}")]
    Invalid(String),
    #[error("invalid query: {0}")]
    Query(String),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a GROQ query with `$param` bindings taken from `params`.
    async fn fetch(&self, query: &str, params: Value) -> StoreResult<Value>;

    /// Create a document. Fails with [`StoreError::Conflict`] when the ID is taken.
    async fn create(&self, document: Document) -> StoreResult<Document>;

    /// Apply a patch to an existing document.
    async fn patch(&self, patch: PatchMutation) -> StoreResult<()>;
}
