//! In-process document store.
//!
//! Answers GROQ through `multi-language-groq` against a snapshot of its
//! documents. Used by the API when no content lake is configured and as the
//! store double in tests, hence the failure switches.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError, StoreResult};
use crate::document::model::Document;
use crate::document::validate::validate_document_fields;
use crate::mutation::types::PatchMutation;

#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Document>>,
    fail_queries: AtomicBool,
    fail_creates: AtomicBool,
    fail_patches: AtomicBool,
    queries: AtomicUsize,
    creates: AtomicUsize,
    patches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store. Documents without a string `_id` are skipped.
    pub fn with_documents(documents: impl IntoIterator<Item = Value>) -> Self {
        let seeded = documents
            .into_iter()
            .filter_map(Document::from_value)
            .filter_map(|doc| Some((doc.id()?.to_string(), doc)))
            .collect();
        Self {
            documents: RwLock::new(seeded),
            ..Self::default()
        }
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_patches(&self, fail: bool) {
        self.fail_patches.store(fail, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn patch_count(&self) -> usize {
        self.patches.load(Ordering::SeqCst)
    }

    fn simulated_outage() -> StoreError {
        StoreError::Status {
            status: 503,
            message: "simulated outage".into(),
        }
    }
}

fn stamp(document: &mut Document) {
    document.set("_updatedAt", Utc::now().to_rfc3339());
    document.set("_rev", uuid::Uuid::new_v4().simple().to_string());
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch(&self, query: &str, params: Value) -> StoreResult<Value> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Self::simulated_outage());
        }

        let expr = multi_language_groq::parse(query).map_err(|e| StoreError::Query(e.to_string()))?;
        if let Some(missing) = expr.params().into_iter().find(|name| params.get(name).is_none()) {
            return Err(StoreError::Query(format!(
                "param ${missing} referenced, but not provided"
            )));
        }

        let dataset: Vec<Value> = self
            .documents
            .read()
            .await
            .values()
            .cloned()
            .map(Document::into_value)
            .collect();

        tracing::trace!(query, documents = dataset.len(), "evaluating query");
        multi_language_groq::eval_query(&expr, &dataset, &params)
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn create(&self, mut document: Document) -> StoreResult<Document> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(Self::simulated_outage());
        }
        validate_document_fields(document.id(), document.doc_type())
            .map_err(|e| StoreError::Invalid(e.to_string()))?;

        let id = document.id().unwrap_or_default().to_string();
        let mut documents = self.documents.write().await;
        if documents.contains_key(&id) {
            return Err(StoreError::Conflict(id));
        }

        document.set("_createdAt", Utc::now().to_rfc3339());
        stamp(&mut document);
        documents.insert(id, document.clone());
        Ok(document)
    }

    async fn patch(&self, patch: PatchMutation) -> StoreResult<()> {
        self.patches.fetch_add(1, Ordering::SeqCst);
        if self.fail_patches.load(Ordering::SeqCst) {
            return Err(Self::simulated_outage());
        }

        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(&patch.id)
            .ok_or_else(|| StoreError::NotFound(patch.id.clone()))?;

        let mut fields = std::mem::take(document).into_inner();
        patch.apply(&mut fields);
        *document = Document::from(fields);
        stamp(document);
        Ok(())
    }
}
