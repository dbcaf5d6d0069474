use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::error::{TranslationError, TranslationResult};
use super::queries;
use super::result::{DuplicateResult, ReferencedDocument, TranslationSlot, UntranslatedReferences};
use crate::config::LanguagesConfig;
use crate::document::id::{new_draft_id, DocumentRef};
use crate::document::model::{Document, LANGUAGE_FIELD, TRANSLATION_ID_FIELD};
use crate::document::validate::{validate_document_fields, validate_required_fields};
use crate::events::bus::EventBus;
use crate::events::types::{CreationMode, TranslationCreated, TranslationEvent};
use crate::mutation::types::PatchMutation;
use crate::reference::walker::{collect_references, prune, transform, Visit};
use crate::reference::{Reference, REF_FIELD, STRENGTHEN_ON_PUBLISH_FIELD, WEAK_FIELD};
use crate::schema::{initial_value, SchemaRegistry};
use crate::store::DocumentStore;

/// Extra fields for fresh translations, derived from the original.
pub type FreshProperties = Arc<dyn Fn(&Document) -> Map<String, Value> + Send + Sync>;

#[derive(Deserialize)]
struct IdOnly {
    #[serde(rename = "_id")]
    id: String,
}

/// Creates language variants of documents against a [`DocumentStore`].
///
/// Operations are not idempotent: every call that succeeds creates a new
/// draft. Callers must not resubmit while a request is in flight.
#[derive(Clone)]
pub struct TranslationEngine {
    store: Arc<dyn DocumentStore>,
    schema: Arc<SchemaRegistry>,
    config: Arc<LanguagesConfig>,
    events: Option<EventBus>,
    fresh_properties: Option<FreshProperties>,
    validate_clean_duplicates: bool,
}

impl TranslationEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        schema: Arc<SchemaRegistry>,
        config: Arc<LanguagesConfig>,
    ) -> Self {
        Self {
            store,
            schema,
            config,
            events: None,
            fresh_properties: None,
            validate_clean_duplicates: false,
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_fresh_properties<F>(mut self, properties: F) -> Self
    where
        F: Fn(&Document) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.fresh_properties = Some(Arc::new(properties));
        self
    }

    /// Withhold the pruned clone when it no longer satisfies the schema's
    /// required fields.
    pub fn with_clean_duplicate_validation(mut self, enabled: bool) -> Self {
        self.validate_clean_duplicates = enabled;
        self
    }

    pub fn config(&self) -> &LanguagesConfig {
        &self.config
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// New empty document of the original's type in `language`, in the
    /// original's translation group.
    #[tracing::instrument(skip_all, fields(language = %language))]
    pub async fn create_fresh_translation(
        &self,
        original: &Document,
        language: &str,
    ) -> TranslationResult<Document> {
        self.check_request(original, language)?;

        let mut fresh = Document::from(
            self.fresh_properties
                .as_ref()
                .map(|properties| properties(original))
                .unwrap_or_default(),
        );
        fresh.set("_type", original.doc_type().unwrap_or_default());
        fresh.set("_id", new_draft_id().full_id());
        let translation_id = group_id(original);
        fresh.set(TRANSLATION_ID_FIELD, translation_id.as_str());
        fresh.set(LANGUAGE_FIELD, language);

        let created = self.persist(original, &translation_id, fresh).await?;
        tracing::info!(id = created.id(), "fresh translation created");
        self.announce(&created, CreationMode::Fresh);
        Ok(created)
    }

    /// Initial field values for a new document of `type_name`. A document
    /// created from a reference field inherits its parent's language; without
    /// a usable parent the explicit `language` applies, then the default.
    #[tracing::instrument(skip(self))]
    pub async fn initial_value_for(
        &self,
        type_name: &str,
        parent_id: Option<&str>,
        language: Option<&str>,
    ) -> TranslationResult<Map<String, Value>> {
        if !self.schema.type_has_language(type_name) {
            return Err(TranslationError::NotTranslatable(type_name.to_string()));
        }
        if let Some(code) = language.filter(|code| !self.config.contains(code)) {
            return Err(TranslationError::UnknownLanguage(code.to_string()));
        }
        let inherited = match parent_id {
            Some(parent_id) => self.parent_language(parent_id).await?,
            None => None,
        };
        Ok(initial_value(&self.config, inherited.as_deref().or(language)))
    }

    /// Clone the original into `language`, pointing every reference at its
    /// sibling translation, or report the references that have none.
    #[tracing::instrument(skip_all, fields(language = %language))]
    pub async fn create_duplicate_translation(
        &self,
        original: &Document,
        language: &str,
    ) -> TranslationResult<DuplicateResult> {
        self.check_request(original, language)?;
        self.duplicate(original, language).await
    }

    /// Retry with the pruned clone from an earlier
    /// [`DuplicateResult::UntranslatedReferencesFound`]. References that
    /// became untranslated in the meantime are reported again.
    #[tracing::instrument(skip_all, fields(language = %language))]
    pub async fn confirm_duplicate_without_references(
        &self,
        clean_duplicate: &Document,
        language: &str,
    ) -> TranslationResult<DuplicateResult> {
        self.check_request(clean_duplicate, language)?;
        let result = self.duplicate(clean_duplicate, language).await?;
        if !result.is_success() {
            tracing::warn!("untranslated references reappeared in the clean duplicate");
        }
        Ok(result)
    }

    /// Members of a translation group keyed by language. Members without a
    /// language are keyed by the default language; a draft wins over the
    /// published copy of the same language.
    #[tracing::instrument(skip(self))]
    pub async fn list_translations(
        &self,
        translation_id: &str,
    ) -> TranslationResult<BTreeMap<String, Document>> {
        let members: Vec<Document> = serde_json::from_value(
            self.fetch(queries::GROUP_MEMBERS, json!({ "translationId": translation_id }))
                .await?,
        )?;

        let mut by_language: BTreeMap<String, Document> = BTreeMap::new();
        for member in members {
            let language = member
                .language()
                .unwrap_or(self.config.default_language.as_str())
                .to_string();
            match by_language.get(&language) {
                Some(existing) if !replaces(existing, &member) => {
                    if existing.id_ref().map(|r| r.base_id().to_string())
                        != member.id_ref().map(|r| r.base_id().to_string())
                    {
                        tracing::warn!(
                            language = %language,
                            kept = existing.id(),
                            ignored = member.id(),
                            "translation group has two documents in one language"
                        );
                    }
                }
                _ => {
                    by_language.insert(language, member);
                }
            }
        }
        Ok(by_language)
    }

    /// One slot per configured language other than the original's, with the
    /// existing translation if there is one.
    pub async fn translation_overview(
        &self,
        original: &Document,
    ) -> TranslationResult<Vec<TranslationSlot>> {
        let mut translations = match original.translation_id() {
            Some(translation_id) => self.list_translations(translation_id).await?,
            None => BTreeMap::new(),
        };
        let current = original.language().unwrap_or(self.config.default_language.as_str());

        Ok(self
            .config
            .languages
            .iter()
            .filter(|(code, _)| code.as_str() != current)
            .map(|(code, info)| TranslationSlot::new(code, info, translations.remove(code)))
            .collect())
    }

    /// Referenced documents that take part in translation but have no
    /// member in `language`, deduplicated by base ID (published preferred).
    pub async fn find_untranslated_references(
        &self,
        document: &Value,
        language: &str,
    ) -> TranslationResult<Vec<ReferencedDocument>> {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        for target in collect_references(document).iter().filter_map(Reference::target_ref) {
            for id in target.candidate_ids() {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<ReferencedDocument> = serde_json::from_value(
            self.fetch(queries::REFERENCED_DOCUMENTS, json!({ "ids": ids }))
                .await?,
        )?;
        let translatable = dedupe_by_base_id(
            found
                .into_iter()
                .filter(|doc| self.schema.type_has_language(&doc.doc_type)),
        );
        tracing::debug!(
            references = ids.len() / 2,
            translatable = translatable.len(),
            "classifying references"
        );

        let checked = try_join_all(translatable.into_iter().map(|doc| async move {
            let Some(translation_id) = doc.translation_id.as_deref() else {
                return Ok(Some(doc));
            };
            let count: u64 = serde_json::from_value(
                self.fetch(
                    queries::COUNT_IN_LANGUAGE,
                    json!({ "translationId": translation_id, "language": language }),
                )
                .await?,
            )?;
            Ok::<_, TranslationError>((count == 0).then_some(doc))
        }))
        .await?;

        Ok(checked.into_iter().flatten().collect())
    }

    async fn duplicate(&self, original: &Document, language: &str) -> TranslationResult<DuplicateResult> {
        let source = original.clone().into_value();
        let untranslated = self.find_untranslated_references(&source, language).await?;

        if !untranslated.is_empty() {
            let excluded: Vec<&str> = untranslated.iter().map(|doc| doc.id.as_str()).collect();
            tracing::info!(untranslated = ?excluded, "untranslated references found");
            let clean_duplicate = Document::from_value(prune(&source, &excluded))
                .filter(|clean| self.clean_duplicate_is_valid(clean));
            return Ok(DuplicateResult::UntranslatedReferencesFound(UntranslatedReferences {
                references: untranslated,
                clean_duplicate,
                language: language.to_string(),
            }));
        }

        let document = self.create_duplicate(original, language).await?;
        Ok(DuplicateResult::Success { document })
    }

    async fn create_duplicate(&self, original: &Document, language: &str) -> TranslationResult<Document> {
        let translation_id = group_id(original);
        let body = original.without_system_fields().into_value();
        let rewritten = transform(&body, move |node| self.point_to_translation(node, language)).await?;

        let mut duplicate = Document::from_value(rewritten).unwrap_or_default();
        duplicate.set("_id", new_draft_id().full_id());
        duplicate.set(TRANSLATION_ID_FIELD, translation_id.as_str());
        duplicate.set(LANGUAGE_FIELD, language);

        let created = self.persist(original, &translation_id, duplicate).await?;
        tracing::info!(id = created.id(), "duplicate translation created");
        self.announce(&created, CreationMode::Duplicate);
        Ok(created)
    }

    /// Rewrite one reference to the `language` member of its target's group.
    async fn point_to_translation(
        &self,
        mut node: Map<String, Value>,
        language: &str,
    ) -> TranslationResult<Visit> {
        let Some(reference) = Reference::from_map(&node) else {
            return Ok(Visit::Keep);
        };
        let Some(target) = reference.target_ref() else {
            return Ok(Visit::Keep);
        };
        let strengthen_on_publish = reference.strengthen_on_publish();

        let [id, draft_id] = target.candidate_ids();
        let found: Vec<ReferencedDocument> = serde_json::from_value(
            self.fetch(
                queries::REFERENCED_DOCUMENT,
                json!({ "id": id, "draftId": draft_id }),
            )
            .await?,
        )?;
        let referenced = found
            .iter()
            .find(|doc| doc.id_ref().is_published())
            .or_else(|| found.first());

        let Some(referenced) = referenced else {
            if strengthen_on_publish {
                // Created inline and not stored yet.
                node.insert(REF_FIELD.into(), Value::String(uuid::Uuid::new_v4().to_string()));
                return Ok(Visit::Replace(Value::Object(node)));
            }
            return Ok(Visit::Keep);
        };

        if !self.schema.type_has_language(&referenced.doc_type) {
            return Ok(Visit::Keep);
        }

        let unresolvable = || TranslationError::UnresolvableReference(target.to_string());
        let translation_id = referenced.translation_id.as_deref().ok_or_else(unresolvable)?;
        let siblings: Vec<IdOnly> = serde_json::from_value(
            self.fetch(
                queries::IDS_IN_LANGUAGE,
                json!({ "translationId": translation_id, "language": language }),
            )
            .await?,
        )?;
        let siblings: Vec<DocumentRef> = siblings.iter().map(|s| DocumentRef::parse(&s.id)).collect();

        if let Some(published) = siblings.iter().find(|id| id.is_published()) {
            node.insert(REF_FIELD.into(), Value::String(published.base_id().to_string()));
            node.shift_remove(WEAK_FIELD);
            node.shift_remove(STRENGTHEN_ON_PUBLISH_FIELD);
            return Ok(Visit::Replace(Value::Object(node)));
        }

        let draft = siblings.first().ok_or_else(unresolvable)?;
        node.insert(REF_FIELD.into(), Value::String(draft.base_id().to_string()));
        node.insert(WEAK_FIELD.into(), Value::Bool(true));
        node.insert(
            STRENGTHEN_ON_PUBLISH_FIELD.into(),
            json!({ "_type": referenced.doc_type }),
        );
        Ok(Visit::Replace(Value::Object(node)))
    }

    /// Create the new variant while backfilling the original's group ID.
    /// The patch is advisory: its failure is logged and otherwise ignored.
    async fn persist(
        &self,
        original: &Document,
        translation_id: &str,
        document: Document,
    ) -> TranslationResult<Document> {
        let backfill = async {
            let Some(original_id) = original.id() else {
                return;
            };
            let mut fields = Map::new();
            fields.insert(TRANSLATION_ID_FIELD.into(), Value::String(translation_id.to_string()));
            let patch = PatchMutation::new(original_id).set_if_missing(fields);
            if let Err(err) = self.store.patch(patch).await {
                tracing::warn!(
                    error = %TranslationError::PatchFailed(err),
                    original = original_id,
                    "translationId backfill did not apply"
                );
            }
        };

        let ((), created) = futures::join!(backfill, self.store.create(document));
        created.map_err(TranslationError::CreateFailed)
    }

    /// Language of the parent document, published copy first. Languages that
    /// are not configured are ignored.
    async fn parent_language(&self, parent_id: &str) -> TranslationResult<Option<String>> {
        let [id, draft_id] = DocumentRef::parse(parent_id).candidate_ids();
        let found: Vec<Document> = serde_json::from_value(
            self.fetch(queries::PARENT_LANGUAGE, json!({ "id": id, "draftId": draft_id }))
                .await?,
        )?;
        let language = found
            .iter()
            .filter(|doc| doc.language().is_some_and(|code| self.config.contains(code)))
            .min_by_key(|doc| doc.id_ref().is_some_and(|id| id.is_draft()))
            .and_then(Document::language)
            .map(str::to_string);
        if language.is_none() {
            tracing::debug!(parent = parent_id, "parent has no usable language");
        }
        Ok(language)
    }

    async fn fetch(&self, query: &str, params: Value) -> TranslationResult<Value> {
        self.store
            .fetch(query, params)
            .await
            .map_err(TranslationError::QueryFailed)
    }

    fn check_request(&self, original: &Document, language: &str) -> TranslationResult<()> {
        if !self.config.contains(language) {
            return Err(TranslationError::UnknownLanguage(language.to_string()));
        }
        validate_document_fields(original.id(), original.doc_type())?;
        Ok(())
    }

    fn clean_duplicate_is_valid(&self, clean: &Document) -> bool {
        if !self.validate_clean_duplicates {
            return true;
        }
        let Some(schema_type) = clean.doc_type().and_then(|name| self.schema.get(name)) else {
            return true;
        };
        match validate_required_fields(clean, schema_type) {
            Ok(()) => true,
            Err(errors) => {
                tracing::info!(?errors, "clean duplicate withheld");
                false
            }
        }
    }

    fn announce(&self, created: &Document, mode: CreationMode) {
        let Some(events) = &self.events else {
            return;
        };
        let event = TranslationEvent::Created(TranslationCreated {
            document_id: created.id().unwrap_or_default().to_string(),
            document_type: created.doc_type().unwrap_or_default().to_string(),
            translation_id: created.translation_id().unwrap_or_default().to_string(),
            language: created.language().unwrap_or_default().to_string(),
            mode,
            timestamp: Utc::now(),
        });
        if events.publish(event) == 0 {
            tracing::debug!("no subscribers for translation events");
        }
    }
}

/// The original's group ID, or a new one when it predates translation support.
fn group_id(original: &Document) -> String {
    original
        .translation_id()
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Whether `candidate` should replace `existing` in a language slot.
fn replaces(existing: &Document, candidate: &Document) -> bool {
    let is_draft = |doc: &Document| doc.id_ref().is_some_and(|id| id.is_draft());
    is_draft(candidate) && !is_draft(existing)
}

fn dedupe_by_base_id(docs: impl Iterator<Item = ReferencedDocument>) -> Vec<ReferencedDocument> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<ReferencedDocument> = Vec::new();
    for doc in docs {
        let base = doc.id_ref().base_id().to_string();
        match index.get(&base) {
            Some(&i) => {
                if unique[i].id_ref().is_draft() && doc.id_ref().is_published() {
                    unique[i] = doc;
                }
            }
            None => {
                index.insert(base, unique.len());
                unique.push(doc);
            }
        }
    }
    unique
}
