/// Document ID parsing utilities.
///
/// Sanity document IDs follow conventions:
/// - Published: `{id}`
/// - Draft: `drafts.{id}`
///
/// The same logical document has at most one of each, so a reference's bare
/// `_ref` may resolve to either store key.
use std::fmt;

pub const DRAFT_PREFIX: &str = "drafts.";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    base_id: String,
    is_draft: bool,
}

impl DocumentRef {
    /// Parse a Sanity document ID into its base ID and draft flag.
    pub fn parse(id: &str) -> Self {
        match id.strip_prefix(DRAFT_PREFIX) {
            Some(base) => Self::draft(base),
            None => Self::published(id),
        }
    }

    pub fn published(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            is_draft: false,
        }
    }

    pub fn draft(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            is_draft: true,
        }
    }

    /// Strip any draft prefix from an ID.
    pub fn normalize(id: &str) -> &str {
        id.strip_prefix(DRAFT_PREFIX).unwrap_or(id)
    }

    /// Get the base (published) document ID regardless of prefix.
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Get the full document ID with its prefix.
    pub fn full_id(&self) -> String {
        if self.is_draft {
            self.draft_id()
        } else {
            self.base_id.clone()
        }
    }

    pub fn draft_id(&self) -> String {
        format!("{DRAFT_PREFIX}{}", self.base_id)
    }

    /// Both store keys this logical document may live under, published first.
    pub fn candidate_ids(&self) -> [String; 2] {
        [self.base_id.clone(), self.draft_id()]
    }

    pub fn is_draft(&self) -> bool {
        self.is_draft
    }

    pub fn is_published(&self) -> bool {
        !self.is_draft
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_draft {
            f.write_str(DRAFT_PREFIX)?;
        }
        f.write_str(&self.base_id)
    }
}

/// A fresh draft ID for a document that is about to be created.
pub fn new_draft_id() -> DocumentRef {
    DocumentRef::draft(uuid::Uuid::new_v4().to_string())
}
