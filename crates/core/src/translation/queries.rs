//! GROQ issued by the engine.

/// Point lookup of every referenced document, both draft and published keys.
pub const REFERENCED_DOCUMENTS: &str = "*[_id in $ids]{_id, _type, translationId, title}";

/// One referenced document under either of its store keys.
pub const REFERENCED_DOCUMENT: &str = "*[_id in [$id, $draftId]]{_id, _type, translationId, title}";

pub const COUNT_IN_LANGUAGE: &str =
    "count(*[translationId == $translationId && language == $language])";

pub const IDS_IN_LANGUAGE: &str = "*[translationId == $translationId && language == $language]{_id}";

/// The document a new one is being created from, under either store key.
pub const PARENT_LANGUAGE: &str = "*[_id in [$id, $draftId]]{_id, language}";

pub const GROUP_MEMBERS: &str = "*[translationId == $translationId]";
