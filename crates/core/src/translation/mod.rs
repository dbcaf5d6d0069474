//! The translation engine: fresh and duplicate translations, reference
//! rewriting, and the translation group lookups behind the switcher.

pub mod engine;
pub mod error;
pub mod queries;
pub mod result;


pub use engine::TranslationEngine;
pub use error::{TranslationError, TranslationResult};
pub use result::{DuplicateResult, ReferencedDocument, TranslationSlot, UntranslatedReferences};
