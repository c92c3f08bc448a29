//! Phrase merging for pre-tokenized text.
//!
//! A [`PhraseDictionary`] is built once from a delimited phrase catalog and
//! then shared read-only by any number of [`transform`] calls, each of which
//! merges known multi-word phrases in a token sequence into single
//! `_`-joined tokens, longest match first.

pub mod catalog;
pub mod dictionary;
pub mod error;
pub mod matcher;
pub mod payload;
pub mod persist;
pub mod session;
pub mod settings;

pub use catalog::{read_catalog, CatalogFormat, PhraseCatalogRow};
pub use dictionary::{DictionaryStats, PhraseDictionary, PhraseDictionaryBuilder};
pub use error::{PhraseError, Result};
pub use matcher::{transform, transform_payload, transform_segment};
pub use payload::{DocumentId, Payload, Segment, SegmentId};
pub use session::Session;
pub use settings::SessionConfig;
