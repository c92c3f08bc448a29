//! Length-keyed phrase dictionary.
//!
//! Phrases are stored in canonical form (tokens joined with `_`) in one set
//! per phrase length. Only lengths of two or more are kept: a single token
//! never needs an entry to pass through the matcher.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::PhraseCatalogRow;
use crate::error::{PhraseError, Result};

/// Separator used between tokens of a canonical phrase.
pub const JOINER: char = '_';

type PhraseSets = HashMap<usize, HashSet<String>>;

/// Immutable set of known phrases grouped by token length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PhraseSets", into = "PhraseSets")]
pub struct PhraseDictionary {
    by_length: PhraseSets,
    max_length: usize,
}

impl PhraseDictionary {
    /// A dictionary with no phrases and `max_length == 0`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> PhraseDictionaryBuilder {
        PhraseDictionaryBuilder::new()
    }

    /// Build from parsed catalog rows. The first failed row aborts the whole
    /// build; no partially filled dictionary is ever returned.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<PhraseCatalogRow>>,
    {
        let mut builder = PhraseDictionaryBuilder::new();
        for row in rows {
            builder.push_row(row?);
        }
        Ok(builder.build())
    }

    /// Longest phrase length present, 0 when empty.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Whether `phrase` (canonical form) is known at exactly `length` tokens.
    pub fn contains(&self, length: usize, phrase: &str) -> bool {
        self.by_length.get(&length).is_some_and(|set| set.contains(phrase))
    }

    pub fn has_length(&self, length: usize) -> bool {
        self.by_length.contains_key(&length)
    }

    /// Number of distinct phrases across all lengths.
    pub fn len(&self) -> usize {
        self.by_length.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.max_length == 0
    }

    pub fn stats(&self) -> DictionaryStats {
        DictionaryStats {
            phrases: self.len(),
            max_length: self.max_length,
            by_length: self.by_length.iter().map(|(k, v)| (*k, v.len())).collect(),
        }
    }
}

impl TryFrom<PhraseSets> for PhraseDictionary {
    type Error = PhraseError;

    fn try_from(by_length: PhraseSets) -> Result<Self> {
        let mut max_length = 0;
        for (&length, set) in &by_length {
            if length < 2 {
                return Err(PhraseError::snapshot(format!("phrase length {length} below 2")));
            }
            if let Some(bad) = set.iter().find(|p| p.is_empty() || p.contains(' ')) {
                return Err(PhraseError::snapshot(format!("non-canonical phrase {bad:?}")));
            }
            max_length = max_length.max(length);
        }
        Ok(Self { by_length, max_length })
    }
}

impl From<PhraseDictionary> for PhraseSets {
    fn from(dict: PhraseDictionary) -> Self {
        dict.by_length
    }
}

/// Summary of a built dictionary, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryStats {
    pub phrases: usize,
    pub max_length: usize,
    pub by_length: BTreeMap<usize, usize>,
}

/// Mutable accumulator that produces a [`PhraseDictionary`].
#[derive(Debug, Default)]
pub struct PhraseDictionaryBuilder {
    by_length: PhraseSets,
    max_length: usize,
    rows: usize,
    skipped: usize,
}

impl PhraseDictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `text` as a phrase of `length` tokens. Lengths below 2 and
    /// empty text are ignored. Returns true when the phrase was not already
    /// present.
    pub fn insert(&mut self, text: &str, length: i64) -> bool {
        self.rows += 1;
        let length = match usize::try_from(length) {
            Ok(l) if l > 1 && !text.is_empty() => l,
            _ => {
                tracing::debug!(text, length, "skipping catalog row that is not a phrase");
                self.skipped += 1;
                return false;
            }
        };
        self.max_length = self.max_length.max(length);
        self.by_length
            .entry(length)
            .or_default()
            .insert(canonicalize(text).into_owned())
    }

    pub fn push_row(&mut self, row: PhraseCatalogRow) {
        self.insert(&row.ngram, row.length);
    }

    pub fn build(self) -> PhraseDictionary {
        let dict = PhraseDictionary { by_length: self.by_length, max_length: self.max_length };
        tracing::info!(
            rows = self.rows,
            skipped = self.skipped,
            phrases = dict.len(),
            max_length = dict.max_length,
            "phrase dictionary built"
        );
        dict
    }
}

/// Space-separated phrases become underscore-joined; anything without a
/// space is assumed to be joined already.
pub fn canonicalize(text: &str) -> Cow<'_, str> {
    if text.contains(' ') {
        Cow::Owned(text.replace(' ', &JOINER.to_string()))
    } else {
        Cow::Borrowed(text)
    }
}
