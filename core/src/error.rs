//! Error types for dictionary builds, settings and snapshots.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong around the core.
///
/// The matcher itself is total and never produces one of these.
#[derive(Error, Debug)]
pub enum PhraseError {
    /// The catalog file could not be opened or read.
    #[error("cannot read phrase catalog {}: {source}", .path.display())]
    CatalogUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A catalog row failed to parse. `line` is the 1-based data row.
    #[error("malformed phrase catalog at data row {line}: {reason}")]
    CatalogMalformed { line: u64, reason: String },

    /// The configured encoding label is not known.
    #[error("unsupported encoding: {0}")]
    EncodingUnsupported(String),

    /// No catalog path was configured.
    #[error("configuration incomplete: no phrase catalog path set")]
    ConfigurationIncomplete,

    /// Delimiter or quote cannot be used to read a catalog.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// A settings map or settings file could not be imported.
    #[error("settings error: {0}")]
    Settings(String),

    /// A dictionary snapshot could not be encoded, decoded or validated.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PhraseError {
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        PhraseError::CatalogMalformed { line, reason: reason.into() }
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        PhraseError::Settings(msg.into())
    }

    pub fn snapshot(msg: impl Into<String>) -> Self {
        PhraseError::Snapshot(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PhraseError>;
