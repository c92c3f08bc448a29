//! Compiled dictionary snapshots.
//!
//! A snapshot is a bincode-encoded [`Snapshot`]: a small header plus the
//! phrase sets. Loading re-validates the sets, so a corrupted or hand-edited
//! file cannot produce a dictionary holding non-canonical phrases.

use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dictionary::PhraseDictionary;
use crate::error::{PhraseError, Result};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub created_at: String,
    pub dictionary: PhraseDictionary,
}

impl Snapshot {
    pub fn new(dictionary: PhraseDictionary) -> Self {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self { version: SNAPSHOT_VERSION, created_at, dictionary }
    }
}

pub fn save_snapshot(path: &Path, dictionary: &PhraseDictionary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let snapshot = Snapshot::new(dictionary.clone());
    let bytes = bincode::serialize(&snapshot).map_err(|e| PhraseError::snapshot(e.to_string()))?;
    let mut f = File::create(path)?;
    f.write_all(&bytes)?;
    tracing::info!(path = %path.display(), phrases = dictionary.len(), "wrote dictionary snapshot");
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let snapshot: Snapshot = bincode::deserialize(&buf).map_err(|e| PhraseError::snapshot(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PhraseError::snapshot(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            snapshot.version
        )));
    }
    Ok(snapshot)
}

/// Load only the dictionary out of a snapshot.
pub fn load_dictionary(path: &Path) -> Result<PhraseDictionary> {
    Ok(load_snapshot(path)?.dictionary)
}
