//! Phrasifier session: configuration plus the dictionary built from it.
//!
//! Lifecycle: [`Session::inspect_settings`] before anything else, then
//! [`Session::initialize`] to build, [`Session::run`] per payload, and
//! [`Session::finish`] to release the dictionary.

use std::sync::Arc;

use crate::dictionary::PhraseDictionary;
use crate::error::{PhraseError, Result};
use crate::matcher::transform_payload;
use crate::payload::Payload;
use crate::settings::{SessionConfig, SettingsMap};

pub const DESCRIPTION: &str = "Replaces runs of words with known phrases from a frequency list, \
joining n-grams into single tokens. Useful before training word embeddings.";

#[derive(Debug, Default)]
pub struct Session {
    config: SessionConfig,
    dictionary: Arc<PhraseDictionary>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config, dictionary: Arc::new(PhraseDictionary::empty()) }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the configuration. The current dictionary is kept until the
    /// next [`Session::initialize`].
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    pub fn inspect_settings(&self) -> Result<()> {
        if self.config.is_complete() {
            Ok(())
        } else {
            Err(PhraseError::ConfigurationIncomplete)
        }
    }

    /// Build the dictionary from the configured catalog.
    ///
    /// On any failure, including a missing catalog path, the session is left
    /// with an empty dictionary (which passes tokens through unchanged) and
    /// the error is returned.
    pub fn initialize(&mut self) -> Result<Arc<PhraseDictionary>> {
        let built = self.config.build_dictionary();
        self.settle(built)
    }

    /// Install the outcome of a build made elsewhere, e.g. off the request
    /// path. Same failure policy as [`Session::initialize`].
    pub fn settle(&mut self, built: Result<PhraseDictionary>) -> Result<Arc<PhraseDictionary>> {
        match built {
            Ok(dictionary) => {
                self.dictionary = Arc::new(dictionary);
                Ok(Arc::clone(&self.dictionary))
            }
            Err(e) => {
                tracing::warn!(error = %e, "phrase dictionary build failed; using empty dictionary");
                self.dictionary = Arc::new(PhraseDictionary::empty());
                Err(e)
            }
        }
    }

    /// Install an already built dictionary, e.g. one loaded from a snapshot.
    pub fn install(&mut self, dictionary: PhraseDictionary) {
        self.dictionary = Arc::new(dictionary);
    }

    /// Shared handle to the current dictionary.
    pub fn dictionary(&self) -> Arc<PhraseDictionary> {
        Arc::clone(&self.dictionary)
    }

    pub fn run(&self, input: &Payload) -> Payload {
        transform_payload(&self.dictionary, input)
    }

    /// Drop the dictionary. Handles already given out stay valid.
    pub fn finish(&mut self) {
        self.dictionary = Arc::new(PhraseDictionary::empty());
    }

    pub fn export_settings(&self) -> Result<SettingsMap> {
        self.config.export()
    }

    pub fn import_settings(&mut self, map: &SettingsMap) -> Result<()> {
        self.config = SessionConfig::import(map)?;
        Ok(())
    }
}
