//! Session configuration: where the catalog lives and how to read it.
//!
//! Settings travel as a flat string map with the keys below, the same map a
//! host stores when it exports a pipeline.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{read_catalog, CatalogFormat, DEFAULT_DELIMITER, DEFAULT_ENCODING, DEFAULT_QUOTE};
use crate::dictionary::PhraseDictionary;
use crate::error::{PhraseError, Result};

pub const KEY_CATALOG_PATH: &str = "CSVFileLocation";
pub const KEY_ENCODING: &str = "SelectedEncoding";
pub const KEY_DELIMITER: &str = "Delimiter";
pub const KEY_QUOTE: &str = "Quote";

pub type SettingsMap = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub catalog_path: PathBuf,
    pub encoding: String,
    pub delimiter: char,
    pub quote: char,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::new(),
            encoding: DEFAULT_ENCODING.to_string(),
            delimiter: DEFAULT_DELIMITER,
            quote: DEFAULT_QUOTE,
        }
    }
}

impl SessionConfig {
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self { catalog_path: catalog_path.into(), ..Self::default() }
    }

    /// True once a catalog path is set. Nothing else is checked before a build.
    pub fn is_complete(&self) -> bool {
        !self.catalog_path.as_os_str().is_empty()
    }

    /// Apply a confirmed edit from a front end. Blank delimiter or quote
    /// fields fall back to `,` and `"`; only the first character is used.
    pub fn apply_edit(&mut self, catalog_path: &str, encoding: &str, delimiter: &str, quote: &str) {
        self.catalog_path = PathBuf::from(catalog_path);
        self.encoding = encoding.to_string();
        self.delimiter = delimiter.chars().next().unwrap_or(DEFAULT_DELIMITER);
        self.quote = quote.chars().next().unwrap_or(DEFAULT_QUOTE);
    }

    pub fn catalog_format(&self) -> Result<CatalogFormat> {
        CatalogFormat::new(&self.encoding, self.delimiter, self.quote)
    }

    /// Build a dictionary from the configured catalog without touching any
    /// session. Rejects an incomplete configuration before any file access.
    pub fn build_dictionary(&self) -> Result<PhraseDictionary> {
        if !self.is_complete() {
            return Err(PhraseError::ConfigurationIncomplete);
        }
        read_catalog(&self.catalog_path, &self.catalog_format()?)
    }

    /// Start from a settings file when given, else the defaults, then apply
    /// `overrides`.
    pub fn load_with_overrides(settings: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let base = match settings {
            Some(path) => load_settings(path)?,
            None => Self::default(),
        };
        Ok(overrides.apply(base))
    }

    /// Flatten to the settings map. Fails for a catalog path that is not
    /// valid UTF-8, which a string map cannot carry without loss.
    pub fn export(&self) -> Result<SettingsMap> {
        let path = self.catalog_path.to_str().ok_or_else(|| {
            PhraseError::settings(format!("catalog path {} is not valid UTF-8", self.catalog_path.display()))
        })?;
        let mut map = SettingsMap::new();
        map.insert(KEY_CATALOG_PATH.into(), path.to_string());
        map.insert(KEY_ENCODING.into(), self.encoding.clone());
        map.insert(KEY_DELIMITER.into(), self.delimiter.to_string());
        map.insert(KEY_QUOTE.into(), self.quote.to_string());
        Ok(map)
    }

    /// Inverse of [`SessionConfig::export`]. Every key must be present.
    pub fn import(map: &SettingsMap) -> Result<Self> {
        Ok(Self {
            catalog_path: PathBuf::from(required(map, KEY_CATALOG_PATH)?),
            encoding: required(map, KEY_ENCODING)?.to_string(),
            delimiter: single_char(map, KEY_DELIMITER)?,
            quote: single_char(map, KEY_QUOTE)?,
        })
    }
}

/// Individually set fields, e.g. from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub quote: Option<char>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: SessionConfig) -> SessionConfig {
        if let Some(p) = self.catalog_path {
            config.catalog_path = p;
        }
        if let Some(e) = self.encoding {
            config.encoding = e;
        }
        if let Some(d) = self.delimiter {
            config.delimiter = d;
        }
        if let Some(q) = self.quote {
            config.quote = q;
        }
        config
    }
}

fn required<'a>(map: &'a SettingsMap, key: &str) -> Result<&'a str> {
    map.get(key).map(String::as_str).ok_or_else(|| PhraseError::settings(format!("missing key {key}")))
}

fn single_char(map: &SettingsMap, key: &str) -> Result<char> {
    let value = required(map, key)?;
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(PhraseError::settings(format!("{key} must be exactly one character, got {value:?}"))),
    }
}

pub fn save_settings(path: &Path, config: &SessionConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let map = config.export()?;
    let mut f = File::create(path)?;
    let json = serde_json::to_string_pretty(&map).map_err(|e| PhraseError::settings(e.to_string()))?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<SessionConfig> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let map: SettingsMap = serde_json::from_str(&buf).map_err(|e| PhraseError::settings(e.to_string()))?;
    SessionConfig::import(&map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionConfig {
        SessionConfig {
            catalog_path: PathBuf::from("/data/BUTTER-FrequencyList.csv"),
            encoding: "windows-1252".into(),
            delimiter: '\t',
            quote: '\'',
        }
    }

    #[test]
    fn export_import_round_trip() {
        let config = sample();
        assert_eq!(SessionConfig::import(&config.export().unwrap()).unwrap(), config);
        let defaults = SessionConfig::default();
        assert_eq!(SessionConfig::import(&defaults.export().unwrap()).unwrap(), defaults);
    }

    #[test]
    fn export_uses_host_keys() {
        let map = sample().export().unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map[KEY_CATALOG_PATH], "/data/BUTTER-FrequencyList.csv");
        assert_eq!(map[KEY_ENCODING], "windows-1252");
        assert_eq!(map[KEY_DELIMITER], "\t");
        assert_eq!(map[KEY_QUOTE], "'");
    }

    #[test]
    fn import_requires_every_key() {
        let mut map = sample().export().unwrap();
        map.remove(KEY_QUOTE);
        let err = SessionConfig::import(&map).unwrap_err();
        assert!(err.to_string().contains(KEY_QUOTE));
    }

    #[test]
    fn import_rejects_multi_char_delimiter() {
        let mut map = sample().export().unwrap();
        map.insert(KEY_DELIMITER.into(), ";;".into());
        assert!(matches!(SessionConfig::import(&map), Err(PhraseError::Settings(_))));
    }

    #[test]
    fn blank_edit_fields_fall_back() {
        let mut config = sample();
        config.apply_edit("list.csv", "utf-8", "", "");
        assert_eq!(config.catalog_path, PathBuf::from("list.csv"));
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.quote, '"');
    }

    #[test]
    fn completeness_is_path_only() {
        assert!(!SessionConfig::default().is_complete());
        assert!(SessionConfig::new("x.csv").is_complete());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_refuses_to_export() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let config = SessionConfig::new(Path::new(OsStr::from_bytes(b"/tmp/caf\xe9.csv")));
        assert!(matches!(config.export(), Err(PhraseError::Settings(_))));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert!(save_settings(&path, &config).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        save_settings(&path, &sample()).unwrap();

        let overrides = ConfigOverrides { encoding: Some("utf-8".into()), quote: Some('"'), ..Default::default() };
        let config = SessionConfig::load_with_overrides(Some(&path), overrides).unwrap();
        assert_eq!(config.catalog_path, sample().catalog_path);
        assert_eq!(config.delimiter, '\t');
        assert_eq!(config.encoding, "utf-8");
        assert_eq!(config.quote, '"');

        let bare = SessionConfig::load_with_overrides(None, ConfigOverrides::default()).unwrap();
        assert_eq!(bare, SessionConfig::default());
    }

    #[test]
    fn incomplete_config_builds_nothing() {
        assert!(matches!(SessionConfig::default().build_dictionary(), Err(PhraseError::ConfigurationIncomplete)));
    }

    #[test]
    fn settings_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.json");
        save_settings(&path, &sample()).unwrap();
        assert_eq!(load_settings(&path).unwrap(), sample());
    }
}
