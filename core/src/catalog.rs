//! Reader for delimited phrase catalogs.
//!
//! A catalog has one header row followed by one row per phrase candidate.
//! The default column layout is the BUTTER frequency list:
//!
//! ```text
//! 0 TextID | 1 Segment | 2 ngram | 3 Frequency | 4 Documents | 5 ObsPct | 6 IDF | 7 PhraseLength | 8 PMI
//! ```
//!
//! Only the ngram, the phrase length and the association metric (PMI) are
//! read. The metric is parsed so malformed files fail fast, but nothing ranks
//! or filters on it.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use encoding_rs::Encoding;

use crate::dictionary::PhraseDictionary;
use crate::error::{PhraseError, Result};

pub const DEFAULT_ENCODING: &str = "utf-8";
pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_QUOTE: char = '"';

/// One data row of a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseCatalogRow {
    pub ngram: String,
    /// Number of tokens in the phrase. Rows at or below 1 are not phrases.
    pub length: i64,
    /// Association strength, `None` when the cell is empty or absent.
    pub association: Option<f64>,
}

/// How to decode and split a catalog file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogFormat {
    pub encoding: &'static Encoding,
    pub delimiter: u8,
    pub quote: u8,
    pub ngram_column: usize,
    pub length_column: usize,
    pub association_column: usize,
}

impl Default for CatalogFormat {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
            delimiter: DEFAULT_DELIMITER as u8,
            quote: DEFAULT_QUOTE as u8,
            ngram_column: 2,
            length_column: 7,
            association_column: 8,
        }
    }
}

impl CatalogFormat {
    /// Resolve an encoding label and single-character delimiter and quote.
    pub fn new(encoding: &str, delimiter: char, quote: char) -> Result<Self> {
        let delimiter = ascii_byte(delimiter, "delimiter")?;
        let quote = ascii_byte(quote, "quote")?;
        if delimiter == quote {
            return Err(PhraseError::ConfigurationInvalid(format!(
                "delimiter and quote are both {:?}",
                delimiter as char
            )));
        }
        Ok(Self { encoding: resolve_encoding(encoding)?, delimiter, quote, ..Self::default() })
    }

    fn parse_row(&self, record: &StringRecord, line: u64) -> Result<PhraseCatalogRow> {
        let ngram = record
            .get(self.ngram_column)
            .ok_or_else(|| PhraseError::malformed(line, format!("missing ngram column {}", self.ngram_column)))?;
        let length_field = record
            .get(self.length_column)
            .ok_or_else(|| PhraseError::malformed(line, format!("missing phrase length column {}", self.length_column)))?;
        let length = length_field
            .trim()
            .parse::<i64>()
            .map_err(|_| PhraseError::malformed(line, format!("phrase length {length_field:?} is not an integer")))?;
        let association = match record.get(self.association_column).map(str::trim) {
            None | Some("") => None,
            Some(v) => Some(
                v.parse::<f64>()
                    .map_err(|_| PhraseError::malformed(line, format!("association metric {v:?} is not a number")))?,
            ),
        };
        Ok(PhraseCatalogRow { ngram: ngram.to_string(), length, association })
    }
}

/// Look up an encoding by its WHATWG label (`utf-8`, `windows-1252`, `latin1`, ...).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| PhraseError::EncodingUnsupported(label.to_string()))
}

fn ascii_byte(c: char, what: &str) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(PhraseError::ConfigurationInvalid(format!("{what} {c:?} is not a single-byte ASCII character")))
    }
}

/// Read the whole catalog at `path` and build a dictionary from it.
pub fn read_catalog(path: &Path, format: &CatalogFormat) -> Result<PhraseDictionary> {
    tracing::debug!(path = %path.display(), encoding = format.encoding.name(), "reading phrase catalog");
    let text = read_text(path, format.encoding)?;
    PhraseDictionary::from_rows(parse_rows(&text, format))
}

/// Parse catalog text (header row first) into rows, lazily.
pub fn parse_rows<'a>(text: &'a str, format: &CatalogFormat) -> impl Iterator<Item = Result<PhraseCatalogRow>> + 'a {
    let format = *format;
    ReaderBuilder::new()
        .delimiter(format.delimiter)
        .quote(format.quote)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes())
        .into_records()
        .enumerate()
        .map(move |(i, record)| {
            let line = i as u64 + 1;
            let record = record.map_err(|e| PhraseError::malformed(line, e.to_string()))?;
            format.parse_row(&record, line)
        })
}

fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| PhraseError::CatalogUnreadable { path: path.to_path_buf(), source })?;
    // A BOM wins over the configured encoding.
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(path = %path.display(), encoding = used.name(), "catalog contained undecodable bytes; replaced");
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "TextID,Segment,ngram,Frequency,Documents,ObsPct,IDF,PhraseLength,PMI\n";

    fn rows(body: &str) -> Vec<Result<PhraseCatalogRow>> {
        let text = format!("{HEADER}{body}");
        parse_rows(&text, &CatalogFormat::default()).collect()
    }

    #[test]
    fn parses_butter_layout() {
        let got = rows("f,1,new york,10,4,0.1,2.3,2,5.5\nf,1,the,99,9,0.9,0.1,1,\n");
        let got: Vec<_> = got.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0], PhraseCatalogRow { ngram: "new york".into(), length: 2, association: Some(5.5) });
        assert_eq!(got[1].association, None);
        assert_eq!(got[1].length, 1);
    }

    #[test]
    fn missing_metric_column_is_absent() {
        let got = rows("f,1,a_b,1,1,0,0,2\n");
        assert_eq!(got[0].as_ref().unwrap().association, None);
    }

    #[test]
    fn bad_length_is_malformed() {
        let got = rows("f,1,a b,1,1,0,0,2\nf,1,c d,1,1,0,0,two,1\n");
        assert!(got[0].is_ok());
        match &got[1] {
            Err(PhraseError::CatalogMalformed { line, reason }) => {
                assert_eq!(*line, 2);
                assert!(reason.contains("two"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn bad_metric_is_malformed() {
        let got = rows("f,1,a b,1,1,0,0,2,high\n");
        assert!(matches!(got[0], Err(PhraseError::CatalogMalformed { line: 1, .. })));
    }

    #[test]
    fn short_row_is_malformed() {
        let got = rows("f,1,a b\n");
        assert!(matches!(got[0], Err(PhraseError::CatalogMalformed { .. })));
    }

    #[test]
    fn custom_delimiter_and_quote() {
        let format = CatalogFormat::new("utf-8", ';', '\'').unwrap();
        let text = "h;h;h;h;h;h;h;h;h\nf;1;'new; york';1;1;0;0;2;1.0\n";
        let got: Vec<_> = parse_rows(text, &format).collect();
        assert_eq!(got[0].as_ref().unwrap().ngram, "new; york");
    }

    #[test]
    fn rejects_unusable_format() {
        assert!(matches!(CatalogFormat::new("klingon-8", ',', '"'), Err(PhraseError::EncodingUnsupported(_))));
        assert!(matches!(CatalogFormat::new("utf-8", '§', '"'), Err(PhraseError::ConfigurationInvalid(_))));
        assert!(matches!(CatalogFormat::new("utf-8", ',', ','), Err(PhraseError::ConfigurationInvalid(_))));
    }

    #[test]
    fn encoding_labels_resolve() {
        assert_eq!(resolve_encoding("UTF-8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve_encoding("windows-1252").unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(resolve_encoding(" latin1 ").unwrap(), encoding_rs::WINDOWS_1252);
    }
}
