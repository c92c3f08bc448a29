use serde::{Deserialize, Serialize};

pub type SegmentId = u64;
pub type DocumentId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub tokens: Vec<String>,
}

impl Segment {
    pub fn new<S: Into<String>>(id: SegmentId, tokens: impl IntoIterator<Item = S>) -> Self {
        Self { id, tokens: tokens.into_iter().map(Into::into).collect() }
    }
}

/// One document as it moves through the pipeline. Segment order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub document_id: DocumentId,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Payload {
    pub fn new(document_id: impl Into<DocumentId>) -> Self {
        Self { document_id: document_id.into(), segments: Vec::new() }
    }

    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Total tokens across all segments. The core never stores this on the
    /// payload; adapters report it where their host expects a token count.
    pub fn token_count(&self) -> usize {
        self.segments.iter().map(|s| s.tokens.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_json_shape() {
        let p = Payload::new("doc-1").with_segment(Segment::new(3, ["a", "b"]));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["document_id"], "doc-1");
        assert_eq!(json["segments"][0]["id"], 3);
        assert_eq!(json["segments"][0]["tokens"][1], "b");
        assert_eq!(p.token_count(), 2);
    }

    #[test]
    fn missing_segments_default_to_empty() {
        let p: Payload = serde_json::from_str(r#"{"document_id":"x"}"#).unwrap();
        assert!(p.segments.is_empty());
        assert_eq!(p.token_count(), 0);
    }
}
