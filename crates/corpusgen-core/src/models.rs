//! Shared typed models passed between the extraction and graph stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CorpusError;

// ---------------------------------------------------------------------------
// 1. Provenance
// ---------------------------------------------------------------------------

/// Where a record came from: relative file path, declaration line and the
/// line of the innermost enclosing class, if any. Lines are 1-based.
///
/// Stored on disk as `"<path> <decl_line> [<class_line>]"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Provenance {
    pub path: String,
    pub line: usize,
    pub class_line: Option<usize>,
}

impl Provenance {
    pub fn new(path: impl Into<String>, line: usize, class_line: Option<usize>) -> Self {
        Self {
            path: path.into(),
            line,
            class_line,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class_line {
            Some(class_line) => write!(f, "{} {} {}", self.path, self.line, class_line),
            None => write!(f, "{} {}", self.path, self.line),
        }
    }
}

impl From<Provenance> for String {
    fn from(provenance: Provenance) -> String {
        provenance.to_string()
    }
}

impl TryFrom<String> for Provenance {
    type Error = CorpusError;

    /// Parses from the right so paths containing spaces survive.
    fn try_from(raw: String) -> Result<Self, Self::Error> {
        let malformed = || CorpusError::Extract(format!("Malformed provenance: {raw:?}"));

        let mut parts = raw.rsplitn(3, ' ');
        let last = parts.next().ok_or_else(malformed)?;
        let middle = parts.next().ok_or_else(malformed)?;
        let rest = parts.next();

        if let (Some(path), Ok(line), Ok(class_line)) =
            (rest, middle.parse::<usize>(), last.parse::<usize>())
        {
            if !path.is_empty() {
                return Ok(Self::new(path, line, Some(class_line)));
            }
        }

        let (path, line) = raw.rsplit_once(' ').ok_or_else(malformed)?;
        let line = line.parse::<usize>().map_err(|_| malformed())?;
        if path.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(path, line, None))
    }
}

// ---------------------------------------------------------------------------
// 2. SourceRecord
// ---------------------------------------------------------------------------

/// One documented function or method, every text field already encoded.
///
/// Serialized as the four-field row `[signature, body, documentation,
/// provenance]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RecordRow", from = "RecordRow")]
pub struct SourceRecord {
    pub signature: String,
    pub body: String,
    pub documentation: String,
    pub provenance: Provenance,
}

type RecordRow = (String, String, String, Provenance);

impl From<SourceRecord> for RecordRow {
    fn from(record: SourceRecord) -> RecordRow {
        (
            record.signature,
            record.body,
            record.documentation,
            record.provenance,
        )
    }
}

impl From<RecordRow> for SourceRecord {
    fn from((signature, body, documentation, provenance): RecordRow) -> SourceRecord {
        SourceRecord {
            signature,
            body,
            documentation,
            provenance,
        }
    }
}

// ---------------------------------------------------------------------------
// 3. GraphRecord
// ---------------------------------------------------------------------------

/// A typed edge between two node ids, serialized as `[kind, origin, destination]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "EdgeRow", from = "EdgeRow")]
pub struct Edge {
    pub kind: String,
    pub origin: usize,
    pub destination: usize,
}

type EdgeRow = (String, usize, usize);

impl From<Edge> for EdgeRow {
    fn from(edge: Edge) -> EdgeRow {
        (edge.kind, edge.origin, edge.destination)
    }
}

impl From<EdgeRow> for Edge {
    fn from((kind, origin, destination): EdgeRow) -> Edge {
        Edge {
            kind,
            origin,
            destination,
        }
    }
}

/// One structural training example built from a decoded [`SourceRecord`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub edges: Vec<Edge>,
    pub backbone_sequence: Vec<usize>,
    pub node_labels: Vec<String>,
    pub docs_words: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_display_without_class() {
        let p = Provenance::new("pkg/mod.py", 12, None);
        assert_eq!(p.to_string(), "pkg/mod.py 12");
    }

    #[test]
    fn test_provenance_display_with_class() {
        let p = Provenance::new("pkg/mod.py", 12, Some(3));
        assert_eq!(p.to_string(), "pkg/mod.py 12 3");
    }

    #[test]
    fn test_provenance_parse_with_class() {
        let p = Provenance::try_from("a/b.py 40 7".to_string()).unwrap();
        assert_eq!(p, Provenance::new("a/b.py", 40, Some(7)));
    }

    #[test]
    fn test_provenance_parse_path_with_spaces() {
        let p = Provenance::try_from("my repo/b.py 40".to_string()).unwrap();
        assert_eq!(p, Provenance::new("my repo/b.py", 40, None));
    }

    #[test]
    fn test_provenance_parse_rejects_garbage() {
        assert!(Provenance::try_from("nolinenumber".to_string()).is_err());
        assert!(Provenance::try_from("file.py abc".to_string()).is_err());
    }

    #[test]
    fn test_source_record_serializes_as_row() {
        let record = SourceRecord {
            signature: "def f ( ) :".to_string(),
            body: "return 1".to_string(),
            documentation: "'Doc.'".to_string(),
            provenance: Provenance::new("a.py", 1, None),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!(["def f ( ) :", "return 1", "'Doc.'", "a.py 1"])
        );
    }

    #[test]
    fn test_graph_record_edge_shape() {
        let graph = GraphRecord {
            edges: vec![Edge {
                kind: "child".to_string(),
                origin: 0,
                destination: 1,
            }],
            backbone_sequence: vec![1],
            node_labels: vec!["module".to_string(), "pass".to_string()],
            docs_words: vec!["Doc".to_string()],
        };
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["edges"], serde_json::json!([["child", 0, 1]]));
        assert_eq!(json["backbone_sequence"], serde_json::json!([1]));
    }
}
