//! Payload persistence for the file index, the corpus and the graph dataset.
//!
//! The format follows the file extension: `.json` is written with
//! `serde_json`, anything else with `bincode` (standard config).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::CorpusResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadFormat {
    Bincode,
    Json,
}

impl PayloadFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Bincode,
        }
    }
}

/// Serialize `value` to `path`, replacing any previous content.
pub fn write_payload<T: Serialize + ?Sized>(path: &Path, value: &T) -> CorpusResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    match PayloadFormat::from_path(path) {
        PayloadFormat::Json => serde_json::to_writer(&mut writer, value)?,
        PayloadFormat::Bincode => {
            bincode::serde::encode_into_std_write(value, &mut writer, bincode::config::standard())?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Deserialize a payload written by [`write_payload`].
pub fn read_payload<T: DeserializeOwned>(path: &Path) -> CorpusResult<T> {
    let mut reader = BufReader::new(File::open(path)?);
    let value = match PayloadFormat::from_path(path) {
        PayloadFormat::Json => serde_json::from_reader(reader)?,
        PayloadFormat::Bincode => {
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Provenance, SourceRecord};

    fn sample() -> Vec<SourceRecord> {
        vec![SourceRecord {
            signature: "def f ( ) :".to_string(),
            body: "return 1".to_string(),
            documentation: "'Doc.'".to_string(),
            provenance: Provenance::new("pkg/a.py", 3, Some(1)),
        }]
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(PayloadFormat::from_path(Path::new("x.json")), PayloadFormat::Json);
        assert_eq!(PayloadFormat::from_path(Path::new("x.JSON")), PayloadFormat::Json);
        assert_eq!(PayloadFormat::from_path(Path::new("x.bin")), PayloadFormat::Bincode);
        assert_eq!(PayloadFormat::from_path(Path::new("x")), PayloadFormat::Bincode);
    }

    #[test]
    fn test_bincode_payload_persists_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.bin");
        write_payload(&path, &sample()).unwrap();
        let loaded: Vec<SourceRecord> = read_payload(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_json_payload_is_row_shaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        write_payload(&path, &sample()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            r#"[["def f ( ) :","return 1","'Doc.'","pkg/a.py 3 1"]]"#
        );
    }

    #[test]
    fn test_write_payload_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        write_payload(&path, &vec!["a.py".to_string(), "b.py".to_string()]).unwrap();
        write_payload(&path, &vec!["c.py".to_string()]).unwrap();
        let loaded: Vec<String> = read_payload(&path).unwrap();
        assert_eq!(loaded, vec!["c.py".to_string()]);
    }

    #[test]
    fn test_write_payload_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");
        assert!(write_payload(&path, &sample()).is_err());
    }
}
