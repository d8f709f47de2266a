//! Error types for the corpusgen core library.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;

/// Top-level error enum for the corpusgen core library.
///
/// `Parse`, `Extract`, `Graph` and `Panicked` are per-unit failures: the
/// pipelines log them and move on. The remaining variants come from setup and
/// teardown I/O and end a run.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Extraction error: {0}")]
    Extract(String),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Worker panicked: {0}")]
    Panicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

#[cfg(feature = "python")]
impl From<CorpusError> for PyErr {
    fn from(err: CorpusError) -> PyErr {
        match &err {
            CorpusError::Io(_) | CorpusError::Index(_) => PyIOError::new_err(err.to_string()),
            CorpusError::Parse(_) | CorpusError::Config(_) => {
                PyValueError::new_err(err.to_string())
            }
            CorpusError::Json(_) | CorpusError::Encode(_) | CorpusError::Decode(_) => {
                PyValueError::new_err(err.to_string())
            }
            CorpusError::Extract(_) | CorpusError::Graph(_) | CorpusError::Panicked(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}

pub type CorpusResult<T> = Result<T, CorpusError>;
