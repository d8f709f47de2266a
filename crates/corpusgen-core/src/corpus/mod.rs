//! Extraction stage: Python files in, encoded [`SourceRecord`](crate::models::SourceRecord)s out.

pub mod decoder;
pub mod docstring;
pub mod encoder;
pub mod extractor;
pub mod filesystem;
pub mod pipeline;

pub use pipeline::{extract_files, generate, CorpusBatch, GenerateReport};
