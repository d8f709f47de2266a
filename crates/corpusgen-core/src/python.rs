//! Python bindings: the `_corpusgen_core` extension module.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::wrap_pyfunction;

use crate::config::{Execution, ExtractionMode, GenerateConfig, GraphConfig};
use crate::corpus::{decoder, encoder};
use crate::graph::{self, AstGraphBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Extraction stage. Returns a summary dict.
#[pyfunction]
#[pyo3(signature = (input, indices, output, regen=false, methods=false, singlethreaded=false))]
pub fn generate_corpus(
    py: Python<'_>,
    input: &str,
    indices: &str,
    output: &str,
    regen: bool,
    methods: bool,
    singlethreaded: bool,
) -> PyResult<PyObject> {
    let config = GenerateConfig::new(input, indices, output)
        .with_regenerate(regen)
        .with_mode(ExtractionMode::from_methods_flag(methods))
        .with_execution(Execution::from_singlethreaded_flag(singlethreaded));

    let report = py.allow_threads(|| crate::corpus::generate(&config))?;

    let result = PyDict::new(py);
    result.set_item("files_scanned", report.files_scanned)?;
    result.set_item("files_failed", report.files_failed)?;
    result.set_item("records", report.records)?;
    result.set_item("index_regenerated", report.index_regenerated)?;
    result.set_item("elapsed_ms", report.elapsed_ms as u64)?;
    Ok(result.into_any().unbind())
}

/// Graph stage over a corpus file. Returns a summary dict.
#[pyfunction]
#[pyo3(signature = (input, output, singlethreaded=false))]
pub fn generate_graphs(
    py: Python<'_>,
    input: &str,
    output: &str,
    singlethreaded: bool,
) -> PyResult<PyObject> {
    let config = GraphConfig::new(input, output)
        .with_execution(Execution::from_singlethreaded_flag(singlethreaded));

    let report = py.allow_threads(|| graph::build_dataset(&config, &AstGraphBuilder))?;

    let result = PyDict::new(py);
    result.set_item("graphs", report.graphs.len())?;
    result.set_item("snippets", report.attempted)?;
    result.set_item("failed", report.failed)?;
    result.set_item("yield_ratio", report.yield_ratio())?;
    Ok(result.into_any().unbind())
}

#[pyfunction]
pub fn encode_documentation(raw: &str) -> String {
    encoder::encode_documentation(raw)
}

#[pyfunction]
pub fn decode(encoded: &str) -> String {
    decoder::decode(encoded)
}

#[pyfunction]
pub fn decode_documentation(encoded: &str) -> String {
    decoder::decode_documentation(encoded)
}

#[pyfunction]
pub fn tokenize_docstring(text: &str) -> Vec<String> {
    graph::tokenize_docstring(text)
}

#[pymodule]
fn _corpusgen_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_tracing();

    m.add("SENTINELS", encoder::SENTINELS.to_vec())?;

    m.add_function(wrap_pyfunction!(generate_corpus, m)?)?;
    m.add_function(wrap_pyfunction!(generate_graphs, m)?)?;
    m.add_function(wrap_pyfunction!(encode_documentation, m)?)?;
    m.add_function(wrap_pyfunction!(decode, m)?)?;
    m.add_function(wrap_pyfunction!(decode_documentation, m)?)?;
    m.add_function(wrap_pyfunction!(tokenize_docstring, m)?)?;

    Ok(())
}
