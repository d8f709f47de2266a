//! Run configuration for both pipeline stages.
//!
//! Paths and flags come from the caller. Two environment variables tune the
//! ambient behaviour:
//!
//! - `CORPUSGEN_WORKERS`: worker pool size (default: twice the available
//!   processing units).
//! - `CORPUSGEN_EXTENSIONS`: comma-separated file extensions to index
//!   (default: `.py`).

use std::path::{Path, PathBuf};

use crate::errors::{CorpusError, CorpusResult};

pub const DEFAULT_EXTENSIONS: &[&str] = &[".py"];

pub const DEFAULT_INPUT_ROOT: &str = ".data/repos";
pub const DEFAULT_INDEX_PATH: &str = ".data/files.idx";
pub const DEFAULT_CORPUS_PATH: &str = ".data/corpus.functions.bin";
pub const DEFAULT_GRAPHS_PATH: &str = ".data/graphs.functions.bin";

/// Which declarations the extractor keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Module-level functions and methods.
    #[default]
    Functions,
    /// Functions declared inside class bodies only.
    Methods,
}

impl ExtractionMode {
    pub fn from_methods_flag(methods: bool) -> Self {
        if methods {
            Self::Methods
        } else {
            Self::Functions
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    /// Input order, one thread.
    Sequential,
    /// Worker pool; output order is not guaranteed.
    #[default]
    Parallel,
}

impl Execution {
    pub fn from_singlethreaded_flag(singlethreaded: bool) -> Self {
        if singlethreaded {
            Self::Sequential
        } else {
            Self::Parallel
        }
    }
}

// ---------------------------------------------------------------------------
// Environment overrides
// ---------------------------------------------------------------------------

/// Pool size: a positive `CORPUSGEN_WORKERS`, otherwise twice the available
/// processing units.
pub fn default_worker_count() -> usize {
    let raw = std::env::var("CORPUSGEN_WORKERS").ok();
    parse_worker_override(raw.as_deref()).unwrap_or_else(|| {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        2 * cores
    })
}

pub fn parse_worker_override(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

/// Extensions from `CORPUSGEN_EXTENSIONS`, falling back to the defaults.
pub fn default_extensions() -> Vec<String> {
    let raw = std::env::var("CORPUSGEN_EXTENSIONS").ok();
    parse_extensions(raw.as_deref())
}

/// Normalize a comma-separated extension list to lowercase `.ext` entries.
pub fn parse_extensions(raw: Option<&str>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .collect();
    if parsed.is_empty() {
        DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
    } else {
        parsed
    }
}

fn absolute(path: &Path) -> CorpusResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| CorpusError::Config(format!("Cannot resolve {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Stage configs
// ---------------------------------------------------------------------------

/// Extraction stage settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateConfig {
    pub input_root: PathBuf,
    pub index_path: PathBuf,
    pub output_path: PathBuf,
    pub regenerate: bool,
    pub mode: ExtractionMode,
    pub execution: Execution,
    pub extensions: Vec<String>,
    pub workers: usize,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from(DEFAULT_INPUT_ROOT),
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            output_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            regenerate: false,
            mode: ExtractionMode::default(),
            execution: Execution::default(),
            extensions: default_extensions(),
            workers: default_worker_count(),
        }
    }
}

impl GenerateConfig {
    pub fn new(
        input_root: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            index_path: index_path.into(),
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    pub fn with_regenerate(mut self, regenerate: bool) -> Self {
        self.regenerate = regenerate;
        self
    }

    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Copy with every path made absolute.
    pub fn normalized(&self) -> CorpusResult<Self> {
        Ok(Self {
            input_root: absolute(&self.input_root)?,
            index_path: absolute(&self.index_path)?,
            output_path: absolute(&self.output_path)?,
            ..self.clone()
        })
    }
}

/// Graph stage settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub execution: Execution,
    pub workers: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_CORPUS_PATH),
            output_path: PathBuf::from(DEFAULT_GRAPHS_PATH),
            execution: Execution::default(),
            workers: default_worker_count(),
        }
    }
}

impl GraphConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn normalized(&self) -> CorpusResult<Self> {
        Ok(Self {
            input_path: absolute(&self.input_path)?,
            output_path: absolute(&self.output_path)?,
            ..self.clone()
        })
    }
}
