//! Extraction stage driver: file index, per-file dispatch and corpus output.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use tracing::{info, warn};

use crate::config::{Execution, ExtractionMode, GenerateConfig};
use crate::corpus::extractor::extract_file;
use crate::corpus::filesystem::resolve_file_index;
use crate::errors::{CorpusError, CorpusResult};
use crate::models::SourceRecord;
use crate::persist::write_payload;
use crate::worker::{isolate, run_units};

const PROGRESS_EVERY: usize = 100;

/// Records from a set of files plus the paths that failed.
#[derive(Clone, Debug, Default)]
pub struct CorpusBatch {
    pub records: Vec<SourceRecord>,
    pub failed: Vec<String>,
    pub scanned: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateReport {
    pub files_scanned: usize,
    pub files_failed: usize,
    pub records: usize,
    pub index_regenerated: bool,
    pub elapsed_ms: u128,
}

/// Extract every file under `root`. A file that fails to read or parse (or
/// panics) is logged and contributes nothing.
pub fn extract_files(
    root: &Path,
    files: &[String],
    mode: ExtractionMode,
    execution: Execution,
    workers: usize,
) -> CorpusBatch {
    let done = AtomicUsize::new(0);
    let total = files.len();

    let outcomes = run_units(files, execution, workers, |_, path| {
        let outcome = isolate(|| extract_file(root, path, mode));
        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
        if finished % PROGRESS_EVERY == 0 {
            info!(finished, total, "Extraction progress");
        }
        outcome
    });

    let mut batch = CorpusBatch {
        scanned: total,
        ..CorpusBatch::default()
    };
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            Ok(records) => batch.records.extend(records),
            Err(e) => {
                warn!(path = %path, error = %e, "File extraction failed");
                batch.failed.push(path.clone());
            }
        }
    }
    batch
}

/// Run the extraction stage end to end: resolve the file index, extract all
/// files and overwrite the corpus at the output path.
pub fn generate(config: &GenerateConfig) -> CorpusResult<GenerateReport> {
    let start = Instant::now();
    let config = config.normalized()?;

    if !config.input_root.is_dir() {
        return Err(CorpusError::Config(format!(
            "Input root {} does not exist",
            config.input_root.display()
        )));
    }

    let index = resolve_file_index(
        &config.input_root,
        &config.index_path,
        config.regenerate,
        &config.extensions,
    )?;

    let batch = extract_files(
        &config.input_root,
        &index.files,
        config.mode,
        config.execution,
        config.workers,
    );

    write_payload(&config.output_path, &batch.records)?;

    let report = GenerateReport {
        files_scanned: batch.scanned,
        files_failed: batch.failed.len(),
        records: batch.records.len(),
        index_regenerated: index.regenerated,
        elapsed_ms: start.elapsed().as_millis(),
    };
    info!(
        files = report.files_scanned,
        failed = report.files_failed,
        records = report.records,
        elapsed_ms = report.elapsed_ms as u64,
        output = %config.output_path.display(),
        "Corpus written"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::read_payload;
    use std::fs;

    fn documented(name: &str) -> String {
        format!("def {name}():\n    \"\"\"Doc for {name}.\"\"\"\n    return 1\n")
    }

    fn fixture(count: usize, broken: Option<usize>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let repos = dir.path().join("repos");
        fs::create_dir_all(&repos).unwrap();
        for i in 0..count {
            let source = if Some(i) == broken {
                "def broken(:\n    pass\n".to_string()
            } else {
                documented(&format!("f{i}"))
            };
            fs::write(repos.join(format!("m{i:02}.py")), source).unwrap();
        }
        dir
    }

    fn config(dir: &Path) -> GenerateConfig {
        GenerateConfig::new(
            dir.join("repos"),
            dir.join("files.json"),
            dir.join("corpus.json"),
        )
        .with_workers(2)
    }

    #[test]
    fn test_extract_files_isolates_failures() {
        let dir = fixture(5, Some(2));
        let files: Vec<String> = (0..5).map(|i| format!("m{i:02}.py")).collect();
        for execution in [Execution::Sequential, Execution::Parallel] {
            let batch = extract_files(
                &dir.path().join("repos"),
                &files,
                ExtractionMode::Functions,
                execution,
                2,
            );
            assert_eq!(batch.scanned, 5);
            assert_eq!(batch.records.len(), 4);
            assert_eq!(batch.failed, vec!["m02.py".to_string()]);
        }
    }

    #[test]
    fn test_extract_files_missing_file_is_a_failure() {
        let dir = fixture(1, None);
        let files = vec!["m00.py".to_string(), "gone.py".to_string()];
        let batch = extract_files(
            &dir.path().join("repos"),
            &files,
            ExtractionMode::Functions,
            Execution::Sequential,
            1,
        );
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.failed, vec!["gone.py".to_string()]);
    }

    #[test]
    fn test_generate_writes_corpus() {
        let dir = fixture(3, Some(1));
        let report = generate(&config(dir.path())).unwrap();
        assert_eq!(report.files_scanned, 3);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.records, 2);
        assert!(report.index_regenerated);

        let corpus: Vec<SourceRecord> = read_payload(&dir.path().join("corpus.json")).unwrap();
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_generate_sequential_order_is_stable() {
        let dir = fixture(6, None);
        let cfg = config(dir.path()).with_execution(Execution::Sequential);
        generate(&cfg).unwrap();
        let first: Vec<SourceRecord> = read_payload(&dir.path().join("corpus.json")).unwrap();
        generate(&cfg).unwrap();
        let second: Vec<SourceRecord> = read_payload(&dir.path().join("corpus.json")).unwrap();

        assert_eq!(first, second);
        let paths: Vec<&str> = first.iter().map(|r| r.provenance.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["m00.py", "m01.py", "m02.py", "m03.py", "m04.py", "m05.py"]
        );
    }

    #[test]
    fn test_generate_reuses_index_until_regenerate() {
        let dir = fixture(2, None);
        let cfg = config(dir.path());
        generate(&cfg).unwrap();

        fs::write(dir.path().join("repos/m99.py"), documented("late")).unwrap();
        let cached = generate(&cfg).unwrap();
        assert!(!cached.index_regenerated);
        assert_eq!(cached.records, 2);

        let rebuilt = generate(&cfg.clone().with_regenerate(true)).unwrap();
        assert!(rebuilt.index_regenerated);
        assert_eq!(rebuilt.records, 3);
    }

    #[test]
    fn test_generate_missing_input_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate(&config(dir.path())).err().unwrap();
        assert!(matches!(err, CorpusError::Config(_)));
    }

    #[test]
    fn test_generate_unwritable_output_is_fatal() {
        let dir = fixture(1, None);
        let cfg = GenerateConfig::new(
            dir.path().join("repos"),
            dir.path().join("files.json"),
            dir.path().join("no-such-dir/corpus.bin"),
        );
        assert!(generate(&cfg).is_err());
    }
}
