//! Source discovery and the cached file index.

use std::path::Path;

use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::{CorpusError, CorpusResult};
use crate::persist::{read_payload, write_payload};

const IMPLICIT_IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn", "__pycache__"];

/// Relative paths of the files a run will process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileIndex {
    pub files: Vec<String>,
    /// True when the index was rebuilt by walking the input root.
    pub regenerated: bool,
}

/// True when the file name ends with one of `extensions` (`.py` style,
/// compared case-insensitively).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && IMPLICIT_IGNORED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref())
}

/// Walk `root` recursively and return matching files as sorted,
/// `/`-separated paths relative to `root`. Symlinked files are included under
/// the link's path. Unreadable entries are skipped.
pub fn discover_files(root: &Path, extensions: &[String]) -> CorpusResult<Vec<String>> {
    if !root.is_dir() {
        return Err(CorpusError::Config(format!(
            "Input root {} is not a directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        // `path().is_file()` follows a symlinked file; links are never descended
        if !entry.path().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        files.push(relative);
    }

    Ok(files)
}

/// Load the index at `index_path`, or rebuild and store it when it is missing
/// or `regenerate` is set.
pub fn resolve_file_index(
    root: &Path,
    index_path: &Path,
    regenerate: bool,
    extensions: &[String],
) -> CorpusResult<FileIndex> {
    if regenerate || !index_path.exists() {
        let files = discover_files(root, extensions)?;
        write_payload(index_path, &files).map_err(|e| {
            CorpusError::Index(format!("Cannot write index {}: {e}", index_path.display()))
        })?;
        info!(files = files.len(), index = %index_path.display(), "Indexed input files");
        return Ok(FileIndex {
            files,
            regenerated: true,
        });
    }

    let files: Vec<String> = read_payload(index_path).map_err(|e| {
        CorpusError::Index(format!("Cannot read index {}: {e}", index_path.display()))
    })?;
    info!(files = files.len(), index = %index_path.display(), "Loaded file index");
    Ok(FileIndex {
        files,
        regenerated: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn py() -> Vec<String> {
        vec![".py".to_string()]
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("pkg/__pycache__")).unwrap();
        fs::write(root.join("b.py"), "x = 1\n").unwrap();
        fs::write(root.join("a.py"), "x = 1\n").unwrap();
        fs::write(root.join("README.md"), "# hi\n").unwrap();
        fs::write(root.join("pkg/sub/c.PY"), "x = 1\n").unwrap();
        fs::write(root.join(".git/hook.py"), "x = 1\n").unwrap();
        fs::write(root.join("pkg/__pycache__/c.py"), "x = 1\n").unwrap();
        dir
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/b.py"), &py()));
        assert!(has_extension(Path::new("a/b.Py"), &py()));
        assert!(!has_extension(Path::new("a/b.pyc"), &py()));
        assert!(!has_extension(Path::new("Makefile"), &py()));
    }

    #[test]
    fn test_discover_files_sorted_and_filtered() {
        let dir = fixture();
        let files = discover_files(dir.path(), &py()).unwrap();
        assert_eq!(files, vec!["a.py", "b.py", "pkg/sub/c.PY"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_files_includes_symlinked_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("shared")).unwrap();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("shared/real.py"), "x = 1\n").unwrap();
        std::os::unix::fs::symlink(root.join("shared/real.py"), root.join("pkg/linked.py"))
            .unwrap();
        // a directory link is not descended
        std::os::unix::fs::symlink(root.join("shared"), root.join("alias")).unwrap();

        let files = discover_files(root, &py()).unwrap();
        assert_eq!(files, vec!["pkg/linked.py", "shared/real.py"]);
    }

    #[test]
    fn test_discover_files_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_files(&dir.path().join("nope"), &py()).unwrap_err();
        assert!(matches!(err, CorpusError::Config(_)));
    }

    #[test]
    fn test_resolve_file_index_caches_until_regenerated() {
        let dir = fixture();
        let index = dir.path().join("files.json");

        let first = resolve_file_index(dir.path(), &index, false, &py()).unwrap();
        assert!(first.regenerated);
        assert_eq!(first.files.len(), 3);

        fs::write(dir.path().join("d.py"), "x = 1\n").unwrap();
        let cached = resolve_file_index(dir.path(), &index, false, &py()).unwrap();
        assert!(!cached.regenerated);
        assert_eq!(cached.files, first.files);

        let rebuilt = resolve_file_index(dir.path(), &index, true, &py()).unwrap();
        assert!(rebuilt.regenerated);
        assert_eq!(rebuilt.files.len(), 4);
    }

    #[test]
    fn test_resolve_file_index_unwritable() {
        let dir = fixture();
        let index = dir.path().join("missing-dir").join("files.bin");
        let err = resolve_file_index(dir.path(), &index, false, &py()).unwrap_err();
        assert!(matches!(err, CorpusError::Index(_)));
    }
}
