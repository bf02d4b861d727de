//! Indexer driver: walks a repository, dispatches each file to a language
//! processor, and feeds the resulting definitions/references into a
//! [`CrossRefIndex`].
//!
//! Grounded on the teacher's `src/indexing/walker.rs` for the `ignore`-crate
//! traversal configuration (gitignore-aware, no symlink-following), with
//! files sorted after the walk so two runs over the same tree produce
//! equivalent output. The parallel variant mirrors the teacher's combination
//! of `rayon` for the worker pool and `parking_lot` for the single-writer
//! guard around the shared index.
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::index::CrossRefIndex;
use crate::parsing::{LanguageProcessor, QueryContext};

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub files_indexed: usize,
    pub files_skipped: usize,
}

/// Collects every file under `root` whose extension is in
/// `processor.extensions()`, sorted lexicographically. If `root` itself is a
/// regular file it is returned as the sole entry regardless of extension —
/// the "explicitly provided" case from the failure-handling note.
fn discover_files(root: &Path, processor: &dyn LanguageProcessor) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .require_git(false);

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| processor.extensions().contains(&ext))
        })
        .collect();

    files.sort();
    files
}

fn repo_relative(root: &Path, file: &Path) -> PathBuf {
    file.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| file.to_path_buf())
}

fn index_one_file(
    root: &Path,
    file: &Path,
    processor: &dyn LanguageProcessor,
) -> Option<(Vec<(crate::model::Symbol, crate::model::Definition)>, Vec<(crate::model::Symbol, crate::model::Reference)>)> {
    let given_ext = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if !processor.extensions().contains(&given_ext) {
        tracing::warn!("indexing {} despite unrecognized extension '{given_ext}'", file.display());
    }

    let source = match std::fs::read(file) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("skipping {}: {e}", file.display());
            return None;
        }
    };
    let text = match std::str::from_utf8(&source) {
        Ok(s) => s,
        Err(_) => {
            tracing::warn!("skipping {}: not valid UTF-8", file.display());
            return None;
        }
    };

    let mut parser = processor.new_parser();
    let tree = match parser.parse(text, None) {
        Some(t) => t,
        None => {
            tracing::warn!("skipping {}: parser produced no tree", file.display());
            return None;
        }
    };

    let relative = repo_relative(root, file);
    let ctx = QueryContext::new(&relative, &source);

    let defs: Vec<_> = processor
        .definition_nodes(tree.root_node())
        .into_iter()
        .filter_map(|node| processor.handle_definition(node, &ctx))
        .collect();
    let refs: Vec<_> = processor
        .reference_nodes(tree.root_node())
        .into_iter()
        .filter_map(|node| processor.handle_reference(node, &ctx))
        .collect();

    Some((defs, refs))
}

/// Sequential driver: one file at a time, in sorted order.
pub fn index_repository(root: &Path, processor: &dyn LanguageProcessor) -> (CrossRefIndex, IndexStats) {
    let mut index = CrossRefIndex::new();
    let mut stats = IndexStats::default();

    for file in discover_files(root, processor) {
        match index_one_file(root, &file, processor) {
            Some((defs, refs)) => {
                for (symbol, def) in defs {
                    index.add_definition(symbol, def);
                }
                for (symbol, reference) in refs {
                    index.add_reference(symbol, reference);
                }
                stats.files_indexed += 1;
            }
            None => stats.files_skipped += 1,
        }
    }

    (index, stats)
}

/// Parallel driver: files are parsed concurrently across a `rayon` thread
/// pool; each worker accumulates its own definitions/references, then a
/// `parking_lot::Mutex` single-writer guard merges them into the shared
/// index in the sorted file order they were dispatched in. Merge order is
/// deterministic even though parse order is not.
pub fn index_repository_parallel(
    root: &Path,
    processor: &dyn LanguageProcessor,
) -> (CrossRefIndex, IndexStats)
where
{
    use rayon::prelude::*;

    let files = discover_files(root, processor);
    let results: Vec<_> = files
        .par_iter()
        .map(|file| index_one_file(root, file, processor))
        .collect();

    let index = parking_lot::Mutex::new(CrossRefIndex::new());
    let mut stats = IndexStats::default();

    for result in results {
        match result {
            Some((defs, refs)) => {
                let mut guard = index.lock();
                for (symbol, def) in defs {
                    guard.add_definition(symbol, def);
                }
                for (symbol, reference) in refs {
                    guard.add_reference(symbol, reference);
                }
                drop(guard);
                stats.files_indexed += 1;
            }
            None => stats.files_skipped += 1,
        }
    }

    (index.into_inner(), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::python::PythonProcessor;
    use crate::parsing::Language;

    #[test]
    fn walks_directory_and_respects_gitignore() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def a():\n    return b()\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "def b():\n    return 1\n").unwrap();
        std::fs::write(dir.path().join(".gitignore"), "ignored.py\n").unwrap();
        std::fs::write(dir.path().join("ignored.py"), "def skip():\n    pass\n").unwrap();

        let processor = PythonProcessor;
        let files = discover_files(dir.path(), &processor);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.file_name().unwrap() != "ignored.py"));
    }

    #[test]
    fn sequential_and_parallel_drivers_agree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def a():\n    return b()\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "def b():\n    return 1\n").unwrap();

        let processor = PythonProcessor;
        let (seq_index, seq_stats) = index_repository(dir.path(), &processor);
        let (par_index, par_stats) = index_repository_parallel(dir.path(), &processor);

        assert_eq!(seq_stats.files_indexed, par_stats.files_indexed);
        assert_eq!(seq_index.as_data().data.len(), par_index.as_data().data.len());
        assert_eq!(Language::Python.tag(), "python");
    }

    #[test]
    fn single_file_input_is_indexed_regardless_of_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.txt");
        std::fs::write(&path, "def a():\n    pass\n").unwrap();

        let processor = PythonProcessor;
        let files = discover_files(&path, &processor);
        assert_eq!(files, vec![path]);
    }
}
