//! JSON persistence for [`IndexData`].
//!
//! Grounded on the teacher's `src/storage/persistence.rs`: write to a `.tmp`
//! sibling then `rename` into place so a crash mid-write never leaves a
//! truncated index file behind. Unlike the teacher, which serializes with
//! `bincode`, the normative wire form here is JSON (`spec.md` §6), so this
//! module uses `serde_json` directly rather than a save/load struct wrapping
//! a base directory.

use std::fs;
use std::path::Path;

use crate::error::IndexError;
use crate::index::{CrossRefIndex, INDEX_DATA_TYPE_TAG};
use crate::model::IndexData;

/// Serializes `index` to pretty JSON and writes it atomically to `path`.
pub fn save_index(index: &CrossRefIndex, path: &Path) -> Result<(), IndexError> {
    let data = index.as_data();
    let json = serde_json::to_string_pretty(&data)
        .map_err(|source| IndexError::DeserializationError { path: path.to_path_buf(), source })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|source| IndexError::FileWrite { path: parent.to_path_buf(), source })?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)
        .map_err(|source| IndexError::FileWrite { path: temp_path.clone(), source })?;
    fs::rename(&temp_path, path)
        .map_err(|source| IndexError::FileWrite { path: path.to_path_buf(), source })?;

    Ok(())
}

/// Reads and decodes an [`IndexData`] document from `path`, warning (not
/// failing) if its `type` tag does not match this crate's own tag.
pub fn load_index(path: &Path) -> Result<CrossRefIndex, IndexError> {
    let bytes = fs::read(path).map_err(|source| IndexError::FileRead { path: path.to_path_buf(), source })?;
    let data: IndexData = serde_json::from_slice(&bytes)
        .map_err(|source| IndexError::DeserializationError { path: path.to_path_buf(), source })?;

    if data.type_tag != INDEX_DATA_TYPE_TAG {
        tracing::warn!(
            "loading index with unexpected type tag '{}' (expected '{}'); ingesting anyway",
            data.type_tag,
            INDEX_DATA_TYPE_TAG
        );
    }

    let mut index = CrossRefIndex::new();
    index.update_from_data(data);
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CodeLocation, Definition, Symbol};

    #[test]
    fn round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut index = CrossRefIndex::new();
        index.add_definition(
            Symbol::Function { name: "main".into() },
            Definition::new(CodeLocation::new("a.c", 1, 0, 3, 1, 0, 20)),
        );
        save_index(&index, &path).unwrap();

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.as_data().data.len(), index.as_data().data.len());
    }

    #[test]
    fn mismatched_type_tag_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        fs::write(&path, r#"{"type":"someone-else/index","data":[]}"#).unwrap();

        let loaded = load_index(&path).unwrap();
        assert_eq!(loaded.as_data().data.len(), 0);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(matches!(load_index(&path), Err(IndexError::FileRead { .. })));
    }
}
