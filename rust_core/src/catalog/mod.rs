//! Master catalog persistence.
//!
//! This module provides:
//! - `TeamCatalog`: append-only team master keyed by team id
//! - `CompetitionCatalog`: competition list with match-file summaries
//! - Atomic JSON writes (temp file in the target directory, then rename)

pub mod competitions;
pub mod teams;

pub use competitions::CompetitionCatalog;
pub use teams::{PersistMode, TeamCatalog};

use crate::error::CatalogError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `value` as pretty JSON with a trailing newline, replacing `path` atomically.
///
/// Readers see either the old file or the complete new one, never a partial write.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), CatalogError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CatalogError::io(dir, e))?;
    serde_json::to_writer_pretty(&mut tmp, value).map_err(|e| CatalogError::json(path, e))?;
    tmp.write_all(b"\n").map_err(|e| CatalogError::io(path, e))?;
    tmp.flush().map_err(|e| CatalogError::io(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CatalogError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| CatalogError::io(path, e.error))?;
    Ok(())
}

/// Read a JSON document. A missing or blank file yields `None`; malformed JSON is an error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CatalogError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| CatalogError::json(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("premier_1".to_string(), "Bath".to_string());
        write_json_atomic(&path, &doc).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with("}\n"));
        assert!(raw.contains("  \"premier_1\": \"Bath\""));

        let back: BTreeMap<String, String> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_read_missing_blank_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        assert!(read_json::<Vec<String>>(&path).unwrap().is_none());

        fs::write(&path, "  \n").unwrap();
        assert!(read_json::<Vec<String>>(&path).unwrap().is_none());

        fs::write(&path, "[\"a\",").unwrap();
        assert!(matches!(
            read_json::<Vec<String>>(&path),
            Err(CatalogError::Json { .. })
        ));
    }

    #[test]
    fn test_non_ascii_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &vec!["東京サントリーサンゴリアス"]).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("東京サントリーサンゴリアス"));
    }
}
