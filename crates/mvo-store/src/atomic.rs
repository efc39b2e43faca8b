//! Atomic file writes: temp file in the target's own directory, fsync,
//! then rename-replace over the target.
//!
//! `write(path, bytes)` guarantees that after return either the file
//! contains exactly the new bytes or is unchanged — partial writes are
//! never observable. The temp file must live on the same filesystem as the
//! target so the final rename is atomic; directory fsync is not performed
//! (recommended for maximum crash-safety, not required by this contract).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::StoreResult;

/// Atomically write `bytes` to `path`.
///
/// On any error before the rename, the temp file is unlinked and the
/// original error propagates; the target is left untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("state");
    let temp_path = dir.join(format!(".{file_name}.{}.tmp", std::process::id()));

    let result = (|| -> StoreResult<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&temp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

/// Atomically write a JSON value with stable (pretty, sorted-key) formatting.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &bytes)
}

/// Read and parse a JSON document, returning `Ok(None)` if it doesn't exist.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_json_atomic(&path, &json!({"a": 1})).unwrap();
        let value: serde_json::Value = read_json(&path).unwrap().unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        let value: Option<serde_json::Value> = read_json(&path).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn write_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_json_atomic(&path, &json!({"a": 1})).unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn second_write_fully_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_json_atomic(&path, &json!({"a": 1})).unwrap();
        write_json_atomic(&path, &json!({"b": 2})).unwrap();
        let value: serde_json::Value = read_json(&path).unwrap().unwrap();
        assert_eq!(value, json!({"b": 2}));
    }
}
