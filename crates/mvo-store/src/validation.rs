//! Session-id and path-safety validation: reject a session id before it
//! is ever used to build a filesystem path.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{StoreError, StoreResult};

const MAX_SESSION_ID_LEN: usize = 255;
const FORBIDDEN_SEQUENCES: &[&str] = &["..", "~", "$"];
const FORBIDDEN_CHARS: &[char] = &['.', '\\', '|', '<', '>', '"', '?', '*'];

/// Validate a session id: `[A-Za-z0-9_-]{1,255}`, with no `..`, `~`, `$`,
/// or any of the forbidden characters.
///
/// Note: `.` is both a forbidden character and excluded from the allowed
/// class, so the forbidden-sequence/forbidden-character checks are
/// subsumed by the regex; they are kept as separate, earlier checks so the
/// error message names the specific violation.
pub fn validate_session_id(session_id: &str) -> StoreResult<&str> {
    if session_id.is_empty() {
        return Err(StoreError::invalid_identifier("session id cannot be empty"));
    }
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(StoreError::invalid_identifier(format!(
            "session id too long (max {MAX_SESSION_ID_LEN} chars)"
        )));
    }
    for seq in FORBIDDEN_SEQUENCES {
        if session_id.contains(seq) {
            return Err(StoreError::invalid_identifier(format!(
                "session id contains forbidden sequence: {seq}"
            )));
        }
    }
    for ch in FORBIDDEN_CHARS {
        if session_id.contains(*ch) {
            return Err(StoreError::invalid_identifier(format!(
                "session id contains forbidden character: {ch}"
            )));
        }
    }
    let pattern = Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex is valid");
    if !pattern.is_match(session_id) {
        return Err(StoreError::invalid_identifier(
            "session id must be alphanumeric with hyphens/underscores only",
        ));
    }
    Ok(session_id)
}

/// Resolve `candidate` under `root` and verify the result is still
/// contained within `root` (prevents path traversal via symlinks or `..`
/// components that survived earlier validation).
pub fn validate_path_within(root: &Path, candidate: &Path) -> StoreResult<PathBuf> {
    let root_resolved = root
        .canonicalize()
        .or_else(|_| std::fs::create_dir_all(root).and_then(|_| root.canonicalize()))?;
    let full = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };
    std::fs::create_dir_all(full.parent().unwrap_or(&full)).ok();
    let resolved = full.canonicalize().unwrap_or(full);
    if !resolved.starts_with(&root_resolved) {
        return Err(StoreError::invalid_identifier(format!(
            "path traversal detected: {} is outside {}",
            resolved.display(),
            root_resolved.display()
        )));
    }
    Ok(resolved)
}

/// Strip path separators and reject empty/hidden/non-alphanumeric names.
pub fn sanitize_filename(filename: &str) -> StoreResult<String> {
    if filename.is_empty() {
        return Err(StoreError::invalid_identifier("filename cannot be empty"));
    }
    let cleaned: String = filename
        .replace('/', "_")
        .replace('\\', "_")
        .replace('\0', "");
    for seq in FORBIDDEN_SEQUENCES {
        if cleaned.contains(seq) {
            return Err(StoreError::invalid_identifier(format!(
                "filename contains forbidden sequence: {seq}"
            )));
        }
    }
    if cleaned.starts_with('.') {
        return Err(StoreError::invalid_identifier(
            "filename cannot start with a dot",
        ));
    }
    if !cleaned.chars().any(|c| c.is_alphanumeric()) {
        return Err(StoreError::invalid_identifier(
            "filename must contain alphanumeric characters",
        ));
    }
    Ok(cleaned)
}

/// Reject JSON documents larger than `max_size` bytes before parsing them.
pub fn validate_json_size(path: &Path, max_size: u64) -> StoreResult<()> {
    if let Ok(meta) = std::fs::metadata(path) {
        if meta.len() > max_size {
            return Err(StoreError::invalid_identifier(format!(
                "file too large: {} bytes (max {} bytes)",
                meta.len(),
                max_size
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_ids() {
        assert!(validate_session_id("abc-123_XYZ").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_session_id("").is_err());
    }

    #[test]
    fn rejects_traversal_sequence() {
        assert!(validate_session_id("../etc/passwd").is_err());
        assert!(validate_session_id("a~b").is_err());
        assert!(validate_session_id("a$b").is_err());
    }

    #[test]
    fn rejects_forbidden_chars() {
        for bad in ["a.b", "a|b", "a<b", "a>b", "a\"b", "a?b", "a*b", "a\\b"] {
            assert!(validate_session_id(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn rejects_too_long() {
        let long = "a".repeat(256);
        assert!(validate_session_id(&long).is_err());
    }

    #[test]
    fn sanitize_filename_strips_separators() {
        assert_eq!(sanitize_filename("a/b\\c").unwrap(), "a_b_c");
    }

    #[test]
    fn sanitize_filename_rejects_hidden() {
        assert!(sanitize_filename(".hidden").is_err());
    }
}
