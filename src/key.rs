//! Key and path normalization.
//!
//! The store has no native directory concept: folders exist purely as a
//! key-naming convention. A folder is a key ending in `/`; a file key is
//! `{uuid-v4}-{original name}`. Every path (prefix) is either empty (the
//! root) or ends in exactly one `/`.

use uuid::Uuid;

use crate::error::{Result, StorageError};

/// Shown when stripping a key leaves nothing displayable.
pub const FALLBACK_DISPLAY_NAME: &str = "Unknown file";

/// Build the storage key for a folder.
///
/// # Arguments
/// * `name` - Human folder name; must be non-empty after trimming and must
///   not contain `/`
/// * `parent` - Parent prefix: `""` for the root, otherwise ending in `/`
///
/// # Returns
/// `{parent}{name}/` with exactly one trailing slash.
pub fn folder_key(name: &str, parent: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorageError::Validation(
            "folder name cannot be empty".into(),
        ));
    }
    if name.contains('/') {
        return Err(StorageError::Validation(
            "folder name cannot contain '/'".into(),
        ));
    }
    validate_prefix(parent)?;
    Ok(format!("{parent}{name}/"))
}

/// Build a fresh unique storage key for an uploaded file: `{uuid}-{name}`.
pub fn unique_file_key(file_name: &str) -> Result<String> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return Err(StorageError::Validation("file name cannot be empty".into()));
    }
    Ok(format!("{}-{}", Uuid::new_v4(), file_name))
}

/// Check that a path is a valid prefix: empty (root) or ending in `/`.
pub(crate) fn validate_prefix(path: &str) -> Result<()> {
    if path.is_empty() || path.ends_with('/') {
        Ok(())
    } else {
        Err(StorageError::Validation(format!(
            "path `{path}` must be empty or end with '/'"
        )))
    }
}

/// True if the key denotes a virtual folder (trailing `/`).
pub fn is_folder_key(key: &str) -> bool {
    key.ends_with('/')
}

/// Last path segment of a key, ignoring a trailing slash.
pub fn leaf_name(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Strip a leading `{uuid}-` segment from a name, if present.
///
/// The UUID must be the full hyphenated 8-4-4-4-12 form (case-insensitive)
/// followed by a `-`. Anything else is returned unchanged.
pub fn strip_uuid_prefix(name: &str) -> &str {
    if let (Some(head), Some(rest)) = (name.get(..36), name.get(36..)) {
        if rest.starts_with('-') && Uuid::try_parse(head).is_ok() {
            return &rest[1..];
        }
    }
    name
}

/// Derive the human-readable display name for a stored key.
///
/// Strips the parent prefix, then a leading UUID segment. Keys without a
/// UUID segment (e.g. folder markers) come back unchanged after prefix
/// stripping. An empty remainder falls back to [`FALLBACK_DISPLAY_NAME`].
pub fn display_name(key: &str, parent: &str) -> String {
    let local = key.strip_prefix(parent).unwrap_or(key);
    let stripped = strip_uuid_prefix(local);
    if stripped.is_empty() {
        FALLBACK_DISPLAY_NAME.to_string()
    } else {
        stripped.to_string()
    }
}

/// Display name for a folder prefix: the leaf segment without the trailing
/// slash, UUID segment stripped.
pub fn folder_display_name(prefix: &str, parent: &str) -> String {
    let local = prefix.strip_prefix(parent).unwrap_or(prefix);
    let stripped = strip_uuid_prefix(leaf_name(local));
    if stripped.is_empty() {
        FALLBACK_DISPLAY_NAME.to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_key_trailing_slash() {
        assert_eq!(folder_key("Photos", "").unwrap(), "Photos/");
        assert_eq!(folder_key("Work", "Photos/").unwrap(), "Photos/Work/");
        // Exactly one trailing slash, no doubled separators.
        for (name, parent) in [("A", ""), ("B", "A/"), ("C", "A/B/")] {
            let key = folder_key(name, parent).unwrap();
            assert!(key.ends_with('/'));
            assert!(!key.ends_with("//"));
            assert!(!key.contains("//"));
        }
    }

    #[test]
    fn test_folder_key_rejects_bad_input() {
        assert!(folder_key("", "").is_err());
        assert!(folder_key("   ", "").is_err());
        assert!(folder_key("a/b", "").is_err());
        assert!(folder_key("Photos", "no-slash").is_err());
    }

    #[test]
    fn test_unique_file_key_round_trip() {
        let key = unique_file_key("cat.png").unwrap();
        assert!(key.ends_with("-cat.png"));
        assert_eq!(display_name(&key, ""), "cat.png");
    }

    #[test]
    fn test_unique_file_key_rejects_empty() {
        assert!(unique_file_key("").is_err());
        assert!(unique_file_key("  ").is_err());
    }

    #[test]
    fn test_strip_uuid_prefix() {
        let key = "123e4567-e89b-12d3-a456-426614174000-report.pdf";
        assert_eq!(strip_uuid_prefix(key), "report.pdf");
        // Uppercase hex matches too.
        let upper = "123E4567-E89B-12D3-A456-426614174000-report.pdf";
        assert_eq!(strip_uuid_prefix(upper), "report.pdf");
        // Not a UUID: unchanged.
        assert_eq!(strip_uuid_prefix("notes.txt"), "notes.txt");
        assert_eq!(strip_uuid_prefix("Photos/"), "Photos/");
        // A 36-char non-UUID head: unchanged.
        let fake = "zzze4567-e89b-12d3-a456-426614174000-x.txt";
        assert_eq!(strip_uuid_prefix(fake), fake);
    }

    #[test]
    fn test_display_name_strips_parent_and_uuid() {
        let key = "Photos/123e4567-e89b-12d3-a456-426614174000-cat.png";
        assert_eq!(display_name(key, "Photos/"), "cat.png");
        // Folder marker: unchanged after prefix stripping.
        assert_eq!(display_name("Photos/Work/", "Photos/"), "Work/");
    }

    #[test]
    fn test_display_name_fallback() {
        // A bare UUID key with nothing after the convention.
        let key = "123e4567-e89b-12d3-a456-426614174000-";
        assert_eq!(display_name(key, ""), FALLBACK_DISPLAY_NAME);
        assert_eq!(display_name("", ""), FALLBACK_DISPLAY_NAME);
    }

    #[test]
    fn test_display_name_uuid_collision_edge() {
        // A human name that itself looks like the UUID convention cannot be
        // round-tripped: the leading segment is stripped as if it were ours.
        let name = "123e4567-e89b-12d3-a456-426614174000-notes.txt";
        let key = unique_file_key(name).unwrap();
        assert_eq!(display_name(&key, ""), "notes.txt");
    }

    #[test]
    fn test_folder_display_name() {
        assert_eq!(folder_display_name("Photos/", ""), "Photos");
        assert_eq!(folder_display_name("Photos/Work/", "Photos/"), "Work");
        // Legacy folders created with a UUID-prefixed key still display clean.
        let legacy = "123e4567-e89b-12d3-a456-426614174000-Photos/";
        assert_eq!(folder_display_name(legacy, ""), "Photos");
    }

    #[test]
    fn test_leaf_name() {
        assert_eq!(leaf_name("a/b/c.txt"), "c.txt");
        assert_eq!(leaf_name("a/b/"), "b");
        assert_eq!(leaf_name("c.txt"), "c.txt");
    }
}
