//! Helpers for `/`-separated key paths
//!
//! Key paths are relative to a mount. Listing entries ending in `/` are
//! directories; everything else is a leaf.

/// Join path segments with `/`, dropping empty segments and redundant slashes.
///
/// A trailing slash on the last segment is not preserved, so
/// `join(&["roles/", ""])` is `"roles"`.
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|p| p.split('/'))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a listing entry denotes a directory
pub fn is_dir_entry(entry: &str) -> bool {
    entry.ends_with('/')
}

/// Final segment of a key path
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_drops_empty_and_slashes() {
        assert_eq!(join(&["secret", "app/db"]), "secret/app/db");
        assert_eq!(join(&["secret/", "/app/", "db"]), "secret/app/db");
        assert_eq!(join(&["secret", ""]), "secret");
        assert_eq!(join(&["", "app/"]), "app");
        assert_eq!(join(&["logical", "uuid-1", ""]), "logical/uuid-1");
    }

    #[test]
    fn test_is_dir_entry() {
        assert!(is_dir_entry("app/"));
        assert!(!is_dir_entry("db"));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("keys/signing"), "signing");
        assert_eq!(base_name("signing"), "signing");
        assert_eq!(base_name("keys/"), "keys");
    }
}
