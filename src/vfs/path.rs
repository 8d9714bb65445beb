//! # Virtual Path Normalization
//!
//! Virtual paths arrive from web forms, WebDAV clients and SMB bridges, so
//! the same logical path can show up percent-encoded, backslash-separated
//! or dotted. Normalization runs before the traversal check so that no
//! encoded form of `..` survives into segment handling.
//!
//! Normalization deliberately does NOT fold `name/..` pairs: a path that
//! still carries a `..` segment after cleaning is rejected outright rather
//! than silently re-rooted.

use super::errors::{VfsError, VfsResult};

/// Classification of a resolved virtual path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageRoot {
    /// The virtual root `/`, listing the namespaces; has no real path
    Root,
    /// A user's own home namespace
    Home { username: String },
    /// `/shared` itself, the drive listing; never a write destination
    SharedRoot,
    /// One named shared drive
    SharedDrive { drive: String },
}

impl StorageRoot {
    /// Whether uploads may land here. Only a home namespace or a named
    /// drive accepts writes; the virtual root and the bare shared root do
    /// not.
    pub fn accepts_uploads(&self) -> bool {
        matches!(self, StorageRoot::Home { .. } | StorageRoot::SharedDrive { .. })
    }
}

/// Decode and split a raw virtual path into clean segments.
///
/// Steps: percent-decode once, unify `\` to `/`, split, drop empty and `.`
/// segments, reject NUL bytes and any remaining `..` segment.
pub fn normalize(raw: &str) -> VfsResult<Vec<String>> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| VfsError::InvalidPath(raw.to_string()))?;

    if decoded.contains('\0') {
        return Err(VfsError::InvalidPath(raw.to_string()));
    }

    let unified = decoded.replace('\\', "/");

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(VfsError::InvalidPath(raw.to_string())),
            other => segments.push(other.to_string()),
        }
    }

    Ok(segments)
}

/// Re-assemble clean segments into the canonical virtual form.
pub fn canonical_form(segments: &[String]) -> String {
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let segments = normalize("/home/docs/report.txt").unwrap();
        assert_eq!(segments, vec!["home", "docs", "report.txt"]);
    }

    #[test]
    fn test_dot_and_empty_segments_dropped() {
        let segments = normalize("//home/./docs//file").unwrap();
        assert_eq!(segments, vec!["home", "docs", "file"]);
    }

    #[test]
    fn test_dotdot_rejected() {
        assert!(matches!(
            normalize("/home/alice/../../etc/passwd"),
            Err(VfsError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_encoded_dotdot_rejected() {
        assert!(matches!(
            normalize("/home/%2e%2e/etc"),
            Err(VfsError::InvalidPath(_))
        ));
        assert!(matches!(
            normalize("/home/..%2fetc"),
            Err(VfsError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_backslash_separators() {
        assert!(matches!(
            normalize("\\home\\..\\etc"),
            Err(VfsError::InvalidPath(_))
        ));
        let segments = normalize("\\shared\\team\\doc.txt").unwrap();
        assert_eq!(segments, vec!["shared", "team", "doc.txt"]);
    }

    #[test]
    fn test_nul_rejected() {
        assert!(normalize("/home/a\0b").is_err());
        assert!(normalize("/home/a%00b").is_err());
    }

    #[test]
    fn test_empty_path_is_root() {
        assert!(normalize("/").unwrap().is_empty());
        assert!(normalize("").unwrap().is_empty());
        assert_eq!(canonical_form(&[]), "/");
    }
}
