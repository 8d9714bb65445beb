//! Path Containment Invariant Tests
//!
//! - Any virtual path still carrying a `..` segment after normalization
//!   fails InvalidPath without touching the filesystem.
//! - Every successfully resolved real path is a strict descendant of its
//!   storage root's base directory, including for encoded and mixed-case
//!   adversarial inputs.
//! - Symlinks under a managed root never resolve outside it.

use driftbox::actor::Actor;
use driftbox::config::StorageLayout;
use driftbox::vfs::{Resolver, StorageRoot, VfsError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use uuid::Uuid;

fn alice() -> Actor {
    Actor::new(Uuid::new_v4(), "alice")
}

fn fixed_resolver() -> Resolver {
    Resolver::new(StorageLayout::new("/srv/homes", "/srv/shared"))
}

// =============================================================================
// Traversal rejection
// =============================================================================

#[test]
fn test_post_normalization_dotdot_always_invalid() {
    let resolver = fixed_resolver();
    let adversarial = [
        "/home/alice/../../etc/passwd",
        "/home/../shared",
        "/shared/team/../../../root",
        "/home/%2e%2e/secret",
        "/home/..%2F..%2Fetc",
        "..",
        "/..",
        "\\home\\..\\..\\windows",
    ];

    for path in adversarial {
        let result = resolver.resolve(path, Some(&alice()));
        assert!(
            matches!(result, Err(VfsError::InvalidPath(_))),
            "expected InvalidPath for {:?}, got {:?}",
            path,
            result
        );
    }
}

#[test]
fn test_rejection_happens_before_filesystem_access() {
    // Bases that do not exist anywhere; a filesystem touch would error
    // differently, so InvalidPath proves the check is purely lexical.
    let resolver = Resolver::new(StorageLayout::new(
        "/nonexistent-qqq/homes",
        "/nonexistent-qqq/shared",
    ));
    assert!(matches!(
        resolver.resolve("/home/a/../../b", Some(&alice())),
        Err(VfsError::InvalidPath(_))
    ));
}

// =============================================================================
// Strict-descendant property
// =============================================================================

#[test]
fn test_resolved_paths_are_strict_descendants() {
    let resolver = fixed_resolver();
    let inputs = [
        ("/home/docs/report.txt", "/srv/homes/alice"),
        ("/HOME/./docs//x", "/srv/homes/alice"),
        ("/shared/team/minutes.md", "/srv/shared"),
        ("/SHARED/team/sub/dir/file", "/srv/shared"),
    ];

    for (input, base) in inputs {
        let resolved = resolver.resolve(input, Some(&alice())).unwrap();
        let real = resolved.real_path.expect("writable input has a real path");
        assert!(
            real.starts_with(base) && real != Path::new(base),
            "{:?} resolved to {:?}, not a strict descendant of {:?}",
            input,
            real,
            base
        );
    }
}

#[test]
fn test_each_path_maps_to_exactly_one_root() {
    let resolver = fixed_resolver();

    let home = resolver.resolve("/home/x", Some(&alice())).unwrap();
    assert!(matches!(home.root, StorageRoot::Home { .. }));

    let drive = resolver.resolve("/shared/team/x", None).unwrap();
    assert_eq!(drive.root, StorageRoot::SharedDrive { drive: "team".into() });

    let shared = resolver.resolve("/shared", None).unwrap();
    assert_eq!(shared.root, StorageRoot::SharedRoot);

    let root = resolver.resolve("/", None).unwrap();
    assert_eq!(root.root, StorageRoot::Root);
}

// =============================================================================
// Symlink containment
// =============================================================================

#[cfg(unix)]
#[test]
fn test_symlink_escape_is_rejected() {
    let temp = TempDir::new().unwrap();
    let homes = temp.path().join("homes");
    let outside = temp.path().join("outside");
    fs::create_dir_all(homes.join("alice")).unwrap();
    fs::create_dir_all(&outside).unwrap();
    std::os::unix::fs::symlink(&outside, homes.join("alice/escape")).unwrap();

    let resolver = Resolver::new(StorageLayout::new(&homes, temp.path().join("shared")));
    let result = resolver.resolve("/home/escape/secret.txt", Some(&alice()));
    assert!(
        matches!(result, Err(VfsError::InvalidPath(_))),
        "symlink out of the home base must not resolve, got {:?}",
        result
    );
}

#[cfg(unix)]
#[test]
fn test_internal_symlink_still_resolves() {
    let temp = TempDir::new().unwrap();
    let homes = temp.path().join("homes");
    fs::create_dir_all(homes.join("alice/real")).unwrap();
    std::os::unix::fs::symlink(homes.join("alice/real"), homes.join("alice/alias")).unwrap();

    let resolver = Resolver::new(StorageLayout::new(&homes, temp.path().join("shared")));
    let resolved = resolver.resolve("/home/alias/file.txt", Some(&alice()));
    assert!(resolved.is_ok(), "in-base symlink should resolve: {:?}", resolved);
}
