//! # Path Resolver
//!
//! Resolution is pure with respect to the filesystem except for the final
//! symlink containment check, which canonicalizes the deepest existing
//! ancestor of the candidate path. A symlink under a managed root that
//! points outside it would otherwise be a containment escape invisible to
//! lexical checks.

use std::path::{Path, PathBuf};

use crate::actor::Actor;
use crate::config::StorageLayout;

use super::errors::{VfsError, VfsResult};
use super::path::{canonical_form, normalize, StorageRoot};

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub root: StorageRoot,

    /// Contained absolute path; `None` only for the virtual root `/`,
    /// which maps to no single physical directory
    pub real_path: Option<PathBuf>,

    /// Normalized virtual form, e.g. `/home/docs/report.txt`
    pub canonical: String,
}

impl Resolved {
    /// The real path, or NotFound if this is the virtual root.
    pub fn require_real_path(&self) -> VfsResult<&Path> {
        self.real_path
            .as_deref()
            .ok_or_else(|| VfsError::NotFound(self.canonical.clone()))
    }
}

/// Maps virtual paths onto the configured storage bases.
#[derive(Debug, Clone)]
pub struct Resolver {
    layout: StorageLayout,
}

impl Resolver {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Resolve a virtual path for the given actor.
    ///
    /// The first segment selects the storage root (case-insensitively):
    /// `home` joins the rest under the actor's home base and requires an
    /// authenticated actor; `shared` treats the next segment as a drive
    /// name. Anything else is an unknown storage type.
    pub fn resolve(&self, virtual_path: &str, actor: Option<&Actor>) -> VfsResult<Resolved> {
        let mut segments = normalize(virtual_path)?;

        let Some(first) = segments.first() else {
            return Ok(Resolved {
                root: StorageRoot::Root,
                real_path: None,
                canonical: "/".to_string(),
            });
        };

        let root_segment = first.to_ascii_lowercase();
        segments[0] = root_segment.clone();
        let canonical = canonical_form(&segments);
        let rest = &segments[1..];

        match root_segment.as_str() {
            "home" => {
                let actor = actor.ok_or(VfsError::Unauthorized)?;
                check_segment_safe(&actor.username)?;

                let base = self.layout.user_home(&actor.username);
                let real = join_segments(&base, rest);
                verify_containment(&base, &real)?;

                Ok(Resolved {
                    root: StorageRoot::Home {
                        username: actor.username.clone(),
                    },
                    real_path: Some(real),
                    canonical,
                })
            }
            "shared" => match rest.split_first() {
                None => Ok(Resolved {
                    root: StorageRoot::SharedRoot,
                    real_path: Some(self.layout.shared_base.clone()),
                    canonical,
                }),
                Some((drive, remainder)) => {
                    let base = self.layout.drive_dir(drive);
                    let real = join_segments(&base, remainder);
                    verify_containment(&self.layout.shared_base, &real)?;

                    Ok(Resolved {
                        root: StorageRoot::SharedDrive {
                            drive: drive.clone(),
                        },
                        real_path: Some(real),
                        canonical,
                    })
                }
            },
            other => Err(VfsError::InvalidStorageType(other.to_string())),
        }
    }
}

fn join_segments(base: &Path, segments: &[String]) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path
}

/// Segments that came from normalize() are already clean; this guards
/// values injected from outside the path, like usernames.
fn check_segment_safe(segment: &str) -> VfsResult<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains('\0')
    {
        return Err(VfsError::InvalidPath(segment.to_string()));
    }
    Ok(())
}

/// Final containment assertion: the candidate must be a descendant of its
/// base both lexically and, where ancestors exist on disk, after symlink
/// resolution.
fn verify_containment(base: &Path, candidate: &Path) -> VfsResult<()> {
    if !candidate.starts_with(base) {
        return Err(VfsError::InvalidPath(candidate.display().to_string()));
    }

    let Ok(base_real) = base.canonicalize() else {
        // Base not created yet; nothing on disk to escape through.
        return Ok(());
    };

    let mut probe = candidate;
    let existing = loop {
        if probe.exists() {
            break Some(probe);
        }
        match probe.parent() {
            Some(parent) if parent.starts_with(base) => probe = parent,
            _ => break None,
        }
    };

    if let Some(existing) = existing {
        let real = existing
            .canonicalize()
            .map_err(|_| VfsError::InvalidPath(candidate.display().to_string()))?;
        if !real.starts_with(&base_real) {
            return Err(VfsError::InvalidPath(candidate.display().to_string()));
        }
    }

    Ok(())
}
