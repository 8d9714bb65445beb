//! # Filename Rules
//!
//! Declared filenames are attacker-controlled. Validation runs before any
//! bytes are accepted; the duplicate-name suffix search runs at
//! reconciliation and is deterministic for a given base name and set of
//! existing files.

use std::path::Path;

use chrono::Utc;

use crate::config::UploadPolicy;

use super::errors::{UploadError, UploadResult};

/// Validate a declared filename against the upload policy.
pub fn validate_filename(name: &str, policy: &UploadPolicy) -> UploadResult<()> {
    if name.is_empty() {
        return Err(UploadError::InvalidFilename("empty filename".into()));
    }
    if name.len() > policy.max_filename_len {
        return Err(UploadError::InvalidFilename(format!(
            "filename exceeds {} bytes",
            policy.max_filename_len
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(UploadError::InvalidFilename(
            "filename contains a path separator".into(),
        ));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(UploadError::InvalidFilename(
            "filename contains control characters".into(),
        ));
    }
    if name.starts_with('.') {
        return Err(UploadError::InvalidFilename(
            "hidden filenames are not accepted".into(),
        ));
    }

    if let Some(extension) = extension_of(name) {
        if policy.is_extension_denied(extension) {
            return Err(UploadError::ExtensionDenied(extension.to_ascii_lowercase()));
        }
    }

    Ok(())
}

/// Extension after the last dot, if any.
pub fn extension_of(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// First free name for `name` inside `dir`.
///
/// Tries `stem (1).ext` through `stem (limit).ext` in order, so the result
/// is deterministic for a given existing-file set; beyond the bound it
/// falls back to a `stem_<unix-millis>.ext` timestamp name.
pub fn unique_name(dir: &Path, name: &str, limit: u32) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    for n in 1..=limit {
        let candidate = match extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        if !dir.join(&candidate).exists() {
            return candidate;
        }
    }

    let millis = Utc::now().timestamp_millis();
    match extension {
        Some(ext) => format!("{}_{}.{}", stem, millis, ext),
        None => format!("{}_{}", stem, millis),
    }
}
