//! Bundled profile archive extraction.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::FlowError;

/// Result of [`ProfileStore::restore_from_archive`](super::ProfileStore::restore_from_archive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    NoArchive,
    AlreadyPresent,
    Restored { entries: usize },
    Failed(String),
}

/// Unpack a `.tar.gz` into `target`, all or nothing.
///
/// The archive is unpacked into a staging sibling of `target`. A single
/// top-level directory in the archive is flattened away. `target` is only
/// replaced once unpacking succeeded.
pub(super) fn extract_into(archive: &Path, target: &Path) -> Result<usize, FlowError> {
    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("profile");
    let staging = parent.join(format!(".{}.staging", name));

    fs::create_dir_all(&parent)?;
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let result = unpack(archive, &staging).and_then(|()| install(&staging, target));
    if staging.exists() {
        let _ = fs::remove_dir_all(&staging);
    }
    result?;

    Ok(fs::read_dir(target)?.count())
}

fn unpack(archive: &Path, dest: &Path) -> Result<(), FlowError> {
    let file = File::open(archive)?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive
        .unpack(dest)
        .map_err(|e| FlowError::Archive(format!("Failed to extract archive: {}", e)))
}

/// Move the unpacked tree from `staging` to `target`.
fn install(staging: &Path, target: &Path) -> Result<(), FlowError> {
    let entries: Vec<PathBuf> = fs::read_dir(staging)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();

    if entries.is_empty() {
        return Err(FlowError::Archive("archive is empty".to_string()));
    }

    let root = match entries.as_slice() {
        [only] if only.is_dir() => only.clone(),
        _ => staging.to_path_buf(),
    };

    // An empty leftover directory does not count as a profile.
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::rename(&root, target)?;
    Ok(())
}
