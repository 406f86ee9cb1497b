use std::path::{Path, PathBuf};

use tracing::debug;

use crate::clips::types::identifier_for;
use crate::error::{CompositionError, Result};

/// List the source clips in a directory.
///
/// Only regular, non-hidden files are returned, sorted by identifier so
/// the program order never depends on the filesystem's listing order.
pub fn discover_clips<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(CompositionError::NoClipsFound {
            path: dir.display().to_string(),
        }
        .into());
    }

    let mut clips = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if !entry.file_type()?.is_file() {
            debug!("Skipping non-file entry {:?}", path);
            continue;
        }
        if identifier_for(&path).starts_with('.') {
            debug!("Skipping hidden file {:?}", path);
            continue;
        }
        clips.push(path);
    }

    if clips.is_empty() {
        return Err(CompositionError::NoClipsFound {
            path: dir.display().to_string(),
        }
        .into());
    }

    clips.sort_by_key(|path| identifier_for(path));
    Ok(clips)
}
