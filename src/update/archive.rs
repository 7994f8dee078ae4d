//! Archive extraction and the selective clean that precedes it.

use crate::error::UpdateError;
use std::fs;
use std::path::Path;

/// Extract a zip archive into `dest`, creating directories as needed.
///
/// Entries whose names would escape the destination root are rejected
/// outright rather than skipped, so a hostile archive fails the whole apply.
pub fn extract(archive_path: &Path, dest: &Path) -> Result<(), UpdateError> {
    let file = fs::File::open(archive_path)
        .map_err(|e| UpdateError::Extract(format!("{}: {e}", archive_path.display())))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| UpdateError::Extract(e.to_string()))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| UpdateError::Extract(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(UpdateError::UnsafeEntry(entry.name().to_owned()));
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
    }

    Ok(())
}

/// Delete a directory's contents except every path matching the preserve
/// list.
///
/// Each node's path relative to the root is compared against the list: an
/// exact match survives, a directory that is a strict ancestor of a
/// preserved path is recursed into instead of being deleted wholesale, and
/// everything else goes.
pub fn clean_tree_except(root: &Path, preserve: &[String]) -> Result<(), UpdateError> {
    if !root.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        let is_dir = entry.file_type()?.is_dir();

        if preserve.iter().any(|p| p == &name) {
            continue;
        }

        let prefix = format!("{name}/");
        let nested: Vec<String> = preserve
            .iter()
            .filter_map(|p| p.strip_prefix(&prefix))
            .map(str::to_owned)
            .collect();

        if is_dir && !nested.is_empty() {
            clean_tree_except(&path, &nested)?;
        } else if is_dir {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    Ok(())
}
