//! Durable file writes for the session file.
//!
//! A session file is replaced with write-to-temp, fsync, rename, fsync-dir so
//! a crash leaves either the previous file or the new one, never a torn mix.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Syncs a file's contents and metadata to disk.
pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so that renames and unlinks inside it are durable.
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

/// Atomically replaces `path` with `bytes`.
///
/// The parent directory is created if missing. The temp file is
/// `<path>.tmp`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(tmp_path)?;
        file.write_all(bytes)?;
        fsync_file(&file)?;
    }

    std::fs::rename(tmp_path, path)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fsync_dir(parent)?;
    }

    Ok(())
}

/// Removes `path`, treating a missing file as already removed.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => match fsync_dir(parent) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        write_atomic(&path, b"{}").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        assert!(!dir.path().join("nested").join("session.json.tmp").exists());
    }

    #[test]
    fn write_atomic_replaces_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn remove_if_exists_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        remove_if_exists(&path).unwrap();

        write_atomic(&path, b"x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn fsync_dir_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(fsync_dir(&dir.path().join("nope")).is_err());
    }
}
