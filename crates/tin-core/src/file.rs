//! File I/O — newline-stripped load and atomic, permission-preserving save.
//!
//! Loading splits the file into rows with their line endings removed (both
//! `\n` and `\r\n` forms); the buffer re-joins rows with `\n` on save, so
//! a file saved untouched round-trips except for `\r\n` normalization.
//!
//! Saving never writes the target in place. The content goes to a
//! temporary file **in the target's directory** (same filesystem, so the
//! final rename is atomic), gets synced, and is renamed over the target.
//! When the target pre-existed, its mode, owner, and group are reapplied
//! to the new inode; when the target is a symbolic link, the write aims
//! at the link's real destination so the link itself survives.
//!
//! Every save failure is recoverable from the editor's point of view: the
//! error is shown in the status bar, the dirty counter stays put, and the
//! user retries.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// A save failure, tagged with the stage that failed. The display text is
/// what lands in the status bar.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Reading the pre-existing target's metadata failed.
    #[error("stat error: {0}")]
    Stat(#[source] io::Error),
    /// Resolving a symbolic link to its real destination failed.
    #[error("readlink error: {0}")]
    Resolve(#[source] io::Error),
    /// Creating or writing the temporary file failed.
    #[error("write error: {0}")]
    Write(#[source] io::Error),
    /// Renaming the temporary file over the target failed.
    #[error("save error: {0}")]
    Rename(#[source] io::Error),
    /// Reapplying the original mode/owner/group failed.
    #[error("permissions error: {0}")]
    Restore(#[source] io::Error),
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read a file as an ordered sequence of newline-stripped rows.
///
/// # Errors
///
/// Returns the underlying I/O error; a `NotFound` is how the editor
/// detects "new file" and starts with an empty buffer.
pub fn load(path: &Path) -> io::Result<Vec<Vec<u8>>> {
    let bytes = fs::read(path)?;
    Ok(split_lines(&bytes))
}

/// Split file content on `\n`, stripping any trailing `\r` from each row.
/// A trailing newline does not produce a final empty row.
fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    if bytes.is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<Vec<u8>> = bytes
        .split(|&b| b == b'\n')
        .map(|line| {
            let mut line = line.to_vec();
            while line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
        .collect();

    if bytes.ends_with(b"\n") {
        lines.pop();
    }
    lines
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

/// Atomically write `content` to `path`, preserving the pre-existing
/// file's mode, owner, and group, and following a symlink to its real
/// destination. Returns the number of bytes written.
///
/// # Errors
///
/// Returns a [`SaveError`] naming the stage that failed; nothing at the
/// target path has been disturbed unless the rename stage was reached.
pub fn save(path: &Path, content: &[u8]) -> Result<usize, SaveError> {
    // Metadata of the current target (through symlinks), if it exists.
    let existing = match fs::metadata(path) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(SaveError::Stat(e)),
    };

    // A symlink target means the rename must aim at the destination —
    // renaming over the link itself would replace the link with a file.
    let target: PathBuf = if fs::symlink_metadata(path)
        .is_ok_and(|m| m.file_type().is_symlink())
    {
        fs::canonicalize(path).map_err(SaveError::Resolve)?
    } else {
        path.to_path_buf()
    };

    // Temp file in the target's directory keeps the rename on one
    // filesystem.
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(SaveError::Write)?;
    tmp.write_all(content).map_err(SaveError::Write)?;
    tmp.as_file().sync_all().map_err(SaveError::Write)?;

    let file = tmp.persist(&target).map_err(|e| SaveError::Rename(e.error))?;

    restore_permissions(&file, existing.as_ref())?;
    Ok(content.len())
}

/// Reapply mode/owner/group from the pre-existing target, or give a
/// brand-new file the conventional 0644 instead of the temp file's 0600.
#[cfg(unix)]
#[allow(unsafe_code)] // fchmod/fchown have no std equivalent for owner/group.
fn restore_permissions(
    file: &fs::File,
    existing: Option<&fs::Metadata>,
) -> Result<(), SaveError> {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    match existing {
        Some(meta) => {
            #[allow(clippy::cast_possible_truncation)] // mode_t is u16 on some unices.
            let mode = meta.mode() as libc::mode_t;
            let rc = unsafe { libc::fchmod(fd, mode) };
            if rc != 0 {
                return Err(SaveError::Restore(io::Error::last_os_error()));
            }
            let rc = unsafe { libc::fchown(fd, meta.uid(), meta.gid()) };
            if rc != 0 {
                return Err(SaveError::Restore(io::Error::last_os_error()));
            }
        }
        None => {
            file.set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(SaveError::Restore)?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn restore_permissions(
    _file: &fs::File,
    _existing: Option<&fs::Metadata>,
) -> Result<(), SaveError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn lines(rows: &[&str]) -> Vec<Vec<u8>> {
        rows.iter().map(|r| r.as_bytes().to_vec()).collect()
    }

    // -- split_lines --------------------------------------------------------

    #[test]
    fn split_plain_lines() {
        assert_eq!(split_lines(b"a\nb"), lines(&["a", "b"]));
    }

    #[test]
    fn split_trailing_newline_adds_no_row() {
        assert_eq!(split_lines(b"a\nb\n"), lines(&["a", "b"]));
    }

    #[test]
    fn split_crlf_lines() {
        assert_eq!(split_lines(b"a\r\nb\r\n"), lines(&["a", "b"]));
    }

    #[test]
    fn split_empty_file() {
        assert_eq!(split_lines(b""), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn split_keeps_interior_empty_lines() {
        assert_eq!(split_lines(b"a\n\nb"), lines(&["a", "", "b"]));
    }

    #[test]
    fn split_lone_newline_is_one_empty_row() {
        assert_eq!(split_lines(b"\n"), lines(&[""]));
    }

    // -- load ---------------------------------------------------------------

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = load(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn load_round_trips_saved_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        save(&path, b"one\ntwo\nthree").unwrap();
        assert_eq!(load(&path).unwrap(), lines(&["one", "two", "three"]));
    }

    // -- save ---------------------------------------------------------------

    #[test]
    fn save_writes_exact_bytes_no_trailing_newline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        let n = save(&path, b"a\nb").unwrap();
        assert_eq!(n, 3);
        assert_eq!(fs::read(&path).unwrap(), b"a\nb");
    }

    #[test]
    fn save_replaces_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, "old content").unwrap();
        save(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn save_fresh_file_gets_conventional_mode() {
        use std::os::unix::fs::MetadataExt;
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        save(&path, b"x").unwrap();
        assert_eq!(fs::metadata(&path).unwrap().mode() & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn save_preserves_existing_mode_and_ownership() {
        use std::os::unix::fs::{MetadataExt, PermissionsExt};
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        let before = fs::metadata(&path).unwrap();

        save(&path, b"new").unwrap();

        let after = fs::metadata(&path).unwrap();
        assert_eq!(after.mode() & 0o777, 0o640);
        assert_eq!(after.uid(), before.uid());
        assert_eq!(after.gid(), before.gid());
    }

    #[cfg(unix)]
    #[test]
    fn save_through_symlink_keeps_the_link() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("link");
        fs::write(&real, "old").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        save(&link, b"updated").unwrap();

        assert!(fs::symlink_metadata(&link)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(fs::read(&real).unwrap(), b"updated");
    }

    #[test]
    fn save_into_missing_directory_fails_at_write_stage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no/such/dir/f");
        let err = save(&path, b"x").unwrap_err();
        assert!(matches!(err, SaveError::Write(_)));
        assert!(err.to_string().starts_with("write error"));
    }

    #[test]
    fn save_error_messages_name_the_stage() {
        let stat = SaveError::Stat(io::Error::new(io::ErrorKind::PermissionDenied, "no"));
        assert!(stat.to_string().starts_with("stat error"));
        let rename = SaveError::Rename(io::Error::other("no"));
        assert!(rename.to_string().starts_with("save error"));
    }
}
