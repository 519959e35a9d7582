//! Filesystem capability surface shared by both installers.
//!
//! Everything that touches disk goes through [`FileSystem`] so installers can
//! be exercised against a recording fake. [`deploy`] is the single write path
//! for destination files: create the parent directory, copy any existing
//! file aside to a timestamped backup, then replace the destination through a
//! temp file in the same directory.

use crate::error::{AirulesError, Result};
use crate::path_utils::{safe_parent_for_creation, with_appended_suffix};
use chrono::{DateTime, Local};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const BACKUP_SUFFIX: &str = ".backup_";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

pub trait FileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;
    /// Streams `contents` into a temp file next to `path`, then renames it into place.
    fn write_atomic(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn write_atomic(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64> {
        let dir = safe_parent_for_creation(path).unwrap_or(Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        let written = io::copy(contents, temp.as_file_mut())?;
        temp.as_file().sync_all()?;
        apply_destination_permissions(&temp, path)?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(written)
    }
}

// Temp files are created 0600; installed rule files should stay readable.
#[cfg(unix)]
fn apply_destination_permissions(temp: &NamedTempFile, path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = match fs::metadata(path) {
        Ok(metadata) => metadata.permissions(),
        Err(_) => fs::Permissions::from_mode(0o644),
    };
    temp.as_file().set_permissions(permissions)
}

#[cfg(not(unix))]
fn apply_destination_permissions(_temp: &NamedTempFile, _path: &Path) -> io::Result<()> {
    Ok(())
}

/// Outcome of writing one destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployed {
    pub destination: PathBuf,
    pub backup: Option<PathBuf>,
}

/// Picks `<dest>.backup_YYYYMMDDHHMMSS`, adding `_1`, `_2`, ... when that name is taken.
pub fn backup_path_for(fs: &dyn FileSystem, destination: &Path, now: DateTime<Local>) -> PathBuf {
    let stamp = now.format(BACKUP_TIMESTAMP_FORMAT);
    let base = with_appended_suffix(destination, &format!("{BACKUP_SUFFIX}{stamp}"));
    if !fs.exists(&base) {
        return base;
    }

    let mut attempt: u32 = 1;
    loop {
        let candidate = with_appended_suffix(&base, &format!("_{attempt}"));
        if !fs.exists(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

pub fn deploy(
    fs: &dyn FileSystem,
    destination: &Path,
    contents: &mut dyn Read,
) -> Result<Deployed> {
    if let Some(parent) = safe_parent_for_creation(destination) {
        fs.create_dir_all(parent)
            .map_err(|e| AirulesError::fs("create directory", parent, e))?;
    }

    let backup = if fs.exists(destination) {
        let backup = backup_path_for(fs, destination, Local::now());
        fs.copy(destination, &backup)
            .map_err(|e| AirulesError::fs("back up", destination, e))?;
        info!(
            destination = %destination.display(),
            backup = %backup.display(),
            "backed up existing rules file"
        );
        Some(backup)
    } else {
        None
    };

    let written = fs
        .write_atomic(destination, contents)
        .map_err(|e| AirulesError::fs("write", destination, e))?;
    debug!(destination = %destination.display(), bytes = written, "wrote rules file");

    Ok(Deployed {
        destination: destination.to_path_buf(),
        backup,
    })
}
