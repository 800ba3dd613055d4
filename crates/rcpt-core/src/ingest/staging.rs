//! Scoped on-disk staging for uploaded files.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::trace;

/// An upload written to a private temporary directory.
///
/// The directory and everything in it is removed when the value is dropped,
/// on success and on every error path alike.
pub struct StagedUpload {
    dir: TempDir,
    path: PathBuf,
}

impl StagedUpload {
    /// Write `bytes` to a fresh temporary directory.
    pub fn write(file_name: &str, bytes: &[u8]) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("rcpt-").tempdir()?;
        let path = dir.path().join(sanitize_file_name(file_name));
        fs::write(&path, bytes)?;
        trace!("Staged {} bytes at {}", bytes.len(), path.display());
        Ok(Self { dir, path })
    }

    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the staged file.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Keep only the final path component so an upload cannot escape the
/// staging directory.
fn sanitize_file_name(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if name.is_empty() || name == ".." {
        "upload".to_string()
    } else {
        name.to_string()
    }
}
