//! Temporary local copies of remote sources.
//!
//! A [`StagedFile`] owns one uniquely named file in the staging directory.
//! The file is removed when the guard is dropped, so every exit path of an
//! analysis (success, error, or unwind) leaves nothing behind.

use std::io;
use std::path::Path;

use chrono::Utc;
use tempfile::TempPath;

/// Exclusive owner of a temporary file.
#[derive(Debug)]
#[must_use = "dropping a StagedFile deletes it"]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    /// Create an empty, uniquely named file in `dir` ending in `_{basename}`.
    ///
    /// The name starts with a millisecond timestamp followed by a random
    /// component, so concurrent requests sharing `dir` never collide. The
    /// transfer overwrites the empty file.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created in `dir`.
    pub fn allocate(dir: &Path, basename: &str) -> io::Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(&format!("{}_", Utc::now().format("%Y%m%dT%H%M%S%3f")))
            .suffix(&format!("_{basename}"))
            .tempfile_in(dir)?
            .into_temp_path();
        log::debug!("Staged {}", path.display());
        Ok(Self { path })
    }

    /// The owned path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now, reporting any error instead of ignoring it.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the removal.
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}
