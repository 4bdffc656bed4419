//! Filesystem access
//!
//! All paths are relative to the project root. [`LocalFilesystem`] writes
//! through temp files in the destination directory and renames them into
//! place, so a reader never sees a half-written class file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::error::FsError;

/// File access used by makers and sessions
pub trait Filesystem: Send + Sync {
    /// Read a text file
    ///
    /// # Errors
    /// Returns [`FsError::NotFound`] for a missing file.
    fn read(&self, path: &Path) -> Result<String, FsError>;

    /// Whether a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Files under `dir` with `extension`, recursively, sorted
    ///
    /// # Errors
    /// Returns [`FsError::NotFound`] when `dir` does not exist.
    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>, FsError>;

    /// Replace a file's contents, creating parent directories
    ///
    /// # Errors
    /// Returns [`FsError::Io`] when the file cannot be written.
    fn write(&self, path: &Path, contents: &str) -> Result<(), FsError>;

    /// Write several files as one unit
    ///
    /// # Errors
    /// Returns the first failure. The default writes files one by one;
    /// [`LocalFilesystem`] stages every file before replacing any and
    /// restores already replaced files when a later one cannot be written.
    fn write_batch(&self, files: &[(PathBuf, String)]) -> Result<(), FsError> {
        for (path, contents) in files {
            self.write(path, contents)?;
        }
        Ok(())
    }
}

/// Filesystem rooted at a project directory
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    /// Create filesystem rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn stage(&self, path: &Path, contents: &str) -> Result<NamedTempFile, FsError> {
        let target = self.resolve(path);
        let dir = target.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| FsError::io(&dir, e))?;
        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| FsError::io(&dir, e))?;
        temp.write_all(contents.as_bytes())
            .and_then(|()| temp.flush())
            .map_err(|e| FsError::io(path, e))?;
        Ok(temp)
    }

    fn replace(&self, temp: NamedTempFile, path: &Path) -> Result<(), FsError> {
        temp.persist(self.resolve(path))
            .map_err(|e| FsError::io(path, e.error))?;
        tracing::debug!(path = %path.display(), "replaced file");
        Ok(())
    }

    /// Put back the previous contents of replaced files, newest first
    fn roll_back(&self, replaced: Vec<(&Path, Option<Vec<u8>>)>) {
        for (path, previous) in replaced.into_iter().rev() {
            let target = self.resolve(path);
            let restored = match previous {
                Some(bytes) => fs::write(&target, bytes),
                None => fs::remove_file(&target),
            };
            match restored {
                Ok(()) => tracing::debug!(path = %path.display(), "rolled back file"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not roll back file"),
            }
        }
    }
}

impl Filesystem for LocalFilesystem {
    fn read(&self, path: &Path) -> Result<String, FsError> {
        fs::read_to_string(self.resolve(path)).map_err(|e| FsError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>, FsError> {
        let base = self.resolve(dir);
        if !base.is_dir() {
            return Err(FsError::NotFound(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                FsError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                files.push(relative.to_path_buf());
            }
        }
        files.sort();
        Ok(files)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        let temp = self.stage(path, contents)?;
        self.replace(temp, path)
    }

    fn write_batch(&self, files: &[(PathBuf, String)]) -> Result<(), FsError> {
        let mut staged = Vec::with_capacity(files.len());
        for (path, contents) in files {
            staged.push((self.stage(path, contents)?, path.as_path()));
        }
        let mut replaced: Vec<(&Path, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
        for (temp, path) in staged {
            let previous = fs::read(self.resolve(path)).ok();
            if let Err(err) = self.replace(temp, path) {
                self.roll_back(replaced);
                return Err(err);
            }
            replaced.push((path, previous));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        let path = Path::new("src/Entity/User.php");
        assert!(!fs.exists(path));
        fs.write(path, "<?php\n").unwrap();
        assert!(fs.exists(path));
        assert_eq!(fs.read(path).unwrap(), "<?php\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        assert!(matches!(
            fs.read(Path::new("src/Nope.php")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn list_is_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        fs.write_batch(&[
            (PathBuf::from("src/Entity/User.php"), "<?php\n".into()),
            (PathBuf::from("src/Entity/Friend/User.php"), "<?php\n".into()),
            (PathBuf::from("src/Entity/notes.txt"), "x".into()),
        ])
        .unwrap();
        let files = fs.list_files(Path::new("src/Entity"), "php").unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("src/Entity/Friend/User.php"),
                PathBuf::from("src/Entity/User.php"),
            ]
        );
        assert!(fs.list_files(Path::new("src/Missing"), "php").is_err());
    }

    #[test]
    fn failed_replace_restores_earlier_files() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        fs.write(Path::new("src/Entity/User.php"), "old").unwrap();
        std::fs::create_dir_all(dir.path().join("src/Entity/Blocked.php")).unwrap();

        let result = fs.write_batch(&[
            (PathBuf::from("src/Entity/User.php"), "new".into()),
            (PathBuf::from("src/Entity/Course.php"), "<?php\n".into()),
            (PathBuf::from("src/Entity/Blocked.php"), "<?php\n".into()),
        ]);

        assert!(result.is_err());
        assert_eq!(fs.read(Path::new("src/Entity/User.php")).unwrap(), "old");
        assert!(!fs.exists(Path::new("src/Entity/Course.php")));
        let names: Vec<_> = std::fs::read_dir(dir.path().join("src/Entity"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn no_temp_files_are_left_behind() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        fs.write(Path::new("a/B.php"), "one").unwrap();
        fs.write(Path::new("a/B.php"), "two").unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("a")).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(fs.read(Path::new("a/B.php")).unwrap(), "two");
    }
}
