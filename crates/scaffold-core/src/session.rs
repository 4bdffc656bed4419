//! All-or-nothing editing of a set of class files
//!
//! A [`Session`] reads each file once, applies every operation in memory
//! and writes the files whose text changed in one staged batch on
//! [`Session::commit`]. Dropping a session discards all changes.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use scaffold_source::{parse, ClassFile, MutationOp, MutationReport, Mutator, ParseMode};
use serde::Serialize;

use crate::error::ScaffoldError;
use crate::fs::Filesystem;
use crate::template::TemplateRenderer;

/// How a committed file changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    /// File did not exist
    Created,
    /// Existing file was rewritten
    Updated,
}

/// A file written by a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    /// Project-relative path
    pub path: PathBuf,
    /// Created or updated
    pub kind: WriteKind,
}

impl Display for WrittenFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let verb = match self.kind {
            WriteKind::Created => "created",
            WriteKind::Updated => "updated",
        };
        write!(f, "{verb}: {}", self.path.display())
    }
}

#[derive(Debug)]
struct StagedFile {
    file: ClassFile,
    original: Option<String>,
    report: MutationReport,
}

impl StagedFile {
    fn is_dirty(&self) -> bool {
        self.original.as_deref() != Some(self.file.source())
    }
}

/// Staged edits of one request
pub struct Session<'a> {
    fs: &'a dyn Filesystem,
    templates: &'a dyn TemplateRenderer,
    mutator: Mutator,
    files: IndexMap<PathBuf, StagedFile>,
}

impl<'a> Session<'a> {
    /// Create session that skips existing declarations
    #[must_use]
    pub fn new(fs: &'a dyn Filesystem, templates: &'a dyn TemplateRenderer) -> Self {
        Self {
            fs,
            templates,
            mutator: Mutator::new(),
            files: IndexMap::new(),
        }
    }

    /// Replace existing declarations instead of skipping them
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.mutator = self.mutator.with_overwrite(overwrite);
        self
    }

    /// Stage an existing file
    ///
    /// # Errors
    /// Returns [`ScaffoldError::Fs`] when the file cannot be read and
    /// [`ScaffoldError::Parse`] when it does not parse.
    pub fn load(&mut self, path: &Path) -> Result<&ClassFile, ScaffoldError> {
        if !self.files.contains_key(path) {
            let text = self.fs.read(path)?;
            let file = parse(&text, path, ParseMode::Strict).map_err(|e| ScaffoldError::parse(path, e))?;
            tracing::debug!(path = %path.display(), "staged file");
            self.stage(path, file, Some(text));
        }
        self.staged(path)
    }

    /// Stage a file, rendering a skeleton for `fqn` when it does not exist
    ///
    /// # Errors
    /// See [`Session::load`].
    pub fn load_or_create(&mut self, path: &Path, fqn: &str) -> Result<&ClassFile, ScaffoldError> {
        if self.files.contains_key(path) || self.fs.exists(path) {
            return self.load(path);
        }
        let text = self.templates.render_class(fqn);
        let file = parse(&text, path, ParseMode::Strict).map_err(|e| ScaffoldError::parse(path, e))?;
        tracing::debug!(path = %path.display(), class = fqn, "staged new file");
        self.stage(path, file, None);
        self.staged(path)
    }

    fn stage(&mut self, path: &Path, file: ClassFile, original: Option<String>) {
        self.files.insert(
            path.to_path_buf(),
            StagedFile {
                file,
                original,
                report: MutationReport::default(),
            },
        );
    }

    fn staged(&self, path: &Path) -> Result<&ClassFile, ScaffoldError> {
        self.file(path)
            .ok_or_else(|| ScaffoldError::invalid(format!("{} is not staged", path.display())))
    }

    /// A staged file
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&ClassFile> {
        self.files.get(path).map(|s| &s.file)
    }

    /// Whether a staged file is new
    #[must_use]
    pub fn is_new(&self, path: &Path) -> bool {
        self.files.get(path).is_some_and(|s| s.original.is_none())
    }

    /// Apply operations to a staged file, loading it first when needed
    ///
    /// # Errors
    /// Returns [`ScaffoldError::Mutation`] on a non-recoverable edit
    /// failure; the session should then be dropped.
    pub fn apply(&mut self, path: &Path, ops: Vec<MutationOp>) -> Result<MutationReport, ScaffoldError> {
        self.load(path)?;
        let staged = self
            .files
            .get_mut(path)
            .ok_or_else(|| ScaffoldError::invalid(format!("{} is not staged", path.display())))?;
        let report = self
            .mutator
            .apply_all(&mut staged.file, ops)
            .map_err(|e| ScaffoldError::mutation(path, e))?;
        staged.report.changes.extend(report.changes.iter().cloned());
        Ok(report)
    }

    /// Accumulated report of a staged file
    #[must_use]
    pub fn report(&self, path: &Path) -> Option<&MutationReport> {
        self.files.get(path).map(|s| &s.report)
    }

    /// Files that would be written, in staging order
    #[must_use]
    pub fn pending(&self) -> Vec<WrittenFile> {
        self.files
            .iter()
            .filter(|(_, s)| s.is_dirty())
            .map(|(path, s)| WrittenFile {
                path: path.clone(),
                kind: if s.original.is_some() {
                    WriteKind::Updated
                } else {
                    WriteKind::Created
                },
            })
            .collect()
    }

    /// Write every changed file
    ///
    /// # Errors
    /// Returns [`ScaffoldError::Fs`] when staging or replacing fails.
    pub fn commit(self) -> Result<Vec<WrittenFile>, ScaffoldError> {
        let written = self.pending();
        let batch: Vec<(PathBuf, String)> = written
            .iter()
            .filter_map(|w| {
                self.files
                    .get(&w.path)
                    .map(|s| (w.path.clone(), s.file.serialize()))
            })
            .collect();
        self.fs.write_batch(&batch)?;
        for file in &written {
            tracing::info!(path = %file.path.display(), kind = ?file.kind, "wrote file");
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFilesystem;
    use crate::template::EntitySkeleton;
    use scaffold_source::PropertySpec;
    use tempfile::TempDir;

    #[test]
    fn untouched_files_are_not_written() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        let path = Path::new("src/Entity/User.php");
        fs.write(path, &EntitySkeleton.render_class("App\\Entity\\User")).unwrap();

        let mut session = Session::new(&fs, &EntitySkeleton);
        session.load(path).unwrap();
        assert!(session.pending().is_empty());
        assert!(session.commit().unwrap().is_empty());
    }

    #[test]
    fn new_file_is_created_on_commit() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        let path = Path::new("src/Entity/Course.php");

        let mut session = Session::new(&fs, &EntitySkeleton);
        session.load_or_create(path, "App\\Entity\\Course").unwrap();
        assert!(session.is_new(path));
        let written = session.commit().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].to_string(), "created: src/Entity/Course.php");
        assert!(fs.exists(path));
    }

    #[test]
    fn dropped_session_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem::new(dir.path());
        let path = Path::new("src/Entity/User.php");
        let original = EntitySkeleton.render_class("App\\Entity\\User");
        fs.write(path, &original).unwrap();

        {
            let mut session = Session::new(&fs, &EntitySkeleton);
            session
                .apply(path, vec![MutationOp::AddProperty(PropertySpec::new("name").with_type("?string"))])
                .unwrap();
            assert_eq!(session.pending().len(), 1);
        }
        assert_eq!(fs.read(path).unwrap(), original);
    }
}
