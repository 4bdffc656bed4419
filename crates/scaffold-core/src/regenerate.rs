//! Namespace-wide regeneration of accessors
//!
//! The scanner parses every class file under a namespace directory;
//! the regenerator rebuilds the relation graph from their mapping tags and
//! re-emits boilerplate for each file. Failures are per file: one broken
//! class never aborts the batch.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use scaffold_relation::{CodeEmitter, RelationGraph, TagRenderer};
use scaffold_source::{parse, Change, ClassFile, Mutator, ParseError, ParseMode};
use serde::Serialize;

use crate::error::{FsError, ScaffoldError};
use crate::fs::Filesystem;
use crate::layout::ProjectLayout;

/// Result of scanning one file
#[derive(Debug)]
pub struct ScannedFile {
    /// Project-relative path
    pub path: PathBuf,
    /// Parsed file, or why it could not be parsed
    pub parsed: Result<ClassFile, ScanFailure>,
}

/// Why a scanned file is unusable
#[derive(Debug, thiserror::Error)]
pub enum ScanFailure {
    /// Not readable
    #[error(transparent)]
    Read(#[from] FsError),

    /// Strict parse failed and the lenient retry was not allowed
    #[error("{0} (rerun with overwrite to attempt a best-effort parse)")]
    Strict(ParseError),

    /// Lenient parse failed too
    #[error("{0}")]
    Lenient(ParseError),
}

/// Parses every class file under a namespace
pub struct RegenerationScanner<'a> {
    fs: &'a dyn Filesystem,
    layout: &'a ProjectLayout,
    lenient_retry: bool,
}

impl<'a> RegenerationScanner<'a> {
    /// Create scanner that never falls back to the lenient parse
    #[must_use]
    pub fn new(fs: &'a dyn Filesystem, layout: &'a ProjectLayout) -> Self {
        Self {
            fs,
            layout,
            lenient_retry: false,
        }
    }

    /// Retry files that fail the strict parse with the lenient one
    #[must_use]
    pub fn with_lenient_retry(mut self, retry: bool) -> Self {
        self.lenient_retry = retry;
        self
    }

    /// Directory a namespace maps to
    ///
    /// # Errors
    /// Returns [`ScaffoldError::InvalidInput`] for an unmapped namespace.
    pub fn directory(&self, namespace: &str) -> Result<PathBuf, ScaffoldError> {
        self.layout.namespace_dir(namespace).ok_or_else(|| {
            ScaffoldError::invalid(format!("no autoload directory maps namespace '{namespace}'"))
        })
    }

    /// Scan all `.php` files of a namespace, sorted by path
    ///
    /// # Errors
    /// Returns an error only when the namespace directory cannot be listed.
    pub fn scan(&self, namespace: &str) -> Result<Vec<ScannedFile>, ScaffoldError> {
        let dir = self.directory(namespace)?;
        let paths = self.fs.list_files(&dir, "php")?;
        tracing::debug!(dir = %dir.display(), files = paths.len(), "scanning namespace");
        Ok(paths
            .into_iter()
            .map(|path| {
                let parsed = self.parse_file(&path);
                ScannedFile { path, parsed }
            })
            .collect())
    }

    fn parse_file(&self, path: &Path) -> Result<ClassFile, ScanFailure> {
        let text = self.fs.read(path)?;
        match parse(&text, path, ParseMode::Strict) {
            Ok(file) => Ok(file),
            Err(strict) if !self.lenient_retry => Err(ScanFailure::Strict(strict)),
            Err(strict) => {
                tracing::debug!(path = %path.display(), error = %strict, "strict parse failed; retrying leniently");
                parse(&text, path, ParseMode::Lenient).map_err(ScanFailure::Lenient)
            }
        }
    }
}

/// Outcome of regenerating one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Text changed and was written
    Updated,
    /// Nothing to do
    Unchanged,
    /// Not parsed; left alone
    Skipped,
    /// Could not be processed
    Failed,
}

/// Per-file entry of a [`BatchReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Project-relative path
    pub path: PathBuf,
    /// Outcome
    pub status: FileStatus,
    /// Why the file was skipped or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Changes applied or skipped
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
}

/// Outcome of a regeneration run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// One entry per scanned file, sorted by path
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Number of files with `status`
    #[must_use]
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// Entry for a path
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&FileReport> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Whether no file failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.count(FileStatus::Failed) == 0
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            let status = match file.status {
                FileStatus::Updated => "updated",
                FileStatus::Unchanged => "unchanged",
                FileStatus::Skipped => "skipped",
                FileStatus::Failed => "failed",
            };
            write!(f, "{status}: {}", file.path.display())?;
            if let Some(message) = &file.message {
                write!(f, " ({message})")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Regenerates accessors for every class of a namespace
pub struct Regenerator<'a> {
    fs: &'a dyn Filesystem,
    layout: &'a ProjectLayout,
    renderer: &'a dyn TagRenderer,
    overwrite: bool,
}

impl<'a> Regenerator<'a> {
    /// Create regenerator that keeps existing methods
    #[must_use]
    pub fn new(fs: &'a dyn Filesystem, layout: &'a ProjectLayout, renderer: &'a dyn TagRenderer) -> Self {
        Self {
            fs,
            layout,
            renderer,
            overwrite: false,
        }
    }

    /// Replace existing accessors, retrying unparseable files leniently
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Regenerate a namespace (the entity namespace when `None`)
    ///
    /// # Errors
    /// Returns an error only when the namespace cannot be scanned at all;
    /// per-file problems are reported in the [`BatchReport`].
    pub fn run(&self, namespace: Option<&str>) -> Result<BatchReport, ScaffoldError> {
        let namespace = namespace.map_or_else(|| self.layout.config().entity_namespace_fqn(), str::to_string);
        let scanned = RegenerationScanner::new(self.fs, self.layout)
            .with_lenient_retry(self.overwrite)
            .scan(&namespace)?;

        let parsed: Vec<&ClassFile> = scanned.iter().filter_map(|s| s.parsed.as_ref().ok()).collect();
        let graph = RelationGraph::from_files(parsed.iter().copied(), self.renderer);
        for relation in graph.dangling() {
            tracing::debug!(class = %relation.class, field = %relation.field, "counterpart not found; no sync");
        }

        let mut report = BatchReport::default();
        for scanned_file in &scanned {
            let path = scanned_file.path.clone();
            let entry = match &scanned_file.parsed {
                Ok(file) => self.regenerate(file.clone(), &graph),
                Err(failure) => {
                    let status = match failure {
                        ScanFailure::Strict(_) => FileStatus::Skipped,
                        ScanFailure::Read(_) | ScanFailure::Lenient(_) => FileStatus::Failed,
                    };
                    tracing::warn!(path = %path.display(), error = %failure, "not regenerated");
                    Err((status, failure.to_string()))
                }
            };
            report.files.push(match entry {
                Ok((status, changes)) => FileReport {
                    path,
                    status,
                    message: None,
                    changes,
                },
                Err((status, message)) => FileReport {
                    path,
                    status,
                    message: Some(message),
                    changes: Vec::new(),
                },
            });
        }

        tracing::info!(
            namespace = %namespace,
            updated = report.count(FileStatus::Updated),
            unchanged = report.count(FileStatus::Unchanged),
            skipped = report.count(FileStatus::Skipped),
            failed = report.count(FileStatus::Failed),
            "regeneration finished"
        );
        Ok(report)
    }

    fn regenerate(&self, mut file: ClassFile, graph: &RelationGraph) -> Result<(FileStatus, Vec<Change>), (FileStatus, String)> {
        let failed = |e: &dyn std::error::Error| (FileStatus::Failed, e.to_string());
        let path = file.path().to_path_buf();
        if !self.layout.is_editable(&path) {
            return Err((FileStatus::Skipped, "outside the editable source root".to_string()));
        }
        let ops = CodeEmitter::new(self.renderer)
            .with_overwrite(self.overwrite)
            .regenerate_file(&file, graph)
            .map_err(|e| failed(&e))?;
        let before = file.source().to_string();
        let report = Mutator::new()
            .with_overwrite(self.overwrite)
            .apply_all(&mut file, ops)
            .map_err(|e| failed(&e))?;
        if file.source() == before {
            return Ok((FileStatus::Unchanged, report.changes));
        }
        self.fs
            .write(&path, &file.serialize())
            .map_err(|e| failed(&e))?;
        tracing::info!(path = %path.display(), "regenerated file");
        Ok((FileStatus::Updated, report.changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_and_display() {
        let report = BatchReport {
            files: vec![
                FileReport {
                    path: PathBuf::from("src/Entity/A.php"),
                    status: FileStatus::Updated,
                    message: None,
                    changes: Vec::new(),
                },
                FileReport {
                    path: PathBuf::from("src/Entity/B.php"),
                    status: FileStatus::Skipped,
                    message: Some("syntax error".into()),
                    changes: Vec::new(),
                },
            ],
        };
        assert_eq!(report.count(FileStatus::Updated), 1);
        assert!(report.is_success());
        assert_eq!(
            report.to_string(),
            "updated: src/Entity/A.php\nskipped: src/Entity/B.php (syntax error)\n"
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&FileStatus::Unchanged).unwrap();
        assert_eq!(json, "\"unchanged\"");
    }
}
