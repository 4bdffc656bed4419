//! Testing utilities for the scaffold workspace
//!
//! In-memory filesystem, class fixtures and a scenario harness that runs a
//! maker against a seeded project.

#![allow(missing_docs)]

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use scaffold_core::{
    Answer, AnswerQueue, BatchReport, EntityMaker, EntityReport, EntitySkeleton, Filesystem,
    FsError, LocalFilesystem, ProjectLayout, PromptKey, PromptRequest, Regenerator,
    ScaffoldConfig, ScaffoldError,
};
use scaffold_relation::{AttributeTagRenderer, Cardinality};
use tempfile::TempDir;

pub mod fixtures;

/// Filesystem backed by a map of path → text
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
    read_only: Mutex<BTreeSet<PathBuf>>,
    writes: Mutex<usize>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.lock().insert(path.into(), text.into());
        self
    }

    /// Make every write to `path` fail
    pub fn with_read_only(self, path: impl Into<PathBuf>) -> Self {
        self.read_only.lock().insert(path.into());
        self
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    /// Number of files written so far
    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }

    fn check_writable(&self, path: &Path) -> Result<(), FsError> {
        if self.read_only.lock().contains(path) {
            return Err(FsError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only file"),
            ));
        }
        Ok(())
    }
}

impl Filesystem for MemoryFilesystem {
    fn read(&self, path: &Path) -> Result<String, FsError> {
        self.get(path).ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>, FsError> {
        let files = self.files.lock();
        let under: Vec<&PathBuf> = files.keys().filter(|p| p.starts_with(dir)).collect();
        if under.is_empty() {
            return Err(FsError::NotFound(dir.to_path_buf()));
        }
        Ok(under
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == extension))
            .cloned()
            .collect())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        self.check_writable(path)?;
        self.files.lock().insert(path.to_path_buf(), contents.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }

    fn write_batch(&self, files: &[(PathBuf, String)]) -> Result<(), FsError> {
        for (path, _) in files {
            self.check_writable(path)?;
        }
        for (path, contents) in files {
            self.write(path, contents)?;
        }
        Ok(())
    }
}

/// Explicit switches for scenarios that cannot run everywhere
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    /// Run against a temporary directory instead of memory
    pub on_disk: bool,
    /// Scenario names to skip
    pub skip: BTreeSet<String>,
}

impl HarnessConfig {
    pub fn on_disk() -> Self {
        Self {
            on_disk: true,
            ..Self::default()
        }
    }

    pub fn skipping(mut self, name: impl Into<String>) -> Self {
        self.skip.insert(name.into());
        self
    }

    pub fn skips(&self, name: &str) -> bool {
        self.skip.contains(name)
    }
}

/// Project files a scenario ran against
pub enum Workspace {
    Memory(MemoryFilesystem),
    Disk { dir: TempDir, fs: LocalFilesystem },
}

impl Workspace {
    fn seed(harness: &HarnessConfig, files: &[(PathBuf, String)]) -> Self {
        if harness.on_disk {
            let dir = TempDir::new().expect("temp dir");
            let fs = LocalFilesystem::new(dir.path());
            for (path, text) in files {
                fs.write(path, text).expect("seed file");
            }
            Self::Disk { dir, fs }
        } else {
            let fs = files
                .iter()
                .fold(MemoryFilesystem::new(), |fs, (path, text)| fs.with_file(path, text.clone()));
            Self::Memory(fs)
        }
    }

    pub fn fs(&self) -> &dyn Filesystem {
        match self {
            Self::Memory(fs) => fs as &dyn Filesystem,
            Self::Disk { fs, .. } => fs as &dyn Filesystem,
        }
    }

    /// Text of a project file; panics when missing
    pub fn read(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        self.fs()
            .read(path)
            .unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.fs().exists(path.as_ref())
    }

    pub fn root(&self) -> Option<&Path> {
        match self {
            Self::Memory(_) => None,
            Self::Disk { dir, .. } => Some(dir.path()),
        }
    }
}

/// Result of running the entity maker
pub struct EntityOutcome {
    pub result: Result<EntityReport, ScaffoldError>,
    pub asked: Vec<PromptRequest>,
    pub unanswered: usize,
    pub workspace: Workspace,
}

impl EntityOutcome {
    /// Report of a successful run; panics otherwise
    pub fn report(&self) -> &EntityReport {
        match &self.result {
            Ok(report) => report,
            Err(e) => panic!("entity maker failed: {e}"),
        }
    }

    pub fn was_asked(&self, key: PromptKey) -> bool {
        self.asked.iter().any(|r| r.key == key)
    }

    /// Questions asked, in order
    pub fn questions(&self) -> Vec<&str> {
        self.asked.iter().map(|r| r.question.as_str()).collect()
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        self.workspace.read(path)
    }
}

/// Result of running the regenerator
pub struct RegenerateOutcome {
    pub result: Result<BatchReport, ScaffoldError>,
    pub workspace: Workspace,
}

impl RegenerateOutcome {
    pub fn report(&self) -> &BatchReport {
        match &self.result {
            Ok(report) => report,
            Err(e) => panic!("regeneration failed: {e}"),
        }
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        self.workspace.read(path)
    }
}

/// A seeded project plus scripted answers
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    config: ScaffoldConfig,
    files: Vec<(PathBuf, String)>,
    answers: Vec<Answer>,
    overwrite: bool,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ScaffoldConfig::default(),
            files: Vec::new(),
            answers: Vec::new(),
            overwrite: false,
        }
    }

    pub fn with_config(mut self, config: ScaffoldConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.push((path.into(), text.into()));
        self
    }

    pub fn with_overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    pub fn answer(mut self, answer: Answer) -> Self {
        self.answers.push(answer);
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.answer(Answer::Text(text.to_string()))
    }

    pub fn yes(self) -> Self {
        self.answer(Answer::Bool(true))
    }

    pub fn no(self) -> Self {
        self.answer(Answer::Bool(false))
    }

    /// Accept the default
    pub fn enter(self) -> Self {
        self.answer(Answer::Default)
    }

    pub fn cardinality(self, cardinality: Cardinality) -> Self {
        self.answer(Answer::Cardinality(cardinality))
    }

    /// Run the entity maker; `None` when the harness skips this scenario
    pub fn run_entity(&self, harness: &HarnessConfig) -> Option<EntityOutcome> {
        if harness.skips(&self.name) {
            return None;
        }
        let workspace = Workspace::seed(harness, &self.files);
        let layout = ProjectLayout::new(self.config.clone());
        let renderer = AttributeTagRenderer::new();
        let mut answers = AnswerQueue::new(self.answers.clone());
        let result = EntityMaker::new(workspace.fs(), &layout, &renderer, &EntitySkeleton)
            .with_overwrite(self.overwrite)
            .run(&mut answers);
        Some(EntityOutcome {
            result,
            asked: answers.asked().to_vec(),
            unanswered: answers.remaining(),
            workspace,
        })
    }

    /// Run the regenerator over `namespace` (the entity namespace when `None`)
    pub fn run_regenerate(&self, harness: &HarnessConfig, namespace: Option<&str>) -> Option<RegenerateOutcome> {
        if harness.skips(&self.name) {
            return None;
        }
        let workspace = Workspace::seed(harness, &self.files);
        let layout = ProjectLayout::new(self.config.clone());
        let renderer = AttributeTagRenderer::new();
        let result = Regenerator::new(workspace.fs(), &layout, &renderer)
            .with_overwrite(self.overwrite)
            .run(namespace);
        Some(RegenerateOutcome { result, workspace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_filesystem_lists_by_extension() {
        let fs = MemoryFilesystem::new()
            .with_file("src/Entity/User.php", "<?php")
            .with_file("src/Entity/notes.txt", "")
            .with_file("src/Entity/Friend/User.php", "<?php");
        let listed = fs.list_files(Path::new("src/Entity"), "php").unwrap();
        assert_eq!(
            listed,
            vec![
                PathBuf::from("src/Entity/Friend/User.php"),
                PathBuf::from("src/Entity/User.php")
            ]
        );
        assert!(matches!(
            fs.list_files(Path::new("src/Missing"), "php"),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let fs = MemoryFilesystem::new().with_read_only("b.php");
        let batch = vec![
            (PathBuf::from("a.php"), "a".to_string()),
            (PathBuf::from("b.php"), "b".to_string()),
        ];
        assert!(fs.write_batch(&batch).is_err());
        assert_eq!(fs.writes(), 0);
        assert!(!fs.exists(Path::new("a.php")));
    }

    #[test]
    fn skipped_scenarios_do_not_run() {
        let harness = HarnessConfig::default().skipping("noop");
        assert!(Scenario::new("noop").run_entity(&harness).is_none());
    }
}
