//! Scaffold Core
//!
//! Makers that create and update entity classes of a project, driven by
//! prompt answers, plus namespace-wide regeneration of accessors.
//!
//! # Core Concepts
//!
//! - [`ScaffoldConfig`]: root namespace, source root and autoload prefixes
//! - [`ProjectLayout`]: class name ↔ file path, editability
//! - [`Prompter`]: question/answer seam ([`AnswerQueue`] for scripted runs)
//! - [`Session`]: staged edits committed all-or-nothing
//! - [`EntityMaker`]: fields and relations added one answer at a time
//! - [`Regenerator`]: accessors rebuilt from mapping tags
//!
//! # Example
//!
//! ```rust,no_run
//! use scaffold_core::{
//!     Answer, AnswerQueue, EntityMaker, EntitySkeleton, LocalFilesystem, ProjectLayout,
//!     ScaffoldConfig,
//! };
//! use scaffold_relation::AttributeTagRenderer;
//!
//! let fs = LocalFilesystem::new("/path/to/project");
//! let layout = ProjectLayout::new(ScaffoldConfig::default());
//! let renderer = AttributeTagRenderer::new();
//! let mut answers = AnswerQueue::new([
//!     Answer::Text("Course".into()),
//!     Answer::Text("title".into()),
//!     Answer::Default,
//!     Answer::Default,
//!     Answer::Default,
//!     Answer::Default,
//! ]);
//!
//! let report = EntityMaker::new(&fs, &layout, &renderer, &EntitySkeleton).run(&mut answers)?;
//! for line in &report.transcript {
//!     println!("{line}");
//! }
//! # Ok::<(), scaffold_core::ScaffoldError>(())
//! ```

#![warn(unreachable_pub)]

mod config;
mod entity;
mod error;
mod fs;
mod layout;
mod maker;
mod prompt;
mod regenerate;
mod session;
mod template;

pub use config::{ScaffoldConfig, DEFAULT_CONFIG_PATH};
pub use entity::{EntityMaker, EntityReport};
pub use error::{ConfigError, FsError, PromptError, ScaffoldError};
pub use fs::{Filesystem, LocalFilesystem};
pub use layout::ProjectLayout;
pub use maker::MakerKind;
pub use prompt::{Answer, AnswerQueue, LinePrompter, PromptKey, PromptRequest, Prompter};
pub use regenerate::{
    BatchReport, FileReport, FileStatus, RegenerationScanner, Regenerator, ScanFailure, ScannedFile,
};
pub use session::{Session, WriteKind, WrittenFile};
pub use template::{EntitySkeleton, TemplateRenderer};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
