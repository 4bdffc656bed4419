//! Scaffold Source
//!
//! Tolerant parsing and anchor-based structural editing of class files.
//!
//! # Core Concepts
//!
//! - [`ClassFile`]: parsed view of one file with exact byte spans
//! - [`parse`]: text → [`ClassFile`] in [`ParseMode::Strict`] or [`ParseMode::Lenient`]
//! - [`Mutator`]: ordered, idempotent [`MutationOp`]s lowered to [`Edit`]s
//! - [`ContentHash`]: Blake3 hash every edit is validated against
//! - [`discriminate`]: namespace suffixes that tell same-named classes apart
//!
//! # Example
//!
//! ```rust
//! use scaffold_source::{parse, MutationOp, Mutator, ParseMode, PropertySpec};
//!
//! let src = "<?php\n\nclass User\n{\n}\n";
//! let mut file = parse(src, "User.php", ParseMode::Strict).unwrap();
//! let op = MutationOp::AddProperty(PropertySpec::new("name").with_type("?string").with_default("null"));
//! Mutator::new().apply(&mut file, &op).unwrap();
//! assert!(file.source().contains("    private ?string $name = null;"));
//! ```

#![warn(unreachable_pub)]

mod accessor;
mod discriminator;
mod edit;
mod error;
mod hash;
mod model;
mod mutator;
mod parser;
mod scanner;
mod span;

/// Name transforms (plural/singular, camel case, class-name parts)
pub mod inflector;

pub use accessor::{
    collection_method_names, generate as generate_accessors, getter_name, setter_name,
    AccessorKind, GeneratedMethod, InverseSync,
};
pub use discriminator::{alias_for, discriminate, display_name};
pub use edit::{Edit, EditError};
pub use error::{MutationError, NamingError, ParseError};
pub use hash::ContentHash;
pub use model::{
    ClassFile, DeclarationKind, Import, ImportKind, Member, MemberKind, MetadataTag, Method,
    Namespace, Parameter, ParseMode, Property, Style, TagArgument, TagEntry, Visibility,
};
pub use mutator::{
    resolve_import, Change, ImportResolution, MutationOp, MutationReport, Mutator, Outcome,
    Phase, PropertySpec, TagTarget,
};
pub use parser::parse;
pub use span::{line_of, Span};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
