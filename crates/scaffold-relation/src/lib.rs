//! Scaffold Relation
//!
//! Bidirectional relation planning between entity classes and lowering of
//! the plan to structural edits.
//!
//! # Core Concepts
//!
//! - [`RelationRequest`]: one relation described from the source class
//! - [`RelationPlanner`]: decides the owning side and the properties of both classes
//! - [`MutationPlan`]: per-file relation properties, source file first
//! - [`CodeEmitter`]: plan → ordered [`MutationOp`](scaffold_source::MutationOp)s
//! - [`TagRenderer`]: mapping semantics ↔ tag text
//! - [`RelationGraph`]: relations rebuilt from scanned class files
//!
//! # Example
//!
//! ```rust
//! use scaffold_relation::{Cardinality, ClassRef, RelationPlanner, RelationRequest};
//!
//! let request = RelationRequest::new(
//!     ClassRef::new("App\\Entity\\UserAvatarPhoto", "src/Entity/UserAvatarPhoto.php", true),
//!     ClassRef::new("App\\Entity\\User", "src/Entity/User.php", true),
//!     Cardinality::ManyToOne,
//!     "user",
//! )
//! .with_inverse_field("photos");
//!
//! let plan = RelationPlanner::new().plan(&request).unwrap();
//! assert_eq!(plan.files().len(), 2);
//! assert!(plan.files()[0].properties[0].owning);
//! ```

#![warn(unreachable_pub)]

mod cardinality;
mod column;
mod describe;
mod emitter;
mod error;
mod graph;
mod plan;
mod planner;
mod request;
mod tag;

pub use cardinality::{Cardinality, UnknownCardinality};
pub use column::{ColumnSpec, ColumnType, UnknownColumnType};
pub use describe::{describe, describe_all, RelationDescription};
pub use emitter::{CodeEmitter, LoweredFile};
pub use error::RelationError;
pub use graph::{DeclaredRelation, RelationGraph};
pub use plan::{FilePlan, MutationPlan, RelationProperty};
pub use planner::RelationPlanner;
pub use request::{default_field_name, ClassRef, RelationRequest};
pub use tag::{AttributeTagRenderer, RelationTag, RenderedTags, TagImport, TagRenderer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
