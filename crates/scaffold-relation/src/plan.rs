//! Planned relation properties, grouped per file

use serde::Serialize;

use crate::cardinality::Cardinality;
use crate::request::ClassRef;

/// A relation property to add to one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationProperty {
    /// Field name
    pub field: String,
    /// Cardinality from this class's side
    pub cardinality: Cardinality,
    /// Class the field points at
    pub target: ClassRef,
    /// Whether this side carries the authoritative mapping
    pub owning: bool,
    /// Field on the other class (`inversedBy` / `mappedBy`)
    pub counterpart: Option<String>,
    /// Field accepts `null`
    pub nullable: bool,
    /// Collection removes orphaned elements
    pub orphan_removal: bool,
    /// Owning side of a one-to-one
    pub unique: bool,
    /// Whether the counterpart field accepts `null`
    pub counterpart_nullable: bool,
}

/// Properties to add to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePlan {
    /// Class being edited
    pub class: ClassRef,
    /// Properties in the order they are added
    pub properties: Vec<RelationProperty>,
}

/// Ordered per-file plans for one request; the source file comes first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationPlan {
    files: Vec<FilePlan>,
}

impl MutationPlan {
    /// Create empty plan
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a property to the plan of `class`, creating it as needed
    pub fn push(&mut self, class: &ClassRef, property: RelationProperty) {
        match self.files.iter_mut().find(|f| f.class.is_same_class(class)) {
            Some(file) => file.properties.push(property),
            None => self.files.push(FilePlan {
                class: class.clone(),
                properties: vec![property],
            }),
        }
    }

    /// Per-file plans
    #[inline]
    #[must_use]
    pub fn files(&self) -> &[FilePlan] {
        &self.files
    }

    /// Plan for a class
    #[must_use]
    pub fn file_for(&self, fqn: &str) -> Option<&FilePlan> {
        self.files
            .iter()
            .find(|f| f.class.fqn.eq_ignore_ascii_case(fqn))
    }

    /// Whether nothing is planned
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consume into per-file plans
    #[must_use]
    pub fn into_files(self) -> Vec<FilePlan> {
        self.files
    }
}
