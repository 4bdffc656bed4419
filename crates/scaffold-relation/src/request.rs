//! Relation requests

use std::path::{Path, PathBuf};

use scaffold_source::inflector::{as_lower_camel_case, short_class_name, to_plural};
use serde::Serialize;

use crate::cardinality::Cardinality;

/// A class taking part in a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassRef {
    /// Fully-qualified name without leading `\`
    pub fqn: String,
    /// File the class lives in
    pub path: PathBuf,
    /// Whether the file lies inside the editable source root
    pub editable: bool,
}

impl ClassRef {
    /// Create class reference
    #[must_use]
    pub fn new(fqn: impl Into<String>, path: impl Into<PathBuf>, editable: bool) -> Self {
        Self {
            fqn: fqn.into().trim_start_matches('\\').to_string(),
            path: path.into(),
            editable,
        }
    }

    /// Short class name
    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_class_name(&self.fqn)
    }

    /// File path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether both refer to the same class
    #[must_use]
    pub fn is_same_class(&self, other: &ClassRef) -> bool {
        self.fqn.eq_ignore_ascii_case(&other.fqn)
    }
}

/// One relation to add, described from the source class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRequest {
    /// Class the field is being added to
    pub source: ClassRef,
    /// Class the field points at
    pub target: ClassRef,
    /// Cardinality from the source side
    pub cardinality: Cardinality,
    /// New field on the source class
    pub field: String,
    /// Field on the target class; derived from the source name when absent
    pub inverse_field: Option<String>,
    /// Whether the many-to-one or owning one-to-one side accepts `null`
    pub nullable: bool,
    /// Remove orphaned elements of the collection side
    pub orphan_removal: bool,
    /// Generate the property on the other side
    pub generate_inverse: bool,
    /// Make the target the owning side (one-to-one only)
    pub flip_owning: bool,
}

impl RelationRequest {
    /// Create request with an inverse side, not nullable, no orphan removal
    #[must_use]
    pub fn new(
        source: ClassRef,
        target: ClassRef,
        cardinality: Cardinality,
        field: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            cardinality,
            field: field.into(),
            inverse_field: None,
            nullable: false,
            orphan_removal: false,
            generate_inverse: true,
            flip_owning: false,
        }
    }

    /// Set the field name on the target class
    #[must_use]
    pub fn with_inverse_field(mut self, field: impl Into<String>) -> Self {
        self.inverse_field = Some(field.into());
        self
    }

    /// Set nullability
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set orphan removal
    #[must_use]
    pub fn with_orphan_removal(mut self, orphan_removal: bool) -> Self {
        self.orphan_removal = orphan_removal;
        self
    }

    /// Set whether the other side gets a property
    #[must_use]
    pub fn with_generate_inverse(mut self, generate: bool) -> Self {
        self.generate_inverse = generate;
        self
    }

    /// Make the target the owning side of a one-to-one
    #[must_use]
    pub fn with_owning_flipped(mut self, flipped: bool) -> Self {
        self.flip_owning = flipped;
        self
    }

    /// Whether source and target are the same class
    #[must_use]
    pub fn is_self_referencing(&self) -> bool {
        self.source.is_same_class(&self.target)
    }

    /// Default field name on the target class
    ///
    /// `UserProfile` → `userProfile` for single-valued sides,
    /// `Course` → `courses` for collection sides.
    #[must_use]
    pub fn default_inverse_field(&self) -> String {
        default_field_name(self.source.short_name(), self.cardinality.inverse())
    }

    /// Field name on the target class, explicit or derived
    #[must_use]
    pub fn resolved_inverse_field(&self) -> String {
        self.inverse_field
            .clone()
            .unwrap_or_else(|| self.default_inverse_field())
    }
}

/// Field name for pointing at `class_short` from a side of `cardinality`
#[must_use]
pub fn default_field_name(class_short: &str, cardinality: Cardinality) -> String {
    let base = as_lower_camel_case(class_short);
    if cardinality.is_to_many() {
        to_plural(&base)
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(fqn: &str) -> ClassRef {
        ClassRef::new(fqn, format!("src/Entity/{}.php", short_class_name(fqn)), true)
    }

    #[test]
    fn default_inverse_names() {
        let request = RelationRequest::new(
            class("App\\Entity\\UserProfile"),
            class("App\\Entity\\User"),
            Cardinality::OneToOne,
            "user",
        );
        assert_eq!(request.default_inverse_field(), "userProfile");

        let request = RelationRequest::new(
            class("App\\Entity\\Course"),
            class("App\\Entity\\User"),
            Cardinality::ManyToMany,
            "students",
        );
        assert_eq!(request.default_inverse_field(), "courses");

        let request = RelationRequest::new(
            class("App\\Entity\\User"),
            class("App\\Entity\\UserAvatarPhoto"),
            Cardinality::OneToMany,
            "photos",
        );
        assert_eq!(request.default_inverse_field(), "user");
    }

    #[test]
    fn explicit_inverse_wins() {
        let request = RelationRequest::new(
            class("App\\Entity\\User"),
            class("App\\Entity\\User"),
            Cardinality::ManyToOne,
            "guardian",
        )
        .with_inverse_field("dependants");
        assert!(request.is_self_referencing());
        assert_eq!(request.resolved_inverse_field(), "dependants");
    }

    #[test]
    fn leading_backslash_is_dropped() {
        assert_eq!(class("\\App\\Entity\\User").fqn, "App\\Entity\\User");
    }
}
