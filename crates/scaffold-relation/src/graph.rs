//! Relation graph rebuilt from declared mapping tags

use indexmap::IndexMap;
use scaffold_source::ClassFile;
use serde::Serialize;

use crate::tag::{RelationTag, TagRenderer};

/// A relation declared on a property of a scanned class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredRelation {
    /// Fully-qualified name of the declaring class
    pub class: String,
    /// Property name
    pub field: String,
    /// Mapping, with the target resolved to a fully-qualified name
    pub tag: RelationTag,
}

/// All declared relations, keyed by class and field
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    relations: IndexMap<(String, String), DeclaredRelation>,
}

fn key(class: &str, field: &str) -> (String, String) {
    (
        class.trim_start_matches('\\').to_ascii_lowercase(),
        field.to_string(),
    )
}

impl RelationGraph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parsed class files
    #[must_use]
    pub fn from_files<'a>(
        files: impl IntoIterator<Item = &'a ClassFile>,
        renderer: &dyn TagRenderer,
    ) -> Self {
        let mut graph = Self::new();
        for file in files {
            let class = file.fqn();
            for property in file.properties() {
                let Some(mut tag) = renderer.parse_relation(property) else {
                    continue;
                };
                tag.target_class = file.resolve_class_name(&tag.target_class);
                graph.insert(DeclaredRelation {
                    class: class.clone(),
                    field: property.name.clone(),
                    tag,
                });
            }
        }
        tracing::debug!(relations = graph.len(), "rebuilt relation graph");
        graph
    }

    /// Add or replace a relation
    pub fn insert(&mut self, relation: DeclaredRelation) {
        self.relations
            .insert(key(&relation.class, &relation.field), relation);
    }

    /// Relation declared on `class::field`
    #[must_use]
    pub fn get(&self, class: &str, field: &str) -> Option<&DeclaredRelation> {
        self.relations.get(&key(class, field))
    }

    /// Matching declaration on the other side, if it points back
    #[must_use]
    pub fn counterpart(&self, relation: &DeclaredRelation) -> Option<&DeclaredRelation> {
        let field = relation.tag.counterpart.as_deref()?;
        let other = self.get(&relation.tag.target_class, field)?;
        let points_back = other.tag.counterpart.as_deref() == Some(relation.field.as_str())
            && other.tag.target_class.eq_ignore_ascii_case(&relation.class);
        points_back.then_some(other)
    }

    /// Relations declared by one class, in scan order
    pub fn relations_of<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a DeclaredRelation> + 'a {
        let class = class.trim_start_matches('\\');
        self.relations
            .values()
            .filter(move |r| r.class.eq_ignore_ascii_case(class))
    }

    /// Relations naming a counterpart that does not point back
    pub fn dangling(&self) -> impl Iterator<Item = &DeclaredRelation> {
        self.relations
            .values()
            .filter(|r| r.tag.counterpart.is_some() && self.counterpart(r).is_none())
    }

    /// Number of relations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether the graph is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
