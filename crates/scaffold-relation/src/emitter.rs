//! Lowering of planned properties to ordered [`MutationOp`]s
//!
//! The emitter only computes operations; applying them is the
//! [`Mutator`](scaffold_source::Mutator)'s job. Imports are resolved up
//! front so that a class sharing a short name with the file's own class,
//! or with another planned import, gets a discriminated alias.

use scaffold_source::inflector::short_class_name;
use scaffold_source::{
    resolve_import, AccessorKind, ClassFile, InverseSync, MutationOp, NamingError, Property,
    PropertySpec, TagTarget,
};
use serde::Serialize;

use crate::cardinality::Cardinality;
use crate::column::ColumnSpec;
use crate::error::RelationError;
use crate::graph::{DeclaredRelation, RelationGraph};
use crate::plan::{FilePlan, RelationProperty};
use crate::tag::{RelationTag, RenderedTags, TagImport, TagRenderer};

const COLLECTION: &str = "Doctrine\\Common\\Collections\\Collection";
const ARRAY_COLLECTION: &str = "Doctrine\\Common\\Collections\\ArrayCollection";

/// Operations for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoweredFile {
    /// Operations in planning order; the mutator sorts them by phase
    pub ops: Vec<MutationOp>,
    /// Fields left alone because they already exist
    pub skipped: Vec<String>,
}

impl LoweredFile {
    /// Whether nothing is to be done
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Accumulates operations for one file, tracking planned imports
struct Lowering<'f> {
    file: &'f ClassFile,
    ops: Vec<MutationOp>,
    reserved: Vec<(String, String)>,
}

impl<'f> Lowering<'f> {
    fn new(file: &'f ClassFile) -> Self {
        Self {
            file,
            ops: Vec::new(),
            reserved: Vec::new(),
        }
    }

    /// Name `fqn` will be visible under, planning an import when needed
    fn import(&mut self, fqn: &str) -> Result<String, NamingError> {
        let resolution = resolve_import(self.file, fqn, &self.reserved)?;
        if let Some((name, alias)) = resolution.import {
            self.reserved.push((resolution.local.clone(), name.clone()));
            self.ops.push(MutationOp::AddImport { name, alias });
        }
        Ok(resolution.local)
    }

    /// Plan an import with a fixed alias
    fn import_fixed(&mut self, (name, alias): &TagImport) {
        if self.file.import_of(name).is_some()
            || self.reserved.iter().any(|(_, f)| f.eq_ignore_ascii_case(name))
        {
            return;
        }
        let local = alias
            .clone()
            .unwrap_or_else(|| short_class_name(name).to_string());
        self.reserved.push((local, name.clone()));
        self.ops.push(MutationOp::AddImport {
            name: name.clone(),
            alias: alias.clone(),
        });
    }

    fn tags(&mut self, field: &str, rendered: &RenderedTags) {
        for import in &rendered.imports {
            self.import_fixed(import);
        }
        for tag in &rendered.extra {
            self.ops.push(MutationOp::AddMetadataTag {
                target: TagTarget::Property(field.to_string()),
                tag: tag.clone(),
            });
        }
    }

    fn collection(&mut self, field: &str) -> Result<(String, String), NamingError> {
        let collection = self.import(COLLECTION)?;
        let array = self.import(ARRAY_COLLECTION)?;
        self.ops.push(MutationOp::EnsureConstructorStatement(format!(
            "$this->{field} = new {array}();"
        )));
        Ok((collection, array))
    }
}

/// Lowers plans and scanned classes to mutation operations
pub struct CodeEmitter<'r> {
    renderer: &'r dyn TagRenderer,
    overwrite: bool,
}

impl<'r> CodeEmitter<'r> {
    /// Create emitter that skips existing properties
    #[must_use]
    pub fn new(renderer: &'r dyn TagRenderer) -> Self {
        Self {
            renderer,
            overwrite: false,
        }
    }

    /// Replace existing properties instead of skipping them
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    fn exists(&self, file: &ClassFile, field: &str) -> bool {
        if file.property(field).is_some() && !self.overwrite {
            tracing::warn!(
                file = %file.path().display(),
                field,
                "property already exists; skipping"
            );
            return true;
        }
        false
    }

    fn finish(&self, mut lowering: Lowering<'_>, skipped: Vec<String>) -> LoweredFile {
        if lowering.ops.is_empty() {
            return LoweredFile {
                ops: Vec::new(),
                skipped,
            };
        }
        for import in self.renderer.required_imports() {
            lowering.import_fixed(&import);
        }
        LoweredFile {
            ops: lowering.ops,
            skipped,
        }
    }

    /// Lower the planned relation properties of one file
    ///
    /// # Errors
    /// Returns [`RelationError::Naming`] when an import alias cannot be
    /// derived.
    pub fn lower_file(&self, plan: &FilePlan, file: &ClassFile) -> Result<LoweredFile, RelationError> {
        let mut lowering = Lowering::new(file);
        let mut skipped = Vec::new();
        for property in &plan.properties {
            if self.exists(file, &property.field) {
                skipped.push(property.field.clone());
                continue;
            }
            self.lower_relation(&mut lowering, property)?;
        }
        Ok(self.finish(lowering, skipped))
    }

    fn lower_relation(&self, lowering: &mut Lowering<'_>, property: &RelationProperty) -> Result<(), RelationError> {
        let field = property.field.as_str();
        let target = lowering.import(&property.target.fqn)?;
        let rendered = self.renderer.render_relation(&RelationTag {
            cardinality: property.cardinality,
            target_class: target.clone(),
            counterpart: property.counterpart.clone(),
            owning: property.owning,
            nullable: property.nullable,
            orphan_removal: property.orphan_removal,
            unique: property.unique,
        });

        let mut spec = PropertySpec::new(field);
        let kind = if property.cardinality.is_to_many() {
            let (collection, _) = lowering.collection(field)?;
            spec = spec
                .with_type(collection.clone())
                .with_doc(format!("/**\n * @var {collection}<int, {target}>\n */"));
            AccessorKind::Collection {
                item_type: target,
                sync: collection_sync(property.cardinality, property.owning, property.counterpart.as_deref()),
            }
        } else {
            spec = spec.with_type(format!("?{target}")).with_default("null");
            single_accessors(
                property.cardinality,
                property.owning,
                property.nullable,
                property.counterpart.as_deref().map(|f| (f, property.counterpart_nullable)),
            )
        };
        for tag in &rendered.property {
            spec = spec.with_tag(tag.clone());
        }
        lowering.ops.push(MutationOp::AddProperty(spec));
        lowering.ops.push(MutationOp::AddAccessors {
            property: field.to_string(),
            kind,
        });
        lowering.tags(field, &rendered);
        Ok(())
    }

    /// Lower a scalar column field
    ///
    /// # Errors
    /// Returns [`RelationError::Naming`] when an import alias cannot be
    /// derived.
    pub fn lower_column(&self, column: &ColumnSpec, file: &ClassFile) -> Result<LoweredFile, RelationError> {
        let mut lowering = Lowering::new(file);
        if self.exists(file, &column.field) {
            return Ok(self.finish(lowering, vec![column.field.clone()]));
        }
        let rendered = self.renderer.render_column(column);
        let mut spec = PropertySpec::new(&column.field)
            .with_type(format!("?{}", column.column_type.php_type()))
            .with_default("null");
        for tag in &rendered.property {
            spec = spec.with_tag(tag.clone());
        }
        lowering.ops.push(MutationOp::AddProperty(spec));
        lowering.ops.push(MutationOp::AddAccessors {
            property: column.field.clone(),
            kind: AccessorKind::Value {
                nullable: column.nullable,
            },
        });
        lowering.tags(&column.field, &rendered);
        Ok(self.finish(lowering, Vec::new()))
    }

    /// Operations regenerating boilerplate for every mapped property
    ///
    /// Generated ids get a getter only. Collections get a constructor
    /// initializer and, when `graph` confirms the other side points back,
    /// adders and removers that keep it in sync. Unmapped properties are
    /// left alone.
    ///
    /// # Errors
    /// Returns [`RelationError::Naming`] when an import alias cannot be
    /// derived.
    pub fn regenerate_file(&self, file: &ClassFile, graph: &RelationGraph) -> Result<Vec<MutationOp>, RelationError> {
        let mut lowering = Lowering::new(file);
        let class = file.fqn();
        for property in file.properties().iter().filter(|p| !p.is_static) {
            let kind = if self.renderer.is_generated_id(property) {
                Some(AccessorKind::ReadOnly)
            } else if let Some(relation) = graph.get(&class, &property.name) {
                Some(self.regenerated_relation(&mut lowering, property, relation, graph)?)
            } else if self.renderer.is_mapped(property) {
                Some(AccessorKind::Value {
                    nullable: self
                        .renderer
                        .column_nullable(property)
                        .unwrap_or(property.nullable),
                })
            } else {
                None
            };
            match kind {
                Some(kind) => lowering.ops.push(MutationOp::AddAccessors {
                    property: property.name.clone(),
                    kind,
                }),
                None => tracing::debug!(property = %property.name, "unmapped property; no accessors"),
            }
        }
        Ok(lowering.ops)
    }

    fn regenerated_relation(
        &self,
        lowering: &mut Lowering<'_>,
        property: &Property,
        relation: &DeclaredRelation,
        graph: &RelationGraph,
    ) -> Result<AccessorKind, RelationError> {
        let tag = &relation.tag;
        let other = graph.counterpart(relation);
        let counterpart = other.map(|o| (o.field.as_str(), o.tag.nullable));
        if tag.cardinality.is_to_many() {
            lowering.collection(&property.name)?;
            let item_type = lowering.import(&tag.target_class)?;
            Ok(AccessorKind::Collection {
                item_type,
                sync: collection_sync(tag.cardinality, tag.owning, counterpart.map(|(f, _)| f)),
            })
        } else {
            Ok(single_accessors(tag.cardinality, tag.owning, tag.nullable, counterpart))
        }
    }
}

fn collection_sync(cardinality: Cardinality, owning: bool, counterpart: Option<&str>) -> Option<InverseSync> {
    let field = counterpart?.to_string();
    match cardinality {
        Cardinality::OneToMany => Some(InverseSync::Reference { field }),
        Cardinality::ManyToMany if !owning => Some(InverseSync::Collection { field }),
        _ => None,
    }
}

fn single_accessors(
    cardinality: Cardinality,
    owning: bool,
    nullable: bool,
    counterpart: Option<(&str, bool)>,
) -> AccessorKind {
    match (cardinality, owning, counterpart) {
        (Cardinality::OneToOne, false, Some((field, owning_nullable))) => AccessorKind::InverseOneToOne {
            owning_field: field.to_string(),
            owning_nullable,
        },
        (Cardinality::OneToOne, true, _) => AccessorKind::Value { nullable },
        _ => AccessorKind::Value { nullable: true },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ClassRef;
    use crate::tag::AttributeTagRenderer;
    use crate::{ColumnType, RelationPlanner, RelationRequest};
    use scaffold_source::{parse, ParseMode};

    const USER: &str = "<?php\n\nnamespace App\\Entity;\n\nclass User\n{\n}\n";

    fn entity(short: &str) -> ClassRef {
        ClassRef::new(format!("App\\Entity\\{short}"), format!("src/Entity/{short}.php"), true)
    }

    fn imports(ops: &[MutationOp]) -> Vec<(String, Option<String>)> {
        ops.iter()
            .filter_map(|op| match op {
                MutationOp::AddImport { name, alias } => Some((name.clone(), alias.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn colliding_target_is_aliased() {
        let file = parse(USER, "src/Entity/User.php", ParseMode::Strict).unwrap();
        let request = RelationRequest::new(
            entity("User"),
            ClassRef::new("App\\Entity\\Friend\\User", "src/Entity/Friend/User.php", true),
            Cardinality::ManyToOne,
            "friend",
        )
        .with_nullable(true);
        let plan = RelationPlanner::new().plan(&request).unwrap();
        let renderer = AttributeTagRenderer::new();
        let lowered = CodeEmitter::new(&renderer).lower_file(&plan.files()[0], &file).unwrap();
        let imports = imports(&lowered.ops);
        assert!(imports.contains(&("App\\Entity\\Friend\\User".to_string(), Some("FriendUser".to_string()))));
        assert!(lowered.ops.iter().any(|op| matches!(
            op,
            MutationOp::AddProperty(spec) if spec.type_decl.as_deref() == Some("?FriendUser")
        )));
    }

    #[test]
    fn existing_property_is_skipped_without_ops() {
        let src = "<?php\n\nnamespace App\\Entity;\n\nclass User\n{\n    private ?string $name = null;\n}\n";
        let file = parse(src, "src/Entity/User.php", ParseMode::Strict).unwrap();
        let renderer = AttributeTagRenderer::new();
        let column = ColumnSpec::new("name", ColumnType::String);
        let lowered = CodeEmitter::new(&renderer).lower_column(&column, &file).unwrap();
        assert!(lowered.is_empty());
        assert_eq!(lowered.skipped, vec!["name"]);

        let lowered = CodeEmitter::new(&renderer)
            .with_overwrite(true)
            .lower_column(&column, &file)
            .unwrap();
        assert!(!lowered.is_empty());
    }

    #[test]
    fn owning_many_to_many_has_no_sync() {
        assert_eq!(collection_sync(Cardinality::ManyToMany, true, Some("students")), None);
        assert_eq!(
            collection_sync(Cardinality::ManyToMany, false, Some("courses")),
            Some(InverseSync::Collection { field: "courses".into() })
        );
        assert_eq!(collection_sync(Cardinality::OneToMany, false, None), None);
    }
}
