//! Mapping tags: rendering and reading back
//!
//! [`TagRenderer`] is the seam between relation/column semantics and the
//! textual tag syntax of the class files. [`AttributeTagRenderer`] writes
//! `#[ORM\...]` attributes.

use once_cell::sync::Lazy;
use regex::Regex;
use scaffold_source::Property;
use serde::Serialize;

use crate::cardinality::Cardinality;
use crate::column::{ColumnSpec, ColumnType};

const MAPPING_NAMESPACE: &str = "Doctrine\\ORM\\Mapping";
const TYPES_CLASS: &str = "Doctrine\\DBAL\\Types\\Types";

static COLLECTION_DOC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@var\s+Collection<\s*(?:[\w\\]+\s*,\s*)?\\?([\w\\]+)\s*>")
        .expect("collection doc pattern is valid")
});

/// Relation mapping of one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationTag {
    /// Cardinality from the declaring side
    pub cardinality: Cardinality,
    /// Target class as written in the file
    pub target_class: String,
    /// Field on the other class
    pub counterpart: Option<String>,
    /// Whether this side owns the mapping
    pub owning: bool,
    /// Join column accepts `null`
    pub nullable: bool,
    /// Collection removes orphaned elements
    pub orphan_removal: bool,
    /// Owning side of a one-to-one
    pub unique: bool,
}

/// Import a renderer's tags need: name and alias
pub type TagImport = (String, Option<String>);

/// Rendered tag text for one property
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedTags {
    /// Tags written with the declaration
    pub property: Vec<String>,
    /// Tags attached after the declaration exists
    pub extra: Vec<String>,
    /// Imports the tags refer to, beyond [`TagRenderer::required_imports`]
    pub imports: Vec<TagImport>,
}

/// Converts mapping semantics to tag text and back
pub trait TagRenderer: Send + Sync {
    /// Imports every rendered tag depends on
    fn required_imports(&self) -> Vec<TagImport>;

    /// Render a relation mapping
    fn render_relation(&self, tag: &RelationTag) -> RenderedTags;

    /// Render a column mapping
    fn render_column(&self, column: &ColumnSpec) -> RenderedTags;

    /// Read the relation mapping of a property
    fn parse_relation(&self, property: &Property) -> Option<RelationTag>;

    /// Nullability of a column mapping; `None` when the property has none
    fn column_nullable(&self, property: &Property) -> Option<bool>;

    /// Whether the property is a database-generated identifier
    fn is_generated_id(&self, property: &Property) -> bool;

    /// Whether the property carries any mapping
    fn is_mapped(&self, property: &Property) -> bool;
}

/// Renders `#[ORM\...]` attribute tags
#[derive(Debug, Clone)]
pub struct AttributeTagRenderer {
    prefix: String,
}

impl Default for AttributeTagRenderer {
    fn default() -> Self {
        Self {
            prefix: "ORM".to_string(),
        }
    }
}

impl AttributeTagRenderer {
    /// Renderer using the `ORM` alias
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias the mapping namespace is imported under
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn tag(&self, name: &str, args: &[String]) -> String {
        if args.is_empty() {
            format!("#[{}\\{name}]", self.prefix)
        } else {
            format!("#[{}\\{name}({})]", self.prefix, args.join(", "))
        }
    }

    fn join_column(&self, nullable: bool) -> Vec<String> {
        if nullable {
            Vec::new()
        } else {
            vec![self.tag("JoinColumn", &["nullable: false".to_string()])]
        }
    }
}

fn quoted(field: &str) -> String {
    format!("'{field}'")
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    ['\'', '"']
        .iter()
        .find_map(|q| value.strip_prefix(*q).and_then(|v| v.strip_suffix(*q)))
        .unwrap_or(value)
}

fn class_argument(value: &str) -> String {
    let value = value.trim();
    value
        .strip_suffix("::class")
        .map_or_else(|| unquote(value).to_string(), |v| v.trim().to_string())
}

impl TagRenderer for AttributeTagRenderer {
    fn required_imports(&self) -> Vec<TagImport> {
        vec![(MAPPING_NAMESPACE.to_string(), Some(self.prefix.clone()))]
    }

    fn render_relation(&self, tag: &RelationTag) -> RenderedTags {
        let target = format!("targetEntity: {}::class", tag.target_class);
        let back_reference = |owning: bool| {
            tag.counterpart.as_deref().map(|field| {
                let key = if owning { "inversedBy" } else { "mappedBy" };
                format!("{key}: {}", quoted(field))
            })
        };
        let mut rendered = RenderedTags::default();
        match tag.cardinality {
            Cardinality::ManyToOne => {
                let args: Vec<String> = back_reference(true).into_iter().collect();
                rendered.property.push(self.tag("ManyToOne", &args));
                rendered.extra = self.join_column(tag.nullable);
            }
            Cardinality::OneToMany => {
                let mut args = vec![target];
                args.extend(back_reference(false));
                if tag.orphan_removal {
                    args.push("orphanRemoval: true".to_string());
                }
                rendered.property.push(self.tag("OneToMany", &args));
            }
            Cardinality::ManyToMany => {
                let mut args = vec![target];
                args.extend(back_reference(tag.owning));
                rendered.property.push(self.tag("ManyToMany", &args));
            }
            Cardinality::OneToOne => {
                let mut args: Vec<String> = back_reference(tag.owning).into_iter().collect();
                args.push("cascade: ['persist', 'remove']".to_string());
                if tag.orphan_removal {
                    args.push("orphanRemoval: true".to_string());
                }
                rendered.property.push(self.tag("OneToOne", &args));
                if tag.owning {
                    rendered.extra = self.join_column(tag.nullable);
                }
            }
        }
        rendered
    }

    fn render_column(&self, column: &ColumnSpec) -> RenderedTags {
        let mut args = Vec::new();
        let mut rendered = RenderedTags::default();
        if column.column_type == ColumnType::Text {
            args.push("type: Types::TEXT".to_string());
            rendered.imports.push((TYPES_CLASS.to_string(), None));
        }
        if column.column_type.has_length() {
            args.push(format!("length: {}", column.length.unwrap_or(255)));
        }
        if column.nullable {
            args.push("nullable: true".to_string());
        }
        rendered.property.push(self.tag("Column", &args));
        rendered
    }

    fn parse_relation(&self, property: &Property) -> Option<RelationTag> {
        let (cardinality, entry) = Cardinality::all()
            .into_iter()
            .find_map(|c| property.tag_entry(c.name()).map(|e| (c, e)))?;

        let target_class = entry
            .argument("targetEntity")
            .or_else(|| entry.positional(0))
            .map(class_argument)
            .or_else(|| {
                if cardinality.is_to_many() {
                    property
                        .doc
                        .as_deref()
                        .and_then(|doc| COLLECTION_DOC.captures(doc))
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str().to_string())
                } else {
                    property.base_type().map(str::to_string)
                }
            })?;

        let mapped_by = entry.argument("mappedBy").map(|v| unquote(v).to_string());
        let inversed_by = entry.argument("inversedBy").map(|v| unquote(v).to_string());
        let owning = match cardinality {
            Cardinality::ManyToOne => true,
            Cardinality::OneToMany => false,
            Cardinality::ManyToMany | Cardinality::OneToOne => mapped_by.is_none(),
        };
        let nullable = !cardinality.is_to_many()
            && property
                .tag_entry("JoinColumn")
                .and_then(|j| j.argument("nullable"))
                .map_or(true, |v| !v.trim().eq_ignore_ascii_case("false"));
        let orphan_removal = entry
            .argument("orphanRemoval")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        Some(RelationTag {
            cardinality,
            target_class,
            counterpart: if owning { inversed_by } else { mapped_by },
            owning,
            nullable,
            orphan_removal,
            unique: cardinality == Cardinality::OneToOne && owning,
        })
    }

    fn column_nullable(&self, property: &Property) -> Option<bool> {
        let column = property.tag_entry("Column")?;
        Some(
            column
                .argument("nullable")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
        )
    }

    fn is_generated_id(&self, property: &Property) -> bool {
        property.tag_entry("Id").is_some() && property.tag_entry("GeneratedValue").is_some()
    }

    fn is_mapped(&self, property: &Property) -> bool {
        ["Column", "Id", "Embedded"]
            .iter()
            .any(|t| property.tag_entry(t).is_some())
            || self.parse_relation(property).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scaffold_source::{parse, ParseMode};

    fn relation(cardinality: Cardinality, target: &str, counterpart: Option<&str>, owning: bool) -> RelationTag {
        RelationTag {
            cardinality,
            target_class: target.to_string(),
            counterpart: counterpart.map(str::to_string),
            owning,
            nullable: true,
            orphan_removal: false,
            unique: false,
        }
    }

    fn property(decl: &str) -> Property {
        let src = format!("<?php\n\nclass Photo\n{{\n{decl}\n}}\n");
        let file = parse(&src, "Photo.php", ParseMode::Strict).unwrap();
        file.properties()[0].clone()
    }

    #[test]
    fn many_to_one_with_join_column() {
        let renderer = AttributeTagRenderer::new();
        let mut tag = relation(Cardinality::ManyToOne, "User", Some("photos"), true);
        tag.nullable = false;
        let rendered = renderer.render_relation(&tag);
        assert_eq!(rendered.property, vec!["#[ORM\\ManyToOne(inversedBy: 'photos')]"]);
        assert_eq!(rendered.extra, vec!["#[ORM\\JoinColumn(nullable: false)]"]);
    }

    #[test]
    fn one_to_many_with_orphan_removal() {
        let mut tag = relation(Cardinality::OneToMany, "UserAvatarPhoto", Some("user"), false);
        tag.orphan_removal = true;
        let rendered = AttributeTagRenderer::new().render_relation(&tag);
        assert_eq!(
            rendered.property,
            vec!["#[ORM\\OneToMany(targetEntity: UserAvatarPhoto::class, mappedBy: 'user', orphanRemoval: true)]"]
        );
        assert!(rendered.extra.is_empty());
    }

    #[test]
    fn vendor_target_has_no_back_reference() {
        let tag = relation(Cardinality::ManyToMany, "Group", None, true);
        let rendered = AttributeTagRenderer::new().render_relation(&tag);
        assert_eq!(rendered.property, vec!["#[ORM\\ManyToMany(targetEntity: Group::class)]"]);
    }

    #[test]
    fn one_to_one_sides() {
        let renderer = AttributeTagRenderer::new();
        let owning = renderer.render_relation(&relation(Cardinality::OneToOne, "UserProfile", Some("user"), true));
        assert_eq!(
            owning.property,
            vec!["#[ORM\\OneToOne(inversedBy: 'user', cascade: ['persist', 'remove'])]"]
        );
        let inverse = renderer.render_relation(&relation(Cardinality::OneToOne, "User", Some("userProfile"), false));
        assert_eq!(
            inverse.property,
            vec!["#[ORM\\OneToOne(mappedBy: 'userProfile', cascade: ['persist', 'remove'])]"]
        );
    }

    #[test]
    fn columns() {
        let renderer = AttributeTagRenderer::new();
        let name = renderer.render_column(&ColumnSpec::new("name", ColumnType::String).with_length(255));
        assert_eq!(name.property, vec!["#[ORM\\Column(length: 255)]"]);
        let bio = renderer.render_column(&ColumnSpec::new("bio", ColumnType::Text).with_nullable(true));
        assert_eq!(bio.property, vec!["#[ORM\\Column(type: Types::TEXT, nullable: true)]"]);
        assert_eq!(bio.imports, vec![(TYPES_CLASS.to_string(), None)]);
        let age = renderer.render_column(&ColumnSpec::new("age", ColumnType::Integer));
        assert_eq!(age.property, vec!["#[ORM\\Column]"]);
    }

    #[test]
    fn parse_many_to_one_back() {
        let prop = property(
            "    #[ORM\\ManyToOne(inversedBy: 'photos')]\n    #[ORM\\JoinColumn(nullable: false)]\n    private ?User $user = null;",
        );
        let tag = AttributeTagRenderer::new().parse_relation(&prop).unwrap();
        assert_eq!(tag.cardinality, Cardinality::ManyToOne);
        assert_eq!(tag.target_class, "User");
        assert_eq!(tag.counterpart.as_deref(), Some("photos"));
        assert!(tag.owning);
        assert!(!tag.nullable);
    }

    #[test]
    fn parse_collection_target_from_doc() {
        let prop = property(
            "    /**\n     * @var Collection<int, Course>\n     */\n    #[ORM\\ManyToMany(mappedBy: \"students\")]\n    private Collection $courses;",
        );
        let tag = AttributeTagRenderer::new().parse_relation(&prop).unwrap();
        assert_eq!(tag.target_class, "Course");
        assert_eq!(tag.counterpart.as_deref(), Some("students"));
        assert!(!tag.owning);
    }

    #[test]
    fn ids_and_columns() {
        let renderer = AttributeTagRenderer::new();
        let id = property("    #[ORM\\Id]\n    #[ORM\\GeneratedValue]\n    #[ORM\\Column]\n    private ?int $id = null;");
        assert!(renderer.is_generated_id(&id));
        assert!(renderer.is_mapped(&id));
        assert_eq!(renderer.column_nullable(&id), Some(false));

        let plain = property("    private array $cache = [];");
        assert!(!renderer.is_mapped(&plain));
        assert_eq!(renderer.column_nullable(&plain), None);
    }
}
