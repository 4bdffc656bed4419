//! Accessor method generation
//!
//! Produces getter/setter (or getter/adder/remover) method text for a
//! property. Output is deterministic given the property and the accessor
//! kind, written at class-body level zero with four-space indentation; the
//! [`Mutator`](crate::Mutator) re-indents it to the file's style.

use serde::Serialize;

use crate::inflector::{as_camel_case, lcfirst, to_singular, ucfirst};
use crate::model::Property;

/// How the other side of a collection is kept in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InverseSync {
    /// Other side holds a single reference (`setUser($this)`)
    Reference {
        /// Field on the other class
        field: String,
    },
    /// Other side holds a collection (`addCourse($this)`)
    Collection {
        /// Field on the other class
        field: String,
    },
}

/// Which accessors a property gets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessorKind {
    /// Getter and fluent setter
    Value {
        /// Setter accepts `null`
        nullable: bool,
    },
    /// Getter only (generated identifiers)
    ReadOnly,
    /// Getter returning the collection, plus adder and remover
    Collection {
        /// Element type as written in the file
        item_type: String,
        /// Other-side synchronization
        sync: Option<InverseSync>,
    },
    /// Inverse side of a one-to-one: the setter also sets the owning side
    InverseOneToOne {
        /// Owning field on the other class
        owning_field: String,
        /// Owning field accepts `null`
        owning_nullable: bool,
    },
}

/// One generated method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMethod {
    /// Method name
    pub name: String,
    /// Full declaration text
    pub text: String,
}

/// Getter name for a property
///
/// `firstName` → `getFirstName`; booleans read as `isActive`, and a name
/// already phrased as a question (`isActive`, `hasAccess`) is used as is.
#[must_use]
pub fn getter_name(property: &str, type_decl: Option<&str>) -> String {
    let is_bool = type_decl
        .map(|t| t.trim_start_matches('?'))
        .is_some_and(|t| t.eq_ignore_ascii_case("bool"));
    if !is_bool {
        return format!("get{}", as_camel_case(property));
    }
    let phrased = ["is", "has"].iter().any(|prefix| {
        property
            .strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(char::is_uppercase)
    });
    if phrased {
        property.to_string()
    } else {
        format!("is{}", as_camel_case(property))
    }
}

/// Setter name for a property (`foo_bar` → `setFooBar`)
#[must_use]
pub fn setter_name(property: &str) -> String {
    format!("set{}", as_camel_case(property))
}

/// Adder and remover names for a collection property (`photos` → `addPhoto`)
#[must_use]
pub fn collection_method_names(property: &str) -> (String, String) {
    let singular = as_camel_case(&ucfirst(&to_singular(property)));
    (format!("add{singular}"), format!("remove{singular}"))
}

/// Generate the accessor methods of `property`
#[must_use]
pub fn generate(property: &Property, kind: &AccessorKind) -> Vec<GeneratedMethod> {
    let name = &property.name;
    let type_decl = property.type_decl.as_deref();
    match kind {
        AccessorKind::ReadOnly => vec![getter(name, type_decl)],
        AccessorKind::Value { nullable } => {
            let param_type = property
                .base_type()
                .map(|t| nullable_type(t, *nullable));
            vec![
                getter(name, type_decl),
                setter(name, param_type.as_deref(), &[]),
            ]
        }
        AccessorKind::InverseOneToOne {
            owning_field,
            owning_nullable,
        } => {
            let base = property.base_type();
            let param_type = base.map(|t| nullable_type(t, property.nullable));
            let owning = as_camel_case(owning_field);
            let mut body = Vec::new();
            if property.nullable {
                if *owning_nullable {
                    body.push("// unset the owning side of the relation if necessary".to_string());
                    body.push(format!("if (${name} === null && $this->{name} !== null) {{"));
                    body.push(format!("    $this->{name}->set{owning}(null);"));
                    body.push("}".to_string());
                    body.push(String::new());
                }
                body.push("// set the owning side of the relation if necessary".to_string());
                body.push(format!(
                    "if (${name} !== null && ${name}->get{owning}() !== $this) {{"
                ));
            } else {
                body.push("// set the owning side of the relation if necessary".to_string());
                body.push(format!("if (${name}->get{owning}() !== $this) {{"));
            }
            body.push(format!("    ${name}->set{owning}($this);"));
            body.push("}".to_string());
            body.push(String::new());
            vec![
                getter(name, type_decl),
                setter(name, param_type.as_deref(), &body),
            ]
        }
        AccessorKind::Collection { item_type, sync } => {
            collection(name, type_decl, item_type, sync.as_ref())
        }
    }
}

fn nullable_type(base: &str, nullable: bool) -> String {
    let is_union = base.contains('|') || base.contains('&');
    if nullable && !is_union && !base.eq_ignore_ascii_case("mixed") {
        format!("?{base}")
    } else {
        base.to_string()
    }
}

fn signature_type(type_decl: Option<&str>) -> String {
    type_decl.map(|t| format!(": {t}")).unwrap_or_default()
}

fn param(type_decl: Option<&str>, name: &str) -> String {
    match type_decl {
        Some(t) => format!("{t} ${name}"),
        None => format!("${name}"),
    }
}

fn method(signature: String, body: &[String]) -> String {
    let mut text = format!("{signature}\n{{\n");
    for line in body {
        if line.is_empty() {
            text.push('\n');
        } else {
            text.push_str("    ");
            text.push_str(line);
            text.push('\n');
        }
    }
    text.push('}');
    text
}

fn getter(name: &str, type_decl: Option<&str>) -> GeneratedMethod {
    let method_name = getter_name(name, type_decl);
    GeneratedMethod {
        text: method(
            format!("public function {method_name}(){}", signature_type(type_decl)),
            &[format!("return $this->{name};")],
        ),
        name: method_name,
    }
}

fn setter(name: &str, param_type: Option<&str>, prelude: &[String]) -> GeneratedMethod {
    let method_name = setter_name(name);
    let mut body = prelude.to_vec();
    body.push(format!("$this->{name} = ${name};"));
    body.push(String::new());
    body.push("return $this;".to_string());
    GeneratedMethod {
        text: method(
            format!(
                "public function {method_name}({}): static",
                param(param_type, name)
            ),
            &body,
        ),
        name: method_name,
    }
}

fn collection(
    name: &str,
    type_decl: Option<&str>,
    item_type: &str,
    sync: Option<&InverseSync>,
) -> Vec<GeneratedMethod> {
    let getter_method = getter_name(name, None);
    let return_type = type_decl
        .map(|t| t.trim_start_matches('?'))
        .unwrap_or("Collection");
    let getter_text = format!(
        "/**\n * @return {return_type}<int, {item_type}>\n */\n{}",
        method(
            format!("public function {getter_method}(): {return_type}"),
            &[format!("return $this->{name};")],
        )
    );

    let (adder, remover) = collection_method_names(name);
    let item = lcfirst(&as_camel_case(&to_singular(name)));
    let item = if item == name { format!("{item}Item") } else { item };

    let mut add_body = vec![
        format!("if (!$this->{name}->contains(${item})) {{"),
        format!("    $this->{name}->add(${item});"),
    ];
    let mut remove_body = Vec::new();
    match sync {
        Some(InverseSync::Reference { field }) => {
            let other = as_camel_case(field);
            add_body.push(format!("    ${item}->set{other}($this);"));
            add_body.push("}".to_string());
            remove_body.push(format!("if ($this->{name}->removeElement(${item})) {{"));
            remove_body.push("    // set the owning side to null (unless already changed)".to_string());
            remove_body.push(format!("    if (${item}->get{other}() === $this) {{"));
            remove_body.push(format!("        ${item}->set{other}(null);"));
            remove_body.push("    }".to_string());
            remove_body.push("}".to_string());
        }
        Some(InverseSync::Collection { field }) => {
            let (other_add, other_remove) = collection_method_names(field);
            add_body.push(format!("    ${item}->{other_add}($this);"));
            add_body.push("}".to_string());
            remove_body.push(format!("if ($this->{name}->removeElement(${item})) {{"));
            remove_body.push(format!("    ${item}->{other_remove}($this);"));
            remove_body.push("}".to_string());
        }
        None => {
            add_body.push("}".to_string());
            remove_body.push(format!("$this->{name}->removeElement(${item});"));
        }
    }
    for body in [&mut add_body, &mut remove_body] {
        body.push(String::new());
        body.push("return $this;".to_string());
    }

    vec![
        GeneratedMethod {
            name: getter_method,
            text: getter_text,
        },
        GeneratedMethod {
            text: method(
                format!("public function {adder}({item_type} ${item}): static"),
                &add_body,
            ),
            name: adder,
        },
        GeneratedMethod {
            text: method(
                format!("public function {remover}({item_type} ${item}): static"),
                &remove_body,
            ),
            name: remover,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Visibility;
    use crate::span::Span;
    use pretty_assertions::assert_eq;

    fn property(name: &str, type_decl: Option<&str>) -> Property {
        Property {
            name: name.to_string(),
            type_decl: type_decl.map(str::to_string),
            nullable: type_decl.is_some_and(|t| t.starts_with('?')),
            default: None,
            visibility: Visibility::Private,
            is_static: false,
            is_readonly: false,
            tags: Vec::new(),
            doc: None,
            span: Span::default(),
            decl_span: Span::default(),
        }
    }

    #[test]
    fn accessor_names() {
        assert_eq!(getter_name("foo_bar", Some("string")), "getFooBar");
        assert_eq!(getter_name("active", Some("?bool")), "isActive");
        assert_eq!(getter_name("isActive", Some("bool")), "isActive");
        assert_eq!(getter_name("hasAccess", Some("bool")), "hasAccess");
        assert_eq!(getter_name("history", Some("bool")), "isHistory");
        assert_eq!(setter_name("foo_bar"), "setFooBar");
        assert_eq!(
            collection_method_names("dependants"),
            ("addDependant".to_string(), "removeDependant".to_string())
        );
    }

    #[test]
    fn value_accessors() {
        let methods = generate(
            &property("firstName", Some("?string")),
            &AccessorKind::Value { nullable: false },
        );
        assert_eq!(methods.len(), 2);
        assert_eq!(
            methods[0].text,
            "public function getFirstName(): ?string\n{\n    return $this->firstName;\n}"
        );
        assert_eq!(
            methods[1].text,
            "public function setFirstName(string $firstName): static\n{\n    $this->firstName = $firstName;\n\n    return $this;\n}"
        );
    }

    #[test]
    fn read_only_has_no_setter() {
        let methods = generate(&property("id", Some("?int")), &AccessorKind::ReadOnly);
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "getId");
    }

    #[test]
    fn collection_with_reference_sync() {
        let methods = generate(
            &property("photos", Some("Collection")),
            &AccessorKind::Collection {
                item_type: "UserAvatarPhoto".to_string(),
                sync: Some(InverseSync::Reference {
                    field: "user".to_string(),
                }),
            },
        );
        let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["getPhotos", "addPhoto", "removePhoto"]);
        assert!(methods[0].text.contains("@return Collection<int, UserAvatarPhoto>"));
        assert_eq!(
            methods[1].text,
            "public function addPhoto(UserAvatarPhoto $photo): static\n{\n    if (!$this->photos->contains($photo)) {\n        $this->photos->add($photo);\n        $photo->setUser($this);\n    }\n\n    return $this;\n}"
        );
        assert!(methods[2].text.contains("if ($photo->getUser() === $this) {"));
    }

    #[test]
    fn collection_with_collection_sync() {
        let methods = generate(
            &property("students", Some("Collection")),
            &AccessorKind::Collection {
                item_type: "User".to_string(),
                sync: Some(InverseSync::Collection {
                    field: "courses".to_string(),
                }),
            },
        );
        assert!(methods[1].text.contains("$student->addCourse($this);"));
        assert!(methods[2].text.contains("$student->removeCourse($this);"));
    }

    #[test]
    fn inverse_one_to_one_sets_owning_side() {
        let methods = generate(
            &property("user", Some("?User")),
            &AccessorKind::InverseOneToOne {
                owning_field: "userProfile".to_string(),
                owning_nullable: true,
            },
        );
        let setter = &methods[1].text;
        assert!(setter.starts_with("public function setUser(?User $user): static"));
        assert!(setter.contains("$this->user->setUserProfile(null);"));
        assert!(setter.contains("$user->setUserProfile($this);"));
    }
}
