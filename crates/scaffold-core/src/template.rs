//! Skeletons for classes that do not exist yet

use scaffold_source::inflector::{namespace_of, short_class_name};

/// Renders the initial text of a new class file
pub trait TemplateRenderer: Send + Sync {
    /// Text of a new file declaring `fqn`
    fn render_class(&self, fqn: &str) -> String;
}

/// Minimal entity with a generated integer id
#[derive(Debug, Clone, Copy, Default)]
pub struct EntitySkeleton;

impl TemplateRenderer for EntitySkeleton {
    fn render_class(&self, fqn: &str) -> String {
        let fqn = fqn.trim_start_matches('\\');
        let namespace = namespace_of(fqn);
        let name = short_class_name(fqn);
        let mut text = String::from("<?php\n\n");
        if !namespace.is_empty() {
            text.push_str(&format!("namespace {namespace};\n\n"));
        }
        text.push_str(&format!(
            "use Doctrine\\ORM\\Mapping as ORM;

#[ORM\\Entity]
class {name}
{{
    #[ORM\\Id]
    #[ORM\\GeneratedValue]
    #[ORM\\Column]
    private ?int $id = null;

    public function getId(): ?int
    {{
        return $this->id;
    }}
}}
"
        ));
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaffold_source::{parse, ParseMode};

    #[test]
    fn skeleton_parses() {
        let text = EntitySkeleton.render_class("App\\Entity\\Course");
        let file = parse(&text, "src/Entity/Course.php", ParseMode::Strict).unwrap();
        assert_eq!(file.fqn(), "App\\Entity\\Course");
        assert!(file.property("id").is_some());
        assert!(file.method("getId").is_some());
        assert!(file.import_of("Doctrine\\ORM\\Mapping").is_some());
    }

    #[test]
    fn global_namespace() {
        let text = EntitySkeleton.render_class("\\Course");
        assert!(text.starts_with("<?php\n\nuse Doctrine"));
    }
}
