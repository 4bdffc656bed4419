//! Class name ↔ file path resolution
//!
//! Namespaces map onto directories PSR-4 style: the root namespace onto
//! the source root, plus any configured autoload prefixes. The longest
//! matching prefix wins.

use std::path::{Component, Path, PathBuf};

use scaffold_relation::ClassRef;
use scaffold_source::inflector::short_class_name;

use crate::config::ScaffoldConfig;
use crate::error::ScaffoldError;

/// Resolves class names to files and decides editability
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    config: ScaffoldConfig,
    prefixes: Vec<(String, PathBuf)>,
}

impl ProjectLayout {
    /// Create layout from configuration
    #[must_use]
    pub fn new(config: ScaffoldConfig) -> Self {
        let mut prefixes: Vec<(String, PathBuf)> = config
            .autoload
            .iter()
            .map(|(prefix, dir)| (prefix.trim_matches('\\').to_string(), dir.clone()))
            .collect();
        prefixes.push((config.root_namespace.clone(), config.source_root.clone()));
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { config, prefixes }
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    /// Fully-qualified name for a class name typed by the user
    ///
    /// A leading `\` marks an absolute name; anything else is relative to
    /// the entity namespace (`Friend\User` → `App\Entity\Friend\User`).
    #[must_use]
    pub fn entity_fqn(&self, input: &str) -> String {
        let input = input.trim();
        if let Some(absolute) = input.strip_prefix('\\') {
            return absolute.to_string();
        }
        let base = self.config.entity_namespace_fqn();
        if base.is_empty() {
            input.to_string()
        } else {
            format!("{base}\\{input}")
        }
    }

    /// Directory of a namespace
    #[must_use]
    pub fn namespace_dir(&self, namespace: &str) -> Option<PathBuf> {
        let namespace = namespace.trim_matches('\\');
        self.prefixes.iter().find_map(|(prefix, dir)| {
            let rest = if prefix.is_empty() {
                Some(namespace)
            } else if namespace.eq_ignore_ascii_case(prefix) {
                Some("")
            } else {
                namespace
                    .get(..prefix.len() + 1)
                    .filter(|head| head.eq_ignore_ascii_case(&format!("{prefix}\\")))
                    .map(|_| &namespace[prefix.len() + 1..])
            }?;
            let mut path = dir.clone();
            for segment in rest.split('\\').filter(|s| !s.is_empty()) {
                path.push(segment);
            }
            Some(path)
        })
    }

    /// File of a class
    #[must_use]
    pub fn path_for(&self, fqn: &str) -> Option<PathBuf> {
        let fqn = fqn.trim_start_matches('\\');
        let namespace = fqn.rsplit_once('\\').map_or("", |(ns, _)| ns);
        let mut path = self.namespace_dir(namespace)?;
        path.push(format!("{}.php", short_class_name(fqn)));
        Some(path)
    }

    /// Whether a file lies inside the source root and outside vendor dirs
    #[must_use]
    pub fn is_editable(&self, path: &Path) -> bool {
        let path = normalize(path);
        let within_source = path.starts_with(normalize(&self.config.source_root));
        let within_vendor = self
            .config
            .vendor_dirs
            .iter()
            .any(|dir| path.starts_with(normalize(dir)));
        within_source && !within_vendor
    }

    /// Class reference for a fully-qualified name
    ///
    /// # Errors
    /// Returns [`ScaffoldError::InvalidInput`] when no directory maps the
    /// class's namespace.
    pub fn class_ref(&self, fqn: &str) -> Result<ClassRef, ScaffoldError> {
        let path = self.path_for(fqn).ok_or_else(|| {
            ScaffoldError::invalid(format!("no autoload directory maps class '{fqn}'"))
        })?;
        let editable = self.is_editable(&path);
        Ok(ClassRef::new(fqn, path, editable))
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ProjectLayout {
        ProjectLayout::new(ScaffoldConfig::new().with_autoload("Some\\Vendor\\", "vendor/some-vendor/src"))
    }

    #[test]
    fn entity_names() {
        let layout = layout();
        assert_eq!(layout.entity_fqn("User"), "App\\Entity\\User");
        assert_eq!(layout.entity_fqn("Friend\\User"), "App\\Entity\\Friend\\User");
        assert_eq!(layout.entity_fqn("\\Some\\Vendor\\Group"), "Some\\Vendor\\Group");
    }

    #[test]
    fn paths() {
        let layout = layout();
        assert_eq!(
            layout.path_for("App\\Entity\\Friend\\User"),
            Some(PathBuf::from("src/Entity/Friend/User.php"))
        );
        assert_eq!(
            layout.path_for("Some\\Vendor\\Group"),
            Some(PathBuf::from("vendor/some-vendor/src/Group.php"))
        );
        assert_eq!(layout.path_for("Other\\Thing"), None);
    }

    #[test]
    fn vendor_is_read_only() {
        let layout = layout();
        let group = layout.class_ref("Some\\Vendor\\Group").unwrap();
        assert!(!group.editable);
        let user = layout.class_ref("App\\Entity\\User").unwrap();
        assert!(user.editable);
        assert!(layout.is_editable(Path::new("./src/Entity/User.php")));
    }

    #[test]
    fn custom_root_namespace() {
        let layout = ProjectLayout::new(ScaffoldConfig::new().with_root_namespace("Custom"));
        assert_eq!(layout.entity_fqn("User"), "Custom\\Entity\\User");
        assert_eq!(
            layout.path_for("Custom\\Entity\\User"),
            Some(PathBuf::from("src/Entity/User.php"))
        );
        assert_eq!(layout.namespace_dir("Custom\\Entity"), Some(PathBuf::from("src/Entity")));
    }
}
