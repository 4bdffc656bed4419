//! Maker configuration
//!
//! Read from the `maker:` section of `config/packages/maker.yaml`; every
//! key is optional.
//!
//! ```yaml
//! maker:
//!   root_namespace: App
//!   source_root: src
//!   entity_namespace: Entity
//!   vendor_dirs: [vendor]
//!   autoload:
//!     'Some\Vendor\': vendor/some-vendor/src
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fs::Filesystem;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/packages/maker.yaml";

/// Project layout and naming configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldConfig {
    /// Namespace mapped onto `source_root`
    pub root_namespace: String,
    /// Editable source directory
    pub source_root: PathBuf,
    /// Namespace of entities, relative to `root_namespace`
    pub entity_namespace: String,
    /// Directories that are never edited
    pub vendor_dirs: Vec<PathBuf>,
    /// Extra namespace prefix → directory mappings
    pub autoload: IndexMap<String, PathBuf>,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            root_namespace: "App".to_string(),
            source_root: PathBuf::from("src"),
            entity_namespace: "Entity".to_string(),
            vendor_dirs: vec![PathBuf::from("vendor")],
            autoload: IndexMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MakerSection {
    #[serde(default)]
    maker: Option<ScaffoldConfig>,
}

impl ScaffoldConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With root namespace
    #[must_use]
    pub fn with_root_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.root_namespace = namespace.into().trim_matches('\\').to_string();
        self
    }

    /// With source root
    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = root.into();
        self
    }

    /// With entity namespace
    #[must_use]
    pub fn with_entity_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.entity_namespace = namespace.into().trim_matches('\\').to_string();
        self
    }

    /// With an additional autoload mapping
    #[must_use]
    pub fn with_autoload(mut self, prefix: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.autoload
            .insert(prefix.into().trim_matches('\\').to_string(), dir.into());
        self
    }

    /// Fully-qualified entity namespace (`App\Entity`)
    #[must_use]
    pub fn entity_namespace_fqn(&self) -> String {
        match (self.root_namespace.as_str(), self.entity_namespace.as_str()) {
            ("", ns) => ns.to_string(),
            (root, "") => root.to_string(),
            (root, ns) => format!("{root}\\{ns}"),
        }
    }

    /// Parse the `maker:` section of a YAML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Yaml`] for malformed YAML.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let section: MakerSection = serde_yaml::from_str(text)?;
        let mut config = section.maker.unwrap_or_default();
        config.root_namespace = config.root_namespace.trim_matches('\\').to_string();
        config.entity_namespace = config.entity_namespace.trim_matches('\\').to_string();
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load(fs: &dyn Filesystem, path: &Path) -> Result<Self, ConfigError> {
        if !fs.exists(path) {
            tracing::debug!(path = %path.display(), "no maker configuration; using defaults");
            return Ok(Self::default());
        }
        let text = fs.read(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), root = %config.root_namespace, "loaded maker configuration");
        Ok(config)
    }
}
