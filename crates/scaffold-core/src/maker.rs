//! Maker registry

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use crate::error::ScaffoldError;

/// Available makers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MakerKind {
    /// Create or update an entity class, one field at a time
    Entity,
    /// Regenerate accessors for every entity of a namespace
    Regenerate,
}

impl MakerKind {
    /// All makers
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::Entity, Self::Regenerate]
    }

    /// Identifier used on the command line
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Regenerate => "regenerate",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Entity => "Create or update an entity class with fields and relations",
            Self::Regenerate => "Regenerate getters, setters and collection methods from mapping tags",
        }
    }

    /// Look up a maker by identifier
    ///
    /// # Errors
    /// Returns [`ScaffoldError::UnknownMaker`] for an unknown identifier.
    pub fn from_id(id: &str) -> Result<Self, ScaffoldError> {
        let wanted = id.trim();
        Self::all()
            .into_iter()
            .find(|k| k.id() == wanted)
            .ok_or_else(|| ScaffoldError::UnknownMaker(wanted.to_string()))
    }
}

impl Display for MakerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MakerKind {
    type Err = ScaffoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}
