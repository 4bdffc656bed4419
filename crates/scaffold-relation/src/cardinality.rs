//! Relation cardinalities

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cardinality of a relation, read from the side that declares it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Many of this class point at one of the other
    ManyToOne,
    /// One of this class holds many of the other
    OneToMany,
    /// Collections on both sides
    ManyToMany,
    /// Single reference on both sides
    OneToOne,
}

impl Cardinality {
    /// All cardinalities in presentation order
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::ManyToOne,
            Self::OneToMany,
            Self::ManyToMany,
            Self::OneToOne,
        ]
    }

    /// Cardinality seen from the other side
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::ManyToOne => Self::OneToMany,
            Self::OneToMany => Self::ManyToOne,
            Self::ManyToMany => Self::ManyToMany,
            Self::OneToOne => Self::OneToOne,
        }
    }

    /// Whether the declaring side holds a collection
    #[must_use]
    pub const fn is_to_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// Mapping name (`ManyToOne`)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ManyToOne => "ManyToOne",
            Self::OneToMany => "OneToMany",
            Self::ManyToMany => "ManyToMany",
            Self::OneToOne => "OneToOne",
        }
    }
}

impl Display for Cardinality {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown cardinality name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown relation type '{0}'")]
pub struct UnknownCardinality(pub String);

impl FromStr for Cardinality {
    type Err = UnknownCardinality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCardinality(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_is_an_involution() {
        for c in Cardinality::all() {
            assert_eq!(c.inverse().inverse(), c);
        }
        assert_eq!(Cardinality::ManyToOne.inverse(), Cardinality::OneToMany);
    }

    #[test]
    fn parse_names() {
        assert_eq!("manytoone".parse::<Cardinality>().unwrap(), Cardinality::ManyToOne);
        assert_eq!(" OneToOne ".parse::<Cardinality>().unwrap(), Cardinality::OneToOne);
        assert!("relation".parse::<Cardinality>().is_err());
    }

    #[test]
    fn to_many_sides() {
        assert!(Cardinality::OneToMany.is_to_many());
        assert!(Cardinality::ManyToMany.is_to_many());
        assert!(!Cardinality::ManyToOne.is_to_many());
        assert!(!Cardinality::OneToOne.is_to_many());
    }
}
