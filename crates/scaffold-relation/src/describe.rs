//! Human-readable relation choices
//!
//! One line pair per cardinality, shown before the user picks a relation
//! type. Class names are disambiguated when the short names collide
//! (`User` vs `Friend\User`).

use std::fmt::{self, Display, Formatter};

use scaffold_source::inflector::short_class_name;
use scaffold_source::{display_name, NamingError};

use crate::cardinality::Cardinality;

const LABEL_WIDTH: usize = 13;

/// Text describing one cardinality between two classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescription {
    /// Cardinality described
    pub cardinality: Cardinality,
    /// Sentence from the source's point of view
    pub line: String,
    /// Sentence from the target's point of view
    pub inverse_line: String,
}

impl Display for RelationDescription {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = self.cardinality.name();
        writeln!(f, "{label:<LABEL_WIDTH$}{}", self.line)?;
        write!(f, "{:LABEL_WIDTH$}{}", "", self.inverse_line)
    }
}

fn names(source: &str, target: &str) -> Result<(String, String), NamingError> {
    let source = source.trim_start_matches('\\');
    let target = target.trim_start_matches('\\');
    if source.eq_ignore_ascii_case(target) {
        let short = short_class_name(source).to_string();
        return Ok((short.clone(), short));
    }
    Ok((display_name(source, target)?, display_name(target, source)?))
}

/// Describe one cardinality from `source` to `target`
///
/// # Errors
/// Returns [`NamingError::Ambiguous`] when two distinct names cannot be
/// told apart.
pub fn describe(
    cardinality: Cardinality,
    source: &str,
    target: &str,
) -> Result<RelationDescription, NamingError> {
    let (s, t) = names(source, target)?;
    let (line, inverse_line) = match cardinality {
        Cardinality::ManyToOne => (
            format!("Each {s} relates to (has) one {t}."),
            format!("Each {t} can relate to (can have) many {s} objects."),
        ),
        Cardinality::OneToMany => (
            format!("Each {s} can relate to (can have) many {t} objects."),
            format!("Each {t} relates to (has) one {s}."),
        ),
        Cardinality::ManyToMany => (
            format!("Each {s} can relate to (can have) many {t} objects."),
            format!("Each {t} can also relate to (can also have) many {s} objects."),
        ),
        Cardinality::OneToOne => (
            format!("Each {s} relates to (has) exactly one {t}."),
            format!("Each {t} also relates to (has) exactly one {s}."),
        ),
    };
    Ok(RelationDescription {
        cardinality,
        line,
        inverse_line,
    })
}

/// Describe every cardinality, in presentation order
///
/// # Errors
/// See [`describe`].
pub fn describe_all(source: &str, target: &str) -> Result<Vec<RelationDescription>, NamingError> {
    Cardinality::all()
        .into_iter()
        .map(|c| describe(c, source, target))
        .collect()
}
