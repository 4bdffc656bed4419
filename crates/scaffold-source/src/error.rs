//! Error types for parsing and mutating class files
//!
//! - Parse operations (text → [`ClassFile`](crate::ClassFile))
//! - Mutation operations (structural edits)
//! - Naming helpers (discriminator)

use crate::edit::EditError;

/// Errors turning text into a class-file model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Text does not start with a `<?php` tag
    #[error("missing '<?php' opening tag")]
    MissingOpenTag,

    /// Syntax the scanner cannot get past
    #[error("syntax error at line {line}: {message}")]
    Syntax {
        /// 1-based line
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Not exactly one class-like declaration
    #[error("expected exactly one class, interface or enum declaration, found {found}")]
    DeclarationCount {
        /// Declarations found
        found: usize,
    },

    /// Declaration kind that is not modeled
    #[error("unsupported declaration kind '{0}'")]
    UnsupportedDeclaration(String),

    /// Class member the strict parser does not recognize
    #[error("unrecognized class member at line {line}")]
    UnrecognizedMember {
        /// 1-based line
        line: usize,
    },

    /// Method signature that cannot be read
    #[error("malformed method '{name}' at line {line}")]
    MalformedMethod {
        /// Method name
        name: String,
        /// 1-based line
        line: usize,
    },

    /// Two members with the same name
    #[error("duplicate {kind} '{name}' at line {line}")]
    DuplicateMember {
        /// `property` or `method`
        kind: &'static str,
        /// Member name
        name: String,
        /// 1-based line of the second declaration
        line: usize,
    },
}

impl ParseError {
    /// Create syntax error
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// Errors applying a structural operation
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// Property or method exists and overwrite was not requested
    #[error("{kind} '{name}' already exists")]
    NameCollision {
        /// `property` or `method`
        kind: &'static str,
        /// Member name
        name: String,
    },

    /// Operation targets a member that does not exist
    #[error("{kind} '{name}' not found")]
    TargetNotFound {
        /// `property` or `method`
        kind: &'static str,
        /// Member name
        name: String,
    },

    /// Operation input is unusable
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Edit computed against stale text
    #[error("stale edit: {0}")]
    StaleEdit(#[from] EditError),

    /// Generated text no longer parses
    #[error("edited text no longer parses: {0}")]
    Reparse(#[from] ParseError),

    /// Alias computation failed
    #[error("naming error: {0}")]
    Naming(#[from] NamingError),
}

impl MutationError {
    /// Create name collision error
    pub fn collision(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NameCollision {
            kind,
            name: name.into(),
        }
    }

    /// Whether the run may continue after this error
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NameCollision { .. })
    }
}

/// Errors from naming helpers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// Two names that cannot be told apart
    #[error("cannot discriminate '{left}' from '{right}': they name the same class")]
    Ambiguous {
        /// First name
        left: String,
        /// Second name
        right: String,
    },
}
