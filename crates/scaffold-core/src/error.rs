//! Error types for Scaffold Core
//!
//! Provides error handling for:
//! - Filesystem access
//! - Configuration loading
//! - Prompt answers
//! - Parsing, planning and mutating class files

use std::io;
use std::path::PathBuf;

use scaffold_relation::RelationError;
use scaffold_source::{MutationError, ParseError};

/// Filesystem errors
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// File does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Any other I/O failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Map an I/O error on `path`, turning `NotFound` into [`FsError::NotFound`]
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("configuration error: {0}")]
    Io(#[from] FsError),

    /// Configuration file is not valid YAML for this schema
    #[error("invalid configuration YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Prompt errors
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// No answer left for a question
    #[error("no answer left for: {question}")]
    AnswersExhausted {
        /// Question that went unanswered
        question: String,
    },

    /// Answer of the wrong shape for a question
    #[error("unexpected answer {answer} for: {question}")]
    UnexpectedAnswer {
        /// Question asked
        question: String,
        /// Answer given
        answer: String,
    },

    /// Reading or writing the terminal failed
    #[error("prompt I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Main error type of makers and sessions
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    /// Filesystem failure
    #[error(transparent)]
    Fs(#[from] FsError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Prompt failure
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// A class file could not be parsed
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ParseError,
    },

    /// A class file could not be edited
    #[error("cannot edit {}: {source}", path.display())]
    Mutation {
        /// File being edited
        path: PathBuf,
        /// Underlying error
        #[source]
        source: MutationError,
    },

    /// Relation rejected or not lowerable
    #[error(transparent)]
    Relation(#[from] RelationError),

    /// User input rejected
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No maker with this identifier
    #[error("unknown maker '{0}'")]
    UnknownMaker(String),
}

impl ScaffoldError {
    /// Create invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wrap a parse error with its path
    pub fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    /// Wrap a mutation error with its path
    pub fn mutation(path: impl Into<PathBuf>, source: MutationError) -> Self {
        Self::Mutation {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_classified() {
        let err = FsError::io("src/Entity/User.php", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, FsError::NotFound(_)));
        let err = FsError::io("src", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, FsError::Io { .. }));
    }

    #[test]
    fn display_includes_path() {
        let err = ScaffoldError::from(FsError::NotFound(PathBuf::from("src/Entity/User.php")));
        assert_eq!(err.to_string(), "file not found: src/Entity/User.php");
    }
}
