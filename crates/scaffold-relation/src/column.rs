//! Scalar column fields

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mapped scalar type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Bounded string
    String,
    /// Unbounded text
    Text,
    /// Integer
    Integer,
    /// Floating point
    Float,
    /// Boolean
    Boolean,
    /// Immutable date and time
    DatetimeImmutable,
    /// JSON document
    Json,
}

impl ColumnType {
    /// All types in presentation order
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::String,
            Self::Text,
            Self::Integer,
            Self::Float,
            Self::Boolean,
            Self::DatetimeImmutable,
            Self::Json,
        ]
    }

    /// Name typed at the prompt
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::DatetimeImmutable => "datetime_immutable",
            Self::Json => "json",
        }
    }

    /// Property type in the class file, without `?`
    #[must_use]
    pub const fn php_type(self) -> &'static str {
        match self {
            Self::String | Self::Text => "string",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Boolean => "bool",
            Self::DatetimeImmutable => "\\DateTimeImmutable",
            Self::Json => "array",
        }
    }

    /// Whether the column takes a length
    #[must_use]
    pub const fn has_length(self) -> bool {
        matches!(self, Self::String)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown column type name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type '{0}'")]
pub struct UnknownColumnType(pub String);

impl FromStr for ColumnType {
    type Err = UnknownColumnType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let alias = match wanted.to_ascii_lowercase().as_str() {
            "int" => Some(Self::Integer),
            "bool" => Some(Self::Boolean),
            "datetime" => Some(Self::DatetimeImmutable),
            _ => None,
        };
        alias
            .or_else(|| {
                Self::all()
                    .into_iter()
                    .find(|t| t.name().eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| UnknownColumnType(wanted.to_string()))
    }
}

/// A scalar field to add
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Field name
    pub field: String,
    /// Mapped type
    pub column_type: ColumnType,
    /// Length for string columns
    pub length: Option<u32>,
    /// Column accepts `null`
    pub nullable: bool,
}

impl ColumnSpec {
    /// Non-nullable column without a length
    #[must_use]
    pub fn new(field: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            field: field.into(),
            column_type,
            length: None,
            nullable: false,
        }
    }

    /// Set length
    #[must_use]
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set nullability
    #[must_use]
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names_and_aliases() {
        assert_eq!("string".parse::<ColumnType>().unwrap(), ColumnType::String);
        assert_eq!("INT".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!(
            "datetime_immutable".parse::<ColumnType>().unwrap(),
            ColumnType::DatetimeImmutable
        );
        assert!("relation".parse::<ColumnType>().is_err());
    }

    #[test]
    fn only_strings_have_length() {
        let with_length: Vec<_> = ColumnType::all().into_iter().filter(|t| t.has_length()).collect();
        assert_eq!(with_length, vec![ColumnType::String]);
    }
}
