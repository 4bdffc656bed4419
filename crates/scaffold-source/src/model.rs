//! Class-file model
//!
//! A [`ClassFile`] is the parsed view of one source file: the recognized
//! top-level statements and class members, each with the exact byte span it
//! occupies. The original text is kept alongside, so serializing an
//! untouched model returns the input unchanged.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::hash::ContentHash;
use crate::inflector::{namespace_of, short_class_name};
use crate::scanner::{split_top_level, Cursor};
use crate::span::Span;

/// How forgiving the parser is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Reject anything not recognized
    #[default]
    Strict,
    /// Keep unknown members opaque and flag malformed methods
    Lenient,
}

/// Kind of the single class-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// `class`
    Class,
    /// `interface`
    Interface,
    /// `enum`
    Enum,
}

impl DeclarationKind {
    /// Source keyword
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
        }
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// `public` (also the implicit default)
    #[default]
    Public,
    /// `protected`
    Protected,
    /// `private`
    Private,
}

impl Visibility {
    /// Source keyword
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Protected => "protected",
            Self::Private => "private",
        }
    }

    pub(crate) fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// What a `use` statement imports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// Class, interface or namespace
    Class,
    /// `use function`
    Function,
    /// `use const`
    Const,
}

/// Namespace declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    /// Namespace name without leading `\`
    pub name: String,
    /// Whole `namespace X;` statement
    pub span: Span,
}

/// One imported name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    /// Fully-qualified name without leading `\`
    pub name: String,
    /// Explicit alias
    pub alias: Option<String>,
    /// Import kind
    pub kind: ImportKind,
    /// Span of the enclosing `use` statement
    pub span: Span,
    /// Part of a group or multi-clause statement
    pub grouped: bool,
}

impl Import {
    /// Name the import is visible under in the file
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| short_class_name(&self.name))
    }
}

/// Argument of a tag entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagArgument {
    /// Name of a named argument
    pub name: Option<String>,
    /// Verbatim value text
    pub value: String,
}

/// One entry of a tag group (`#[A, B(x: 1)]` has two)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    /// Tag name as written (`ORM\Column`)
    pub name: String,
    /// Parsed arguments, in order
    pub arguments: Vec<TagArgument>,
}

impl TagEntry {
    /// Value of a named argument
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| a.value.as_str())
    }

    /// Value of the `index`-th positional argument
    #[must_use]
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.arguments
            .iter()
            .filter(|a| a.name.is_none())
            .nth(index)
            .map(|a| a.value.as_str())
    }

    /// Whether the entry's name ends with `short` (`Column` matches `ORM\Column`)
    #[must_use]
    pub fn is(&self, short: &str) -> bool {
        short_class_name(&self.name) == short
    }
}

/// Structured metadata tag (`#[...]`)
///
/// Raw text is authoritative; the parsed entries are a best-effort view and
/// are empty when the arguments could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataTag {
    /// Verbatim text including `#[` and `]`
    pub text: String,
    /// Parsed entries
    pub entries: Vec<TagEntry>,
    /// Location in the file
    pub span: Span,
}

impl MetadataTag {
    /// Parse raw tag text
    #[must_use]
    pub fn parse(text: &str, span: Span) -> Self {
        let entries = text
            .strip_prefix("#[")
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|inner| split_top_level(inner, b','))
            .map(|parts| parts.into_iter().filter_map(parse_entry).collect())
            .unwrap_or_default();
        Self {
            text: text.to_string(),
            entries,
            span,
        }
    }

    /// Namespace prefix of the first entry (`ORM` for `#[ORM\Column]`)
    #[must_use]
    pub fn family(&self) -> &str {
        self.entries
            .first()
            .map_or("", |e| namespace_of(&e.name))
    }

    /// First entry named `short`
    #[must_use]
    pub fn entry(&self, short: &str) -> Option<&TagEntry> {
        self.entries.iter().find(|e| e.is(short))
    }
}

fn parse_entry(text: &str) -> Option<TagEntry> {
    let mut cursor = Cursor::new(text);
    let name = cursor.name()?.trim_start_matches('\\').to_string();
    cursor.skip_whitespace();
    let mut arguments = Vec::new();
    if cursor.peek() == Some(b'(') {
        let open = cursor.pos();
        cursor.skip_balanced().ok()?;
        let inner = &text[open + 1..cursor.pos() - 1];
        for part in split_top_level(inner, b',')? {
            arguments.push(parse_argument(part));
        }
    }
    Some(TagEntry { name, arguments })
}

fn parse_argument(part: &str) -> TagArgument {
    let mut cursor = Cursor::new(part);
    if let Some(name) = cursor.ident() {
        cursor.skip_whitespace();
        if cursor.peek() == Some(b':') && cursor.peek_at(1) != Some(b':') {
            return TagArgument {
                name: Some(name.to_string()),
                value: part[cursor.pos() + 1..].trim().to_string(),
            };
        }
    }
    TagArgument {
        name: None,
        value: part.to_string(),
    }
}

/// Typed property declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    /// Name without `$`
    pub name: String,
    /// Declared type text
    pub type_decl: Option<String>,
    /// Type admits `null`
    pub nullable: bool,
    /// Default value text
    pub default: Option<String>,
    /// Visibility
    pub visibility: Visibility,
    /// `static`
    pub is_static: bool,
    /// `readonly`
    pub is_readonly: bool,
    /// Attached tags
    pub tags: Vec<MetadataTag>,
    /// Doc block text
    pub doc: Option<String>,
    /// Declaration including doc block and tags
    pub span: Span,
    /// Declaration without doc block and tags
    pub decl_span: Span,
}

impl Property {
    /// First attached tag entry named `short`
    #[must_use]
    pub fn tag_entry(&self, short: &str) -> Option<&TagEntry> {
        self.tags.iter().find_map(|t| t.entry(short))
    }

    /// Type without a leading `?`
    #[must_use]
    pub fn base_type(&self) -> Option<&str> {
        self.type_decl.as_deref().map(|t| t.trim_start_matches('?'))
    }
}

/// Method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Name without `$`
    pub name: String,
    /// Declared type text
    pub type_decl: Option<String>,
    /// Default value text
    pub default: Option<String>,
    /// `...$name`
    pub variadic: bool,
    /// `&$name`
    pub by_ref: bool,
    /// Constructor-promoted property
    pub promoted: bool,
}

/// Method declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    /// Name as written
    pub name: String,
    /// Visibility
    pub visibility: Visibility,
    /// `static`
    pub is_static: bool,
    /// `abstract`, or a body-less interface method
    pub is_abstract: bool,
    /// Parameters
    pub parameters: Vec<Parameter>,
    /// Return type text
    pub return_type: Option<String>,
    /// Body text between the braces
    pub body: Option<String>,
    /// Doc block text
    pub doc: Option<String>,
    /// Attached tags
    pub tags: Vec<MetadataTag>,
    /// Declaration including doc block and tags
    pub span: Span,
    /// Declaration without doc block and tags
    pub decl_span: Span,
    /// Span of the body braces
    pub body_span: Option<Span>,
    /// Signature could not be read; only set by the lenient parse
    pub malformed: bool,
}

/// Kind of a class-body member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// Property declaration
    Property,
    /// Method declaration
    Method,
    /// `const` declaration
    Constant,
    /// Enum `case`
    Case,
    /// Trait `use`
    TraitUse,
    /// Anything the lenient parse could not recognize
    Opaque,
}

/// Member in body order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    /// Kind
    pub kind: MemberKind,
    /// Span including doc block and tags
    pub span: Span,
}

/// Formatting conventions detected in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Style {
    /// One indentation level
    pub indent: String,
    /// Line ending
    pub newline: String,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            newline: "\n".to_string(),
        }
    }
}

impl Style {
    /// `level` indentation units
    #[must_use]
    pub fn indent(&self, level: usize) -> String {
        self.indent.repeat(level)
    }

    /// Re-indent a `\n`-separated block to `level` and convert line endings
    ///
    /// Blank lines stay empty.
    #[must_use]
    pub fn block(&self, text: &str, level: usize) -> String {
        let prefix = self.indent(level);
        text.split('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    let depth = line.len() - line.trim_start_matches("    ").len();
                    let inner = self.indent(depth / 4);
                    format!("{prefix}{inner}{}", line.trim_start_matches("    "))
                }
            })
            .collect::<Vec<_>>()
            .join(&self.newline)
    }
}

/// Parsed class file
///
/// Constructed by [`parse`](crate::parse); changed only through the
/// [`Mutator`](crate::Mutator), which re-parses after every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassFile {
    pub(crate) path: PathBuf,
    #[serde(skip)]
    pub(crate) source: String,
    pub(crate) hash: ContentHash,
    pub(crate) mode: ParseMode,
    pub(crate) open_tag_end: usize,
    pub(crate) namespace: Option<Namespace>,
    pub(crate) imports: Vec<Import>,
    pub(crate) kind: DeclarationKind,
    pub(crate) name: String,
    pub(crate) class_tags: Vec<MetadataTag>,
    pub(crate) class_doc: Option<String>,
    pub(crate) header_start: usize,
    pub(crate) decl_span: Span,
    pub(crate) body_span: Span,
    pub(crate) properties: Vec<Property>,
    pub(crate) methods: Vec<Method>,
    pub(crate) members: Vec<Member>,
    pub(crate) style: Style,
}

impl ClassFile {
    /// File path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current text
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Full file text; equals the parsed input when no edit was applied
    #[inline]
    #[must_use]
    pub fn serialize(&self) -> String {
        self.source.clone()
    }

    /// Hash of the current text
    #[inline]
    #[must_use]
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Mode the model was parsed with
    #[inline]
    #[must_use]
    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Namespace name (`""` for the global namespace)
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.namespace.as_ref().map_or("", |ns| ns.name.as_str())
    }

    /// Namespace statement
    #[inline]
    #[must_use]
    pub fn namespace_decl(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    /// Imports in file order
    #[inline]
    #[must_use]
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// Declaration kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// Short name of the declared class
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fully-qualified name of the declared class
    #[must_use]
    pub fn fqn(&self) -> String {
        match self.namespace() {
            "" => self.name.clone(),
            ns => format!("{ns}\\{}", self.name),
        }
    }

    /// Class-level tags
    #[inline]
    #[must_use]
    pub fn class_tags(&self) -> &[MetadataTag] {
        &self.class_tags
    }

    /// Class doc block
    #[inline]
    #[must_use]
    pub fn class_doc(&self) -> Option<&str> {
        self.class_doc.as_deref()
    }

    /// Span of the declaration from its first modifier to the closing brace
    #[inline]
    #[must_use]
    pub fn decl_span(&self) -> Span {
        self.decl_span
    }

    /// Span of the body braces
    #[inline]
    #[must_use]
    pub fn body_span(&self) -> Span {
        self.body_span
    }

    /// Properties in declaration order
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Methods in declaration order
    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// All body members in order
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Detected formatting
    #[inline]
    #[must_use]
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Property by exact name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Method by name, compared case-insensitively
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Class import whose local name matches, case-insensitively
    #[must_use]
    pub fn import_by_local_name(&self, local: &str) -> Option<&Import> {
        self.imports
            .iter()
            .filter(|i| i.kind == ImportKind::Class)
            .find(|i| i.local_name().eq_ignore_ascii_case(local))
    }

    /// Class import of a fully-qualified name
    #[must_use]
    pub fn import_of(&self, fqn: &str) -> Option<&Import> {
        let fqn = fqn.trim_start_matches('\\');
        self.imports
            .iter()
            .filter(|i| i.kind == ImportKind::Class)
            .find(|i| i.name.eq_ignore_ascii_case(fqn))
    }

    /// Resolve a class name as written in this file to its fully-qualified form
    ///
    /// Handles fully-qualified names, imported names and aliases, partially
    /// qualified names through an imported prefix, and the current namespace.
    #[must_use]
    pub fn resolve_class_name(&self, written: &str) -> String {
        if let Some(absolute) = written.strip_prefix('\\') {
            return absolute.to_string();
        }
        if let Some(rest) = written.strip_prefix("namespace\\") {
            return self.qualify(rest);
        }
        let (head, tail) = match written.split_once('\\') {
            Some((head, tail)) => (head, Some(tail)),
            None => (written, None),
        };
        if let Some(import) = self.import_by_local_name(head) {
            return match tail {
                Some(tail) => format!("{}\\{tail}", import.name),
                None => import.name.clone(),
            };
        }
        if head.eq_ignore_ascii_case(&self.name) && tail.is_none() {
            return self.fqn();
        }
        self.qualify(written)
    }

    fn qualify(&self, name: &str) -> String {
        match self.namespace() {
            "" => name.to_string(),
            ns => format!("{ns}\\{name}"),
        }
    }

    /// Name usable in this file's code for `fqn`, if one is already in scope
    #[must_use]
    pub fn local_reference(&self, fqn: &str) -> Option<String> {
        let fqn = fqn.trim_start_matches('\\');
        if let Some(import) = self.import_of(fqn) {
            return Some(import.local_name().to_string());
        }
        if fqn.eq_ignore_ascii_case(&self.fqn()) {
            return Some(self.name.clone());
        }
        let short = short_class_name(fqn);
        let same_namespace = namespace_of(fqn).eq_ignore_ascii_case(self.namespace());
        if same_namespace && self.import_by_local_name(short).is_none() {
            return Some(short.to_string());
        }
        None
    }
}
