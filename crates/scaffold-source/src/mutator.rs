//! Structural operations on a parsed class file
//!
//! Each operation computes one [`Edit`] against the current text, applies
//! it, and re-parses the result in the file's original mode. Text outside
//! the edited span is never touched.
//!
//! Operations applied through [`Mutator::apply_all`] run in a fixed phase
//! order (imports, properties, constructor, accessors, tags) regardless of
//! the order they were planned in.

use std::collections::HashSet;

use serde::Serialize;

use crate::accessor::{self, AccessorKind};
use crate::discriminator::alias_for;
use crate::edit::Edit;
use crate::error::{MutationError, NamingError};
use crate::inflector::short_class_name;
use crate::model::{ClassFile, ImportKind, MemberKind, MetadataTag, Visibility};
use crate::parser::parse;
use crate::scanner::{split_top_level, strip_comments};
use crate::span::Span;

/// Property to declare
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertySpec {
    /// Name without `$`
    pub name: String,
    /// Declared type
    pub type_decl: Option<String>,
    /// Default value text
    pub default: Option<String>,
    /// Visibility
    pub visibility: Visibility,
    /// Tags written above the declaration, in order
    pub tags: Vec<String>,
    /// Doc block text
    pub doc: Option<String>,
}

impl PropertySpec {
    /// Private property with no type, default or tags
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_decl: None,
            default: None,
            visibility: Visibility::Private,
            tags: Vec::new(),
            doc: None,
        }
    }

    /// Set declared type
    #[must_use]
    pub fn with_type(mut self, type_decl: impl Into<String>) -> Self {
        self.type_decl = Some(type_decl.into());
        self
    }

    /// Set default value
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Add a tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set doc block
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        if let Some(doc) = &self.doc {
            lines.extend(doc.lines().map(str::to_string));
        }
        lines.extend(self.tags.iter().cloned());
        let mut decl = self.visibility.keyword().to_string();
        if let Some(t) = &self.type_decl {
            decl.push(' ');
            decl.push_str(t);
        }
        decl.push_str(" $");
        decl.push_str(&self.name);
        if let Some(default) = &self.default {
            decl.push_str(" = ");
            decl.push_str(default);
        }
        decl.push(';');
        lines.push(decl);
        lines.join("\n")
    }
}

/// Where a metadata tag goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TagTarget {
    /// The class declaration
    Class,
    /// A property by name
    Property(String),
    /// A method by name
    Method(String),
}

/// One structural operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum MutationOp {
    /// Import a class; an alias is chosen when none is given and the short
    /// name is taken
    AddImport {
        /// Fully-qualified name
        name: String,
        /// Explicit alias
        alias: Option<String>,
    },
    /// Declare a property
    AddProperty(PropertySpec),
    /// Make sure `__construct` contains a statement
    EnsureConstructorStatement(String),
    /// Generate accessors for a property
    AddAccessors {
        /// Property name
        property: String,
        /// Accessor shape
        kind: AccessorKind,
    },
    /// Attach a tag
    AddMetadataTag {
        /// Tagged declaration
        target: TagTarget,
        /// Full tag text
        tag: String,
    },
}

/// Application order of operations within one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// `use` statements
    Imports,
    /// Property declarations
    Properties,
    /// Constructor statements
    Constructor,
    /// Accessor methods
    Accessors,
    /// Metadata tags
    Tags,
}

impl MutationOp {
    /// Phase this operation runs in
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::AddImport { .. } => Phase::Imports,
            Self::AddProperty(_) => Phase::Properties,
            Self::EnsureConstructorStatement(_) => Phase::Constructor,
            Self::AddAccessors { .. } => Phase::Accessors,
            Self::AddMetadataTag { .. } => Phase::Tags,
        }
    }

    /// Property this operation depends on, if any
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::AddProperty(spec) => Some(&spec.name),
            Self::AddAccessors { property, .. } => Some(property),
            Self::AddMetadataTag {
                target: TagTarget::Property(name),
                ..
            } => Some(name),
            _ => None,
        }
    }
}

/// Effect of an operation on one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// New text was inserted
    Added,
    /// Existing declaration was replaced
    Replaced,
    /// Already present; nothing to do
    Unchanged,
    /// Left alone because of a collision
    Skipped,
}

/// Result of an operation on one subject (`import X`, `method getX`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// What was affected
    pub subject: String,
    /// What happened
    pub outcome: Outcome,
    /// Why it was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Change {
    fn new(subject: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            subject: subject.into(),
            outcome,
            note: None,
        }
    }

    fn skipped(subject: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            outcome: Outcome::Skipped,
            note: Some(note.into()),
        }
    }
}

/// Changes made by a batch of operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    /// Per-subject changes in application order
    pub changes: Vec<Change>,
}

impl MutationReport {
    /// Whether any text changed
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changes
            .iter()
            .any(|c| matches!(c.outcome, Outcome::Added | Outcome::Replaced))
    }

    /// Changes that were skipped
    pub fn skipped(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|c| c.outcome == Outcome::Skipped)
    }
}

/// How a class name will be referenced after importing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResolution {
    /// Name to use in code
    pub local: String,
    /// `use` statement to add, if any: name and alias
    pub import: Option<(String, Option<String>)>,
}

/// Decide how `fqn` can be referenced in `file`
///
/// `reserved` lists `(local, fqn)` pairs already claimed by imports that
/// are planned but not yet applied.
///
/// # Errors
/// Returns [`NamingError`] when an alias cannot be derived.
pub fn resolve_import(
    file: &ClassFile,
    fqn: &str,
    reserved: &[(String, String)],
) -> Result<ImportResolution, NamingError> {
    let fqn = fqn.trim_start_matches('\\');
    if let Some(local) = file.local_reference(fqn) {
        return Ok(ImportResolution {
            local,
            import: None,
        });
    }
    if let Some((local, _)) = reserved.iter().find(|(_, f)| f.eq_ignore_ascii_case(fqn)) {
        return Ok(ImportResolution {
            local: local.clone(),
            import: None,
        });
    }

    let clash = |name: &str| -> Option<String> {
        if let Some(import) = file.import_by_local_name(name) {
            return Some(import.name.clone());
        }
        if name.eq_ignore_ascii_case(file.name()) {
            return Some(file.fqn());
        }
        reserved
            .iter()
            .find(|(local, _)| local.eq_ignore_ascii_case(name))
            .map(|(_, f)| f.clone())
    };

    let short = short_class_name(fqn);
    let Some(other) = clash(short) else {
        return Ok(ImportResolution {
            local: short.to_string(),
            import: Some((fqn.to_string(), None)),
        });
    };

    let base = alias_for(fqn, &other)?;
    let mut alias = base.clone();
    let mut n = 2;
    while clash(&alias).is_some() {
        alias = format!("{base}{n}");
        n += 1;
    }
    Ok(ImportResolution {
        local: alias.clone(),
        import: Some((fqn.to_string(), Some(alias))),
    })
}

/// Applies [`MutationOp`]s to class files
#[derive(Debug, Clone, Copy, Default)]
pub struct Mutator {
    overwrite: bool,
}

impl Mutator {
    /// Create mutator that never replaces existing declarations
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace existing properties and methods instead of skipping them
    #[inline]
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Whether existing declarations are replaced
    #[inline]
    #[must_use]
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Apply operations in phase order
    ///
    /// A property that already exists (without overwrite) is skipped
    /// together with every later operation on it; the run continues.
    ///
    /// # Errors
    /// Returns the first non-recoverable [`MutationError`]. The file may be
    /// partially edited at that point; callers discard it.
    pub fn apply_all(
        &self,
        file: &mut ClassFile,
        mut ops: Vec<MutationOp>,
    ) -> Result<MutationReport, MutationError> {
        ops.sort_by_key(MutationOp::phase);
        let mut report = MutationReport::default();
        let mut skipped: HashSet<String> = HashSet::new();

        for op in &ops {
            if let Some(property) = op.property() {
                if skipped.contains(property) {
                    report.changes.push(Change::skipped(
                        subject(op),
                        format!("property '{property}' was skipped"),
                    ));
                    continue;
                }
            }
            match self.apply(file, op) {
                Ok(changes) => report.changes.extend(changes),
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(file = %file.path().display(), error = %err, "skipping operation");
                    if let Some(property) = op.property() {
                        skipped.insert(property.to_string());
                    }
                    report.changes.push(Change::skipped(subject(op), err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }

    /// Apply one operation
    ///
    /// # Errors
    /// - [`MutationError::NameCollision`] for an existing property without overwrite
    /// - [`MutationError::TargetNotFound`] when the operation names a missing member
    /// - any other error is fatal for the file
    pub fn apply(&self, file: &mut ClassFile, op: &MutationOp) -> Result<Vec<Change>, MutationError> {
        tracing::debug!(file = %file.path().display(), op = %subject(op), "applying");
        match op {
            MutationOp::AddImport { name, alias } => {
                let (_, change) = self.import(file, name, alias.as_deref())?;
                Ok(vec![change])
            }
            MutationOp::AddProperty(spec) => self.add_property(file, spec).map(|c| vec![c]),
            MutationOp::EnsureConstructorStatement(stmt) => {
                ensure_constructor_statement(file, stmt).map(|c| vec![c])
            }
            MutationOp::AddAccessors { property, kind } => self.add_accessors(file, property, kind),
            MutationOp::AddMetadataTag { target, tag } => {
                add_metadata_tag(file, target, tag).map(|c| vec![c])
            }
        }
    }

    /// Import a class and return the name it is visible under
    ///
    /// # Errors
    /// Returns error when an alias cannot be derived or the edit fails.
    pub fn add_import(
        &self,
        file: &mut ClassFile,
        name: &str,
        alias: Option<&str>,
    ) -> Result<String, MutationError> {
        self.import(file, name, alias).map(|(local, _)| local)
    }

    fn import(
        &self,
        file: &mut ClassFile,
        name: &str,
        alias: Option<&str>,
    ) -> Result<(String, Change), MutationError> {
        let name = name.trim_start_matches('\\');
        let subject = format!("import {name}");
        if let Some(existing) = file.import_of(name) {
            return Ok((existing.local_name().to_string(), Change::new(subject, Outcome::Unchanged)));
        }
        let (name, alias) = match alias {
            Some(alias) => (name.to_string(), Some(alias.to_string())),
            None => {
                let resolution = resolve_import(file, name, &[])?;
                match resolution.import {
                    Some(import) => import,
                    None => return Ok((resolution.local, Change::new(subject, Outcome::Unchanged))),
                }
            }
        };
        if let Some(alias) = &alias {
            if file.import_by_local_name(alias).is_some() {
                return Err(MutationError::InvalidOperation(format!(
                    "alias '{alias}' is already in use"
                )));
            }
        }

        let nl = file.style().newline.clone();
        let statement = match &alias {
            Some(alias) => format!("use {name} as {alias};"),
            None => format!("use {name};"),
        };
        let key = name.to_ascii_lowercase();
        let singles: Vec<_> = file
            .imports()
            .iter()
            .filter(|i| i.kind == ImportKind::Class && !i.grouped)
            .collect();

        let (offset, text) = if let Some(next) = singles.iter().find(|i| i.name.to_ascii_lowercase() > key) {
            (next.span.start, format!("{statement}{nl}"))
        } else if let Some(last) = singles.last() {
            (last.span.end, format!("{nl}{statement}"))
        } else if let Some(last) = file.imports().iter().max_by_key(|i| i.span.end) {
            (last.span.end, format!("{nl}{statement}"))
        } else if let Some(ns) = file.namespace_decl() {
            (ns.span.end, format!("{nl}{nl}{statement}"))
        } else {
            (file.open_tag_end, format!("{nl}{nl}{statement}"))
        };

        let local = alias.clone().unwrap_or_else(|| short_class_name(&name).to_string());
        commit(file, Edit::insert(offset, text, *file.hash(), subject.clone()))?;
        Ok((local, Change::new(subject, Outcome::Added)))
    }

    fn add_property(&self, file: &mut ClassFile, spec: &PropertySpec) -> Result<Change, MutationError> {
        let subject = format!("property {}", spec.name);
        let rendered = spec.render();

        if let Some(existing) = file.property(&spec.name) {
            if !self.overwrite {
                return Err(MutationError::collision("property", &spec.name));
            }
            let span = existing.span;
            let shared = file
                .properties()
                .iter()
                .filter(|p| p.span == span)
                .count();
            if shared > 1 {
                return Err(MutationError::InvalidOperation(format!(
                    "property '{}' shares its declaration with others",
                    spec.name
                )));
            }
            let text = file.style().block(&rendered, 1);
            if span.slice(file.source()) == text.trim_start() {
                return Ok(Change::new(subject, Outcome::Unchanged));
            }
            commit(file, Edit::replace(span, text.trim_start(), *file.hash(), subject.clone()))?;
            return Ok(Change::new(subject, Outcome::Replaced));
        }

        let anchor = file.properties().last().map(|p| p.span).or_else(|| {
            file.members()
                .iter()
                .filter(|m| matches!(m.kind, MemberKind::Constant | MemberKind::Case | MemberKind::TraitUse))
                .map(|m| m.span)
                .last()
        });
        insert_member(file, &rendered, anchor, &subject)?;
        Ok(Change::new(subject, Outcome::Added))
    }

    fn add_accessors(
        &self,
        file: &mut ClassFile,
        property: &str,
        kind: &AccessorKind,
    ) -> Result<Vec<Change>, MutationError> {
        let target = file
            .property(property)
            .ok_or_else(|| MutationError::TargetNotFound {
                kind: "property",
                name: property.to_string(),
            })?
            .clone();

        let mut changes = Vec::new();
        for generated in accessor::generate(&target, kind) {
            let subject = format!("method {}", generated.name);
            if let Some(existing) = file.method(&generated.name) {
                if !self.overwrite {
                    tracing::debug!(method = %generated.name, "method exists, skipping");
                    changes.push(Change::skipped(subject, format!("method '{}' already exists", generated.name)));
                    continue;
                }
                let span = existing.span;
                let text = file.style().block(&generated.text, 1);
                if span.slice(file.source()) == text.trim_start() {
                    changes.push(Change::new(subject, Outcome::Unchanged));
                    continue;
                }
                commit(file, Edit::replace(span, text.trim_start(), *file.hash(), subject.clone()))?;
                changes.push(Change::new(subject, Outcome::Replaced));
                continue;
            }
            let anchor = file
                .methods()
                .last()
                .map(|m| m.span)
                .or_else(|| file.members().last().map(|m| m.span));
            insert_member(file, &generated.text, anchor, &subject)?;
            changes.push(Change::new(subject, Outcome::Added));
        }
        Ok(changes)
    }
}

fn subject(op: &MutationOp) -> String {
    match op {
        MutationOp::AddImport { name, .. } => format!("import {name}"),
        MutationOp::AddProperty(spec) => format!("property {}", spec.name),
        MutationOp::EnsureConstructorStatement(stmt) => format!("constructor `{stmt}`"),
        MutationOp::AddAccessors { property, .. } => format!("accessors of {property}"),
        MutationOp::AddMetadataTag { tag, .. } => format!("tag {tag}"),
    }
}

fn commit(file: &mut ClassFile, edit: Edit) -> Result<(), MutationError> {
    let text = edit.apply(file.source())?;
    *file = parse(&text, file.path().to_path_buf(), file.mode())?;
    Ok(())
}

/// Insert a member after `anchor`, or at the top of the class body
fn insert_member(
    file: &mut ClassFile,
    text: &str,
    anchor: Option<Span>,
    description: &str,
) -> Result<(), MutationError> {
    let style = file.style().clone();
    let nl = &style.newline;
    let block = style.block(text, 1);
    let body = file.body_span();
    let inner = Span::new(body.start + 1, body.end - 1);

    let edit = match anchor {
        Some(anchor) => Edit::insert(anchor.end, format!("{nl}{nl}{block}"), *file.hash(), description),
        None if inner.slice(file.source()).trim().is_empty() => {
            Edit::replace(body, format!("{{{nl}{block}{nl}}}"), *file.hash(), description)
        }
        None => Edit::insert(inner.start, format!("{nl}{block}{nl}"), *file.hash(), description),
    };
    commit(file, edit)
}

/// Whitespace between the start of the line and `offset`
fn line_indent(source: &str, offset: usize) -> String {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &source[line_start..offset];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix.to_string()
    } else {
        String::new()
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized top-level statements of a method body, comments removed
fn body_statements(body: &str) -> Vec<String> {
    let Some(code) = strip_comments(body) else {
        return Vec::new();
    };
    split_top_level(&code, b';')
        .unwrap_or_default()
        .into_iter()
        .map(normalize)
        .collect()
}

fn ensure_constructor_statement(file: &mut ClassFile, stmt: &str) -> Result<Change, MutationError> {
    let subject = format!("constructor `{stmt}`");
    let stmt = stmt.trim();
    let style = file.style().clone();
    let nl = &style.newline;

    let Some(ctor) = file.method("__construct") else {
        let text = format!("public function __construct()\n{{\n    {stmt}\n}}");
        let anchor = file.properties().last().map(|p| p.span).or_else(|| {
            file.members()
                .iter()
                .filter(|m| matches!(m.kind, MemberKind::Constant | MemberKind::Case | MemberKind::TraitUse))
                .map(|m| m.span)
                .last()
        });
        insert_member(file, &text, anchor, &subject)?;
        return Ok(Change::new(subject, Outcome::Added));
    };

    let (Some(body), Some(body_span)) = (ctor.body.as_deref(), ctor.body_span) else {
        return Err(MutationError::InvalidOperation(
            "constructor has no body".to_string(),
        ));
    };
    let wanted = normalize(stmt.trim_end_matches(';'));
    if body_statements(body).iter().any(|s| *s == wanted) {
        return Ok(Change::new(subject, Outcome::Unchanged));
    }

    let outer = line_indent(file.source(), ctor.decl_span.start);
    let inner = format!("{outer}{}", style.indent);
    let edit = if body.trim().is_empty() {
        Edit::replace(
            body_span,
            format!("{{{nl}{inner}{stmt}{nl}{outer}}}"),
            *file.hash(),
            subject.clone(),
        )
    } else {
        let last = body_span.start + 1 + body.trim_end().len();
        Edit::insert(last, format!("{nl}{inner}{stmt}"), *file.hash(), subject.clone())
    };
    commit(file, edit)?;
    Ok(Change::new(subject, Outcome::Added))
}

fn add_metadata_tag(file: &mut ClassFile, target: &TagTarget, tag: &str) -> Result<Change, MutationError> {
    let subject = format!("tag {tag}");
    let tag = tag.trim();
    let (tags, decl_start): (Vec<MetadataTag>, usize) = match target {
        TagTarget::Class => (file.class_tags().to_vec(), file.decl_span().start),
        TagTarget::Property(name) => {
            let p = file.property(name).ok_or_else(|| MutationError::TargetNotFound {
                kind: "property",
                name: name.clone(),
            })?;
            (p.tags.clone(), p.decl_span.start)
        }
        TagTarget::Method(name) => {
            let m = file.method(name).ok_or_else(|| MutationError::TargetNotFound {
                kind: "method",
                name: name.clone(),
            })?;
            (m.tags.clone(), m.decl_span.start)
        }
    };

    if tags.iter().any(|t| normalize(&t.text) == normalize(tag)) {
        return Ok(Change::new(subject, Outcome::Unchanged));
    }

    let nl = file.style().newline.clone();
    let indent = line_indent(file.source(), decl_start);
    let family = MetadataTag::parse(tag, Span::default()).family().to_string();
    let anchor = tags
        .iter()
        .rev()
        .find(|t| !family.is_empty() && t.family() == family)
        .or_else(|| tags.last())
        .map(|t| t.span);

    let edit = match anchor {
        Some(span) => Edit::insert(span.end, format!("{nl}{indent}{tag}"), *file.hash(), subject.clone()),
        None => Edit::insert(decl_start, format!("{tag}{nl}{indent}"), *file.hash(), subject.clone()),
    };
    commit(file, edit)?;
    Ok(Change::new(subject, Outcome::Added))
}
