//! Tolerant class-file parser
//!
//! Recognizes the top-level statements and class members that scaffolding
//! needs to reason about and records their exact byte spans. Method bodies,
//! default values and anything else not modeled are skipped as opaque text.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::ParseError;
use crate::hash::ContentHash;
use crate::model::{
    ClassFile, DeclarationKind, Import, ImportKind, Member, MemberKind, MetadataTag, Method,
    Namespace, Parameter, ParseMode, Property, Style, Visibility,
};
use crate::scanner::{split_top_level, Cursor};
use crate::span::{line_of, Span};

/// Parse class-file text
///
/// # Errors
/// Returns [`ParseError`] when the text is not a single class, interface or
/// enum declaration the parser can delimit. In [`ParseMode::Strict`] any
/// unrecognized member, malformed method signature or duplicate member name
/// is also an error.
///
/// # Examples
/// ```
/// use scaffold_source::{parse, ParseMode};
///
/// let src = "<?php\n\nnamespace App\\Entity;\n\nclass User\n{\n    private ?int $id = null;\n}\n";
/// let file = parse(src, "src/Entity/User.php", ParseMode::Strict).unwrap();
/// assert_eq!(file.fqn(), "App\\Entity\\User");
/// assert_eq!(file.serialize(), src);
/// ```
pub fn parse(
    source: &str,
    path: impl Into<PathBuf>,
    mode: ParseMode,
) -> Result<ClassFile, ParseError> {
    Parser::new(source, mode).run(path.into())
}

#[derive(Default)]
struct Leading {
    start: Option<usize>,
    doc: Option<String>,
    tags: Vec<MetadataTag>,
}

impl Leading {
    fn note(&mut self, at: usize) {
        self.start.get_or_insert(at);
    }
}

struct Declaration {
    kind: DeclarationKind,
    name: String,
    leading: Leading,
    decl_span: Span,
    body_span: Span,
    body: Body,
}

#[derive(Default)]
struct Body {
    properties: Vec<Property>,
    methods: Vec<Method>,
    members: Vec<Member>,
}

#[derive(Default)]
struct Modifiers {
    visibility: Option<Visibility>,
    is_static: bool,
    is_readonly: bool,
    is_abstract: bool,
    any: bool,
}

struct Parser<'a> {
    cursor: Cursor<'a>,
    mode: ParseMode,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, mode: ParseMode) -> Self {
        Self {
            cursor: Cursor::new(source),
            mode,
        }
    }

    fn src(&self) -> &'a str {
        self.cursor.src()
    }

    fn run(mut self, path: PathBuf) -> Result<ClassFile, ParseError> {
        let open_tag_end = self.open_tag()?;
        let mut namespace = None;
        let mut imports = Vec::new();
        let mut declaration = None;
        let mut found = 0usize;
        let mut leading = Leading::default();

        loop {
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() || self.cursor.starts_with("?>") {
                break;
            }
            let start = self.cursor.pos();
            if self.cursor.at_doc_comment() {
                let span = self.cursor.skip_comment()?;
                leading.note(start);
                leading.doc = Some(span.slice(self.src()).to_string());
            } else if self.cursor.at_comment() {
                self.cursor.skip_comment()?;
            } else if self.cursor.at_attribute() {
                let span = self.cursor.skip_attribute()?;
                leading.note(start);
                leading.tags.push(MetadataTag::parse(span.slice(self.src()), span));
            } else if self.cursor.eat_keyword("namespace") {
                namespace = Some(self.namespace(start)?);
                leading = Leading::default();
            } else if self.cursor.eat_keyword("use") {
                imports.extend(self.use_statement(start)?);
                leading = Leading::default();
            } else if self.at_declaration() {
                found += 1;
                let decl = self.declaration(std::mem::take(&mut leading))?;
                if declaration.is_none() {
                    declaration = Some(decl);
                }
            } else if self.cursor.at_keyword("trait") {
                return Err(ParseError::UnsupportedDeclaration("trait".to_string()));
            } else {
                self.statement()?;
                leading = Leading::default();
            }
        }

        let decl = match (declaration, found) {
            (Some(decl), 1) => decl,
            (_, found) => return Err(ParseError::DeclarationCount { found }),
        };

        let style = detect_style(self.src(), &decl.body.members);
        let header_start = decl.leading.start.unwrap_or(decl.decl_span.start);
        Ok(ClassFile {
            path,
            source: self.src().to_string(),
            hash: ContentHash::of_text(self.src()),
            mode: self.mode,
            open_tag_end,
            namespace,
            imports,
            kind: decl.kind,
            name: decl.name,
            class_tags: decl.leading.tags,
            class_doc: decl.leading.doc,
            header_start,
            decl_span: decl.decl_span,
            body_span: decl.body_span,
            properties: decl.body.properties,
            methods: decl.body.methods,
            members: decl.body.members,
            style,
        })
    }

    fn open_tag(&mut self) -> Result<usize, ParseError> {
        if self.cursor.starts_with("#!") {
            while self.cursor.peek().is_some_and(|b| b != b'\n') {
                self.cursor.bump();
            }
        }
        self.cursor.skip_whitespace();
        if self.cursor.at_keyword("<?php") {
            self.cursor.eat_keyword("<?php");
            Ok(self.cursor.pos())
        } else {
            Err(ParseError::MissingOpenTag)
        }
    }

    fn namespace(&mut self, start: usize) -> Result<Namespace, ParseError> {
        self.cursor.skip_trivia()?;
        let name = self
            .cursor
            .name()
            .ok_or_else(|| self.cursor.error("expected namespace name"))?
            .trim_start_matches('\\')
            .to_string();
        self.cursor.skip_trivia()?;
        match self.cursor.peek() {
            Some(b';') => {
                self.cursor.bump();
                Ok(Namespace {
                    name,
                    span: Span::new(start, self.cursor.pos()),
                })
            }
            Some(b'{') => Err(self.cursor.error("braced namespace blocks are not supported")),
            _ => Err(self.cursor.error("expected ';' after namespace")),
        }
    }

    fn import_kind(&mut self) -> ImportKind {
        if self.cursor.eat_keyword("function") {
            ImportKind::Function
        } else if self.cursor.eat_keyword("const") {
            ImportKind::Const
        } else {
            ImportKind::Class
        }
    }

    fn use_statement(&mut self, start: usize) -> Result<Vec<Import>, ParseError> {
        struct Clause {
            name: String,
            alias: Option<String>,
            kind: ImportKind,
        }

        self.cursor.skip_trivia()?;
        let statement_kind = self.import_kind();
        let mut clauses = Vec::new();
        let mut grouped = false;

        loop {
            self.cursor.skip_trivia()?;
            let name = self
                .cursor
                .name()
                .ok_or_else(|| self.cursor.error("expected name in use statement"))?
                .trim_start_matches('\\')
                .to_string();
            self.cursor.skip_trivia()?;

            if self.cursor.starts_with("\\{") || self.cursor.peek() == Some(b'{') {
                grouped = true;
                self.cursor.eat("\\");
                self.cursor.bump();
                let prefix = name.trim_end_matches('\\').to_string();
                loop {
                    self.cursor.skip_trivia()?;
                    if self.cursor.peek() == Some(b'}') {
                        self.cursor.bump();
                        break;
                    }
                    let kind = match self.import_kind() {
                        ImportKind::Class => statement_kind,
                        other => other,
                    };
                    self.cursor.skip_trivia()?;
                    let item = self
                        .cursor
                        .name()
                        .ok_or_else(|| self.cursor.error("expected name in use group"))?;
                    let alias = self.alias()?;
                    clauses.push(Clause {
                        name: format!("{prefix}\\{}", item.trim_start_matches('\\')),
                        alias,
                        kind,
                    });
                    self.cursor.skip_trivia()?;
                    if self.cursor.peek() == Some(b',') {
                        self.cursor.bump();
                    }
                }
            } else {
                let alias = self.alias()?;
                clauses.push(Clause {
                    name,
                    alias,
                    kind: statement_kind,
                });
            }

            self.cursor.skip_trivia()?;
            match self.cursor.peek() {
                Some(b',') => {
                    grouped = true;
                    self.cursor.bump();
                }
                Some(b';') => {
                    self.cursor.bump();
                    break;
                }
                _ => return Err(self.cursor.error("expected ';' after use statement")),
            }
        }

        let span = Span::new(start, self.cursor.pos());
        Ok(clauses
            .into_iter()
            .map(|c| Import {
                name: c.name,
                alias: c.alias,
                kind: c.kind,
                span,
                grouped,
            })
            .collect())
    }

    fn alias(&mut self) -> Result<Option<String>, ParseError> {
        self.cursor.skip_trivia()?;
        if !self.cursor.eat_keyword("as") {
            return Ok(None);
        }
        self.cursor.skip_trivia()?;
        self.cursor
            .ident()
            .map(|a| Some(a.to_string()))
            .ok_or_else(|| self.cursor.error("expected alias after 'as'"))
    }

    fn at_declaration(&mut self) -> bool {
        let save = self.cursor.pos();
        let mut result = false;
        loop {
            if self.cursor.eat_keyword("final")
                || self.cursor.eat_keyword("abstract")
                || self.cursor.eat_keyword("readonly")
            {
                if self.cursor.skip_trivia().is_err() {
                    break;
                }
                continue;
            }
            result = self.cursor.at_keyword("class")
                || self.cursor.at_keyword("interface")
                || self.cursor.at_keyword("enum");
            break;
        }
        self.cursor.set_pos(save);
        result
    }

    fn declaration(&mut self, leading: Leading) -> Result<Declaration, ParseError> {
        let decl_start = self.cursor.pos();
        let kind = loop {
            self.cursor.skip_trivia()?;
            if self.cursor.eat_keyword("final")
                || self.cursor.eat_keyword("abstract")
                || self.cursor.eat_keyword("readonly")
            {
                continue;
            }
            if self.cursor.eat_keyword("class") {
                break DeclarationKind::Class;
            }
            if self.cursor.eat_keyword("interface") {
                break DeclarationKind::Interface;
            }
            if self.cursor.eat_keyword("enum") {
                break DeclarationKind::Enum;
            }
            return Err(self.cursor.error("expected declaration keyword"));
        };
        self.cursor.skip_trivia()?;
        let name = self
            .cursor
            .ident()
            .ok_or_else(|| self.cursor.error(format!("expected {} name", kind.keyword())))?
            .to_string();

        if self.cursor.skip_until_any(&[b'{', b';'])? == b';' {
            return Err(self.cursor.error("expected declaration body"));
        }
        let body_start = self.cursor.pos();
        self.cursor.bump();
        let body = self.body()?;
        let body_span = Span::new(body_start, self.cursor.pos());

        Ok(Declaration {
            kind,
            name,
            leading,
            decl_span: Span::new(decl_start, self.cursor.pos()),
            body_span,
            body,
        })
    }

    /// Generic top-level statement: up to `;` or through a braced block
    fn statement(&mut self) -> Result<(), ParseError> {
        if self.cursor.skip_until_any(&[b';', b'{'])? == b'{' {
            self.cursor.skip_balanced()?;
        } else {
            self.cursor.bump();
        }
        Ok(())
    }

    fn body(&mut self) -> Result<Body, ParseError> {
        let mut body = Body::default();
        loop {
            let mut leading = Leading::default();
            loop {
                self.cursor.skip_whitespace();
                let at = self.cursor.pos();
                if self.cursor.at_doc_comment() {
                    let span = self.cursor.skip_comment()?;
                    leading.note(at);
                    leading.doc = Some(span.slice(self.src()).to_string());
                } else if self.cursor.at_comment() {
                    self.cursor.skip_comment()?;
                } else if self.cursor.at_attribute() {
                    let span = self.cursor.skip_attribute()?;
                    leading.note(at);
                    leading.tags.push(MetadataTag::parse(span.slice(self.src()), span));
                } else {
                    break;
                }
            }

            match self.cursor.peek() {
                None => return Err(self.cursor.error("unterminated class body")),
                Some(b'}') => {
                    self.cursor.bump();
                    break;
                }
                Some(_) => {}
            }

            let decl_start = self.cursor.pos();
            let member_start = leading.start.unwrap_or(decl_start);
            let modifiers = self.modifiers()?;

            if self.cursor.eat_keyword("function") {
                let method = self.method(leading, decl_start, &modifiers)?;
                match method {
                    Some(method) => {
                        body.members.push(Member {
                            kind: MemberKind::Method,
                            span: method.span,
                        });
                        body.methods.push(method);
                    }
                    None => body.members.push(Member {
                        kind: MemberKind::Opaque,
                        span: Span::new(member_start, self.cursor.pos()),
                    }),
                }
                continue;
            }

            let kind = if self.cursor.eat_keyword("const") {
                Some(MemberKind::Constant)
            } else if self.cursor.eat_keyword("case") {
                Some(MemberKind::Case)
            } else if self.cursor.eat_keyword("use") {
                Some(MemberKind::TraitUse)
            } else {
                None
            };
            if let Some(kind) = kind {
                self.statement()?;
                body.members.push(Member {
                    kind,
                    span: Span::new(member_start, self.cursor.pos()),
                });
                continue;
            }

            if modifiers.any {
                if let Some(props) = self.properties(&leading, decl_start, &modifiers)? {
                    body.members.push(Member {
                        kind: MemberKind::Property,
                        span: Span::new(member_start, self.cursor.pos()),
                    });
                    body.properties.extend(props);
                    continue;
                }
            }

            self.unrecognized(decl_start)?;
            body.members.push(Member {
                kind: MemberKind::Opaque,
                span: Span::new(member_start, self.cursor.pos()),
            });
        }

        self.check_duplicates(&mut body)?;
        Ok(body)
    }

    fn modifiers(&mut self) -> Result<Modifiers, ParseError> {
        let mut m = Modifiers::default();
        loop {
            let save = self.cursor.pos();
            let Some(word) = self.cursor.ident() else {
                break;
            };
            let lower = word.to_ascii_lowercase();
            match lower.as_str() {
                "public" | "protected" | "private" => m.visibility = Visibility::parse(&lower),
                "static" => m.is_static = true,
                "readonly" => m.is_readonly = true,
                "abstract" => m.is_abstract = true,
                "final" | "var" => {}
                _ => {
                    self.cursor.set_pos(save);
                    break;
                }
            }
            // `public(set)` asymmetric visibility
            if self.cursor.peek() == Some(b'(') {
                self.cursor.skip_balanced()?;
            }
            m.any = true;
            self.cursor.skip_trivia()?;
        }
        Ok(m)
    }

    fn unrecognized(&mut self, at: usize) -> Result<(), ParseError> {
        if self.mode == ParseMode::Strict {
            return Err(ParseError::UnrecognizedMember {
                line: line_of(self.src(), at),
            });
        }
        self.cursor.set_pos(at);
        self.recover()
    }

    /// Skip to the end of the current member: a `;` or a braced block
    fn recover(&mut self) -> Result<(), ParseError> {
        match self.cursor.skip_until_any(&[b';', b'{', b'}'])? {
            b';' => self.cursor.bump(),
            b'{' => self.cursor.skip_balanced()?,
            _ => {}
        }
        Ok(())
    }

    /// Parse property declarations; `None` when this is not a property
    fn properties(
        &mut self,
        leading: &Leading,
        decl_start: usize,
        modifiers: &Modifiers,
    ) -> Result<Option<Vec<Property>>, ParseError> {
        let type_start = self.cursor.pos();
        while let Some(b) = self.cursor.peek() {
            match b {
                b'$' => break,
                b'(' if in_type_position(self.src(), type_start, self.cursor.pos()) => {
                    self.cursor.skip_balanced()?;
                }
                b';' | b'{' | b'}' | b'=' | b'(' | b')' => return Ok(None),
                _ => self.cursor.bump(),
            }
        }
        if self.cursor.peek() != Some(b'$') {
            return Ok(None);
        }
        let type_text = self.src()[type_start..self.cursor.pos()].trim();
        let type_decl = (!type_text.is_empty()).then(|| type_text.to_string());
        let nullable = type_decl.as_deref().is_some_and(type_is_nullable);

        let mut found = Vec::new();
        loop {
            self.cursor.skip_trivia()?;
            let Some(name) = self.cursor.variable() else {
                return Ok(None);
            };
            self.cursor.skip_trivia()?;
            let default = if self.cursor.peek() == Some(b'=') {
                self.cursor.bump();
                let value_start = self.cursor.pos();
                self.cursor.skip_until_any(&[b',', b';'])?;
                Some(self.src()[value_start..self.cursor.pos()].trim().to_string())
            } else {
                None
            };
            found.push((name.to_string(), default));
            match self.cursor.peek() {
                Some(b',') => self.cursor.bump(),
                Some(b';') => {
                    self.cursor.bump();
                    break;
                }
                // property hooks
                Some(b'{') => {
                    self.cursor.skip_balanced()?;
                    break;
                }
                _ => return Ok(None),
            }
        }

        let decl_span = Span::new(decl_start, self.cursor.pos());
        let span = Span::new(leading.start.unwrap_or(decl_start), self.cursor.pos());
        Ok(Some(
            found
                .into_iter()
                .map(|(name, default)| Property {
                    name,
                    type_decl: type_decl.clone(),
                    nullable,
                    default,
                    visibility: modifiers.visibility.unwrap_or_default(),
                    is_static: modifiers.is_static,
                    is_readonly: modifiers.is_readonly,
                    tags: leading.tags.clone(),
                    doc: leading.doc.clone(),
                    span,
                    decl_span,
                })
                .collect(),
        ))
    }

    /// Parse a method after `function`; `None` when the lenient parse could
    /// not even find its name
    fn method(
        &mut self,
        leading: Leading,
        decl_start: usize,
        modifiers: &Modifiers,
    ) -> Result<Option<Method>, ParseError> {
        let span_start = leading.start.unwrap_or(decl_start);
        self.cursor.skip_trivia()?;
        self.cursor.eat("&");
        self.cursor.skip_trivia()?;
        let Some(name) = self.cursor.ident().map(str::to_string) else {
            self.unrecognized(decl_start)?;
            return Ok(None);
        };

        match self.signature() {
            Ok((parameters, return_type)) => {
                let (body, body_span) = if self.cursor.peek() == Some(b'{') {
                    let open = self.cursor.pos();
                    self.cursor.skip_balanced()?;
                    let span = Span::new(open, self.cursor.pos());
                    let inner = &self.src()[open + 1..self.cursor.pos() - 1];
                    (Some(inner.to_string()), Some(span))
                } else {
                    self.cursor.bump();
                    (None, None)
                };
                Ok(Some(Method {
                    name,
                    visibility: modifiers.visibility.unwrap_or_default(),
                    is_static: modifiers.is_static,
                    is_abstract: modifiers.is_abstract || body.is_none(),
                    parameters,
                    return_type,
                    body,
                    doc: leading.doc,
                    tags: leading.tags,
                    span: Span::new(span_start, self.cursor.pos()),
                    decl_span: Span::new(decl_start, self.cursor.pos()),
                    body_span,
                    malformed: false,
                }))
            }
            Err(()) => {
                let line = line_of(self.src(), decl_start);
                if self.mode == ParseMode::Strict {
                    return Err(ParseError::MalformedMethod { name, line });
                }
                self.recover()?;
                Ok(Some(Method {
                    name,
                    visibility: modifiers.visibility.unwrap_or_default(),
                    is_static: modifiers.is_static,
                    is_abstract: modifiers.is_abstract,
                    parameters: Vec::new(),
                    return_type: None,
                    body: None,
                    doc: leading.doc,
                    tags: leading.tags,
                    span: Span::new(span_start, self.cursor.pos()),
                    decl_span: Span::new(decl_start, self.cursor.pos()),
                    body_span: None,
                    malformed: true,
                }))
            }
        }
    }

    /// Parameters and return type; leaves the cursor on `{` or `;`
    fn signature(&mut self) -> Result<(Vec<Parameter>, Option<String>), ()> {
        self.cursor.skip_trivia().map_err(|_| ())?;
        if self.cursor.peek() != Some(b'(') {
            return Err(());
        }
        let open = self.cursor.pos();
        self.cursor.skip_balanced().map_err(|_| ())?;
        let inner = &self.src()[open + 1..self.cursor.pos() - 1];
        let parameters = split_top_level(inner, b',')
            .ok_or(())?
            .into_iter()
            .map(parse_parameter)
            .collect::<Option<Vec<_>>>()
            .ok_or(())?;

        self.cursor.skip_trivia().map_err(|_| ())?;
        let mut return_type = None;
        if self.cursor.peek() == Some(b':') {
            self.cursor.bump();
            let start = self.cursor.pos();
            self.cursor.skip_until_any(&[b'{', b';']).map_err(|_| ())?;
            let text = self.src()[start..self.cursor.pos()].trim();
            if !is_type_expression(text) {
                return Err(());
            }
            return_type = Some(text.to_string());
        }
        match self.cursor.peek() {
            Some(b'{' | b';') => Ok((parameters, return_type)),
            _ => Err(()),
        }
    }

    fn check_duplicates(&self, body: &mut Body) -> Result<(), ParseError> {
        let mut seen = HashSet::new();
        let mut keep = Vec::with_capacity(body.properties.len());
        for property in body.properties.drain(..) {
            if seen.insert(property.name.clone()) {
                keep.push(property);
            } else if self.mode == ParseMode::Strict {
                return Err(ParseError::DuplicateMember {
                    kind: "property",
                    name: property.name,
                    line: line_of(self.src(), property.decl_span.start),
                });
            } else {
                demote(&mut body.members, property.span);
            }
        }
        body.properties = keep;

        let mut seen = HashSet::new();
        let mut keep = Vec::with_capacity(body.methods.len());
        for method in body.methods.drain(..) {
            if seen.insert(method.name.to_ascii_lowercase()) {
                keep.push(method);
            } else if self.mode == ParseMode::Strict {
                return Err(ParseError::DuplicateMember {
                    kind: "method",
                    name: method.name,
                    line: line_of(self.src(), method.decl_span.start),
                });
            } else {
                demote(&mut body.members, method.span);
            }
        }
        body.methods = keep;
        Ok(())
    }
}

fn demote(members: &mut [Member], span: Span) {
    if let Some(member) = members.iter_mut().find(|m| m.span == span) {
        member.kind = MemberKind::Opaque;
    }
}

/// `(` inside a type is a DNF group (`(A&B)|null`)
fn in_type_position(src: &str, type_start: usize, pos: usize) -> bool {
    let before = src[type_start..pos].trim_end();
    before.is_empty() || before.ends_with('|') || before.ends_with('?')
}

fn type_is_nullable(type_decl: &str) -> bool {
    type_decl.starts_with('?')
        || type_decl
            .split('|')
            .any(|part| matches!(part.trim().to_ascii_lowercase().as_str(), "null" | "mixed"))
}

/// Whether `text` reads as a type: names joined by `|` or `&`, optional `?`
/// prefix, optional DNF parentheses
pub(crate) fn is_type_expression(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let compact: String = {
        let mut out = String::with_capacity(text.len());
        let mut pending_space = false;
        for c in text.chars() {
            if c.is_whitespace() {
                pending_space = true;
                continue;
            }
            let joiner = matches!(c, '|' | '&' | '(' | ')');
            let prev_joiner = out
                .chars()
                .last()
                .map_or(true, |p| matches!(p, '|' | '&' | '(' | ')' | '?'));
            if pending_space && !joiner && !prev_joiner {
                return false;
            }
            pending_space = false;
            out.push(c);
        }
        out
    };
    let body = compact.strip_prefix('?').unwrap_or(&compact);
    !body.is_empty()
        && body
            .split(|c| matches!(c, '|' | '&'))
            .all(|part| {
                let part = part.trim_matches(|c| c == '(' || c == ')');
                let part = part.trim_start_matches('\\');
                !part.is_empty()
                    && part
                        .split('\\')
                        .all(|seg| crate::inflector::is_identifier(seg))
            })
}

fn parse_parameter(text: &str) -> Option<Parameter> {
    let mut cursor = Cursor::new(text);
    let mut promoted = false;
    loop {
        cursor.skip_trivia().ok()?;
        if cursor.at_attribute() {
            cursor.skip_attribute().ok()?;
            continue;
        }
        let save = cursor.pos();
        match cursor.ident().map(str::to_ascii_lowercase).as_deref() {
            Some("public" | "protected" | "private" | "readonly") => promoted = true,
            _ => {
                cursor.set_pos(save);
                break;
            }
        }
    }

    let type_start = cursor.pos();
    let dollar = text[type_start..].find('$')? + type_start;
    let mut prefix = text[type_start..dollar].trim_end();
    let variadic = prefix.ends_with("...");
    if variadic {
        prefix = prefix[..prefix.len() - 3].trim_end();
    }
    let by_ref = prefix.ends_with('&');
    if by_ref {
        prefix = prefix[..prefix.len() - 1].trim_end();
    }
    if !prefix.is_empty() && !is_type_expression(prefix) {
        return None;
    }

    cursor.set_pos(dollar);
    let name = cursor.variable()?.to_string();
    cursor.skip_trivia().ok()?;
    let default = if cursor.peek() == Some(b'=') {
        Some(text[cursor.pos() + 1..].trim().to_string())
    } else if cursor.is_eof() {
        None
    } else {
        return None;
    };

    Some(Parameter {
        name,
        type_decl: (!prefix.is_empty()).then(|| prefix.to_string()),
        default,
        variadic,
        by_ref,
        promoted,
    })
}

fn detect_style(src: &str, members: &[Member]) -> Style {
    let newline = if src.contains("\r\n") { "\r\n" } else { "\n" };
    let indent = members
        .first()
        .and_then(|m| {
            let line_start = src[..m.span.start].rfind('\n').map_or(0, |i| i + 1);
            let ws = &src[line_start..m.span.start];
            (!ws.is_empty() && ws.chars().all(|c| c == ' ' || c == '\t')).then(|| ws.to_string())
        })
        .unwrap_or_else(|| "    ".to_string());
    Style {
        indent,
        newline: newline.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USER: &str = r#"<?php

namespace App\Entity;

use App\Repository\UserRepository;
use Doctrine\ORM\Mapping as ORM;

/**
 * A user.
 */
#[ORM\Entity(repositoryClass: UserRepository::class)]
class User
{
    #[ORM\Id]
    #[ORM\GeneratedValue]
    #[ORM\Column]
    private ?int $id = null;

    #[ORM\Column(length: 255)]
    private ?string $firstName = null;

    public function getId(): ?int
    {
        return $this->id;
    }

    public function getFirstName(): ?string
    {
        return $this->firstName;
    }

    public function setFirstName(string $firstName): static
    {
        $this->firstName = $firstName;

        return $this;
    }
}
"#;

    fn strict(src: &str) -> Result<ClassFile, ParseError> {
        parse(src, "src/Entity/User.php", ParseMode::Strict)
    }

    #[test]
    fn parses_entity() {
        let file = strict(USER).unwrap();
        assert_eq!(file.namespace(), "App\\Entity");
        assert_eq!(file.name(), "User");
        assert_eq!(file.kind(), DeclarationKind::Class);
        assert_eq!(file.imports().len(), 2);
        assert_eq!(file.imports()[1].local_name(), "ORM");
        assert_eq!(file.class_tags().len(), 1);
        assert!(file.class_doc().unwrap().contains("A user."));

        let id = file.property("id").unwrap();
        assert_eq!(id.type_decl.as_deref(), Some("?int"));
        assert!(id.nullable);
        assert_eq!(id.default.as_deref(), Some("null"));
        assert_eq!(id.tags.len(), 3);
        assert_eq!(id.visibility, Visibility::Private);

        let setter = file.method("SETFIRSTNAME").unwrap();
        assert_eq!(setter.parameters.len(), 1);
        assert_eq!(setter.parameters[0].type_decl.as_deref(), Some("string"));
        assert_eq!(setter.return_type.as_deref(), Some("static"));
        assert_eq!(file.serialize(), USER);
    }

    #[test]
    fn property_span_covers_tags() {
        let file = strict(USER).unwrap();
        let id = file.property("id").unwrap();
        let text = id.span.slice(file.source());
        assert!(text.starts_with("#[ORM\\Id]"));
        assert!(text.ends_with("private ?int $id = null;"));
        assert_eq!(id.decl_span.slice(file.source()), "private ?int $id = null;");
    }

    #[test]
    fn missing_open_tag() {
        assert_eq!(strict("class A {}").unwrap_err(), ParseError::MissingOpenTag);
    }

    #[test]
    fn declaration_count() {
        assert_eq!(
            strict("<?php\nclass A {}\nclass B {}\n").unwrap_err(),
            ParseError::DeclarationCount { found: 2 }
        );
        assert_eq!(
            strict("<?php\n$x = 1;\n").unwrap_err(),
            ParseError::DeclarationCount { found: 0 }
        );
    }

    #[test]
    fn trait_is_rejected() {
        assert!(matches!(
            strict("<?php\ntrait T {}\n"),
            Err(ParseError::UnsupportedDeclaration(_))
        ));
    }

    #[test]
    fn grouped_and_function_imports() {
        let src = "<?php\nnamespace A;\nuse B\\{C, D as E};\nuse function F\\g;\nuse H, I;\nclass X {}\n";
        let file = strict(src).unwrap();
        let names: Vec<_> = file.imports().iter().map(|i| (i.name.as_str(), i.local_name())).collect();
        assert_eq!(
            names,
            vec![("B\\C", "C"), ("B\\D", "E"), ("F\\g", "g"), ("H", "H"), ("I", "I")]
        );
        assert!(file.imports()[0].grouped);
        assert_eq!(file.imports()[2].kind, ImportKind::Function);
        assert!(file.imports()[3].grouped);
    }

    #[test]
    fn bodies_with_braces_in_strings_and_heredocs() {
        let src = "<?php\nclass A\n{\n    public function f(): string\n    {\n        $a = '}';\n        return <<<EOT\n        }}}\n        EOT;\n    }\n\n    public function g() {}\n}\n";
        let file = strict(src).unwrap();
        assert_eq!(file.methods().len(), 2);
        assert_eq!(file.serialize(), src);
    }

    #[test]
    fn enum_with_cases_and_constants() {
        let src = "<?php\nenum Suit: string\n{\n    case Hearts = 'H';\n    const Wild = self::Hearts;\n\n    public function label(): string { return 'x'; }\n}\n";
        let file = strict(src).unwrap();
        assert_eq!(file.kind(), DeclarationKind::Enum);
        let kinds: Vec<_> = file.members().iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MemberKind::Case, MemberKind::Constant, MemberKind::Method]);
    }

    #[test]
    fn promoted_and_variadic_parameters() {
        let src = "<?php\nfinal class A\n{\n    public function __construct(private readonly string $name = 'x', int &...$rest) {}\n}\n";
        let file = strict(src).unwrap();
        let ctor = file.method("__construct").unwrap();
        assert!(ctor.parameters[0].promoted);
        assert_eq!(ctor.parameters[0].default.as_deref(), Some("'x'"));
        assert!(ctor.parameters[1].variadic);
        assert!(ctor.parameters[1].by_ref);
    }

    #[test]
    fn union_and_static_properties() {
        let src = "<?php\nclass A\n{\n    public static int|null $count = 0;\n    protected $legacy;\n    var $old, $older = [1, 2];\n}\n";
        let file = strict(src).unwrap();
        let count = file.property("count").unwrap();
        assert!(count.is_static);
        assert!(count.nullable);
        assert_eq!(file.property("legacy").unwrap().type_decl, None);
        assert_eq!(file.property("older").unwrap().default.as_deref(), Some("[1, 2]"));
    }

    #[test]
    fn strict_rejects_malformed_method() {
        let src = "<?php\nclass A\n{\n    public function broken(): ?string string\n    {\n        return null;\n    }\n}\n";
        assert!(matches!(strict(src), Err(ParseError::MalformedMethod { .. })));

        let lenient = parse(src, "a.php", ParseMode::Lenient).unwrap();
        let method = lenient.method("broken").unwrap();
        assert!(method.malformed);
        assert!(method.span.slice(lenient.source()).ends_with('}'));
        assert_eq!(lenient.serialize(), src);
    }

    #[test]
    fn duplicates() {
        let src = "<?php\nclass A\n{\n    public function f() {}\n    public function F() {}\n}\n";
        assert!(matches!(
            strict(src),
            Err(ParseError::DuplicateMember { kind: "method", .. })
        ));
        let lenient = parse(src, "a.php", ParseMode::Lenient).unwrap();
        assert_eq!(lenient.methods().len(), 1);
        assert_eq!(lenient.members()[1].kind, MemberKind::Opaque);
    }

    #[test]
    fn unbalanced_fails_in_both_modes() {
        let src = "<?php\nclass A\n{\n    public function f() {\n}\n";
        assert!(strict(src).is_err());
        assert!(parse(src, "a.php", ParseMode::Lenient).is_err());
    }

    #[test]
    fn style_detection() {
        let src = "<?php\r\nclass A\r\n{\r\n\tprivate $a;\r\n}\r\n";
        let file = strict(src).unwrap();
        assert_eq!(file.style().indent, "\t");
        assert_eq!(file.style().newline, "\r\n");
    }

    #[test]
    fn type_expressions() {
        assert!(is_type_expression("?string"));
        assert!(is_type_expression("int|null"));
        assert!(is_type_expression("(A&B)|null"));
        assert!(is_type_expression("\\DateTimeInterface"));
        assert!(is_type_expression("static"));
        assert!(!is_type_expression("?string string"));
        assert!(!is_type_expression(""));
    }

    #[test]
    fn resolves_names() {
        let file = strict(USER).unwrap();
        assert_eq!(file.resolve_class_name("UserRepository"), "App\\Repository\\UserRepository");
        assert_eq!(file.resolve_class_name("ORM\\Column"), "Doctrine\\ORM\\Mapping\\Column");
        assert_eq!(file.resolve_class_name("Photo"), "App\\Entity\\Photo");
        assert_eq!(file.resolve_class_name("\\DateTime"), "DateTime");
    }
}
