//! Byte cursor over class-file text
//!
//! Knows just enough lexical structure to walk a file without tokenizing it:
//! comments, strings, heredocs, attributes and bracket nesting. Everything
//! the parser does not model is skipped as an opaque run of bytes.

use crate::error::ParseError;
use crate::span::{line_of, Span};

#[inline]
pub(crate) fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic() || b >= 0x80
}

#[inline]
pub(crate) fn is_ident_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric() || b >= 0x80
}

/// Cursor over a source string
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.bytes.len());
    }

    #[inline]
    pub(crate) fn src(&self) -> &'a str {
        self.src
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
    }

    #[inline]
    pub(crate) fn starts_with(&self, s: &str) -> bool {
        self.bytes[self.pos..].starts_with(s.as_bytes())
    }

    pub(crate) fn eat(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Case-insensitive keyword check with an identifier boundary after it
    pub(crate) fn at_keyword(&self, kw: &str) -> bool {
        let end = self.pos + kw.len();
        if end > self.bytes.len() {
            return false;
        }
        if !self.bytes[self.pos..end].eq_ignore_ascii_case(kw.as_bytes()) {
            return false;
        }
        !self.bytes.get(end).copied().is_some_and(is_ident_byte)
    }

    pub(crate) fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.at_keyword(kw) {
            self.pos += kw.len();
            true
        } else {
            false
        }
    }

    pub(crate) fn line(&self) -> usize {
        line_of(self.src, self.pos)
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(self.line(), message)
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// `/**` doc block (but not the empty comment `/**/`)
    pub(crate) fn at_doc_comment(&self) -> bool {
        self.starts_with("/**") && !self.starts_with("/**/")
    }

    /// Any comment; `#[` opens an attribute, not a comment
    pub(crate) fn at_comment(&self) -> bool {
        self.starts_with("//")
            || self.starts_with("/*")
            || (self.peek() == Some(b'#') && self.peek_at(1) != Some(b'['))
    }

    pub(crate) fn at_attribute(&self) -> bool {
        self.starts_with("#[")
    }

    /// Skip one comment, returning its span
    pub(crate) fn skip_comment(&mut self) -> Result<Span, ParseError> {
        let start = self.pos;
        if self.eat("/*") {
            match self.src[self.pos..].find("*/") {
                Some(idx) => self.pos += idx + 2,
                None => return Err(ParseError::syntax(line_of(self.src, start), "unterminated comment")),
            }
        } else {
            while let Some(b) = self.peek() {
                if b == b'\n' || self.starts_with("?>") {
                    break;
                }
                self.pos += 1;
            }
        }
        Ok(Span::new(start, self.pos))
    }

    /// Skip whitespace and comments of every kind
    pub(crate) fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();
            if self.at_comment() {
                self.skip_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Skip a `#[...]` attribute, returning its span
    pub(crate) fn skip_attribute(&mut self) -> Result<Span, ParseError> {
        let start = self.pos;
        self.bump();
        self.skip_balanced()?;
        Ok(Span::new(start, self.pos))
    }

    pub(crate) fn ident(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return None;
        }
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        Some(&self.src[start..self.pos])
    }

    /// Possibly qualified name (`Foo`, `\Foo\Bar`, `Foo\Bar`)
    pub(crate) fn name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        loop {
            if self.peek() == Some(b'\\') && self.peek_at(1).is_some_and(is_ident_start) {
                self.pos += 1;
            }
            if self.ident().is_none() {
                break;
            }
            if !(self.peek() == Some(b'\\') && self.peek_at(1).is_some_and(is_ident_start)) {
                break;
            }
        }
        if self.pos == start {
            None
        } else {
            Some(&self.src[start..self.pos])
        }
    }

    /// `$name`, returning `name`
    pub(crate) fn variable(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if self.peek() != Some(b'$') {
            return None;
        }
        self.pos += 1;
        match self.ident() {
            Some(name) => Some(name),
            None => {
                self.pos = start;
                None
            }
        }
    }

    /// Skip a quoted string starting at the current quote character
    pub(crate) fn skip_string(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let Some(quote) = self.peek() else {
            return Ok(());
        };
        self.pos += 1;
        while let Some(b) = self.peek() {
            if b == b'\\' {
                self.pos = (self.pos + 2).min(self.bytes.len());
                continue;
            }
            self.pos += 1;
            if b == quote {
                return Ok(());
            }
        }
        Err(ParseError::syntax(line_of(self.src, start), "unterminated string"))
    }

    pub(crate) fn at_heredoc(&self) -> bool {
        self.starts_with("<<<")
    }

    /// Skip a heredoc or nowdoc starting at `<<<`
    pub(crate) fn skip_heredoc(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 3;
        while self.peek().is_some_and(|b| b == b' ' || b == b'\t') {
            self.pos += 1;
        }
        let quoted = matches!(self.peek(), Some(b'\'' | b'"'));
        if quoted {
            self.pos += 1;
        }
        let label = self
            .ident()
            .ok_or_else(|| ParseError::syntax(line_of(self.src, start), "heredoc without label"))?
            .to_string();
        if quoted {
            self.bump();
        }

        let mut line_start = match self.src[self.pos..].find('\n') {
            Some(idx) => self.pos + idx + 1,
            None => return Err(ParseError::syntax(line_of(self.src, start), "unterminated heredoc")),
        };
        while line_start < self.bytes.len() {
            let line_end = self.src[line_start..]
                .find('\n')
                .map_or(self.bytes.len(), |idx| line_start + idx);
            let line = &self.src[line_start..line_end];
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix(label.as_str()) {
                if !rest.bytes().next().is_some_and(is_ident_byte) {
                    self.pos = line_start + (line.len() - trimmed.len()) + label.len();
                    return Ok(());
                }
            }
            line_start = line_end + 1;
        }
        Err(ParseError::syntax(line_of(self.src, start), "unterminated heredoc"))
    }

    /// Skip one opaque lexical unit that may contain brackets or separators
    fn skip_atom(&mut self) -> Result<bool, ParseError> {
        match self.peek() {
            Some(b'\'' | b'"' | b'`') => self.skip_string().map(|()| true),
            _ if self.at_heredoc() => self.skip_heredoc().map(|()| true),
            _ if self.at_comment() => self.skip_comment().map(|_| true),
            _ => Ok(false),
        }
    }

    /// Skip a bracketed group starting at `(`, `[` or `{`
    pub(crate) fn skip_balanced(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        let mut stack: Vec<u8> = Vec::new();
        loop {
            if self.skip_atom()? {
                continue;
            }
            let Some(b) = self.peek() else {
                return Err(ParseError::syntax(
                    line_of(self.src, start),
                    "unbalanced brackets",
                ));
            };
            match b {
                b'(' => stack.push(b')'),
                b'[' => stack.push(b']'),
                b'{' => stack.push(b'}'),
                b')' | b']' | b'}' => {
                    if stack.pop() != Some(b) {
                        return Err(self.error(format!("unexpected '{}'", b as char)));
                    }
                }
                _ => {}
            }
            self.pos += 1;
            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    /// Advance to the first of `stops` at bracket depth zero
    ///
    /// The stop byte is not consumed. Closing brackets at depth zero that
    /// are not in `stops` are errors.
    pub(crate) fn skip_until_any(&mut self, stops: &[u8]) -> Result<u8, ParseError> {
        loop {
            let Some(b) = self.peek() else {
                return Err(self.error("unexpected end of file"));
            };
            if stops.contains(&b) {
                return Ok(b);
            }
            if self.skip_atom()? {
                continue;
            }
            match b {
                b'(' | b'[' | b'{' => self.skip_balanced()?,
                b')' | b']' | b'}' => {
                    return Err(self.error(format!("unexpected '{}'", b as char)));
                }
                _ => self.pos += 1,
            }
        }
    }
}

/// Split `text` on `sep` at bracket depth zero, skipping strings and comments
///
/// Returns trimmed non-empty pieces, or `None` when the text is unbalanced.
pub(crate) fn split_top_level(text: &str, sep: u8) -> Option<Vec<&str>> {
    let mut cursor = Cursor::new(text);
    let mut parts = Vec::new();
    let mut start = 0;
    loop {
        let stop = cursor.skip_until_any(&[sep]);
        match stop {
            Ok(_) => {
                parts.push(text[start..cursor.pos()].trim());
                cursor.bump();
                start = cursor.pos();
            }
            Err(_) if cursor.is_eof() => {
                parts.push(text[start..].trim());
                break;
            }
            Err(_) => return None,
        }
    }
    Some(parts.into_iter().filter(|p| !p.is_empty()).collect())
}

/// Copy `text` with every comment replaced by a single space
///
/// Strings and heredocs are copied verbatim. Returns `None` when the text
/// holds an unterminated string or comment.
pub(crate) fn strip_comments(text: &str) -> Option<String> {
    let mut cursor = Cursor::new(text);
    let mut out: Vec<u8> = Vec::with_capacity(text.len());
    while !cursor.is_eof() {
        if cursor.at_comment() {
            cursor.skip_comment().ok()?;
            out.push(b' ');
            continue;
        }
        let start = cursor.pos();
        match cursor.peek() {
            Some(b'\'' | b'"' | b'`') => cursor.skip_string().ok()?,
            _ if cursor.at_heredoc() => cursor.skip_heredoc().ok()?,
            _ => cursor.bump(),
        }
        out.extend_from_slice(&text.as_bytes()[start..cursor.pos()]);
    }
    String::from_utf8(out).ok()
}
