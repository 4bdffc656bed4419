//! Typed prompts and answers
//!
//! Makers ask a finite sequence of [`PromptRequest`]s through a
//! [`Prompter`]. [`AnswerQueue`] answers them from a pre-supplied list and
//! records what was asked; [`LinePrompter`] reads a terminal.

use std::collections::VecDeque;
use std::fmt::{self, Display, Formatter};
use std::io::{BufRead, Write};

use scaffold_relation::Cardinality;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PromptError;

/// What a prompt asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKey {
    /// Entity class name
    ClassName,
    /// New property name; empty stops the loop
    FieldName,
    /// Scalar type, `relation`, or a cardinality name
    FieldType,
    /// String column length
    FieldLength,
    /// Whether a field accepts `null`
    Nullable,
    /// Class a relation points at
    RelatedClass,
    /// Relation cardinality
    RelationType,
    /// Whether the other class gets a property
    GenerateInverse,
    /// Name of the property on the other class
    InverseField,
    /// Whether orphaned collection elements are removed
    OrphanRemoval,
}

/// One question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptRequest {
    /// What is asked
    pub key: PromptKey,
    /// Question text
    pub question: String,
    /// Value used for [`Answer::Default`]
    pub default: Option<String>,
}

impl PromptRequest {
    /// Create request without a default
    #[must_use]
    pub fn new(key: PromptKey, question: impl Into<String>) -> Self {
        Self {
            key,
            question: question.into(),
            default: None,
        }
    }

    /// With default value
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Yes/no question
    #[must_use]
    pub fn yes_no(key: PromptKey, question: impl Into<String>, default: bool) -> Self {
        Self::new(key, question).with_default(if default { "yes" } else { "no" })
    }

    /// Interpret an answer as text, applying the default
    ///
    /// # Errors
    /// Returns [`PromptError::UnexpectedAnswer`] for a boolean answer.
    pub fn text(&self, answer: Answer) -> Result<String, PromptError> {
        match answer {
            Answer::Default => Ok(self.default.clone().unwrap_or_default()),
            Answer::Text(text) => Ok(text.trim().to_string()),
            Answer::Cardinality(c) => Ok(c.name().to_string()),
            Answer::Bool(_) => Err(self.unexpected(&answer)),
        }
    }

    /// Interpret an answer as yes/no, applying the default
    ///
    /// # Errors
    /// Returns [`PromptError::UnexpectedAnswer`] for anything but a boolean,
    /// `yes`/`no`, or a default on a question that has one.
    pub fn boolean(&self, answer: Answer) -> Result<bool, PromptError> {
        let text = match &answer {
            Answer::Bool(b) => return Ok(*b),
            Answer::Default => self.default.clone(),
            Answer::Text(t) if t.trim().is_empty() => self.default.clone(),
            Answer::Text(t) => Some(t.clone()),
            Answer::Cardinality(_) => None,
        };
        match text.as_deref().map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("y" | "yes" | "true") => Ok(true),
            Some("n" | "no" | "false") => Ok(false),
            _ => Err(self.unexpected(&answer)),
        }
    }

    fn unexpected(&self, answer: &Answer) -> PromptError {
        PromptError::UnexpectedAnswer {
            question: self.question.clone(),
            answer: answer.to_string(),
        }
    }
}

impl Display for PromptRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.default {
            Some(default) => write!(f, "{} [{default}]:", self.question),
            None => write!(f, "{}:", self.question),
        }
    }
}

/// A pre-validated answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// Accept the default (`<return>`)
    Default,
    /// Free text
    Text(String),
    /// Yes or no
    Bool(bool),
    /// Relation type
    Cardinality(Cardinality),
}

impl Display for Answer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("<default>"),
            Self::Text(t) => write!(f, "'{t}'"),
            Self::Bool(b) => write!(f, "{}", if *b { "yes" } else { "no" }),
            Self::Cardinality(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    Bool(bool),
    Int(i64),
    Text(String),
    Cardinality { cardinality: Cardinality },
}

impl<'de> Deserialize<'de> for Answer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<RawAnswer> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => Self::Default,
            Some(RawAnswer::Bool(b)) => Self::Bool(b),
            Some(RawAnswer::Int(n)) => Self::Text(n.to_string()),
            Some(RawAnswer::Text(t)) => Self::Text(t),
            Some(RawAnswer::Cardinality { cardinality }) => Self::Cardinality(cardinality),
        })
    }
}

/// Source of answers
pub trait Prompter {
    /// Answer one question
    ///
    /// # Errors
    /// Returns [`PromptError`] when no answer can be produced.
    fn ask(&mut self, request: &PromptRequest) -> Result<Answer, PromptError>;
}

/// Answers from a fixed list, in order
#[derive(Debug, Clone, Default)]
pub struct AnswerQueue {
    answers: VecDeque<Answer>,
    asked: Vec<PromptRequest>,
}

impl AnswerQueue {
    /// Create queue
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Load from a YAML sequence (`~` accepts the default)
    ///
    /// # Errors
    /// Returns the YAML error for anything but a sequence of answers.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        let answers: Vec<Answer> = serde_yaml::from_str(text)?;
        Ok(Self::new(answers))
    }

    /// Append an answer
    pub fn push(&mut self, answer: Answer) {
        self.answers.push_back(answer);
    }

    /// Questions asked so far
    #[inline]
    #[must_use]
    pub fn asked(&self) -> &[PromptRequest] {
        &self.asked
    }

    /// Whether a question with `key` was asked
    #[must_use]
    pub fn was_asked(&self, key: PromptKey) -> bool {
        self.asked.iter().any(|r| r.key == key)
    }

    /// Answers not consumed
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for AnswerQueue {
    fn ask(&mut self, request: &PromptRequest) -> Result<Answer, PromptError> {
        self.asked.push(request.clone());
        self.answers
            .pop_front()
            .ok_or_else(|| PromptError::AnswersExhausted {
                question: request.question.clone(),
            })
    }
}

/// Reads one line per question; an empty line accepts the default
#[derive(Debug)]
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Create prompter
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn ask(&mut self, request: &PromptRequest) -> Result<Answer, PromptError> {
        write!(self.output, "\n {request}\n > ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::AnswersExhausted {
                question: request.question.clone(),
            });
        }
        let line = line.trim();
        Ok(if line.is_empty() {
            Answer::Default
        } else {
            Answer::Text(line.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_records_questions() {
        let mut queue = AnswerQueue::new([Answer::Text("User".into())]);
        let request = PromptRequest::new(PromptKey::ClassName, "Class name of the entity");
        assert_eq!(queue.ask(&request).unwrap(), Answer::Text("User".into()));
        assert!(queue.was_asked(PromptKey::ClassName));
        assert!(matches!(
            queue.ask(&request),
            Err(PromptError::AnswersExhausted { .. })
        ));
        assert_eq!(queue.asked().len(), 2);
    }

    #[test]
    fn yaml_answers() {
        let queue = AnswerQueue::from_yaml("- User\n- ~\n- true\n- 255\n- cardinality: OneToMany\n").unwrap();
        assert_eq!(
            queue.answers,
            vec![
                Answer::Text("User".into()),
                Answer::Default,
                Answer::Bool(true),
                Answer::Text("255".into()),
                Answer::Cardinality(Cardinality::OneToMany),
            ]
        );
    }

    #[test]
    fn defaults_and_yes_no() {
        let request = PromptRequest::yes_no(PromptKey::Nullable, "Nullable?", false);
        assert!(!request.boolean(Answer::Default).unwrap());
        assert!(request.boolean(Answer::Text("yes".into())).unwrap());
        assert!(request.boolean(Answer::Text("maybe".into())).is_err());

        let request = PromptRequest::new(PromptKey::FieldLength, "Field length").with_default("255");
        assert_eq!(request.text(Answer::Default).unwrap(), "255");
        assert!(request.text(Answer::Bool(true)).is_err());
        assert_eq!(request.to_string(), "Field length [255]:");
    }

    #[test]
    fn line_prompter_reads_answers() {
        let input = b"User\n\n".as_slice();
        let mut output = Vec::new();
        let mut prompter = LinePrompter::new(input, &mut output);
        let request = PromptRequest::new(PromptKey::ClassName, "Class name");
        assert_eq!(prompter.ask(&request).unwrap(), Answer::Text("User".into()));
        assert_eq!(prompter.ask(&request).unwrap(), Answer::Default);
        assert!(prompter.ask(&request).is_err());
        drop(prompter);
        assert!(String::from_utf8(output).unwrap().contains("Class name:"));
    }
}
