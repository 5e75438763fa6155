//! Error types for XDITA parsing.

use lwdita_ast::{ContentModelViolation, UnknownTagError};
use std::fmt;
use thiserror::Error;

/// Location in the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizationErrorKind {
    /// Malformed markup reported by the XML reader.
    Syntax(String),
    /// An attribute that could not be read; the attribute is skipped.
    Attribute(String),
    /// Text with a bad entity reference; the raw text is kept.
    Text(String),
    /// An element still open when its parent (or the input) ended.
    Unclosed(String),
    /// A close tag with no matching open element; ignored.
    UnexpectedClose(String),
}

/// A recoverable tokenizer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{position}: {kind}")]
pub struct TokenizationError {
    pub kind: TokenizationErrorKind,
    pub position: Position,
}

impl fmt::Display for TokenizationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizationErrorKind::Syntax(message) => write!(f, "XML syntax error: {message}"),
            TokenizationErrorKind::Attribute(message) => {
                write!(f, "invalid attribute: {message}")
            }
            TokenizationErrorKind::Text(message) => write!(f, "invalid text content: {message}"),
            TokenizationErrorKind::Unclosed(tag) => write!(f, "unclosed element <{tag}>"),
            TokenizationErrorKind::UnexpectedClose(tag) => {
                write!(f, "unexpected closing tag </{tag}>")
            }
        }
    }
}

/// Why a parse failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The input was not well-formed.
    #[error("{}", describe_tokenization(.0))]
    Tokenization(Vec<TokenizationError>),

    #[error("{error} at {position}")]
    UnknownTag {
        error: UnknownTagError,
        position: Position,
    },

    #[error("{violation} at {position}")]
    ContentModel {
        violation: ContentModelViolation,
        position: Position,
    },

    #[error(transparent)]
    Tree(#[from] lwdita_ast::Error),
}

fn describe_tokenization(errors: &[TokenizationError]) -> String {
    match errors {
        [] => "malformed XML".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

/// A lenient-mode problem recorded while building a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    Tokenization(TokenizationError),
    /// An element that was skipped, together with its own tags.
    UnknownTag {
        error: UnknownTagError,
        position: Position,
    },
    /// A violation that was tolerated; the node was kept.
    ContentModel {
        violation: ContentModelViolation,
        position: Position,
    },
}

impl Diagnostic {
    pub fn position(&self) -> Position {
        match self {
            Diagnostic::Tokenization(error) => error.position,
            Diagnostic::UnknownTag { position, .. } | Diagnostic::ContentModel { position, .. } => {
                *position
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Tokenization(error) => write!(f, "{error}"),
            Diagnostic::UnknownTag { error, position } => write!(f, "{position}: {error}"),
            Diagnostic::ContentModel {
                violation,
                position,
            } => write!(f, "{position}: {violation}"),
        }
    }
}
