use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// What went wrong while converting a quest document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The token stream could not be built from the input.
    Lex,
    /// No `# Quest: <name>` heading, or an empty name.
    MalformedHeader,
    /// A block heading without an `id:` line.
    MissingBlockId,
    /// Two blocks in the same quest share an id.
    DuplicateBlockId,
    /// A block tag with no converter in the registry.
    UnknownBlockType,
    /// A block whose properties break its variant's contract.
    Validation,
}

impl ErrorKind {
    /// Structural errors are about the document's shape rather than a block's contents.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedHeader
                | ErrorKind::MissingBlockId
                | ErrorKind::DuplicateBlockId
                | ErrorKind::UnknownBlockType
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Lex => "lex error",
            ErrorKind::MalformedHeader => "malformed quest header",
            ErrorKind::MissingBlockId => "missing block id",
            ErrorKind::DuplicateBlockId => "duplicate block id",
            ErrorKind::UnknownBlockType => "unknown block type",
            ErrorKind::Validation => "validation error",
        };
        f.write_str(label)
    }
}

/// Conversion error with optional source location information.
///
/// The message is the whole `Display` output so callers can match on it
/// directly. Spans, when present, are byte ranges into the original input.
#[derive(Debug, Clone)]
pub struct ConvertError {
    pub kind: ErrorKind,
    pub message: String,
    /// Id of the offending block, for validation errors.
    pub block_id: Option<String>,
    pub span: Option<Range<usize>>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl ConvertError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ConvertError {
            kind,
            message: message.into(),
            block_id: None,
            span: None,
            file_id: 0,
            notes: Vec::new(),
        }
    }

    pub fn lex(message: impl Into<String>, span: Range<usize>) -> Self {
        ConvertError::new(ErrorKind::Lex, message).with_span(span)
    }

    pub fn malformed_header(message: impl Into<String>) -> Self {
        ConvertError::new(ErrorKind::MalformedHeader, message)
    }

    pub fn unknown_block_type(tag: &str) -> Self {
        ConvertError::new(
            ErrorKind::UnknownBlockType,
            format!("No converter registered for block type: {}", tag),
        )
    }

    /// A block-level contract violation. The message should already name the block id.
    pub fn validation(block_id: &str, message: impl Into<String>) -> Self {
        let mut err = ConvertError::new(ErrorKind::Validation, message);
        err.block_id = Some(block_id.to_string());
        err
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_file_id(mut self, file_id: usize) -> Self {
        self.file_id = file_id;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Attach a span only if the error does not carry one yet.
    pub fn or_span(self, span: Range<usize>) -> Self {
        if self.span.is_some() {
            self
        } else {
            self.with_span(span)
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let labels = match &self.span {
            Some(span) => {
                vec![Label::primary(self.file_id, span.clone()).with_message(self.kind.to_string())]
            }
            None => Vec::new(),
        };
        Diagnostic::new(Severity::Error)
            .with_message(&self.message)
            .with_labels(labels)
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConvertError {}
