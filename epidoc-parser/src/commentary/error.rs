//! Error types for commentary processing.

use std::fmt;

/// Aphorism/footnote numbering or block-ordering violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    /// 1-based source line the violation was detected on, when known.
    pub line: Option<usize>,
    pub message: String,
}

impl StructuralError {
    pub fn new(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {}: {}", line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for StructuralError {}

/// Malformed inline marker in a line of running text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSyntaxError {
    /// 1-based source line number.
    pub line: usize,
    /// Byte offset of the offending marker within the line.
    pub offset: usize,
    pub message: String,
}

impl fmt::Display for MarkerSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, offset {}: {}",
            self.line, self.offset, self.message
        )
    }
}

impl std::error::Error for MarkerSyntaxError {}

/// Footnote definition line matching none of the five grammar shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteGrammarError {
    pub number: u32,
    /// The offending definition line.
    pub body: String,
    pub message: String,
}

impl fmt::Display for FootnoteGrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "footnote {}: {} in {:?}",
            self.number, self.message, self.body
        )
    }
}

impl std::error::Error for FootnoteGrammarError {}

/// Unmatched marker/definition pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReferenceError {
    /// The footnote number on the broken end of the link.
    pub number: u32,
    pub message: String,
}

impl fmt::Display for CrossReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "footnote {}: {}", self.number, self.message)
    }
}

impl std::error::Error for CrossReferenceError {}

/// The XML template is unusable (missing insertion token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub message: String,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TemplateError {}

/// Top-level failure for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    Structural(StructuralError),
    Template(TemplateError),
    /// Errors were recorded during parsing; XML output is suppressed.
    /// The details live in the reporter that was threaded through the run.
    Failed { errors: usize },
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Structural(e) => write!(f, "structural error: {}", e),
            ProcessError::Template(e) => write!(f, "template error: {}", e),
            ProcessError::Failed { errors } => {
                write!(f, "processing failed with {} error(s)", errors)
            }
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Structural(e) => Some(e),
            ProcessError::Template(e) => Some(e),
            ProcessError::Failed { .. } => None,
        }
    }
}

impl From<StructuralError> for ProcessError {
    fn from(e: StructuralError) -> Self {
        ProcessError::Structural(e)
    }
}

impl From<TemplateError> for ProcessError {
    fn from(e: TemplateError) -> Self {
        ProcessError::Template(e)
    }
}
