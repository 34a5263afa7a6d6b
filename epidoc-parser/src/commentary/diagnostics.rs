//! Diagnostics sink threaded through the processing stages.
//!
//! The core stages never log directly; they record [`Diagnostic`] entries in
//! a [`Reporter`] passed down the call chain. This keeps the parsing engine
//! testable without log side effects and lets the caller decide how the
//! entries are surfaced (terminal logging, JSON report, test assertions).

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One recorded finding, locatable in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// 1-based source line, when the finding is tied to a line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Footnote number, when the finding is tied to a footnote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footnote: Option<u32>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(line) = self.line {
            write!(f, " line {}", line)?;
        }
        if let Some(n) = self.footnote {
            write!(f, " footnote {}", n)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Collects diagnostics for one file run.
#[derive(Debug, Default, Clone)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Diagnostic {
            severity: Severity::Info,
            line: None,
            footnote: None,
            message: message.into(),
        });
    }

    pub fn warning(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.record(Diagnostic {
            severity: Severity::Warning,
            line,
            footnote: None,
            message: message.into(),
        });
    }

    pub fn error(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.record(Diagnostic {
            severity: Severity::Error,
            line,
            footnote: None,
            message: message.into(),
        });
    }

    pub fn footnote_error(&mut self, number: u32, message: impl Into<String>) {
        self.record(Diagnostic {
            severity: Severity::Error,
            line: None,
            footnote: Some(number),
            message: message.into(),
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Serialize all recorded diagnostics as a JSON array.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.diagnostics).expect("diagnostics serialize to JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_counts_errors() {
        let mut reporter = Reporter::new();
        reporter.info("opened file");
        assert!(!reporter.has_errors());

        reporter.error(Some(12), "numbering gap");
        reporter.warning(None, "marker out of order");
        assert!(reporter.has_errors());
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.diagnostics().len(), 3);
    }

    #[test]
    fn display_includes_location() {
        let mut reporter = Reporter::new();
        reporter.footnote_error(3, "unmatched definition");
        let shown = reporter.diagnostics()[0].to_string();
        assert_eq!(shown, "ERROR footnote 3: unmatched definition");
    }

    #[test]
    fn json_export_round_trips() {
        let mut reporter = Reporter::new();
        reporter.error(Some(4), "bad marker");
        let parsed: serde_json::Value = serde_json::from_str(&reporter.to_json()).unwrap();
        assert_eq!(parsed[0]["severity"], "Error");
        assert_eq!(parsed[0]["line"], 4);
    }
}
