//! Data model for a parsed commentary file.
//!
//! The [`Document`] owns the running text; footnotes live in a flat,
//! number-indexed collection of their own because they come from a distinct
//! region of the source file. The two are joined later by the linker through
//! shared anchor identifiers.

use crate::commentary::footnote::FootnoteKind;

/// One line of running text with its position in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    /// 1-based line number in the source file.
    pub no: usize,
    pub text: String,
}

impl TextLine {
    pub fn new(no: usize, text: impl Into<String>) -> Self {
        Self {
            no,
            text: text.into(),
        }
    }
}

/// A parsed commentary file before cross-reference linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Document number, taken from the `_<n>` suffix of the file base name.
    /// Feeds the `n` attribute of the title `<div>`.
    pub doc_num: u32,
    /// Introduction lines, if the file has an introduction block.
    pub introduction: Vec<TextLine>,
    /// Title lines. Never empty for a structurally valid file.
    pub title: Vec<TextLine>,
    /// Aphorisms, numbered 1..N contiguously.
    pub aphorisms: Vec<Aphorism>,
}

impl Document {
    /// All text lines in document order: introduction, title, then each
    /// aphorism followed by its commentary. This is the order footnote
    /// markers must first occur in.
    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.introduction
            .iter()
            .chain(self.title.iter())
            .chain(self.aphorisms.iter().flat_map(|aphorism| {
                std::iter::once(&aphorism.text).chain(aphorism.commentary.iter())
            }))
    }
}

/// One aphorism together with its commentary lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aphorism {
    /// 1-based number; matches the aphorism's position in the document.
    pub number: u32,
    /// The aphorism text (a single line).
    pub text: TextLine,
    /// Commentary lines following the aphorism, in source order.
    pub commentary: Vec<TextLine>,
}

/// A raw footnote definition line, before grammar classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteLine {
    /// Footnote number from the leading `*n*`.
    pub number: u32,
    /// The definition body: everything after `*n*`, trailing `.` stripped.
    pub body: String,
    /// 1-based line number in the source file.
    pub line_no: usize,
}

/// A classified footnote definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub number: u32,
    /// The raw definition body the classification was derived from.
    pub raw: String,
    /// Trailing note introduced by `;`, kept for the app `<note>` entry.
    pub note: Option<String>,
    pub kind: FootnoteKind,
}
