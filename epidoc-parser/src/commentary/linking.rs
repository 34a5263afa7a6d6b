//! Cross-reference linker.
//!
//! Joins the footnote markers scanned from the body text to the classified
//! footnote definitions, assigning every matched pair one [`AnchorId`]. The
//! anchor is the double-end-point-attached link: the main document's inline
//! `<app>` element and the app document's apparatus entry both carry it, so
//! either document can be traversed independently of the other.
//!
//! Matching is a bijection. A marker with no definition or a definition
//! never referenced is fatal for the file; marker numbers whose first
//! occurrences are not in ascending order are reported as warnings only.

use crate::commentary::diagnostics::Reporter;
use crate::commentary::document::{Document, Footnote, TextLine};
use crate::commentary::error::CrossReferenceError;
use crate::commentary::scanning::{scan_line, Marker};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier shared by a marker's insertion point in the main document and
/// the corresponding apparatus entry. Never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(u32);

impl AnchorId {
    pub fn number(self) -> u32 {
        self.0
    }

    /// `xml:id` of the inline element opening the marked span.
    pub fn begin(self) -> String {
        format!("begin_fn{}", self.0)
    }

    /// `xml:id` of the anchor closing the marked span.
    pub fn end(self) -> String {
        format!("end_fn{}", self.0)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// A text line with its scanned markers, in offset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedLine {
    pub line: TextLine,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAphorism {
    pub number: u32,
    pub text: LinkedLine,
    pub commentary: Vec<LinkedLine>,
}

/// A footnote definition with its assigned anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedFootnote {
    pub footnote: Footnote,
    pub anchor: AnchorId,
}

/// The fully linked document, ready for XML assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedDocument {
    pub doc_num: u32,
    pub introduction: Vec<LinkedLine>,
    pub title: Vec<LinkedLine>,
    pub aphorisms: Vec<LinkedAphorism>,
    /// In definition order; each anchor matches exactly one inline marker.
    pub footnotes: Vec<LinkedFootnote>,
}

/// Scan every text line of `document`, join markers to `footnotes`, and
/// assign anchors. All findings are recorded on the reporter; the first
/// fatal cross-reference violation is also returned as the error.
pub fn link(
    document: &Document,
    footnotes: Vec<Footnote>,
    reporter: &mut Reporter,
) -> Result<LinkedDocument, CrossReferenceError> {
    let definitions: BTreeMap<u32, &Footnote> =
        footnotes.iter().map(|f| (f.number, f)).collect();

    let mut first_error: Option<CrossReferenceError> = None;
    let mut record = |reporter: &mut Reporter, number: u32, message: String| {
        reporter.footnote_error(number, message.clone());
        if first_error.is_none() {
            first_error = Some(CrossReferenceError { number, message });
        }
    };

    // referenced[n] = line of first marker occurrence.
    let mut referenced: BTreeMap<u32, usize> = BTreeMap::new();
    let mut highest_seen: Option<u32> = None;

    let mut scan = |line: &TextLine, reporter: &mut Reporter| -> LinkedLine {
        let (markers, errors) = scan_line(&line.text, line.no);
        for error in errors {
            reporter.error(Some(error.line), error.to_string());
        }
        for marker in &markers {
            let footnote = match marker {
                Marker::Footnote(f) => f,
                Marker::Witness(_) => continue,
            };
            let number = footnote.number;
            if let Some(first_line) = referenced.get(&number) {
                record(
                    reporter,
                    number,
                    format!(
                        "marker *{}* occurs more than once (first on line {}, again on line {})",
                        number, first_line, line.no
                    ),
                );
                continue;
            }
            referenced.insert(number, line.no);
            if !definitions.contains_key(&number) {
                record(
                    reporter,
                    number,
                    format!(
                        "marker *{}* on line {} has no footnote definition",
                        number, line.no
                    ),
                );
            }
            match highest_seen {
                Some(highest) if number < highest => {
                    reporter.warning(
                        Some(line.no),
                        format!(
                            "marker *{}* appears in the text after marker *{}*",
                            number, highest
                        ),
                    );
                }
                _ => highest_seen = Some(number),
            }
        }
        LinkedLine {
            line: line.clone(),
            markers,
        }
    };

    let introduction = document
        .introduction
        .iter()
        .map(|line| scan(line, reporter))
        .collect();
    let title = document
        .title
        .iter()
        .map(|line| scan(line, reporter))
        .collect();
    let aphorisms = document
        .aphorisms
        .iter()
        .map(|aphorism| LinkedAphorism {
            number: aphorism.number,
            text: scan(&aphorism.text, reporter),
            commentary: aphorism
                .commentary
                .iter()
                .map(|line| scan(line, reporter))
                .collect(),
        })
        .collect();

    for footnote in &footnotes {
        if !referenced.contains_key(&footnote.number) {
            record(
                reporter,
                footnote.number,
                format!(
                    "footnote definition *{}* is never referenced in the text",
                    footnote.number
                ),
            );
        }
    }

    if let Some(error) = first_error {
        return Err(error);
    }

    Ok(LinkedDocument {
        doc_num: document.doc_num,
        introduction,
        title,
        aphorisms,
        footnotes: footnotes
            .into_iter()
            .map(|footnote| {
                let anchor = AnchorId(footnote.number);
                LinkedFootnote { footnote, anchor }
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::document::Aphorism;
    use crate::commentary::footnote::{FootnoteKind, Reading};

    fn footnote(number: u32) -> Footnote {
        Footnote {
            number,
            raw: format!("seg{} ] W1: om. W2", number),
            note: None,
            kind: FootnoteKind::Omission {
                segment: format!("seg{}", number),
                reason: None,
                reading: Some(Reading {
                    text: String::new(),
                    witnesses: vec!["W1".into()],
                }),
                omitted_by: vec!["W2".into()],
            },
        }
    }

    fn document(lines: &[&str]) -> Document {
        Document {
            doc_num: 1,
            introduction: Vec::new(),
            title: vec![TextLine::new(1, "Title.")],
            aphorisms: vec![Aphorism {
                number: 1,
                text: TextLine::new(2, lines[0]),
                commentary: lines[1..]
                    .iter()
                    .enumerate()
                    .map(|(i, text)| TextLine::new(3 + i, *text))
                    .collect(),
            }],
        }
    }

    #[test]
    fn links_markers_to_definitions_bijectively() {
        let doc = document(&["text *1*alpha more", "and *2*beta here"]);
        let mut reporter = Reporter::new();
        let linked = link(&doc, vec![footnote(1), footnote(2)], &mut reporter).unwrap();

        assert!(!reporter.has_errors());
        assert_eq!(linked.footnotes.len(), 2);
        assert_eq!(linked.footnotes[0].anchor.begin(), "begin_fn1");
        assert_eq!(linked.footnotes[1].anchor.end(), "end_fn2");

        // Each anchor pairs with exactly one inline marker occurrence.
        let marker_numbers: Vec<u32> = linked
            .aphorisms
            .iter()
            .flat_map(|a| std::iter::once(&a.text).chain(a.commentary.iter()))
            .flat_map(|line| line.markers.iter())
            .filter_map(|m| match m {
                Marker::Footnote(f) => Some(f.number),
                Marker::Witness(_) => None,
            })
            .collect();
        assert_eq!(marker_numbers, vec![1, 2]);
    }

    #[test]
    fn marker_without_definition_is_fatal() {
        let doc = document(&["text *1*alpha and *2*beta"]);
        let mut reporter = Reporter::new();
        let error = link(&doc, vec![footnote(1)], &mut reporter).unwrap_err();
        assert_eq!(error.number, 2);
        assert!(reporter.has_errors());
    }

    #[test]
    fn unreferenced_definition_is_fatal() {
        let doc = document(&["text *1*alpha only"]);
        let mut reporter = Reporter::new();
        let error = link(&doc, vec![footnote(1), footnote(2)], &mut reporter).unwrap_err();
        assert_eq!(error.number, 2);
        assert!(error.message.contains("never referenced"));
    }

    #[test]
    fn duplicate_marker_is_fatal() {
        let doc = document(&["text *1*alpha and *1*again"]);
        let mut reporter = Reporter::new();
        let error = link(&doc, vec![footnote(1)], &mut reporter).unwrap_err();
        assert!(error.message.contains("more than once"));
    }

    #[test]
    fn out_of_order_markers_warn_but_link() {
        let doc = document(&["text *2*beta first", "then *1*alpha later"]);
        let mut reporter = Reporter::new();
        let linked = link(&doc, vec![footnote(1), footnote(2)], &mut reporter).unwrap();
        assert_eq!(linked.footnotes.len(), 2);
        assert!(!reporter.has_errors());
        assert!(reporter
            .diagnostics()
            .iter()
            .any(|d| d.severity == crate::commentary::Severity::Warning
                && d.message.contains("after marker")));
    }

    #[test]
    fn marker_syntax_errors_are_recorded() {
        let doc = document(&["broken *1 marker here *1*word"]);
        let mut reporter = Reporter::new();
        let _ = link(&doc, vec![footnote(1)], &mut reporter);
        assert!(reporter
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("missing closing '*'")));
    }
}
