//! Document structure parser.
//!
//! A single forward pass over the lines of a file drives a small state
//! machine:
//!
//! ```text
//! Start → (Introduction, terminated by a "++" line)? → Title
//!       → (AphorismNumber → AphorismText → CommentaryLine*)+
//!       → FootnoteList → End
//! ```
//!
//! The aphorism blocks must be numbered 1..N contiguously and the footnote
//! list 1..M contiguously; violations are recorded on the reporter and the
//! parse fails. Numbering findings are collected across the whole file
//! before failing, to maximize diagnostic yield.

use crate::commentary::diagnostics::Reporter;
use crate::commentary::document::{Aphorism, FootnoteLine, TextLine};
use crate::commentary::error::StructuralError;
use crate::commentary::footnote::split_definition;
use once_cell::sync::Lazy;
use regex::Regex;

/// A bare integer with an optional trailing `.` marks an aphorism block.
static APHORISM_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)\.?$").unwrap());

/// A line opening with the literal `*1*` marks the start of the footnote
/// list. Body lines may open with any other marker; only the first
/// definition line is a boundary.
static FOOTNOTE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*1\*").unwrap());

/// Terminator of the introduction block.
const INTRODUCTION_END: &str = "++";

/// The structural split of one file, before linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStructure {
    pub introduction: Vec<TextLine>,
    pub title: Vec<TextLine>,
    pub aphorisms: Vec<Aphorism>,
    pub footnotes: Vec<FootnoteLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Collecting introduction or title lines, before the first aphorism.
    Preamble,
    /// Just consumed an aphorism number line; its text line must follow.
    AphorismText,
    /// Inside an aphorism's commentary lines.
    Commentary,
    /// Inside the trailing footnote list.
    Footnotes,
}

/// Split a file into introduction, title, aphorism blocks and footnote list.
pub fn parse(text: &str, reporter: &mut Reporter) -> Result<ParsedStructure, StructuralError> {
    let mut state = State::Preamble;
    let mut preamble: Vec<TextLine> = Vec::new();
    let mut intro_end: Option<usize> = None;
    let mut aphorisms: Vec<Aphorism> = Vec::new();
    let mut footnotes: Vec<FootnoteLine> = Vec::new();
    let mut numbering_ok = true;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        // The footnote list boundary ends the body wherever we are.
        if state != State::Footnotes
            && state != State::Preamble
            && FOOTNOTE_START.is_match(line)
        {
            state = State::Footnotes;
        }

        match state {
            State::Preamble => {
                if line == INTRODUCTION_END {
                    if intro_end.is_some() {
                        let error = StructuralError::new(
                            Some(line_no),
                            "more than one '++' introduction terminator",
                        );
                        reporter.error(Some(line_no), error.to_string());
                        return Err(error);
                    }
                    intro_end = Some(preamble.len());
                } else if let Some(captures) = APHORISM_NUMBER.captures(line) {
                    let number: u32 = captures[1].parse().map_err(|_| {
                        StructuralError::new(Some(line_no), "aphorism number out of range")
                    })?;
                    aphorisms.push(Aphorism {
                        number,
                        text: TextLine::new(0, ""),
                        commentary: Vec::new(),
                    });
                    state = State::AphorismText;
                } else {
                    preamble.push(TextLine::new(line_no, line));
                }
            }
            State::AphorismText => {
                let aphorism = aphorisms.last_mut().expect("entered via number line");
                if APHORISM_NUMBER.is_match(line) {
                    let error = StructuralError::new(
                        Some(line_no),
                        format!("aphorism {} has no text", aphorism.number),
                    );
                    reporter.error(Some(line_no), error.to_string());
                    return Err(error);
                }
                aphorism.text = TextLine::new(line_no, line);
                state = State::Commentary;
            }
            State::Commentary => {
                if let Some(captures) = APHORISM_NUMBER.captures(line) {
                    let number: u32 = captures[1].parse().map_err(|_| {
                        StructuralError::new(Some(line_no), "aphorism number out of range")
                    })?;
                    aphorisms.push(Aphorism {
                        number,
                        text: TextLine::new(0, ""),
                        commentary: Vec::new(),
                    });
                    state = State::AphorismText;
                } else {
                    aphorisms
                        .last_mut()
                        .expect("in commentary state")
                        .commentary
                        .push(TextLine::new(line_no, line));
                }
            }
            State::Footnotes => match split_definition(line) {
                Some((number, body)) => footnotes.push(FootnoteLine {
                    number,
                    body,
                    line_no,
                }),
                None => {
                    let error = StructuralError::new(
                        Some(line_no),
                        format!("malformed footnote definition line: {:?}", line),
                    );
                    reporter.error(Some(line_no), error.to_string());
                    return Err(error);
                }
            },
        }
    }

    // Covers both a number line at end of input and one immediately
    // followed by the footnote list.
    if let Some(aphorism) = aphorisms.iter().find(|a| a.text.no == 0) {
        let error = StructuralError::new(None, format!("aphorism {} has no text", aphorism.number));
        reporter.error(None, error.to_string());
        return Err(error);
    }

    // Split the preamble into introduction and title.
    let (introduction, title) = match intro_end {
        Some(split) => {
            let title = preamble.split_off(split);
            (preamble, title)
        }
        None => (Vec::new(), preamble),
    };
    if title.is_empty() {
        let error = StructuralError::new(None, "no title found before the first aphorism");
        reporter.error(None, error.to_string());
        return Err(error);
    }
    if aphorisms.is_empty() {
        let error = StructuralError::new(None, "no aphorisms found");
        reporter.error(None, error.to_string());
        return Err(error);
    }

    // Aphorism numbering: 1..N contiguous. All findings are recorded before
    // the parse fails, and the declared-vs-counted mismatch is reported the
    // same way the numbering check always has been.
    let declared_last = aphorisms.last().expect("non-empty").number;
    let count = aphorisms.len() as u32;
    if declared_last != count {
        numbering_ok = false;
        reporter.error(
            None,
            format!("N aphorism expected {}, got {}", declared_last, count),
        );
    }
    let mut expected = 1;
    for aphorism in &aphorisms {
        if aphorism.number != expected {
            numbering_ok = false;
            reporter.error(
                Some(aphorism.text.no),
                format!(
                    "aphorism numbering is not contiguous: expected {}, got {}",
                    expected, aphorism.number
                ),
            );
            expected = aphorism.number;
        }
        expected += 1;
    }

    // Footnote list numbering: the boundary guarantees the list opens at
    // *1*; the rest must be contiguous.
    let mut expected = 1;
    for footnote in &footnotes {
        if footnote.number != expected {
            numbering_ok = false;
            reporter.error(
                Some(footnote.line_no),
                format!(
                    "footnote numbering is not contiguous: expected {}, got {}",
                    expected, footnote.number
                ),
            );
            expected = footnote.number;
        }
        expected += 1;
    }

    if !numbering_ok {
        return Err(StructuralError::new(None, "numbering check failed"));
    }

    Ok(ParsedStructure {
        introduction,
        title,
        aphorisms,
        footnotes,
    })
}
