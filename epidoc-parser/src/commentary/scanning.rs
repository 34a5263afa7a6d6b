//! Witness/footnote marker scanner.
//!
//! Raw tokenization is handled by a logos lexer; [`MarkerScanner`] walks the
//! token stream once, yielding marker occurrences in offset order. Scanning a
//! line is linear in its length: the `#`-terminator lookahead for one
//! footnote marker stops at the next footnote marker, so no token is examined
//! more than twice.
//!
//! Marker forms:
//! - `[WW LL]`: a witness reference; the bracketed content must be a witness
//!   code and a locator separated by a space, with no nested brackets.
//! - `*n*word`: a single-word footnote span: exactly the next token,
//!   trailing punctuation stripped.
//! - `*n*marked run of text#`: a multi-word footnote span ending at (and
//!   excluding) the `#`, which must occur on the same line.
//!
//! Witness references may sit inside a footnote span; both markers are
//! yielded.

use crate::commentary::error::MarkerSyntaxError;
use logos::Logos;
use std::ops::Range;

/// Raw tokens for one line of running text.
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("#")]
    Hash,
    /// A complete footnote mark `*n*`.
    #[regex(r"\*[0-9]+\*")]
    FootnoteMark,
    /// A lone `*`, kept separate so unterminated marks can be reported.
    #[token("*")]
    Star,
    #[regex(r"[ \t]+")]
    Whitespace,
    #[regex(r"[^\[\]#\* \t]+")]
    Text,
}

/// Tokenize one line with source spans.
pub fn tokenize_line(line: &str) -> Vec<(LineToken, Range<usize>)> {
    let mut lexer = LineToken::lexer(line);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        if let Ok(token) = result {
            tokens.push((token, lexer.span()));
        }
    }
    tokens
}

/// Witness reference `[WW LL]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessRef {
    pub code: String,
    pub location: String,
    /// Byte range of the whole `[...]` construct within the line.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    SingleWord,
    MultiWord,
}

/// Footnote marker `*n*` with its resolved span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteMarker {
    pub number: u32,
    pub kind: SpanKind,
    /// The marked text (single word, or the run up to the `#`).
    pub text: String,
    /// Byte range of the marked text within the line.
    pub text_range: Range<usize>,
    /// Byte range of the whole construct, `*n*` through the span end
    /// (including the `#` terminator for multi-word spans).
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Witness(WitnessRef),
    Footnote(FootnoteMarker),
}

impl Marker {
    pub fn start(&self) -> usize {
        match self {
            Marker::Witness(w) => w.span.start,
            Marker::Footnote(f) => f.span.start,
        }
    }
}

/// Punctuation stripped from the end of a single-word span.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '·'];

/// Lazy iterator over the markers of one line, in offset order.
///
/// Restartable: construct a fresh scanner from the same line to scan again.
/// Malformed markers are yielded as errors carrying the line number and byte
/// offset; scanning continues after them.
pub struct MarkerScanner<'a> {
    line: &'a str,
    line_no: usize,
    tokens: Vec<(LineToken, Range<usize>)>,
    pos: usize,
}

impl<'a> MarkerScanner<'a> {
    pub fn new(line: &'a str, line_no: usize) -> Self {
        Self {
            line,
            line_no,
            tokens: tokenize_line(line),
            pos: 0,
        }
    }

    fn err(&self, offset: usize, message: impl Into<String>) -> MarkerSyntaxError {
        MarkerSyntaxError {
            line: self.line_no,
            offset,
            message: message.into(),
        }
    }

    /// Parse a witness reference starting at the `[` token at `self.pos`.
    fn witness_ref(&mut self) -> Result<WitnessRef, MarkerSyntaxError> {
        let open = self.tokens[self.pos].1.clone();
        let mut i = self.pos + 1;
        let close = loop {
            match self.tokens.get(i) {
                Some((LineToken::CloseBracket, span)) => break span.clone(),
                Some((LineToken::OpenBracket, span)) => {
                    self.pos = i;
                    return Err(self.err(span.start, "nested '[' in witness reference"));
                }
                Some(_) => i += 1,
                None => {
                    // Skip only the `[` so scanning can pick up markers that
                    // follow inside the would-be reference.
                    self.pos += 1;
                    return Err(self.err(open.start, "unterminated witness reference"));
                }
            }
        };
        self.pos = i + 1;

        let content = &self.line[open.end..close.start];
        let (code, location) = content.split_once([' ', '\t']).ok_or_else(|| {
            self.err(
                open.start,
                format!("witness reference [{}] is missing the space between code and locator", content),
            )
        })?;
        let code = code.trim();
        let location = location.trim();
        if code.is_empty() || location.is_empty() {
            return Err(self.err(
                open.start,
                format!("witness reference [{}] has an empty code or locator", content),
            ));
        }
        Ok(WitnessRef {
            code: code.to_string(),
            location: location.to_string(),
            span: open.start..close.end,
        })
    }

    /// Parse a footnote marker starting at the `*n*` token at `self.pos`.
    fn footnote_marker(&mut self) -> Result<FootnoteMarker, MarkerSyntaxError> {
        let mark = self.tokens[self.pos].1.clone();
        let digits = self.line[mark.clone()].trim_matches('*');
        let number: u32 = digits
            .parse()
            .map_err(|_| self.err(mark.start, "footnote number out of range"))?;
        if number == 0 {
            self.pos += 1;
            return Err(self.err(mark.start, "footnote number must be positive"));
        }

        // Look for a `#` terminator before the next footnote mark.
        let mut hash = None;
        for (token, span) in &self.tokens[self.pos + 1..] {
            match token {
                LineToken::FootnoteMark => break,
                LineToken::Hash => {
                    hash = Some(span.clone());
                    break;
                }
                _ => {}
            }
        }

        if let Some(hash) = hash {
            // Multi-word span: everything strictly between `*n*` and `#`.
            self.pos += 1;
            return Ok(FootnoteMarker {
                number,
                kind: SpanKind::MultiWord,
                text: self.line[mark.end..hash.start].to_string(),
                text_range: mark.end..hash.start,
                span: mark.start..hash.end,
            });
        }

        // Single-word span: exactly the next token, trailing punctuation
        // stripped. A marker with nothing to cover is unterminated.
        let word = match self.tokens.get(self.pos + 1) {
            Some((LineToken::Text, span)) => span.clone(),
            _ => {
                self.pos += 1;
                return Err(self.err(
                    mark.start,
                    format!(
                        "footnote marker *{}* is not followed by a word \
                         and has no '#' terminator before the end of the line",
                        number
                    ),
                ));
            }
        };
        let trimmed = self.line[word.clone()].trim_end_matches(TRAILING_PUNCTUATION);
        if trimmed.is_empty() {
            self.pos += 1;
            return Err(self.err(
                mark.start,
                format!("footnote marker *{}* covers no word", number),
            ));
        }
        let text_range = word.start..word.start + trimmed.len();
        self.pos += 1;
        Ok(FootnoteMarker {
            number,
            kind: SpanKind::SingleWord,
            text: trimmed.to_string(),
            text_range: text_range.clone(),
            span: mark.start..text_range.end,
        })
    }
}

impl<'a> Iterator for MarkerScanner<'a> {
    type Item = Result<Marker, MarkerSyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.tokens.len() {
            match self.tokens[self.pos].0 {
                LineToken::OpenBracket => {
                    return Some(self.witness_ref().map(Marker::Witness));
                }
                LineToken::FootnoteMark => {
                    return Some(self.footnote_marker().map(Marker::Footnote));
                }
                LineToken::Star => {
                    // `*12 text` - digits follow with no closing star.
                    let star = self.tokens[self.pos].1.clone();
                    let unterminated = matches!(
                        self.tokens.get(self.pos + 1),
                        Some((LineToken::Text, span))
                            if span.start == star.end
                                && self.line[span.clone()].starts_with(|c: char| c.is_ascii_digit())
                    );
                    self.pos += 1;
                    if unterminated {
                        self.pos += 1;
                        return Some(Err(self.err(
                            star.start,
                            "unterminated footnote marker (missing closing '*')",
                        )));
                    }
                }
                _ => self.pos += 1,
            }
        }
        None
    }
}

/// Scan a whole line, splitting markers from syntax errors.
pub fn scan_line(line: &str, line_no: usize) -> (Vec<Marker>, Vec<MarkerSyntaxError>) {
    let mut markers = Vec::new();
    let mut errors = Vec::new();
    for item in MarkerScanner::new(line, line_no) {
        match item {
            Ok(marker) => markers.push(marker),
            Err(error) => errors.push(error),
        }
    }
    (markers, errors)
}
