//! Footnote grammar classifier.
//!
//! A footnote definition line has the form `*n*seg ] ... .` and matches
//! exactly one of five shapes, tried in fixed precedence order so ambiguous
//! lines resolve deterministically:
//!
//! 1. Omission: `seg ] [correxi:|conieci: repl] W1[, W2]: om. Wx[, Wy].`
//! 2. Addition: `seg ] add. text W1[, W2].` or `seg ] add. t1 W1: t2 W2.`
//! 3. Correxi: `seg ] correxi: text W1[, W2].` or `... t1 W1: t2 W2.`
//! 4. Conieci: same shapes as Correxi, keyed on `conieci:`.
//! 5. Variation (fallback): `seg ] W1[, W2]: text W3[, W4].`
//!
//! A trailing `; note` is stripped first and preserved for the app
//! document's `<note>` entry. Classification is total: a line matching no
//! shape is a [`FootnoteGrammarError`], and the caller moves on to the next
//! footnote.

use crate::commentary::document::{Footnote, FootnoteLine};
use crate::commentary::error::FootnoteGrammarError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading `*n*` with the definition body; trailing `.` is optional so a
/// missing full stop classifies rather than failing outright.
static DEFINITION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*([0-9]+)\*\s*(.*?)\s*\.?\s*$").unwrap());

/// One side of a variant: a reading text and the witnesses attesting it.
///
/// An empty `text` means the witnesses attest the base segment unchanged
/// (omission shape, present side).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub text: String,
    pub witnesses: Vec<String>,
}

/// Editorial reason attached to the replacement inside an omission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionReason {
    Correxi,
    Conieci,
}

/// The classified shape of a footnote, one variant per grammar form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FootnoteKind {
    Omission {
        segment: String,
        reason: Option<CorrectionReason>,
        /// Witnesses that carry the text (with their reading when the shape
        /// includes a correction); absent for `seg ] om. W.` lines.
        reading: Option<Reading>,
        omitted_by: Vec<String>,
    },
    Addition {
        segment: String,
        /// One shared reading, or two when the witnesses' added text differs.
        additions: Vec<Reading>,
    },
    Correxi {
        segment: String,
        readings: Vec<Reading>,
    },
    Conieci {
        segment: String,
        readings: Vec<Reading>,
    },
    Variation {
        segment: String,
        /// First reading is the base segment with its witnesses, second the
        /// variant text with its witnesses.
        readings: Vec<Reading>,
    },
}

impl FootnoteKind {
    pub fn name(&self) -> &'static str {
        match self {
            FootnoteKind::Omission { .. } => "omission",
            FootnoteKind::Addition { .. } => "addition",
            FootnoteKind::Correxi { .. } => "correxi",
            FootnoteKind::Conieci { .. } => "conieci",
            FootnoteKind::Variation { .. } => "variation",
        }
    }
}

/// Split a raw footnote list line into its number and body.
pub fn split_definition(line: &str) -> Option<(u32, String)> {
    let captures = DEFINITION_LINE.captures(line.trim())?;
    let number: u32 = captures[1].parse().ok()?;
    Some((number, captures[2].to_string()))
}

/// Classify one footnote definition.
pub fn classify(note_line: &FootnoteLine) -> Result<Footnote, FootnoteGrammarError> {
    let number = note_line.number;
    let err = |message: String| FootnoteGrammarError {
        number,
        body: note_line.body.clone(),
        message,
    };

    let mut body = note_line.body.trim().trim_end_matches('.').trim();

    // A `;` introduces a trailing editorial note kept out of the grammar.
    let mut note = None;
    if let Some(pos) = body.rfind(';') {
        let tail = body[pos + 1..].trim();
        if !tail.is_empty() {
            note = Some(tail.to_string());
        }
        body = body[..pos].trim_end();
    }

    let (segment, rest) = body
        .split_once(']')
        .ok_or_else(|| err("missing ']' after the base segment".into()))?;
    let segment = segment.trim();
    let rest = rest.trim();
    if segment.is_empty() {
        return Err(err("empty base segment before ']'".into()));
    }
    if rest.is_empty() {
        return Err(err("nothing after ']'".into()));
    }

    let kind = if rest.contains("om.") {
        parse_omission(segment, rest).map_err(err)?
    } else if rest.contains("add.") {
        parse_addition(segment, rest).map_err(err)?
    } else if rest.contains("correxi:") {
        let readings = parse_correction(rest, "correxi:").map_err(err)?;
        FootnoteKind::Correxi {
            segment: segment.to_string(),
            readings,
        }
    } else if rest.contains("conieci:") {
        let readings = parse_correction(rest, "conieci:").map_err(err)?;
        FootnoteKind::Conieci {
            segment: segment.to_string(),
            readings,
        }
    } else {
        parse_variation(segment, rest).map_err(err)?
    };

    Ok(Footnote {
        number,
        raw: note_line.body.clone(),
        note,
        kind,
    })
}

/// Parse `text W1[, W2]`: the last word of the first comma field is a
/// witness code, anything before it is the reading text.
fn parse_reading(part: &str) -> Result<Reading, String> {
    let mut fields = part.split(',');
    let first = fields.next().unwrap_or("").trim();
    if first.is_empty() {
        return Err("empty reading".into());
    }
    let mut words: Vec<&str> = first.split_whitespace().collect();
    let witness = words.pop().expect("non-empty field has a last word");
    let mut witnesses = vec![witness.to_string()];
    for field in fields {
        let code = field.trim();
        if code.is_empty() || code.contains(char::is_whitespace) {
            return Err(format!("malformed witness code {:?}", field.trim()));
        }
        witnesses.push(code.to_string());
    }
    Ok(Reading {
        text: words.join(" "),
        witnesses,
    })
}

/// Parse a comma-separated list of bare witness codes.
fn parse_witness_list(part: &str) -> Result<Vec<String>, String> {
    let mut witnesses = Vec::new();
    for field in part.split(',') {
        let code = field.trim();
        if code.is_empty() || code.contains(char::is_whitespace) {
            return Err(format!("malformed witness code {:?}", field.trim()));
        }
        witnesses.push(code.to_string());
    }
    Ok(witnesses)
}

fn parse_omission(segment: &str, rest: &str) -> Result<FootnoteKind, String> {
    let (reason, rest) = if let Some(stripped) = rest.strip_prefix("correxi:") {
        (Some(CorrectionReason::Correxi), stripped.trim_start())
    } else if let Some(stripped) = rest.strip_prefix("conieci:") {
        (Some(CorrectionReason::Conieci), stripped.trim_start())
    } else {
        (None, rest)
    };

    let (present, omitted) = rest.split_once("om.").expect("discriminator checked");
    let omitted = omitted.trim();
    if omitted.is_empty() {
        return Err("no witness after 'om.'".into());
    }
    let omitted_by = parse_witness_list(omitted)?;

    let present = present.trim_matches([' ', ':']);
    let reading = if present.is_empty() {
        None
    } else {
        Some(parse_reading(present)?)
    };
    Ok(FootnoteKind::Omission {
        segment: segment.to_string(),
        reason,
        reading,
        omitted_by,
    })
}

fn parse_addition(segment: &str, rest: &str) -> Result<FootnoteKind, String> {
    let (_, after) = rest.split_once("add.").expect("discriminator checked");
    let additions = parse_sides(after)?;
    for reading in &additions {
        if reading.text.is_empty() {
            return Err("addition without added text".into());
        }
    }
    Ok(FootnoteKind::Addition {
        segment: segment.to_string(),
        additions,
    })
}

fn parse_correction(rest: &str, keyword: &str) -> Result<Vec<Reading>, String> {
    let (_, after) = rest
        .split_once(keyword)
        .expect("discriminator checked");
    let readings = parse_sides(after)?;
    for reading in &readings {
        if reading.text.is_empty() {
            return Err("correction without replacement text".into());
        }
    }
    Ok(readings)
}

/// Split `t1 W1[, W2][: t2 W3[, W4]]` into one or two readings.
fn parse_sides(input: &str) -> Result<Vec<Reading>, String> {
    let sides: Vec<&str> = input.split(':').collect();
    if sides.len() > 2 {
        return Err("more than two ':'-separated variant groups".into());
    }
    sides.iter().map(|side| parse_reading(side)).collect()
}

fn parse_variation(segment: &str, rest: &str) -> Result<FootnoteKind, String> {
    let (base, variant) = rest
        .split_once(':')
        .ok_or_else(|| "no grammar keyword and no ':' variant separator".to_string())?;
    let base_witnesses = parse_witness_list(base)?;
    let variant = parse_reading(variant)?;
    if variant.text.is_empty() {
        return Err("variation without variant text".into());
    }
    Ok(FootnoteKind::Variation {
        segment: segment.to_string(),
        readings: vec![
            Reading {
                text: segment.to_string(),
                witnesses: base_witnesses,
            },
            variant,
        ],
    })
}
