//! End-to-end processing of one commentary file.
//!
//! Runs the stages in order: structure parse, footnote classification,
//! cross-reference linking, XML assembly, template splicing. Per-footnote
//! grammar failures are recorded and processing continues, so one bad
//! definition does not hide findings in the rest of the file; but a file
//! with any recorded error produces no XML at all.

use crate::commentary::diagnostics::Reporter;
use crate::commentary::document::{Document, Footnote};
use crate::commentary::error::ProcessError;
use crate::commentary::footnote::classify;
use crate::commentary::linking::link;
use crate::commentary::structure;
use crate::commentary::template::splice;
use crate::commentary::xml::{build_app, build_main, serialize_elements, XmlConfig};
use std::path::Path;

/// The two serialized XML documents produced from one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    /// Main document: the template with the body divisions spliced in.
    pub main_xml: String,
    /// Critical apparatus document, one `<app>` entry per footnote.
    pub app_xml: String,
}

/// Document number from the `_<n>` suffix of the file's base name.
/// `aphorisms_2.txt` numbers the document 2; a name without the suffix
/// defaults to 1 and is noted on the reporter.
pub fn document_number(name: &str, reporter: &mut Reporter) -> u32 {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);
    if let Some((_, suffix)) = stem.rsplit_once('_') {
        if let Ok(number) = suffix.parse::<u32>() {
            return number;
        }
    }
    reporter.info(format!(
        "no _<n> suffix in {:?}, defaulting document number to 1",
        stem
    ));
    1
}

/// Process the text of one commentary file into its two XML documents.
///
/// `name` is the input file name (used for the document number), `template`
/// the main-document template containing the insertion marker. Every
/// finding lands on `reporter`; if any of them is an error the file yields
/// no output and the returned error carries the error count.
pub fn process_text(
    name: &str,
    text: &str,
    template: &str,
    config: &XmlConfig,
    reporter: &mut Reporter,
) -> Result<FileOutput, ProcessError> {
    let doc_num = document_number(name, reporter);
    let parsed = structure::parse(text, reporter)?;

    let mut footnotes: Vec<Footnote> = Vec::with_capacity(parsed.footnotes.len());
    for line in &parsed.footnotes {
        match classify(line) {
            Ok(footnote) => footnotes.push(footnote),
            Err(error) => reporter.footnote_error(error.number, error.to_string()),
        }
    }

    let document = Document {
        doc_num,
        introduction: parsed.introduction,
        title: parsed.title,
        aphorisms: parsed.aphorisms,
    };

    let linked = match link(&document, footnotes, reporter) {
        Ok(linked) if !reporter.has_errors() => linked,
        _ => {
            return Err(ProcessError::Failed {
                errors: reporter.error_count(),
            })
        }
    };

    let body = serialize_elements(&build_main(&linked), config, config.offset_depth);
    let main_xml = splice(template, &body)?;
    let app_xml = serialize_elements(&build_app(&linked), config, 0);

    Ok(FileOutput { main_xml, app_xml })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "<TEI>\n#INSERT#\n</TEI>\n";

    const WELL_FORMED: &str = "\
Opening remarks.
++
On the aphorisms.

1.
First aphorism *1*with a marked word.
Commentary seen in [W1 12v] here.

2.
Second aphorism *2*spanning two words# exactly.

*1*ssss ] W1: om. W2.
*2*tttt ] add. uuuu W3.
";

    #[test]
    fn well_formed_file_yields_both_documents() {
        let mut reporter = Reporter::new();
        let output = process_text(
            "aphorisms_5.txt",
            WELL_FORMED,
            TEMPLATE,
            &XmlConfig::default(),
            &mut reporter,
        )
        .unwrap();

        assert!(!reporter.has_errors());
        assert!(output.main_xml.starts_with("<TEI>\n"));
        assert!(output.main_xml.contains("<div n=\"5\" type=\"Title_section\">"));
        assert!(output.main_xml.contains("xml:id=\"begin_fn1\""));
        assert!(output.main_xml.contains("<div type=\"intro\">"));
        assert!(output.app_xml.contains("<app from=\"#begin_fn2\" to=\"#end_fn2\">"));
        assert!(output.app_xml.contains("<add reason=\"add_scribe\">uuuu</add>"));
    }

    #[test]
    fn document_number_from_suffix() {
        let mut reporter = Reporter::new();
        assert_eq!(document_number("path/to/aphorisms_7.txt", &mut reporter), 7);
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn missing_suffix_defaults_to_one_with_a_note() {
        let mut reporter = Reporter::new();
        assert_eq!(document_number("aphorisms.txt", &mut reporter), 1);
        assert!(reporter
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("defaulting document number")));
        assert!(!reporter.has_errors());
    }

    #[test]
    fn any_error_suppresses_both_outputs() {
        // Footnote 2 is defined but never referenced.
        let text = "\
Title.
1.
Aphorism *1*word here.
*1*s ] W1: om. W2.
*2*t ] W1: om. W2.
";
        let mut reporter = Reporter::new();
        let error = process_text(
            "bad_1.txt",
            text,
            TEMPLATE,
            &XmlConfig::default(),
            &mut reporter,
        )
        .unwrap_err();
        assert!(matches!(error, ProcessError::Failed { errors } if errors >= 1));
    }

    #[test]
    fn bad_footnote_grammar_does_not_stop_other_findings() {
        // Footnote 1 lacks the ']' separator; marker *2* has no definition.
        let text = "\
Title.
1.
Aphorism *1*word and *2*another.
*1*no separator here
*2*valid ] W1: om. W2.
";
        let mut reporter = Reporter::new();
        let _ = process_text(
            "bad_1.txt",
            text,
            TEMPLATE,
            &XmlConfig::default(),
            &mut reporter,
        );
        let messages: Vec<&str> = reporter
            .diagnostics()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert!(messages.iter().any(|m| m.contains("footnote 1")
            || m.contains("']'")
            || m.contains("separator")));
    }

    #[test]
    fn structural_failure_reports_count_mismatch() {
        let text = "Title.\n1.\nA one.\n2.\nA two.\n4.\nA four.\n";
        let mut reporter = Reporter::new();
        let error = process_text(
            "bad_1.txt",
            text,
            TEMPLATE,
            &XmlConfig::default(),
            &mut reporter,
        )
        .unwrap_err();
        assert!(matches!(error, ProcessError::Structural(_)));
        assert!(reporter
            .diagnostics()
            .iter()
            .any(|d| d.message.contains("expected 4, got 3")));
    }
}
