//! Template splicing for the main document.
//!
//! The main XML file is produced by replacing a single marker line in a
//! TEI template with the serialized body divisions. The app file is written
//! bare, without a template.

use crate::commentary::error::TemplateError;

/// Line content marking the insertion point in a main-document template.
pub const TEMPLATE_MARKER: &str = "#INSERT#";

/// Replace the marker line of `template` with `body`.
///
/// The marker must occur on exactly one line (surrounding whitespace on
/// that line is ignored); anything else is a template error.
pub fn splice(template: &str, body: &str) -> Result<String, TemplateError> {
    let marker_lines = template
        .lines()
        .filter(|line| line.trim() == TEMPLATE_MARKER)
        .count();
    if marker_lines == 0 {
        return Err(TemplateError {
            message: format!("template has no {} line", TEMPLATE_MARKER),
        });
    }
    if marker_lines > 1 {
        return Err(TemplateError {
            message: format!(
                "template has {} {} lines, expected exactly one",
                marker_lines, TEMPLATE_MARKER
            ),
        });
    }

    let mut output = String::with_capacity(template.len() + body.len());
    for line in template.lines() {
        if line.trim() == TEMPLATE_MARKER {
            output.push_str(body.trim_end_matches('\n'));
        } else {
            output.push_str(line);
        }
        output.push('\n');
    }
    Ok(output)
}
