//! XML tree builder and serializer.
//!
//! A deterministic, side-effect-free transform from a [`LinkedDocument`] to
//! the two EpiDoc trees: the main body tree and the critical-apparatus
//! ("app") tree. Both ends of every footnote link carry the same anchor
//! identifier; no index is consulted at render time.
//!
//! Elements marked `compact` serialize on one line (inline apparatus
//! entries, `<locus>` references); everything else is one tag per line,
//! indented by [`XmlConfig`].

use crate::commentary::footnote::{CorrectionReason, FootnoteKind, Reading};
use crate::commentary::linking::{AnchorId, LinkedAphorism, LinkedDocument, LinkedLine};
use crate::commentary::scanning::Marker;
use std::collections::BTreeMap;

/// Indentation configuration for serialized XML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlConfig {
    /// Base indentation depth of the main tree inside the template body.
    pub offset_depth: usize,
    /// Number of spaces per indentation level.
    pub offset_size: usize,
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            offset_depth: 3,
            offset_size: 4,
        }
    }
}

impl XmlConfig {
    fn indent(&self, depth: usize) -> String {
        " ".repeat(self.offset_size * depth)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// One element of the in-memory tree, built fluently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
    compact: bool,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
            compact: false,
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    /// Serialize this element and its subtree on a single line.
    pub fn compact(mut self) -> Self {
        self.compact = true;
        self
    }

    pub fn child(mut self, node: XmlNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn element(self, element: XmlElement) -> Self {
        self.child(XmlNode::Element(element))
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(XmlNode::Text(text.into()))
    }

    pub fn children(mut self, nodes: Vec<XmlNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    fn open_tag(&self, self_closing: bool) -> String {
        let mut tag = String::from("<");
        tag.push_str(&self.name);
        for (name, value) in &self.attrs {
            tag.push(' ');
            tag.push_str(name);
            tag.push_str("=\"");
            tag.push_str(&escape_attr(value));
            tag.push('"');
        }
        tag.push_str(if self_closing { "/>" } else { ">" });
        tag
    }

    fn render_inline(&self, out: &mut String) {
        if self.children.is_empty() {
            out.push_str(&self.open_tag(true));
            return;
        }
        out.push_str(&self.open_tag(false));
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(&escape_text(text)),
                XmlNode::Element(element) => element.render_inline(out),
            }
        }
        out.push_str(&format!("</{}>", self.name));
    }

    /// Append the serialized element to `out`, one line per tag unless the
    /// element is compact or has pure-text content.
    pub fn serialize(&self, config: &XmlConfig, depth: usize, out: &mut Vec<String>) {
        let indent = config.indent(depth);
        if self.compact || self.children.is_empty() || self.has_only_text() {
            let mut line = indent;
            self.render_inline(&mut line);
            out.push(line);
            return;
        }
        out.push(format!("{}{}", indent, self.open_tag(false)));
        for child in &self.children {
            match child {
                XmlNode::Text(text) => {
                    out.push(format!("{}{}", config.indent(depth + 1), escape_text(text)));
                }
                XmlNode::Element(element) => element.serialize(config, depth + 1, out),
            }
        }
        out.push(format!("{}</{}>", indent, self.name));
    }

    fn has_only_text(&self) -> bool {
        self.children.len() == 1 && matches!(self.children[0], XmlNode::Text(_))
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Serialize a sequence of sibling elements into newline-joined lines.
pub fn serialize_elements(elements: &[XmlElement], config: &XmlConfig, depth: usize) -> String {
    let mut lines = Vec::new();
    for element in elements {
        element.serialize(config, depth, &mut lines);
    }
    let mut output = lines.join("\n");
    output.push('\n');
    output
}

/// One renderable region of the main document. Every variant renders to a
/// top-level `<div>` through the same dispatch.
enum Section<'a> {
    Introduction(&'a [LinkedLine]),
    Title {
        doc_num: u32,
        lines: &'a [LinkedLine],
    },
    Aphorism(&'a LinkedAphorism),
}

impl Section<'_> {
    fn render(&self, anchors: &BTreeMap<u32, AnchorId>) -> XmlElement {
        match self {
            Section::Introduction(lines) => {
                let mut paragraph = XmlElement::new("p");
                for line in *lines {
                    paragraph = paragraph.children(render_line(line, anchors));
                }
                XmlElement::new("div").attr("type", "intro").element(paragraph)
            }
            Section::Title { doc_num, lines } => {
                let mut block = XmlElement::new("ab");
                for line in *lines {
                    block = block.children(render_line(line, anchors));
                }
                XmlElement::new("div")
                    .attr("n", doc_num.to_string())
                    .attr("type", "Title_section")
                    .element(block)
            }
            Section::Aphorism(aphorism) => {
                let text = XmlElement::new("p").children(render_line(&aphorism.text, anchors));
                let mut unit = XmlElement::new("div")
                    .attr("n", aphorism.number.to_string())
                    .attr("type", "aphorism_commentary_unit")
                    .element(XmlElement::new("div").attr("type", "aphorism").element(text));
                for line in &aphorism.commentary {
                    let paragraph = XmlElement::new("p").children(render_line(line, anchors));
                    unit = unit.element(
                        XmlElement::new("div")
                            .attr("type", "commentary")
                            .element(paragraph),
                    );
                }
                unit
            }
        }
    }
}

/// Build the main-document tree: intro, title and aphorism `<div>`s with
/// inline apparatus anchors at the marker offsets.
pub fn build_main(document: &LinkedDocument) -> Vec<XmlElement> {
    let anchors: BTreeMap<u32, AnchorId> = document
        .footnotes
        .iter()
        .map(|linked| (linked.footnote.number, linked.anchor))
        .collect();

    let mut sections = Vec::new();
    if !document.introduction.is_empty() {
        sections.push(Section::Introduction(&document.introduction));
    }
    sections.push(Section::Title {
        doc_num: document.doc_num,
        lines: &document.title,
    });
    sections.extend(document.aphorisms.iter().map(Section::Aphorism));

    sections
        .iter()
        .map(|section| section.render(&anchors))
        .collect()
}

/// Build the app-document tree: one apparatus entry per footnote, carrying
/// the anchor its inline counterpart also carries.
pub fn build_app(document: &LinkedDocument) -> Vec<XmlElement> {
    document
        .footnotes
        .iter()
        .map(|linked| {
            let mut app = XmlElement::new("app")
                .attr("from", format!("#{}", linked.anchor.begin()))
                .attr("to", format!("#{}", linked.anchor.end()));
            app = apparatus_children(app, &linked.footnote.kind);
            if let Some(note) = &linked.footnote.note {
                app = app.element(XmlElement::new("note").text(note.clone()).compact());
            }
            app
        })
        .collect()
}

/// Render one text line into inline nodes: text fragments, `<locus>`
/// references and `<app>` spans. Witness references inside a footnote span
/// render nested inside its `<rdg>`.
fn render_line(line: &LinkedLine, anchors: &BTreeMap<u32, AnchorId>) -> Vec<XmlNode> {
    let text = &line.line.text;
    let markers = &line.markers;
    let mut nodes = Vec::new();
    let mut cursor = 0;
    let mut i = 0;

    while i < markers.len() {
        match &markers[i] {
            Marker::Witness(witness) => {
                if witness.span.start < cursor {
                    // Already rendered inside a footnote span.
                    i += 1;
                    continue;
                }
                push_text(&mut nodes, &text[cursor..witness.span.start]);
                nodes.push(XmlNode::Element(locus(witness.code.as_str(), &witness.location)));
                cursor = witness.span.end;
                i += 1;
            }
            Marker::Footnote(footnote) => {
                push_text(&mut nodes, &text[cursor..footnote.span.start]);

                // Collect witness references nested in the marked span.
                let mut reading = Vec::new();
                let mut inner_cursor = footnote.text_range.start;
                let mut j = i + 1;
                while let Some(Marker::Witness(witness)) = markers.get(j) {
                    if witness.span.end > footnote.text_range.end {
                        break;
                    }
                    // Inline context: keep the spacing around the reference.
                    push_text_raw(&mut reading, &text[inner_cursor..witness.span.start]);
                    reading.push(XmlNode::Element(locus(
                        witness.code.as_str(),
                        &witness.location,
                    )));
                    inner_cursor = witness.span.end;
                    j += 1;
                }
                push_text_raw(&mut reading, &text[inner_cursor..footnote.text_range.end]);

                match anchors.get(&footnote.number) {
                    Some(anchor) => nodes.push(XmlNode::Element(inline_app(*anchor, reading))),
                    // No apparatus entry to link to: keep the span content
                    // without an anchor rather than panic.
                    None => nodes.extend(reading),
                }
                cursor = footnote.span.end;
                i = j;
            }
        }
    }
    push_text(&mut nodes, &text[cursor..]);
    nodes
}

fn push_text(nodes: &mut Vec<XmlNode>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        nodes.push(XmlNode::Text(trimmed.to_string()));
    }
}

fn push_text_raw(nodes: &mut Vec<XmlNode>, fragment: &str) {
    if !fragment.is_empty() {
        nodes.push(XmlNode::Text(fragment.to_string()));
    }
}

fn locus(code: &str, location: &str) -> XmlElement {
    XmlElement::new("locus")
        .attr("target", code)
        .text(location)
        .compact()
}

/// `<app n=".." type="footnote" xml:id="begin_fnN"><rdg>..</rdg><anchor xml:id="end_fnN"/></app>`
fn inline_app(anchor: AnchorId, reading: Vec<XmlNode>) -> XmlElement {
    XmlElement::new("app")
        .attr("n", anchor.number().to_string())
        .attr("type", "footnote")
        .attr("xml:id", anchor.begin())
        .element(XmlElement::new("rdg").children(reading))
        .element(XmlElement::new("anchor").attr("xml:id", anchor.end()))
        .compact()
}

fn witness_rdg(code: &str, text: &str) -> XmlElement {
    XmlElement::new("rdg")
        .attr("wit", format!("#{}", code))
        .text(text)
        .compact()
}

/// `<rdg><choice><corr [type="conjecture"]>..</corr></choice></rdg>`
fn editorial_rdg(reason: CorrectionReason, text: &str) -> XmlElement {
    let corr = match reason {
        CorrectionReason::Correxi => XmlElement::new("corr"),
        CorrectionReason::Conieci => XmlElement::new("corr").attr("type", "conjecture"),
    };
    XmlElement::new("rdg").element(XmlElement::new("choice").element(corr.text(text)))
}

fn omission_rdg(code: &str) -> XmlElement {
    XmlElement::new("rdg")
        .attr("wit", format!("#{}", code))
        .element(XmlElement::new("gap").attr("reason", "omission"))
}

fn reading_rdgs(app: XmlElement, reading: &Reading, fallback: &str) -> XmlElement {
    let text = if reading.text.is_empty() {
        fallback
    } else {
        &reading.text
    };
    reading
        .witnesses
        .iter()
        .fold(app, |app, code| app.element(witness_rdg(code, text)))
}

fn apparatus_children(mut app: XmlElement, kind: &FootnoteKind) -> XmlElement {
    match kind {
        FootnoteKind::Omission {
            segment,
            reason,
            reading,
            omitted_by,
        } => {
            if let Some(reason) = reason {
                app = app.element(editorial_rdg(*reason, segment));
            }
            if let Some(reading) = reading {
                app = reading_rdgs(app, reading, segment);
            }
            for code in omitted_by {
                app = app.element(omission_rdg(code));
            }
            app
        }
        FootnoteKind::Addition { additions, .. } => {
            for reading in additions {
                for code in &reading.witnesses {
                    app = app.element(
                        XmlElement::new("rdg").attr("wit", format!("#{}", code)).element(
                            XmlElement::new("add")
                                .attr("reason", "add_scribe")
                                .text(reading.text.clone()),
                        ),
                    );
                }
            }
            app
        }
        FootnoteKind::Correxi { segment, readings } => {
            app = app.element(editorial_rdg(CorrectionReason::Correxi, segment));
            for reading in readings {
                app = reading_rdgs(app, reading, segment);
            }
            app
        }
        FootnoteKind::Conieci { segment, readings } => {
            app = app.element(editorial_rdg(CorrectionReason::Conieci, segment));
            for reading in readings {
                app = reading_rdgs(app, reading, segment);
            }
            app
        }
        FootnoteKind::Variation { segment, readings } => {
            for reading in readings {
                app = reading_rdgs(app, reading, segment);
            }
            app
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::diagnostics::Reporter;
    use crate::commentary::document::{Aphorism, Document, TextLine};
    use crate::commentary::footnote::classify;
    use crate::commentary::document::FootnoteLine;
    use crate::commentary::linking::link;

    fn linked(body_lines: &[&str], footnote_bodies: &[&str]) -> LinkedDocument {
        let document = Document {
            doc_num: 1,
            introduction: Vec::new(),
            title: vec![TextLine::new(1, "Title line.")],
            aphorisms: vec![Aphorism {
                number: 1,
                text: TextLine::new(2, body_lines[0]),
                commentary: body_lines[1..]
                    .iter()
                    .enumerate()
                    .map(|(i, text)| TextLine::new(3 + i, *text))
                    .collect(),
            }],
        };
        let footnotes = footnote_bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                classify(&FootnoteLine {
                    number: i as u32 + 1,
                    body: body.to_string(),
                    line_no: 10 + i,
                })
                .unwrap()
            })
            .collect();
        let mut reporter = Reporter::new();
        link(&document, footnotes, &mut reporter).unwrap()
    }

    fn serialized_main(document: &LinkedDocument, config: &XmlConfig) -> String {
        serialize_elements(&build_main(document), config, 0)
    }

    fn serialized_app(document: &LinkedDocument) -> String {
        serialize_elements(&build_app(document), &XmlConfig::default(), 0)
    }

    #[test]
    fn main_tree_wraps_single_word_span() {
        let doc = linked(&["text *1*word here"], &["ssss ] W1: om. W2"]);
        let xml = serialized_main(&doc, &XmlConfig::default());
        assert!(xml.contains(
            "<app n=\"1\" type=\"footnote\" xml:id=\"begin_fn1\">\
             <rdg>word</rdg><anchor xml:id=\"end_fn1\"/></app>"
        ));
        assert!(xml.contains("<div n=\"1\" type=\"aphorism_commentary_unit\">"));
        assert!(xml.contains("<div type=\"aphorism\">"));
    }

    #[test]
    fn main_tree_wraps_multi_word_span() {
        let doc = linked(&["before *1*two words# after"], &["ssss ] W1: om. W2"]);
        let xml = serialized_main(&doc, &XmlConfig::default());
        assert!(xml.contains("<rdg>two words</rdg>"));
        assert!(!xml.contains('#'), "terminator must not leak into XML");
        assert!(!xml.contains("*1*"), "marker must not leak into XML");
    }

    #[test]
    fn witness_reference_renders_as_locus() {
        let doc = linked(&["seen in [W1 12v] here"], &[]);
        let xml = serialized_main(&doc, &XmlConfig::default());
        assert!(xml.contains("<locus target=\"W1\">12v</locus>"));
    }

    #[test]
    fn witness_inside_footnote_span_nests_in_rdg() {
        let doc = linked(&["x *1*start [W2 3r] end# y"], &["ssss ] W1: om. W2"]);
        let xml = serialized_main(&doc, &XmlConfig::default());
        assert!(xml.contains("<rdg>start <locus target=\"W2\">3r</locus> end</rdg>"));
    }

    #[test]
    fn title_division_carries_doc_num() {
        let doc = linked(&["plain"], &[]);
        let xml = serialized_main(&doc, &XmlConfig::default());
        assert!(xml.contains("<div n=\"1\" type=\"Title_section\">"));
        assert!(xml.contains("<ab>"));
    }

    #[test]
    fn indentation_follows_config() {
        let doc = linked(&["plain"], &[]);
        let config = XmlConfig {
            offset_depth: 0,
            offset_size: 2,
        };
        let xml = serialized_main(&doc, &config);
        assert!(xml.contains("\n  <ab>plain"), "two-space unit expected: {}", xml);
    }

    #[test]
    fn app_tree_omission_entry() {
        let doc = linked(&["text *1*word"], &["ssss ] W1: om. W2"]);
        let xml = serialized_app(&doc);
        assert!(xml.contains("<app from=\"#begin_fn1\" to=\"#end_fn1\">"));
        assert!(xml.contains("<rdg wit=\"#W1\">ssss</rdg>"));
        assert!(xml.contains("<rdg wit=\"#W2\">"));
        assert!(xml.contains("<gap reason=\"omission\"/>"));
    }

    #[test]
    fn app_tree_addition_entry() {
        let doc = linked(&["text *1*word"], &["ssss ] add. tttt W1, W2"]);
        let xml = serialized_app(&doc);
        assert!(xml.contains("<add reason=\"add_scribe\">tttt</add>"));
        assert!(xml.contains("<rdg wit=\"#W1\">"));
        assert!(xml.contains("<rdg wit=\"#W2\">"));
    }

    #[test]
    fn app_tree_correxi_entry() {
        let doc = linked(&["text *1*word"], &["ssss ] correxi: tttt W1: uuuu W2"]);
        let xml = serialized_app(&doc);
        assert!(xml.contains("<corr>ssss</corr>"));
        assert!(xml.contains("<rdg wit=\"#W1\">tttt</rdg>"));
        assert!(xml.contains("<rdg wit=\"#W2\">uuuu</rdg>"));
    }

    #[test]
    fn app_tree_conieci_is_marked_conjecture() {
        let doc = linked(&["text *1*word"], &["ssss ] conieci: tttt W1"]);
        let xml = serialized_app(&doc);
        assert!(xml.contains("<corr type=\"conjecture\">ssss</corr>"));
    }

    #[test]
    fn app_tree_variation_entry() {
        let doc = linked(&["text *1*word"], &["ssss ] W1: tttt W2"]);
        let xml = serialized_app(&doc);
        assert!(xml.contains("<rdg wit=\"#W1\">ssss</rdg>"));
        assert!(xml.contains("<rdg wit=\"#W2\">tttt</rdg>"));
    }

    #[test]
    fn app_tree_note_entry() {
        let doc = linked(&["text *1*word"], &["ssss ] W1: om. W2; a scribal remark"]);
        let xml = serialized_app(&doc);
        assert!(xml.contains("<note>a scribal remark</note>"));
    }

    #[test]
    fn anchors_agree_between_both_trees() {
        let doc = linked(
            &["first *1*alpha then", "second *2*beta end"],
            &["ssss ] W1: om. W2", "tttt ] add. uuuu W3"],
        );
        let main = serialized_main(&doc, &XmlConfig::default());
        let app = serialized_app(&doc);
        for n in 1..=2 {
            assert!(main.contains(&format!("xml:id=\"begin_fn{}\"", n)));
            assert!(main.contains(&format!("xml:id=\"end_fn{}\"", n)));
            assert!(app.contains(&format!("from=\"#begin_fn{}\" to=\"#end_fn{}\"", n, n)));
        }
    }

    #[test]
    fn text_is_escaped() {
        let doc = linked(&["salt & <pepper>"], &[]);
        let xml = serialized_main(&doc, &XmlConfig::default());
        assert!(xml.contains("salt &amp; &lt;pepper&gt;"));
    }

    #[test]
    fn marker_without_apparatus_entry_renders_as_plain_text() {
        use crate::commentary::linking::LinkedLine;
        use crate::commentary::scanning::scan_line;

        let line = "text *1*word here";
        let (markers, _) = scan_line(line, 2);
        let doc = LinkedDocument {
            doc_num: 1,
            introduction: Vec::new(),
            title: vec![LinkedLine {
                line: TextLine::new(1, "Title."),
                markers: Vec::new(),
            }],
            aphorisms: vec![LinkedAphorism {
                number: 1,
                text: LinkedLine {
                    line: TextLine::new(2, line),
                    markers,
                },
                commentary: Vec::new(),
            }],
            footnotes: Vec::new(),
        };
        let xml = serialized_main(&doc, &XmlConfig::default());
        assert!(!xml.contains("begin_fn1"));
        assert!(xml.contains("word"));
    }

    #[test]
    fn build_is_deterministic() {
        let doc = linked(&["text *1*word"], &["ssss ] W1: om. W2"]);
        assert_eq!(serialized_app(&doc), serialized_app(&doc));
        assert_eq!(
            serialized_main(&doc, &XmlConfig::default()),
            serialized_main(&doc, &XmlConfig::default())
        );
    }
}
