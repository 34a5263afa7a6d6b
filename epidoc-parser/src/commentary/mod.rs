//! Commentary file processing.
//!
//! Modules are ordered the way data flows: `structure` produces a
//! [`document::Document`] plus raw footnote lines, `scanning` and `footnote`
//! interpret the inline markers and footnote grammar, `linking` ties the two
//! together, and `xml` renders the linked result.

pub mod diagnostics;
pub mod document;
pub mod error;
pub mod footnote;
pub mod linking;
pub mod pipeline;
pub mod scanning;
pub mod structure;
pub mod template;
pub mod xml;

pub use diagnostics::{Diagnostic, Reporter, Severity};
pub use document::{Aphorism, Document, Footnote, FootnoteLine, TextLine};
pub use error::ProcessError;
pub use pipeline::{process_text, FileOutput};
pub use xml::XmlConfig;
