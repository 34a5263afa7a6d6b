//! # epidoc-parser
//!
//! Parser library for hand-annotated philological commentary files.
//!
//! A commentary file carries an optional introduction, a title, a numbered
//! sequence of aphorisms with their commentaries, and a trailing list of
//! footnote definitions describing textual variants (omissions, additions,
//! editorial corrections and conjectures, standard variations). Running text
//! embeds witness references `[WW LL]` and footnote markers `*n*`.
//!
//! The library turns one such file into a pair of cross-linked TEI/EpiDoc
//! XML documents: the main body document and the critical-apparatus ("app")
//! document. The stages are:
//!
//! 1. [`commentary::structure`]: split the raw file into title,
//!    introduction, aphorism/commentary blocks and the footnote list;
//! 2. [`commentary::scanning`]: extract inline markers from each text line;
//! 3. [`commentary::footnote`]: classify each footnote definition line;
//! 4. [`commentary::linking`]: join markers to definitions and assign the
//!    shared anchor identifiers both XML documents carry;
//! 5. [`commentary::xml`]: assemble and serialize both XML trees.
//!
//! [`commentary::pipeline`] drives the stages for a whole file. All stages
//! report through an explicit [`commentary::diagnostics::Reporter`] value;
//! the library holds no global logging state.

pub mod commentary;
