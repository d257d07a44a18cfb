#![deny(missing_docs)]
//! r2b translators: document trees to LaTeX and Beamer-flavoured LaTeX.

/// Beamer translator.
pub mod beamer;
/// Base LaTeX translator.
pub mod latex;
/// Tree traversal.
pub mod visitor;
/// Writers and conversion entry points.
pub mod writer;

pub use beamer::BeamerTranslator;
pub use latex::{DocumentClass, LatexTranslator, encode};
pub use visitor::{Visit, Visitor, walk};
pub use writer::{
    BeamerWriter, Conversion, LatexWriter, Translation, Writer, convert_markdown,
    convert_markdown_with, markdown_to_beamer,
};
