//! Pattern-based SVG manipulation.
//!
//! Banner templates have a fixed, known shape: elements are addressed by
//! their `id` attribute and mutated in place through text substitution,
//! without building a document tree.

mod document;
mod escape;

pub use document::Document;
pub use escape::escape_xml;
