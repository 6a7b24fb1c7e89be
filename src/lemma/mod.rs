//! Lemma module: turns text and HTML into lemma counts
//!
//! # Components
//!
//! - `Lemmatizer`: lemma extraction and query-term mapping on top of a `Morphology`
//! - `html_to_text`: visible text of an HTML document

mod extractor;

pub use extractor::{html_to_text, Lemmatizer};
