use crate::morphology::Morphology;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Node};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

lazy_static! {
    // Anything that is not a Cyrillic letter separates words
    static ref NON_CYRILLIC: Regex = Regex::new(r"[^а-яё]+").expect("valid regex");
}

/// Elements whose text is never visible page content
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracts lemmas from text using a morphological analyzer
#[derive(Clone)]
pub struct Lemmatizer {
    morphology: Arc<dyn Morphology>,
}

impl Lemmatizer {
    pub fn new(morphology: Arc<dyn Morphology>) -> Self {
        Self { morphology }
    }

    /// Counts lemma occurrences in a text
    ///
    /// The text is lowercased and split on every run of non-Cyrillic
    /// characters. Each token is reduced to its first normal form; tokens
    /// without one, and tokens of a service part of speech, are skipped.
    ///
    /// # Returns
    ///
    /// A mapping lemma → number of occurrences. Blank input yields an empty map.
    ///
    /// # Example
    ///
    /// ```
    /// use lemma_search::morphology::{DictionaryMorphology, SnowballMorphology};
    /// use lemma_search::Lemmatizer;
    /// use std::sync::Arc;
    ///
    /// let dictionary = DictionaryMorphology::from_entries(
    ///     [("леопард", "леопард", "NOUN"), ("леопарда", "леопард", "NOUN")],
    ///     Box::new(SnowballMorphology::new()),
    /// );
    /// let lemmatizer = Lemmatizer::new(Arc::new(dictionary));
    /// let lemmas = lemmatizer.extract_lemmas("Леопард и леопарда");
    /// assert_eq!(lemmas.get("леопард"), Some(&2));
    /// assert_eq!(lemmas.len(), 1);
    /// ```
    pub fn extract_lemmas(&self, text: &str) -> HashMap<String, usize> {
        let mut lemmas = HashMap::new();

        for token in tokenize(text) {
            if let Some(lemma) = self.lemma_of(&token) {
                *lemmas.entry(lemma).or_insert(0) += 1;
            }
        }

        lemmas
    }

    /// Distinct lemmas of a text
    pub fn lemma_set(&self, text: &str) -> HashSet<String> {
        self.extract_lemmas(text).into_keys().collect()
    }

    /// Maps each lemma back to the query word it came from
    ///
    /// Only lemmas present in `lemmas` are mapped. When several query words
    /// share a lemma, the first one wins.
    pub fn ratio_of_query_terms_to_lemmas(
        &self,
        query: &str,
        lemmas: &HashSet<String>,
    ) -> HashMap<String, String> {
        let mut surface_forms = HashMap::new();

        for token in tokenize(query) {
            if let Some(lemma) = self.lemma_of(&token) {
                if lemmas.contains(&lemma) {
                    surface_forms.entry(lemma).or_insert(token);
                }
            }
        }

        surface_forms
    }

    fn lemma_of(&self, token: &str) -> Option<String> {
        let (base, pos) = self.morphology.analyze(token)?;
        if pos.is_service() {
            return None;
        }
        Some(base)
    }
}

/// Splits text into lowercase Cyrillic tokens
fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_CYRILLIC
        .split(&lowered)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the visible text of an HTML document
///
/// Text nodes are joined with single spaces; script and style content is
/// dropped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name().to_string()))
            .map(|name| INVISIBLE_ELEMENTS.contains(&name.as_str()))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        let text = text.trim();
        if !text.is_empty() {
            parts.push(text);
        }
    }

    parts.join(" ")
}
