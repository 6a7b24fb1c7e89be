use crate::morphology::{is_cyrillic_word, Morphology, PartOfSpeech};
use crate::EngineError;
use std::collections::HashMap;
use std::path::Path;

/// Analyzer backed by a word-form dictionary
///
/// Two file layouts are accepted:
///
/// - The OpenCorpora plain-text dump (`dict.opcorpora.txt`): numbered
///   blocks, one per lexeme, with one `FORM  GRAMMEMES` line per word form.
///   The first form of a block is the lemma and the first grammeme its part
///   of speech.
/// - A tab-separated file with one `form  lemma  TAG` triple per line, where
///   `TAG` is an OpenCorpora part-of-speech tag.
///
/// The layout is picked from the first line: a bare number starts an
/// OpenCorpora dump. A form may map to several lemmas; the first one seen
/// wins when picking the base form. Lines starting with `#` are comments.
///
/// Forms missing from the dictionary are delegated to the fallback analyzer.
pub struct DictionaryMorphology {
    forms: HashMap<String, Vec<String>>,
    tags: HashMap<String, PartOfSpeech>,
    fallback: Box<dyn Morphology>,
}

impl DictionaryMorphology {
    /// Loads a dictionary file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the tab-separated dictionary
    /// * `fallback` - Analyzer consulted for unknown forms
    ///
    /// # Returns
    ///
    /// * `Ok(DictionaryMorphology)` - Dictionary loaded
    /// * `Err(EngineError)` - File could not be read or a line is malformed
    pub fn from_file(path: &Path, fallback: Box<dyn Morphology>) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, fallback).map_err(|(line, message)| {
            EngineError::Morphology(format!("{}:{}: {}", path.display(), line, message))
        })
    }

    /// Builds a dictionary from in-memory `(form, lemma, tag)` triples
    pub fn from_entries<'a, I>(entries: I, fallback: Box<dyn Morphology>) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut dictionary = Self {
            forms: HashMap::new(),
            tags: HashMap::new(),
            fallback,
        };
        for (form, lemma, tag) in entries {
            dictionary.insert(form, lemma, PartOfSpeech::from_tag(tag));
        }
        dictionary
    }

    /// Number of distinct word forms in the dictionary
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    fn parse(content: &str, fallback: Box<dyn Morphology>) -> Result<Self, (usize, String)> {
        let mut dictionary = Self::from_entries(std::iter::empty::<(&str, &str, &str)>(), fallback);

        let opencorpora = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .map(is_lexeme_id)
            .unwrap_or(false);
        if opencorpora {
            dictionary.parse_opencorpora(content)?;
        } else {
            dictionary.parse_triples(content)?;
        }

        Ok(dictionary)
    }

    fn parse_opencorpora(&mut self, content: &str) -> Result<(), (usize, String)> {
        let mut lexeme: Option<(String, PartOfSpeech)> = None;

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || is_lexeme_id(line) {
                lexeme = None;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let Some((form, grammemes)) = line.split_once('\t') else {
                return Err((index + 1, "expected a form and its grammemes".to_string()));
            };
            let pos = grammemes
                .split(|c: char| c == ',' || c.is_whitespace())
                .next()
                .map(PartOfSpeech::from_tag)
                .unwrap_or(PartOfSpeech::Unknown);

            let (lemma, lemma_pos) = lexeme
                .get_or_insert_with(|| (form.trim().to_lowercase(), pos))
                .clone();
            self.insert(form, &lemma, lemma_pos);
        }

        Ok(())
    }

    fn parse_triples(&mut self, content: &str) -> Result<(), (usize, String)> {
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err((
                    index + 1,
                    format!("expected 3 tab-separated fields, got {}", fields.len()),
                ));
            }

            self.insert(fields[0], fields[1], PartOfSpeech::from_tag(fields[2]));
        }

        Ok(())
    }

    fn insert(&mut self, form: &str, lemma: &str, pos: PartOfSpeech) {
        let form = form.trim().to_lowercase();
        let lemma = lemma.trim().to_lowercase();

        let lemmas = self.forms.entry(form).or_default();
        if !lemmas.contains(&lemma) {
            lemmas.push(lemma.clone());
        }
        self.tags.entry(lemma).or_insert(pos);
    }
}

/// A bare number opens a lexeme block in the OpenCorpora dump
fn is_lexeme_id(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

impl Morphology for DictionaryMorphology {
    fn normal_forms(&self, token: &str) -> Vec<String> {
        if !is_cyrillic_word(token) {
            return Vec::new();
        }

        match self.forms.get(token) {
            Some(lemmas) => lemmas.clone(),
            None => self.fallback.normal_forms(token),
        }
    }

    fn part_of_speech(&self, base_form: &str) -> PartOfSpeech {
        match self.tags.get(base_form) {
            Some(pos) => *pos,
            None => self.fallback.part_of_speech(base_form),
        }
    }

    fn analyze(&self, token: &str) -> Option<(String, PartOfSpeech)> {
        if !is_cyrillic_word(token) {
            return None;
        }

        match self.forms.get(token).and_then(|lemmas| lemmas.first()) {
            Some(lemma) => {
                let pos = self.tags.get(lemma).copied().unwrap_or(PartOfSpeech::Unknown);
                Some((lemma.clone(), pos))
            }
            None => self.fallback.analyze(token),
        }
    }
}
