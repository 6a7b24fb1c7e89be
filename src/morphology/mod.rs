//! Morphology module: normal forms and parts of speech for Russian words
//!
//! # Components
//!
//! - `Morphology`: the analyzer contract used by the lemma extractor
//! - `PartOfSpeech`: coarse part-of-speech tags (OpenCorpora naming)
//! - `DictionaryMorphology`: analyzer backed by a `form  lemma  TAG` dictionary
//! - `SnowballMorphology`: dictionary-free analyzer built on the Russian Snowball stemmer

mod dictionary;
mod snowball;

pub use dictionary::DictionaryMorphology;
pub use snowball::SnowballMorphology;

use crate::config::MorphologyConfig;
use crate::EngineError;
use std::path::Path;
use std::sync::Arc;

/// A morphological analyzer
///
/// Implementations must be safe to share between the loader and the search
/// service.
pub trait Morphology: Send + Sync {
    /// Returns candidate base forms of a lowercase token, most likely first
    ///
    /// An empty list means the token cannot be analyzed and must be skipped.
    fn normal_forms(&self, token: &str) -> Vec<String>;

    /// Returns the part of speech of a base form
    fn part_of_speech(&self, base_form: &str) -> PartOfSpeech;

    /// Returns the first base form of a token together with its part of speech
    ///
    /// Analyzers whose base forms can collide with unrelated words (such as
    /// stems) override this to tag the token itself.
    fn analyze(&self, token: &str) -> Option<(String, PartOfSpeech)> {
        let base = self.normal_forms(token).into_iter().next()?;
        let pos = self.part_of_speech(&base);
        Some((base, pos))
    }
}

/// Coarse part-of-speech tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    Adjective,
    Verb,
    Participle,
    Gerund,
    Numeral,
    Adverb,
    Pronoun,
    Predicative,
    Preposition,
    Conjunction,
    Particle,
    Interjection,
    Unknown,
}

impl PartOfSpeech {
    /// Returns true for the closed word classes excluded from indexing
    pub fn is_service(&self) -> bool {
        matches!(
            self,
            Self::Conjunction
                | Self::Preposition
                | Self::Interjection
                | Self::Particle
                | Self::Predicative
        )
    }

    /// OpenCorpora tag for this part of speech
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Noun => "NOUN",
            Self::Adjective => "ADJF",
            Self::Verb => "VERB",
            Self::Participle => "PRTF",
            Self::Gerund => "GRND",
            Self::Numeral => "NUMR",
            Self::Adverb => "ADVB",
            Self::Pronoun => "NPRO",
            Self::Predicative => "PRED",
            Self::Preposition => "PREP",
            Self::Conjunction => "CONJ",
            Self::Particle => "PRCL",
            Self::Interjection => "INTJ",
            Self::Unknown => "UNKN",
        }
    }

    /// Parses an OpenCorpora tag; unrecognized tags map to `Unknown`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "NOUN" => Self::Noun,
            "ADJF" | "ADJS" | "COMP" => Self::Adjective,
            "VERB" | "INFN" => Self::Verb,
            "PRTF" | "PRTS" => Self::Participle,
            "GRND" => Self::Gerund,
            "NUMR" => Self::Numeral,
            "ADVB" => Self::Adverb,
            "NPRO" => Self::Pronoun,
            "PRED" => Self::Predicative,
            "PREP" => Self::Preposition,
            "CONJ" => Self::Conjunction,
            "PRCL" => Self::Particle,
            "INTJ" => Self::Interjection,
            _ => Self::Unknown,
        }
    }
}

/// Returns true if every character is a lowercase Cyrillic letter
pub(crate) fn is_cyrillic_word(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| matches!(c, 'а'..='я' | 'ё'))
}

/// Builds the analyzer described by the configuration
///
/// Loads the dictionary named by `dictionary-path`. The Snowball analyzer
/// only covers forms missing from the dictionary.
///
/// # Errors
///
/// * `EngineError::Morphology` - No dictionary is configured or it is malformed
/// * `EngineError::Io` - The dictionary cannot be read
pub fn build_morphology(config: &MorphologyConfig) -> Result<Arc<dyn Morphology>, EngineError> {
    let Some(path) = config.dictionary_path.as_deref() else {
        return Err(EngineError::Morphology(
            "no dictionary configured, set [morphology] dictionary-path".to_string(),
        ));
    };

    let dictionary =
        DictionaryMorphology::from_file(Path::new(path), Box::new(SnowballMorphology::new()))?;
    tracing::info!(
        "Loaded morphology dictionary from {} ({} forms)",
        path,
        dictionary.len()
    );
    Ok(Arc::new(dictionary))
}

/// OpenCorpora dump covering the words of the lemma extractor's sample sentence
#[cfg(test)]
pub(crate) const SAMPLE_DICTIONARY: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/opcorpora_sample.txt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_classes() {
        assert!(PartOfSpeech::Conjunction.is_service());
        assert!(PartOfSpeech::Preposition.is_service());
        assert!(PartOfSpeech::Interjection.is_service());
        assert!(PartOfSpeech::Particle.is_service());
        assert!(PartOfSpeech::Predicative.is_service());

        assert!(!PartOfSpeech::Noun.is_service());
        assert!(!PartOfSpeech::Adverb.is_service());
        assert!(!PartOfSpeech::Unknown.is_service());
    }

    #[test]
    fn test_tag_roundtrip() {
        for pos in [
            PartOfSpeech::Noun,
            PartOfSpeech::Verb,
            PartOfSpeech::Preposition,
            PartOfSpeech::Predicative,
            PartOfSpeech::Interjection,
        ] {
            assert_eq!(PartOfSpeech::from_tag(pos.tag()), pos);
        }
        assert_eq!(PartOfSpeech::from_tag("INFN"), PartOfSpeech::Verb);
        assert_eq!(PartOfSpeech::from_tag("adjs"), PartOfSpeech::Adjective);
        assert_eq!(PartOfSpeech::from_tag("???"), PartOfSpeech::Unknown);
    }

    #[test]
    fn test_is_cyrillic_word() {
        assert!(is_cyrillic_word("леопард"));
        assert!(is_cyrillic_word("ёж"));
        assert!(!is_cyrillic_word("leopard"));
        assert!(!is_cyrillic_word("Леопард"));
        assert!(!is_cyrillic_word(""));
    }

    #[test]
    fn test_build_morphology_requires_dictionary() {
        let result = build_morphology(&MorphologyConfig::default());
        assert!(matches!(result, Err(EngineError::Morphology(_))));
    }

    #[test]
    fn test_build_morphology_from_dump() {
        let config = MorphologyConfig {
            dictionary_path: Some(SAMPLE_DICTIONARY.to_string()),
        };
        let morphology = build_morphology(&config).unwrap();
        assert_eq!(
            morphology.analyze("позволяет"),
            Some(("позволять".to_string(), PartOfSpeech::Verb))
        );
        assert_eq!(morphology.part_of_speech("в"), PartOfSpeech::Preposition);
    }
}
