use crate::morphology::{is_cyrillic_word, Morphology, PartOfSpeech};
use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashMap;

lazy_static! {
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::Russian);
    static ref CLOSED_CLASS: HashMap<&'static str, PartOfSpeech> = {
        let mut words = HashMap::new();
        let groups: &[(PartOfSpeech, &[&str])] = &[
            (
                PartOfSpeech::Conjunction,
                &[
                    "и", "а", "но", "или", "либо", "что", "чтобы", "если", "когда", "как",
                    "потому", "поэтому", "хотя", "зато", "тоже", "также", "однако", "да",
                    "ибо", "будто", "словно", "пока", "причем", "притом", "нежели", "чем",
                    "иль", "аж",
                ],
            ),
            (
                PartOfSpeech::Preposition,
                &[
                    "в", "во", "на", "с", "со", "к", "ко", "по", "о", "об", "обо", "от", "ото",
                    "до", "из", "изо", "у", "за", "над", "надо", "под", "подо", "при", "про",
                    "для", "без", "безо", "через", "между", "перед", "передо", "около",
                    "возле", "среди", "вокруг", "после", "против",
                    "кроме", "вместо", "сквозь", "ради", "вдоль", "мимо",
                ],
            ),
            (
                PartOfSpeech::Particle,
                &[
                    "не", "ни", "бы", "б", "же", "ж", "ли", "ль", "вот", "вон", "даже",
                    "лишь", "только", "уж", "ведь", "разве", "неужели", "пусть", "пускай",
                    "ка", "то", "именно", "почти", "исключительно",
                ],
            ),
            (
                PartOfSpeech::Interjection,
                &[
                    "ах", "ох", "эх", "ой", "ух", "ай", "увы", "ура", "эй", "ну", "ого",
                    "ага", "фу", "тьфу", "браво", "алло",
                ],
            ),
            (
                PartOfSpeech::Predicative,
                &["нельзя", "можно", "надо", "нужно", "жаль", "пора", "некогда", "негде"],
            ),
        ];
        for (pos, list) in groups {
            for word in list.iter() {
                words.entry(*word).or_insert(*pos);
            }
        }
        words
    };
}

/// Dictionary-free analyzer
///
/// Closed-class words are recognized from a built-in list and returned
/// unchanged; every other Cyrillic word is reduced to its Snowball stem.
/// A stem is never tagged as a closed-class word, even when it is spelled
/// like one (`уха` stems to `ух`).
///
/// Stems are not dictionary forms, so this analyzer only backs a
/// `DictionaryMorphology` for forms missing from the dictionary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowballMorphology;

impl SnowballMorphology {
    pub fn new() -> Self {
        Self
    }
}

impl Morphology for SnowballMorphology {
    fn normal_forms(&self, token: &str) -> Vec<String> {
        if !is_cyrillic_word(token) {
            return Vec::new();
        }

        if CLOSED_CLASS.contains_key(token) {
            return vec![token.to_string()];
        }

        vec![STEMMER.stem(token).into_owned()]
    }

    fn part_of_speech(&self, base_form: &str) -> PartOfSpeech {
        CLOSED_CLASS
            .get(base_form)
            .copied()
            .unwrap_or(PartOfSpeech::Unknown)
    }

    fn analyze(&self, token: &str) -> Option<(String, PartOfSpeech)> {
        if !is_cyrillic_word(token) {
            return None;
        }

        match CLOSED_CLASS.get(token) {
            Some(pos) => Some((token.to_string(), *pos)),
            None => Some((STEMMER.stem(token).into_owned(), PartOfSpeech::Unknown)),
        }
    }
}
