//! Snippet extraction with bold highlighting

use regex::Regex;

/// Builds highlighted text windows around query words
#[derive(Debug, Clone, Copy)]
pub struct SnippetBuilder {
    /// Characters kept on each side of a match
    interval: usize,
}

impl SnippetBuilder {
    pub fn new(interval: usize) -> Self {
        Self { interval }
    }

    /// Builds a snippet for a page
    ///
    /// `text` is the lower-cased visible text of the page and `words` the
    /// query's surface forms, rarest lemma first. Candidates are windows
    /// around the matches of the first word (only its first match when it is
    /// the only word). Each following word drops the candidates that do not
    /// contain it. Every word is wrapped in `<b>` in the surviving candidate.
    ///
    /// Returns None when no candidate contains every word.
    pub fn build(&self, text: &str, words: &[String]) -> Option<String> {
        let patterns: Vec<Regex> = words
            .iter()
            .filter_map(|word| word_pattern(word))
            .collect();
        let (first, rest) = patterns.split_first()?;

        let mut candidates: Vec<&str> = Vec::new();
        for found in first.find_iter(text) {
            candidates.push(self.window(text, found.start(), found.end()));
            if rest.is_empty() {
                break;
            }
        }

        for pattern in rest {
            candidates.retain(|candidate| pattern.is_match(candidate));
            if candidates.is_empty() {
                return None;
            }
        }

        let mut snippet = candidates.first()?.to_string();
        for pattern in &patterns {
            snippet = pattern.replace_all(&snippet, "<b>$0</b>").into_owned();
        }
        Some(snippet)
    }

    /// Cuts `interval` characters on each side of the byte range
    fn window<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        let from = text[..start]
            .char_indices()
            .rev()
            .take(self.interval)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(start);
        let to = text[end..]
            .char_indices()
            .nth(self.interval)
            .map(|(i, _)| end + i)
            .unwrap_or(text.len());
        &text[from..to]
    }
}

fn word_pattern(word: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).ok()
}
