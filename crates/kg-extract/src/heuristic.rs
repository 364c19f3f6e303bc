//! Capitalization-based extractor.
//!
//! A candidate starts at a capitalized word that is not a stopword. Following
//! capitalized words join it when only whitespace separates them; lowercase
//! connectors ("of", "the", "van", ...) may sit inside a span as long as a
//! capitalized word follows them. Any punctuation ends a span. Each multi-word
//! span is followed by its capitalized constituents so single-word names stay
//! reachable.

use crate::EntityExtractor;
use kg_types::ExtractedEntity;
use std::collections::HashSet;

/// Lowercase words allowed inside a multi-word span.
pub const CONNECTORS: &[&str] = &[
    "of", "the", "de", "da", "del", "du", "la", "le", "van", "von", "der",
];

/// Words that never start a candidate, compared case-insensitively. Mostly
/// question words and sentence openers that are capitalized by position only.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "all", "an", "and", "any", "are", "as", "at", "be", "between", "but", "by",
    "can", "could", "describe", "did", "do", "does", "explain", "find", "for", "from", "give",
    "has", "have", "he", "her", "here", "his", "how", "i", "if", "in", "is", "it", "its", "list",
    "me", "my", "no", "not", "of", "on", "or", "our", "please", "she", "should", "show", "so",
    "tell", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "to", "was", "we", "were", "what", "when", "where", "which", "who", "whom", "whose", "why",
    "will", "with", "would", "yes", "you", "your",
];

#[derive(Debug)]
struct Token<'a> {
    text: &'a str,
    start: usize,
    /// Only whitespace separates this token from the previous one.
    joined: bool,
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut punct_since_last = false;
    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
            continue;
        }
        if let Some(s) = start.take() {
            tokens.push(Token {
                text: &text[s..i],
                start: s,
                joined: !tokens.is_empty() && !punct_since_last,
            });
            punct_since_last = false;
        }
        if !c.is_whitespace() {
            punct_since_last = true;
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &text[s..],
            start: s,
            joined: !tokens.is_empty() && !punct_since_last,
        });
    }
    tokens
}

/// Heuristic extractor over capitalized word spans.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    stopwords: HashSet<String>,
    connectors: HashSet<String>,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS.iter().map(|s| s.to_string()).collect(),
            connectors: CONNECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add domain stopwords (e.g. "Chapter") on top of the built-in set.
    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    fn is_head(&self, token: &Token<'_>) -> bool {
        token.text.chars().next().is_some_and(char::is_uppercase)
            && !self.stopwords.contains(&token.text.to_lowercase())
    }

    fn is_connector(&self, token: &Token<'_>) -> bool {
        self.connectors.contains(token.text)
    }

    /// Index of the last token of the span starting at `first`.
    fn span_end(&self, tokens: &[Token<'_>], first: usize) -> usize {
        let mut end = first;
        loop {
            let mut next = end + 1;
            while next < tokens.len() && tokens[next].joined && self.is_connector(&tokens[next]) {
                next += 1;
            }
            match tokens.get(next) {
                Some(t) if t.joined && self.is_head(t) => end = next,
                _ => return end,
            }
        }
    }
}

impl EntityExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        let text = text.trim();
        let tokens = tokenize(text);
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut push = |name: String, offset: usize| {
            if seen.insert(name.clone()) {
                out.push(ExtractedEntity::new(name, offset));
            }
        };

        let mut i = 0;
        while i < tokens.len() {
            if !self.is_head(&tokens[i]) {
                i += 1;
                continue;
            }
            let end = self.span_end(&tokens, i);
            let span = &tokens[i..=end];
            let name = span.iter().map(|t| t.text).collect::<Vec<_>>().join(" ");
            push(name, tokens[i].start);
            if end > i {
                for t in span.iter().filter(|t| self.is_head(t)) {
                    push(t.text.to_string(), t.start);
                }
            }
            i = end + 1;
        }
        tracing::debug!(count = out.len(), "extracted entities");
        out
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<String> {
        HeuristicExtractor::new()
            .extract(text)
            .into_iter()
            .map(|e| e.name)
            .collect()
    }

    #[test]
    fn question_words_are_not_entities() {
        assert_eq!(names("Who is Gandalf?"), vec!["Gandalf"]);
        assert!(names("what is it").is_empty());
        assert!(names("   ").is_empty());
        assert!(names("What Is This?").is_empty());
    }

    #[test]
    fn connectors_join_capitalized_runs() {
        assert_eq!(
            names("What is the relationship between Frodo and the Ring of Power?"),
            vec!["Frodo", "Ring of Power", "Ring", "Power"]
        );
        assert_eq!(
            names("Tell me about Gandalf the White"),
            vec!["Gandalf the White", "Gandalf", "White"]
        );
        assert_eq!(
            names("Lord of the Rings"),
            vec!["Lord of the Rings", "Lord", "Rings"]
        );
    }

    #[test]
    fn trailing_connector_does_not_join() {
        assert_eq!(names("Frodo of the shire"), vec!["Frodo"]);
        assert_eq!(names("Sam and Rosie"), vec!["Sam", "Rosie"]);
    }

    #[test]
    fn punctuation_breaks_runs() {
        assert_eq!(names("Frodo, Sam"), vec!["Frodo", "Sam"]);
        assert_eq!(names("Frodo's Sting"), vec!["Frodo", "Sting"]);
        assert_eq!(names("Mount Doom"), vec!["Mount Doom", "Mount", "Doom"]);
    }

    #[test]
    fn order_and_duplicates() {
        let got = HeuristicExtractor::new().extract("  Sam met Frodo; later Frodo met Sam and Bilbo.");
        let names: Vec<&str> = got.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Sam", "Frodo", "Bilbo"]);
        assert_eq!(got[0].offset, 0);
        assert_eq!(got[1].offset, 8);
    }

    #[test]
    fn offsets_point_into_trimmed_text() {
        let text = "  Where is Mount   Doom?";
        let got = HeuristicExtractor::new().extract(text);
        let trimmed = text.trim();
        assert_eq!(got[0].name, "Mount Doom");
        assert_eq!(&trimmed[got[0].offset..got[0].offset + 5], "Mount");
        assert_eq!(got[2].name, "Doom");
        assert_eq!(&trimmed[got[2].offset..got[2].offset + 4], "Doom");
    }

    #[test]
    fn custom_stopwords() {
        let ex = HeuristicExtractor::new().with_stopwords(["Chapter"]);
        let got: Vec<String> = ex.extract("Chapter Frodo").into_iter().map(|e| e.name).collect();
        assert_eq!(got, vec!["Frodo"]);
    }
}
