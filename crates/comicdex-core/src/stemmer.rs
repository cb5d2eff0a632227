use std::collections::BTreeSet;

use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};

use crate::domain::Comic;

/// Normalizes arbitrary text into a deduplicated set of index terms.
///
/// Splits on runs of non-letter code points, lowercases and runs each token
/// through the English Snowball (Porter2) algorithm, then drops anything
/// short or in the stop-word list. Deterministic, no I/O, infallible.
pub struct Stemmer {
    inner: SnowballStemmer,
}

impl Default for Stemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer {
    pub fn new() -> Self {
        Self {
            inner: SnowballStemmer::create(Algorithm::English),
        }
    }

    /// Stems the concatenation of a comic's title, alt text and transcript.
    pub fn stem_comic(&self, comic: &Comic) -> Vec<String> {
        self.stem_string(&format!("{} {} {}", comic.title, comic.alt, comic.transcript))
    }

    /// Stems an arbitrary string into its deduplicated term set.
    pub fn stem_string(&self, text: &str) -> Vec<String> {
        let mut terms = BTreeSet::new();

        for word in split_words(text) {
            let stemmed = self.inner.stem(&word.to_lowercase()).into_owned();
            if should_ignore(&stemmed) {
                continue;
            }
            terms.insert(stemmed);
        }

        terms.into_iter().collect()
    }
}

fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphabetic()).filter(|s| !s.is_empty())
}

fn should_ignore(term: &str) -> bool {
    term.chars().count() <= 2 || is_stop_word(term)
}

/// The classic Snowball English stop-word list, the same corpus the
/// original upstream's `kljensen/snowball/english` package ships.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "would",
    "should", "could", "ought", "im", "youre", "hes", "shes", "its", "were", "theyre", "ive",
    "youve", "weve", "theyve", "id", "youd", "hed", "shed", "wed", "theyd", "ill", "youll",
    "hell", "shell", "well", "theyll", "isnt", "arent", "wasnt", "werent", "hasnt", "havent",
    "hadnt", "doesnt", "dont", "didnt", "wont", "wouldnt", "shant", "shouldnt", "cant",
    "cannot", "couldnt", "mustnt", "lets", "thats", "whos", "whats", "heres", "theres",
    "whens", "wheres", "whys", "hows", "a", "an", "the", "and", "but", "if", "or", "because",
    "as", "until", "while", "of", "at", "by", "for", "with", "about", "against", "between",
    "into", "through", "during", "before", "after", "above", "below", "to", "from", "up",
    "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few",
    "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
    "than", "too", "very",
];

fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(&term)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_string_matches_known_cases() {
        let stemmer = Stemmer::new();

        let cases: &[(&str, &[&str])] = &[
            ("", &[]),
            (
                "follower brings bunch of questions",
                &["follow", "bring", "bunch", "question"],
            ),
            (
                "i'll follow you as long as you are following me",
                &["follow", "long"],
            ),
        ];

        for (input, expected) in cases {
            let mut got = stemmer.stem_string(input);
            got.sort();
            let mut want: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
            want.sort();
            assert_eq!(got, want, "input: {input:?}");
        }
    }

    #[test]
    fn idempotent_as_a_set() {
        let stemmer = Stemmer::new();
        let inputs = [
            "The quick brown fox jumps over the lazy dog repeatedly",
            "Stemming stemmed stems stemmer",
            "",
            "a an the of",
        ];

        for input in inputs {
            let once = stemmer.stem_string(input);
            let twice = stemmer.stem_string(&once.join(" "));
            let once_set: BTreeSet<_> = once.into_iter().collect();
            let twice_set: BTreeSet<_> = twice.into_iter().collect();
            assert_eq!(once_set, twice_set, "input: {input:?}");
        }
    }

    #[test]
    fn never_yields_short_or_stop_words() {
        let stemmer = Stemmer::new();
        let text = "the a an is are because until while questioning bringing";
        for term in stemmer.stem_string(text) {
            assert!(term.chars().count() > 2, "term too short: {term}");
            assert!(!is_stop_word(&term), "stop word leaked through: {term}");
        }
    }

    #[test]
    fn stem_comic_concatenates_all_three_fields() {
        let stemmer = Stemmer::new();
        let comic = Comic {
            num: 1,
            title: "Flying".to_string(),
            alt: "Cars".to_string(),
            transcript: "Engines".to_string(),
            img: String::new(),
        };

        let terms = stemmer.stem_comic(&comic);
        assert!(terms.iter().any(|t| t.starts_with("fli")));
        assert!(terms.contains(&"car".to_string()));
        assert!(terms.iter().any(|t| t.starts_with("engin")));
    }
}
