//! Fuzzy lookup over an existing locale's translations.
//!
//! The fix engine asks this index for existing (key, translation) pairs
//! similar to a newly-discovered key, to give the AI-translation
//! collaborator stylistic context. Built fresh per validation run and
//! discarded afterwards; nothing is persisted.

use std::collections::{
    HashMap,
    HashSet,
};

/// Canonical token standing in for `{n}` placeholders, digit runs, and the
/// plural `#` marker, so keys differing only in slot positions still match.
const PLACEHOLDER_TOKEN: &str = "#";

/// Minimum blended key score a candidate must reach to be suggested.
const SCORE_FLOOR: f64 = 0.12;

/// Candidates kept for the translation-consistency re-rank.
const RERANK_POOL: usize = 20;

/// Default number of matches returned by a query.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Score blend weights: word tokens / trigrams / common prefix.
const WORD_WEIGHT: f64 = 0.65;
/// See [`WORD_WEIGHT`].
const TRIGRAM_WEIGHT: f64 = 0.25;
/// See [`WORD_WEIGHT`].
const PREFIX_WEIGHT: f64 = 0.10;

/// Re-rank blend: key score vs. translation consistency with the best match.
const KEY_SCORE_WEIGHT: f64 = 0.85;
/// See [`KEY_SCORE_WEIGHT`].
const CONSISTENCY_WEIGHT: f64 = 0.15;

/// One indexed (key, translation) pair.
#[derive(Debug, Clone)]
struct IndexedEntry {
    /// The existing translation key.
    key: String,
    /// Its translation in the context locale.
    translation: String,
    /// Word-token set of the key.
    tokens: HashSet<String>,
    /// Character trigram set of the flattened key.
    trigrams: HashSet<String>,
    /// Flattened normalized key, for prefix scoring.
    flat: String,
}

/// A similar existing translation returned by a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarMatch {
    /// The existing key.
    pub key: String,
    /// Its translation.
    pub translation: String,
    /// Final blended score (higher is more similar).
    pub score: f64,
}

/// Token/trigram inverted index over one locale's key→translation pairs.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// All indexed entries.
    entries: Vec<IndexedEntry>,
    /// Word token → indices of entries containing it.
    postings: HashMap<String, Vec<usize>>,
    /// Inverse-document-frequency weight per word token.
    idf: HashMap<String, f64>,
    /// Weight assigned to tokens never seen at build time.
    max_idf: f64,
}

impl SimilarityIndex {
    /// Builds the index from existing (key, translation) pairs.
    #[must_use]
    pub fn build(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries = Vec::new();
        let mut postings: HashMap<String, Vec<usize>> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();

        for (key, translation) in pairs {
            let tokens = word_tokens(&key);
            let flat = normalize_flat(&key);
            let trigrams = char_ngrams(&flat);

            let index = entries.len();
            for token in &tokens {
                postings.entry(token.clone()).or_default().push(index);
                *document_frequency.entry(token.clone()).or_insert(0) += 1;
            }

            entries.push(IndexedEntry { key, translation, tokens, trigrams, flat });
        }

        #[allow(clippy::cast_precision_loss)] // キー数が 2^52 を超えることはない
        let total = entries.len() as f64;
        let idf: HashMap<String, f64> = document_frequency
            .into_iter()
            .map(|(token, df)| {
                #[allow(clippy::cast_precision_loss)]
                let df = df as f64;
                (token, ((total + 1.0) / (df + 1.0)).ln() + 1.0)
            })
            .collect();
        let max_idf = idf.values().copied().fold(1.0_f64, f64::max);

        Self { entries, postings, idf, max_idf }
    }

    /// Finds up to `max_results` existing entries similar to `key`.
    ///
    /// Candidates must share at least one word token with the query (every
    /// entry is considered when the query has none), reach the score floor,
    /// and survive a translation-consistency re-rank against the best match.
    /// Ties break by key lexical order.
    #[must_use]
    pub fn query(&self, key: &str, max_results: usize) -> Vec<SimilarMatch> {
        let query_tokens = word_tokens(key);
        let query_flat = normalize_flat(key);
        let query_trigrams = char_ngrams(&query_flat);

        let candidates = self.candidate_indices(&query_tokens);

        let mut scored: Vec<(f64, &IndexedEntry)> = candidates
            .into_iter()
            .filter_map(|index| {
                let entry = self.entries.get(index)?;
                let words = self.weighted_jaccard(&query_tokens, &entry.tokens);
                let trigrams = jaccard(&query_trigrams, &entry.trigrams);
                let prefix = prefix_score(&query_flat, &entry.flat);
                let score =
                    WORD_WEIGHT * words + TRIGRAM_WEIGHT * trigrams + PREFIX_WEIGHT * prefix;
                (score >= SCORE_FLOOR).then_some((score, entry))
            })
            .collect();

        sort_scored(&mut scored);
        scored.truncate(RERANK_POOL);

        // 最上位の翻訳と文体が揃っている候補を優先する
        let best_translation_tokens =
            scored.first().map(|(_, entry)| word_tokens(&entry.translation));

        let mut reranked: Vec<(f64, &IndexedEntry)> = scored
            .into_iter()
            .map(|(score, entry)| {
                let consistency = best_translation_tokens.as_ref().map_or(0.0, |best| {
                    jaccard(best, &word_tokens(&entry.translation))
                });
                (KEY_SCORE_WEIGHT * score + CONSISTENCY_WEIGHT * consistency, entry)
            })
            .collect();

        sort_scored(&mut reranked);
        reranked.truncate(max_results);

        reranked
            .into_iter()
            .map(|(score, entry)| SimilarMatch {
                key: entry.key.clone(),
                translation: entry.translation.clone(),
                score,
            })
            .collect()
    }

    /// Entry indices sharing at least one query token, or every entry when
    /// the query has no word tokens.
    fn candidate_indices(&self, query_tokens: &HashSet<String>) -> Vec<usize> {
        if query_tokens.is_empty() {
            return (0..self.entries.len()).collect();
        }

        let mut seen = HashSet::new();
        let mut indices = Vec::new();
        for token in query_tokens {
            if let Some(posting) = self.postings.get(token) {
                for index in posting {
                    if seen.insert(*index) {
                        indices.push(*index);
                    }
                }
            }
        }
        indices
    }

    /// IDF-weighted Jaccard similarity over word tokens. Tokens unseen at
    /// build time get the maximum observed weight.
    fn weighted_jaccard(&self, left: &HashSet<String>, right: &HashSet<String>) -> f64 {
        if left.is_empty() && right.is_empty() {
            return 0.0;
        }

        let weight = |token: &String| self.idf.get(token).copied().unwrap_or(self.max_idf);
        let intersection: f64 = left.intersection(right).map(weight).sum();
        let union: f64 = left.union(right).map(weight).sum();

        if union == 0.0 { 0.0 } else { intersection / union }
    }
}

/// Sorts by score descending, then key ascending, for deterministic output.
fn sort_scored(scored: &mut [(f64, &IndexedEntry)]) {
    scored.sort_by(|(left_score, left), (right_score, right)| {
        right_score
            .partial_cmp(left_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| left.key.cmp(&right.key))
    });
}

/// Plain Jaccard similarity over two sets.
fn jaccard(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    if left.is_empty() && right.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let intersection = left.intersection(right).count() as f64;
    #[allow(clippy::cast_precision_loss)]
    let union = left.union(right).count() as f64;

    if union == 0.0 { 0.0 } else { intersection / union }
}

/// Normalized common-prefix length between the flattened forms.
fn prefix_score(left: &str, right: &str) -> f64 {
    let common = left
        .chars()
        .zip(right.chars())
        .take_while(|(left_char, right_char)| left_char == right_char)
        .count();
    let longest = left.chars().count().max(right.chars().count());

    if longest == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let score = common as f64 / longest as f64;
    score
}

/// Word tokens of a key: case-folded, camelCase-split, with placeholders,
/// digit runs, and `#` collapsed to the canonical placeholder token. Tokens
/// shorter than two characters are dropped (the placeholder token excepted).
fn word_tokens(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut word = String::new();

    let mut push_word = |word: &mut String, tokens: &mut HashSet<String>| {
        if word.is_empty() {
            return;
        }
        for part in split_camel_case(word) {
            let part = part.to_lowercase();
            if part.chars().count() >= 2 {
                tokens.insert(part);
            }
        }
        word.clear();
    };

    for ch in placeholder_normalized_chars(text) {
        if ch == '#' {
            push_word(&mut word, &mut tokens);
            tokens.insert(PLACEHOLDER_TOKEN.to_string());
        } else if ch.is_alphabetic() {
            word.push(ch);
        } else {
            push_word(&mut word, &mut tokens);
        }
    }
    push_word(&mut word, &mut tokens);

    tokens
}

/// Flattened normalized form: lowercase, with placeholders, digit runs, and
/// `#` collapsed to single `#` characters. Used for trigrams and prefix
/// scoring without word splitting.
fn normalize_flat(text: &str) -> String {
    let mut out = String::new();
    for ch in placeholder_normalized_chars(text) {
        if ch == '#' {
            if !out.ends_with('#') {
                out.push('#');
            }
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Streams the characters of `text` with `{n}` placeholders, digits, and `#`
/// all mapped to `#`.
fn placeholder_normalized_chars(text: &str) -> impl Iterator<Item = char> {
    let mut out = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '{' {
            // `{digits}` をプレースホルダとして読み取る
            let mut lookahead = chars.clone();
            let mut digits = 0_usize;
            while lookahead.peek().is_some_and(char::is_ascii_digit) {
                lookahead.next();
                digits += 1;
            }
            if digits > 0 && lookahead.peek() == Some(&'}') {
                lookahead.next();
                chars = lookahead;
                out.push('#');
                continue;
            }
        }

        if ch.is_ascii_digit() || ch == '#' {
            out.push('#');
        } else {
            out.push(ch);
        }
    }

    out.into_iter()
}

/// Splits a word at lowercase→uppercase boundaries (`"camelCase"` →
/// `["camel", "Case"]`).
fn split_camel_case(word: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;

    for ch in word.chars() {
        if ch.is_uppercase() && previous_lower && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        previous_lower = ch.is_lowercase();
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

/// Character n-grams of the flattened form: trigrams, degrading to bigrams
/// then unigrams for very short keys.
fn char_ngrams(flat: &str) -> HashSet<String> {
    let chars: Vec<char> = flat.chars().collect();
    let n = match chars.len() {
        0 => return HashSet::new(),
        1 => 1,
        2 => 2,
        _ => 3,
    };

    chars.windows(n).map(|window| window.iter().collect()).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn index(pairs: &[(&str, &str)]) -> SimilarityIndex {
        SimilarityIndex::build(
            pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())),
        )
    }

    #[rstest]
    #[case::lowercases("Save File", &["save", "file"])]
    #[case::camel_split("$saveTooltip", &["save", "tooltip"])]
    #[case::placeholder_token("Hello {1}", &["hello", "#"])]
    #[case::digits_collapse("Page 12 of 34", &["page", "of", "#"])]
    #[case::count_marker("# files", &["#", "files"])]
    #[case::short_dropped("a big X", &["big"])]
    fn test_word_tokens(#[case] text: &str, #[case] expected: &[&str]) {
        let expected: HashSet<String> = expected.iter().map(|t| (*t).to_string()).collect();

        assert_that!(word_tokens(text), eq(&expected));
    }

    #[rstest]
    #[case::plain("Save", "save")]
    #[case::placeholder("Hello {1}!", "hello #!")]
    #[case::digit_run("Page 12", "page #")]
    #[case::adjacent_collapse("{1}{2}", "#")]
    fn test_normalize_flat(#[case] text: &str, #[case] expected: &str) {
        assert_that!(normalize_flat(text), eq(expected));
    }

    #[googletest::test]
    fn test_ngrams_degrade_for_short_keys() {
        expect_that!(char_ngrams("ab"), unordered_elements_are![eq("ab")]);
        expect_that!(char_ngrams("a"), unordered_elements_are![eq("a")]);
        expect_that!(char_ngrams(""), is_empty());
        expect_that!(char_ngrams("abcd"), unordered_elements_are![eq("abc"), eq("bcd")]);
    }

    #[googletest::test]
    fn test_query_finds_token_overlap() {
        let index = index(&[
            ("Save file", "Fichier enregistré"),
            ("Delete file", "Fichier supprimé"),
            ("Open window", "Fenêtre ouverte"),
        ]);

        let matches = index.query("Save all files", DEFAULT_MAX_RESULTS);

        assert_that!(matches.first().map(|m| m.key.as_str()), some(eq("Save file")));
        // "Open window" はトークンを共有しないので候補にならない
        assert_that!(matches.iter().any(|m| m.key == "Open window"), eq(false));
    }

    #[googletest::test]
    fn test_query_without_tokens_considers_all_entries() {
        let index = index(&[("!!", "bang"), ("??", "quoi")]);

        // クエリ "!!" は単語トークンを持たないため全エントリが候補になる
        let matches = index.query("!!", DEFAULT_MAX_RESULTS);

        assert_that!(matches.first().map(|m| m.key.as_str()), some(eq("!!")));
    }

    #[googletest::test]
    fn test_low_scores_are_discarded() {
        let index = index(&[("Completely unrelated phrasing", "??")]);

        let matches = index.query("zzz", DEFAULT_MAX_RESULTS);

        assert_that!(matches, is_empty());
    }

    #[googletest::test]
    fn test_max_results_limits_output() {
        let pairs: Vec<(String, String)> = (0..10)
            .map(|i| (format!("Save file variant {i}"), format!("T{i}")))
            .collect();
        let index = SimilarityIndex::build(pairs);

        let matches = index.query("Save file", 3);

        assert_that!(matches, len(eq(3)));
    }

    #[googletest::test]
    fn test_identical_key_scores_highest() {
        let index = index(&[
            ("Delete the file", "Supprimer le fichier"),
            ("Delete the folder", "Supprimer le dossier"),
        ]);

        let matches = index.query("Delete the file", DEFAULT_MAX_RESULTS);

        let first = matches.first().unwrap();
        expect_that!(first.key, eq("Delete the file"));
        expect_that!(first.translation, eq("Supprimer le fichier"));
    }

    #[googletest::test]
    fn test_query_is_deterministic_with_ties() {
        let index = index(&[("Save b", "B"), ("Save a", "A"), ("Save c", "C")]);

        let first = index.query("Save", DEFAULT_MAX_RESULTS);
        let second = index.query("Save", DEFAULT_MAX_RESULTS);

        let keys: Vec<&str> = first.iter().map(|m| m.key.as_str()).collect();
        assert_that!(first, eq(&second));
        // 同点はキーの辞書順
        assert_that!(keys, eq(&vec!["Save a", "Save b", "Save c"]));
    }

    #[googletest::test]
    fn test_placeholder_normalization_matches_across_slots() {
        let index = index(&[("You have {1} new messages", "Vous avez {1} nouveaux messages")]);

        let matches = index.query("You have {2} unread messages", DEFAULT_MAX_RESULTS);

        assert_that!(matches, not(is_empty()));
    }
}
