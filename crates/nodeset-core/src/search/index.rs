//! Inverted index with boosted fields and typo-tolerant matching.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::{BROWSE_PATH_BOOST, DESCRIPTION_BOOST, NODE_CLASS_BOOST, TITLE_BOOST};

const EXACT_SCORE: f32 = 1.0;
const PREFIX_SCORE: f32 = 0.6;
const FUZZY_SCORE: f32 = 0.4;

/// Shortest query token that prefix matching applies to.
const MIN_PREFIX_LEN: usize = 2;

/// Indexed fields and their ranking boosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    BrowsePath,
    Description,
    NodeClass,
}

impl Field {
    pub fn boost(&self) -> f32 {
        match self {
            Field::Title => TITLE_BOOST,
            Field::BrowsePath => BROWSE_PATH_BOOST,
            Field::Description => DESCRIPTION_BOOST,
            Field::NodeClass => NODE_CLASS_BOOST,
        }
    }
}

/// Maps tokens to the documents containing them, weighted by the boosts of
/// the fields they appear in.
#[derive(Debug, Default)]
pub struct SearchIndex {
    postings: HashMap<String, HashMap<usize, f32>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the fields of document `id`. A token found in several fields
    /// counts once per field.
    pub fn insert(&mut self, id: usize, fields: &[(Field, &str)]) {
        for (field, text) in fields {
            let mut tokens = tokenize(text);
            tokens.sort();
            tokens.dedup();
            for token in tokens {
                *self
                    .postings
                    .entry(token)
                    .or_default()
                    .entry(id)
                    .or_insert(0.0) += field.boost();
            }
        }
    }

    /// Number of distinct tokens.
    pub fn vocabulary_len(&self) -> usize {
        self.postings.len()
    }

    pub fn clear(&mut self) {
        self.postings.clear();
    }

    /// Rank documents for `query`, best first, at most `limit`.
    ///
    /// Each query token contributes its best match per document: exact,
    /// prefix or within edit distance, scaled by the token's field weight.
    /// Ties go to the lower id.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, f32)> {
        let mut query_tokens = tokenize(query);
        query_tokens.sort();
        query_tokens.dedup();
        if query_tokens.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scores: HashMap<usize, f32> = HashMap::new();
        for query_token in &query_tokens {
            let max_distance = max_edit_distance(query_token);
            let mut best: HashMap<usize, f32> = HashMap::new();

            for (token, docs) in &self.postings {
                let Some(kind) = match_kind(query_token, token, max_distance) else {
                    continue;
                };
                for (&id, &weight) in docs {
                    let score = kind * weight;
                    let slot = best.entry(id).or_insert(0.0);
                    if score > *slot {
                        *slot = score;
                    }
                }
            }

            for (id, score) in best {
                *scores.entry(id).or_insert(0.0) += score;
            }
        }

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(limit);
        ranked
    }
}

fn match_kind(query_token: &str, token: &str, max_distance: usize) -> Option<f32> {
    if token == query_token {
        return Some(EXACT_SCORE);
    }

    let query_len = query_token.chars().count();
    if query_len >= MIN_PREFIX_LEN && token.starts_with(query_token) {
        Some(PREFIX_SCORE)
    } else if max_distance > 0
        && token.chars().count().abs_diff(query_len) <= max_distance
        && levenshtein_distance(query_token, token) <= max_distance
    {
        Some(FUZZY_SCORE)
    } else {
        None
    }
}

/// Typos tolerated for a query token of this length.
fn max_edit_distance(token: &str) -> usize {
    match token.chars().count() {
        0..=3 => 0,
        4..=7 => 1,
        _ => 2,
    }
}

/// Split on non-alphanumerics and lowercase. Words with internal case
/// changes also yield their parts: `SerialNumber` gives `serialnumber`,
/// `serial` and `number`.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        tokens.push(word.to_lowercase());

        let parts = split_camel_case(word);
        if parts.len() > 1 {
            tokens.extend(parts.into_iter().map(|p| p.to_lowercase()));
        }
    }
    tokens
}

/// `HTTPServerState` -> `HTTP`, `Server`, `State`; `Motor1` stays whole.
fn split_camel_case(word: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let mut parts = Vec::new();
    let mut start = 0;

    for i in 1..chars.len() {
        let (pos, c) = chars[i];
        let prev = chars[i - 1].1;
        let next_is_lower = chars.get(i + 1).is_some_and(|&(_, n)| n.is_lowercase());

        let boundary = (prev.is_lowercase() && c.is_uppercase())
            || (prev.is_uppercase() && c.is_uppercase() && next_is_lower);
        if boundary {
            parts.push(&word[start..pos]);
            start = pos;
        }
    }
    parts.push(&word[start..]);
    parts
}

/// Calculate Levenshtein distance between two strings.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_camel_case() {
        assert_eq!(
            tokenize("SerialNumber (Variable)"),
            vec!["serialnumber", "serial", "number", "variable"]
        );
        assert_eq!(tokenize("Motor1/SerialNumber")[0], "motor1");
        assert_eq!(tokenize("ns=1;i=100"), vec!["ns", "1", "i", "100"]);
    }

    #[test]
    fn test_split_camel_case_acronyms() {
        assert_eq!(split_camel_case("HTTPServerState"), vec!["HTTP", "Server", "State"]);
        assert_eq!(split_camel_case("Motor1"), vec!["Motor1"]);
        assert_eq!(split_camel_case("lowercase"), vec!["lowercase"]);
    }

    #[test]
    fn test_fuzzy_match_counts_chars_not_bytes() {
        let query = "насосы";
        assert_eq!(max_edit_distance(query), 1);
        assert_eq!(match_kind(query, "насос", max_edit_distance(query)), Some(FUZZY_SCORE));
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("motor", "motro"), 2);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_title_outranks_description() {
        let mut index = SearchIndex::new();
        index.insert(0, &[(Field::Description, "mentions pump somewhere")]);
        index.insert(1, &[(Field::Title, "Pump (Object)")]);

        let ranked = index.search("pump", 10);
        assert_eq!(ranked[0].0, 1);
        assert_eq!(ranked[1].0, 0);
    }

    #[test]
    fn test_exact_prefix_and_fuzzy_matches() {
        let mut index = SearchIndex::new();
        index.insert(0, &[(Field::Title, "Temperature")]);

        let exact = index.search("temperature", 10)[0].1;
        let prefix = index.search("temper", 10)[0].1;
        let fuzzy = index.search("temperatur3", 10)[0].1;
        assert!(exact > prefix);
        assert!(prefix > fuzzy);
        assert!(index.search("xyz", 10).is_empty());
    }

    #[test]
    fn test_short_tokens_are_not_fuzzy() {
        let mut index = SearchIndex::new();
        index.insert(0, &[(Field::Title, "Axis")]);
        assert!(index.search("axe", 10).is_empty());
        assert_eq!(index.search("axes", 10).len(), 1);
    }

    #[test]
    fn test_ties_break_by_id() {
        let mut index = SearchIndex::new();
        index.insert(3, &[(Field::Title, "Valve")]);
        index.insert(1, &[(Field::Title, "Valve")]);
        index.insert(2, &[(Field::Title, "Valve")]);

        let ids: Vec<_> = index.search("valve", 2).into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
