//! Place and person-name extraction.
//!
//! Both extractors are plain string heuristics: places are matched by
//! case-insensitive substring containment against the configured list, and
//! names are runs of two or more title-cased tokens. The name heuristic
//! over-matches (sentence-initial words, organisations); that noise is
//! accepted.

use itertools::Itertools;
use std::collections::BTreeSet;

/// Configured places mentioned in `text`, in configuration order, each once.
pub fn extract_cities(text: &str, cities: &[String]) -> Vec<String> {
    let lowered = text.to_lowercase();
    cities
        .iter()
        .filter(|city| lowered.contains(&city.to_lowercase()))
        .unique()
        .cloned()
        .collect()
}

/// Candidate person names: runs of at least two title-cased tokens.
///
/// A run starts at a title-cased token longer than two characters and
/// extends over every immediately following title-cased token.
pub fn extract_names(text: &str) -> BTreeSet<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut names = BTreeSet::new();
    let mut i = 0;

    while i < words.len() {
        let word = words[i];
        if !(is_title_case(word) && word.chars().count() > 2) {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < words.len() && is_title_case(words[j]) {
            j += 1;
        }

        if j - i >= 2 {
            names.insert(words[i..j].join(" "));
            i = j;
        } else {
            i += 1;
        }
    }

    names
}

/// Title case: every cased run starts with one uppercase letter followed
/// only by lowercase letters, and at least one cased letter is present.
///
/// `"João"`, `"Pessoa,"` and `"Jean-Luc"` qualify; `"PM"`, `"iPhone"` and
/// `"123"` do not.
pub fn is_title_case(word: &str) -> bool {
    let mut seen_cased = false;
    let mut previous_cased = false;

    for c in word.chars() {
        if c.is_uppercase() {
            if previous_cased {
                return false;
            }
            previous_cased = true;
            seen_cased = true;
        } else if c.is_lowercase() {
            if !previous_cased {
                return false;
            }
            previous_cased = true;
            seen_cased = true;
        } else {
            previous_cased = false;
        }
    }

    seen_cased
}
