//! Short digests of article text.
//!
//! Policy:
//! - fewer than [`MIN_SUMMARY_TOKENS`] whitespace tokens: the trimmed text is
//!   returned unchanged
//! - otherwise the [`SentenceRanker`] (LexRank by default) selects up to `k`
//!   sentences, joined by single spaces
//! - if ranking fails, the text is split on `.` and the first `k` fragments
//!   are joined instead
//!
//! [`summarize`] never fails; [`Summary::method`] records which branch ran.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Number of sentences kept in a digest.
pub const SUMMARY_SENTENCES: usize = 3;
/// Texts with fewer whitespace-delimited tokens are not summarized.
pub const MIN_SUMMARY_TOKENS: usize = 30;

static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?…]+[.!?…]*").expect("static regex"));
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("static regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummarizeError {
    #[error("text contains no sentences")]
    NoSentences,
    #[error("no sentence contains a word token")]
    NoVocabulary,
    #[error("centrality scores did not converge after {0} iterations")]
    DidNotConverge(usize),
}

/// Extractive ranking capability: pick up to `k` sentences of `text`.
pub trait SentenceRanker {
    fn rank(&self, text: &str, k: usize) -> Result<Vec<String>, SummarizeError>;
}

/// Which branch of the summarization policy produced a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMethod {
    Passthrough,
    Extractive,
    NaiveSplit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    pub method: SummaryMethod,
}

/// Reduce `text` to a digest of at most `k` sentences. Never fails.
pub fn summarize<R: SentenceRanker>(ranker: &R, text: &str, k: usize) -> Summary {
    if text.split_whitespace().count() < MIN_SUMMARY_TOKENS {
        return Summary {
            text: text.trim().to_string(),
            method: SummaryMethod::Passthrough,
        };
    }

    match ranker.rank(text, k) {
        Ok(sentences) => Summary {
            text: sentences.join(" "),
            method: SummaryMethod::Extractive,
        },
        Err(e) => {
            warn!(error = %e, "Extractive summarization failed; using first sentences");
            Summary {
                text: naive_split(text, k),
                method: SummaryMethod::NaiveSplit,
            }
        }
    }
}

/// Split on `.` and join the first `k` fragments with spaces.
pub fn naive_split(text: &str, k: usize) -> String {
    text.split('.')
        .take(k)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Split text into trimmed sentences that keep their terminators.
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| WORD_RE.is_match(s))
        .collect()
}

fn tokenize(sentence: &str) -> Vec<String> {
    WORD_RE
        .find_iter(sentence)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Graph-centrality sentence ranking (LexRank).
///
/// Sentences are nodes; an edge links two sentences whose idf-modified
/// cosine similarity exceeds `threshold`. Scores are the stationary
/// distribution of the degree-normalised adjacency matrix, computed by
/// power iteration.
#[derive(Debug, Clone)]
pub struct LexRank {
    pub threshold: f64,
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for LexRank {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            epsilon: 0.1,
            max_iterations: 1_000,
        }
    }
}

impl LexRank {
    /// Centrality score of every sentence, in input order.
    pub fn scores(&self, sentences: &[Vec<String>]) -> Result<Vec<f64>, SummarizeError> {
        let n = sentences.len();
        if n == 0 {
            return Err(SummarizeError::NoSentences);
        }
        if sentences.iter().all(Vec::is_empty) {
            return Err(SummarizeError::NoVocabulary);
        }

        let tf: Vec<HashMap<&str, f64>> = sentences.iter().map(|s| term_frequencies(s)).collect();
        let idf = inverse_document_frequencies(&tf, n);

        let mut matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let similarity = idf_modified_cosine(&tf[i], &tf[j], &idf);
                let edge = if similarity > self.threshold { 1.0 } else { 0.0 };
                matrix[i][j] = edge;
                matrix[j][i] = edge;
            }
        }
        for row in matrix.iter_mut() {
            let degree: f64 = row.iter().sum();
            if degree > 0.0 {
                row.iter_mut().for_each(|v| *v /= degree);
            } else {
                row.iter_mut().for_each(|v| *v = 1.0 / n as f64);
            }
        }

        self.power_method(&matrix)
    }

    fn power_method(&self, matrix: &[Vec<f64>]) -> Result<Vec<f64>, SummarizeError> {
        let n = matrix.len();
        let mut p = vec![1.0 / n as f64; n];
        for iteration in 0..self.max_iterations {
            let next: Vec<f64> = (0..n)
                .map(|j| (0..n).map(|i| matrix[i][j] * p[i]).sum::<f64>())
                .collect();
            let delta = next
                .iter()
                .zip(&p)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            p = next;
            if delta < self.epsilon {
                debug!(iterations = iteration + 1, "LexRank converged");
                return Ok(p);
            }
        }
        Err(SummarizeError::DidNotConverge(self.max_iterations))
    }
}

impl SentenceRanker for LexRank {
    fn rank(&self, text: &str, k: usize) -> Result<Vec<String>, SummarizeError> {
        let sentences = split_sentences(text);
        let tokens: Vec<Vec<String>> = sentences.iter().map(|s| tokenize(s)).collect();
        let scores = self.scores(&tokens)?;

        let mut order: Vec<usize> = (0..sentences.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
        let mut chosen: Vec<usize> = order.into_iter().take(k).collect();
        chosen.sort_unstable();

        Ok(chosen.into_iter().map(|i| sentences[i].clone()).collect())
    }
}

fn term_frequencies(words: &[String]) -> HashMap<&str, f64> {
    let mut counts: HashMap<&str, f64> = HashMap::new();
    for w in words {
        *counts.entry(w.as_str()).or_default() += 1.0;
    }
    let max = counts.values().cloned().fold(0.0, f64::max);
    if max > 0.0 {
        counts.values_mut().for_each(|v| *v /= max);
    }
    counts
}

fn inverse_document_frequencies<'a>(tf: &[HashMap<&'a str, f64>], n: usize) -> HashMap<&'a str, f64> {
    let vocabulary: HashSet<&str> = tf.iter().flat_map(|m| m.keys().copied()).collect();
    vocabulary
        .into_iter()
        .map(|term| {
            let df = tf.iter().filter(|m| m.contains_key(term)).count() as f64;
            (term, (n as f64 / df).ln() + 1.0)
        })
        .collect()
}

fn idf_modified_cosine(a: &HashMap<&str, f64>, b: &HashMap<&str, f64>, idf: &HashMap<&str, f64>) -> f64 {
    let weight = |term: &str| idf.get(term).copied().unwrap_or(0.0);

    let numerator: f64 = a
        .iter()
        .filter_map(|(term, tf_a)| b.get(term).map(|tf_b| tf_a * tf_b * weight(*term).powi(2)))
        .sum();
    let norm = |m: &HashMap<&str, f64>| {
        m.iter()
            .map(|(term, tf)| (tf * weight(*term)).powi(2))
            .sum::<f64>()
            .sqrt()
    };
    let denominator = norm(a) * norm(b);
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl SentenceRanker for Broken {
        fn rank(&self, _text: &str, _k: usize) -> Result<Vec<String>, SummarizeError> {
            Err(SummarizeError::NoSentences)
        }
    }

    fn long_text() -> String {
        [
            "A polícia civil da Paraíba prendeu dois suspeitos de roubo em João Pessoa.",
            "Os suspeitos foram levados para a central de polícia da capital.",
            "Segundo a polícia, os dois suspeitos já tinham passagem por roubo.",
            "O tempo estava nublado durante toda a manhã.",
            "A investigação da polícia continua para identificar outros suspeitos do roubo.",
        ]
        .join(" ")
    }

    #[test]
    fn test_short_text_is_trimmed_passthrough() {
        let text = "  Homicídio registrado em Campina Grande.  ";
        let summary = summarize(&LexRank::default(), text, SUMMARY_SENTENCES);
        assert_eq!(summary.method, SummaryMethod::Passthrough);
        assert_eq!(summary.text, text.trim());
        assert_eq!(summarize(&Broken, "", 3).text, "");
    }

    fn words(n: usize) -> String {
        (1..=n)
            .map(|i| if i % 10 == 0 { "fim." } else { "palavra" })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_token_threshold_boundary() {
        let below = words(MIN_SUMMARY_TOKENS - 1);
        let summary = summarize(&Broken, &below, SUMMARY_SENTENCES);
        assert_eq!(summary.method, SummaryMethod::Passthrough);
        assert_eq!(summary.text, below);

        let at = words(MIN_SUMMARY_TOKENS);
        assert_eq!(at.split_whitespace().count(), 30);
        let summary = summarize(&Broken, &at, SUMMARY_SENTENCES);
        assert_eq!(summary.method, SummaryMethod::NaiveSplit);
        assert_eq!(summary.text, naive_split(&at, SUMMARY_SENTENCES));
    }

    #[test]
    fn test_long_text_is_reduced_to_k_sentences_in_document_order() {
        let text = long_text();
        assert!(text.split_whitespace().count() >= MIN_SUMMARY_TOKENS);

        let summary = summarize(&LexRank::default(), &text, SUMMARY_SENTENCES);
        assert_eq!(summary.method, SummaryMethod::Extractive);

        let picked = split_sentences(&summary.text);
        assert_eq!(picked.len(), SUMMARY_SENTENCES);
        let all = split_sentences(&text);
        let positions: Vec<usize> = picked
            .iter()
            .map(|s| all.iter().position(|a| a == s).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ranker_failure_falls_back_to_naive_split() {
        let text = long_text();
        let summary = summarize(&Broken, &text, 2);
        assert_eq!(summary.method, SummaryMethod::NaiveSplit);
        assert_eq!(summary.text, naive_split(&text, 2));
        assert!(summary.text.starts_with("A polícia civil"));
    }

    #[test]
    fn test_naive_split_drops_terminators() {
        assert_eq!(naive_split("Um. Dois. Três. Quatro.", 3), "Um  Dois  Três");
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("Primeira frase. Segunda?! Terceira... ");
        assert_eq!(sentences, vec!["Primeira frase.", "Segunda?!", "Terceira..."]);
        assert!(split_sentences("... !!!").is_empty());
    }

    #[test]
    fn test_lexrank_rejects_wordless_input() {
        assert_eq!(
            LexRank::default().rank("... ---", 3),
            Err(SummarizeError::NoSentences)
        );
        assert_eq!(
            LexRank::default().scores(&[vec![], vec![]]),
            Err(SummarizeError::NoVocabulary)
        );
    }

    #[test]
    fn test_lexrank_scores_sum_to_one() {
        let sentences = split_sentences(&long_text());
        let tokens: Vec<Vec<String>> = sentences.iter().map(|s| tokenize(s)).collect();
        let scores = LexRank::default().scores(&tokens).unwrap();
        let total: f64 = scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
