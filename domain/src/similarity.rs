//! Lexical agreement scoring between two answers.
//!
//! The jury never attempts semantic understanding: agreement between two
//! answers is measured as the cosine similarity of their TF-IDF weight
//! vectors, using the two answers themselves as the entire corpus. This is
//! deliberately coarse — it only has to support a three-way threshold
//! decision, not equivalence checking.

use std::collections::HashMap;

/// Number of documents in the two-answer corpus.
const CORPUS_SIZE: f64 = 2.0;

/// Split a text into lowercased word tokens.
///
/// Tokens are maximal runs of alphanumeric characters; everything else
/// (whitespace, punctuation) is a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score the lexical agreement between two texts, in `[0, 1]`.
///
/// Both texts are case-folded and tokenized on whitespace/punctuation.
/// Each term in either document gets a per-document weight
/// `tf(t, d) * (1 + ln(N / df(t)))` with `N = 2` — the smoothing term keeps
/// vocabulary shared by both answers contributing through its raw term
/// frequency even though its IDF is zero. The result is the cosine of the
/// two weight vectors over the union of terms.
///
/// Returns 0 when either text has no tokens or either weight vector has
/// zero magnitude.
///
/// # Examples
///
/// ```
/// use compass_domain::similarity::sim;
///
/// assert_eq!(sim("The answer is Go.", "The answer is Go."), 1.0);
/// assert_eq!(sim("anything", ""), 0.0);
/// ```
pub fn sim(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let tf_a = term_counts(&tokens_a);
    let tf_b = term_counts(&tokens_b);

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    let union = tf_a
        .keys()
        .chain(tf_b.keys().filter(|t| !tf_a.contains_key(*t)));

    for term in union {
        let count_a = tf_a.get(term).copied().unwrap_or(0) as f64;
        let count_b = tf_b.get(term).copied().unwrap_or(0) as f64;
        let df = (count_a > 0.0) as u32 + (count_b > 0.0) as u32;
        let idf = (CORPUS_SIZE / df as f64).ln();

        let weight_a = count_a * (1.0 + idf);
        let weight_b = count_b * (1.0 + idf);

        dot += weight_a * weight_b;
        norm_a += weight_a * weight_a;
        norm_b += weight_b * weight_b;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn term_counts(tokens: &[String]) -> HashMap<&str, u32> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_score_one() {
        let text = "Rust guarantees memory safety without garbage collection.";
        let score = sim(text, text);
        assert!((score - 1.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(sim("hello world", ""), 0.0);
        assert_eq!(sim("", "hello world"), 0.0);
        assert_eq!(sim("", ""), 0.0);
        assert_eq!(sim("...", "!!!"), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = "Use Rust for safety and performance.";
        let b = "Scripting languages are faster to develop in.";
        assert!((sim(a, b) - sim(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_range_bounds() {
        let pairs = [
            ("the quick brown fox", "the quick brown fox"),
            ("the quick brown fox", "a slow red turtle"),
            ("alpha beta gamma", "alpha beta delta"),
        ];
        for (a, b) in pairs {
            let score = sim(a, b);
            assert!((0.0..=1.0 + 1e-9).contains(&score), "{a} / {b} -> {score}");
        }
    }

    #[test]
    fn test_disjoint_vocabulary_scores_zero() {
        assert_eq!(sim("alpha beta gamma", "delta epsilon zeta"), 0.0);
    }

    #[test]
    fn test_partial_overlap_is_between() {
        let score = sim(
            "Use Rust for safety and performance.",
            "Use Rust for speed and performance.",
        );
        assert!(score > 0.3 && score < 1.0, "got {score}");
    }

    #[test]
    fn test_repeated_terms_weigh_heavier() {
        let base = sim("rust is fast", "rust is safe");
        let repeated = sim("rust rust rust is fast", "rust rust rust is safe");
        assert!(repeated > base, "{repeated} vs {base}");
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        assert_eq!(sim("The Answer Is GO!", "the answer is go"), 1.0);
    }

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        assert_eq!(
            tokenize("Hello, world! It's 2-fold."),
            vec!["hello", "world", "it", "s", "2", "fold"]
        );
    }
}
