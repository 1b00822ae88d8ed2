//! Text similarity scoring for duplicate detection.
//!
//! The duplicate detector only needs a score in `[0, 1]` for a pair of
//! texts, so scoring sits behind the [`SimilarityProvider`] trait. Two
//! implementations ship with the crate:
//!
//! - [`Jaccard`]: overlap of the two texts' unique word sets. Cheap; used for
//!   titles.
//! - [`TfIdfCosine`]: cosine similarity of TF-IDF vectors fitted on the pair,
//!   with English stop words removed. Used for article bodies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Any word (`\b\w+\b`).
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());
/// Words of two or more characters (`\b\w\w+\b`).
static TERM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Scores how alike two texts are.
///
/// Implementations must be pure: the same pair always yields the same score,
/// and the score lies in `[0, 1]`. Empty input scores `0.0` rather than
/// failing.
pub trait SimilarityProvider: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Which provider a configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    Jaccard,
    #[default]
    TfIdf,
}

impl SimilarityKind {
    pub fn provider(self) -> Box<dyn SimilarityProvider> {
        match self {
            SimilarityKind::Jaccard => Box::new(Jaccard),
            SimilarityKind::TfIdf => Box::new(TfIdfCosine),
        }
    }
}

/// Intersection over union of lower-cased unique words.
#[derive(Debug, Clone, Copy, Default)]
pub struct Jaccard;

impl SimilarityProvider for Jaccard {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        jaccard(a, b)
    }
}

/// Word-overlap similarity of two texts.
///
/// # Examples
///
/// ```
/// use awful_news_archive::similarity::jaccard;
///
/// assert_eq!(jaccard("the cat sat", "The cat ran"), 0.5);
/// assert_eq!(jaccard("", "anything"), 0.0);
/// ```
pub fn jaccard(a: &str, b: &str) -> f64 {
    let words_a = word_set(a);
    let words_b = word_set(b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    let overlap = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();
    overlap as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// TF-IDF cosine similarity fitted on just the two documents being compared.
///
/// Terms are lower-cased words of at least two characters with English stop
/// words removed. Term frequency is the raw count; inverse document frequency
/// is smoothed as `ln((1 + n) / (1 + df)) + 1` with `n = 2`; both vectors are
/// L2-normalised so the cosine is their dot product.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfCosine;

impl SimilarityProvider for TfIdfCosine {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let counts_a = term_counts(a);
        let counts_b = term_counts(b);
        if counts_a.is_empty() || counts_b.is_empty() {
            return 0.0;
        }

        let shared_idf = 1.0; // ln(3/3) + 1
        let single_idf = (3.0_f64 / 2.0).ln() + 1.0;
        let idf = |term: &str| {
            if counts_a.contains_key(term) && counts_b.contains_key(term) {
                shared_idf
            } else {
                single_idf
            }
        };

        let weights_a: HashMap<&str, f64> = counts_a
            .iter()
            .map(|(t, c)| (t.as_str(), *c as f64 * idf(t)))
            .collect();
        let weights_b: HashMap<&str, f64> = counts_b
            .iter()
            .map(|(t, c)| (t.as_str(), *c as f64 * idf(t)))
            .collect();

        let norm = |w: &HashMap<&str, f64>| w.values().map(|v| v * v).sum::<f64>().sqrt();
        let (norm_a, norm_b) = (norm(&weights_a), norm(&weights_b));
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        let dot: f64 = weights_a
            .iter()
            .filter_map(|(t, wa)| weights_b.get(t).map(|wb| wa * wb))
            .sum();
        (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let lower = text.to_lowercase();
    let mut counts = HashMap::new();
    for term in TERM.find_iter(&lower).map(|m| m.as_str()) {
        if !STOP_WORDS.contains(term) {
            *counts.entry(term.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are",
    "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "done", "down",
    "due", "during", "each", "either", "else", "elsewhere", "enough", "etc", "even", "ever",
    "every", "everyone", "everything", "everywhere", "except", "few", "first", "for", "former",
    "formerly", "from", "further", "had", "has", "have", "he", "hence", "her", "here",
    "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him", "himself", "his",
    "how", "however", "i", "ie", "if", "in", "indeed", "into", "is", "it", "its", "itself",
    "last", "latter", "latterly", "least", "less", "ltd", "many", "may", "me", "meanwhile",
    "might", "mine", "more", "moreover", "most", "mostly", "much", "must", "my", "myself",
    "namely", "neither", "never", "nevertheless", "next", "no", "nobody", "none", "noone",
    "nor", "not", "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one",
    "only", "onto", "or", "other", "others", "otherwise", "our", "ours", "ourselves", "out",
    "over", "own", "per", "perhaps", "please", "rather", "re", "same", "seem", "seemed",
    "seeming", "seems", "several", "she", "should", "since", "so", "some", "somehow", "someone",
    "something", "sometime", "sometimes", "somewhere", "still", "such", "than", "that", "the",
    "their", "them", "themselves", "then", "thence", "there", "thereafter", "thereby",
    "therefore", "therein", "thereupon", "these", "they", "this", "those", "though", "through",
    "throughout", "thru", "thus", "to", "together", "too", "toward", "towards", "under",
    "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever",
    "when", "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein",
    "whereupon", "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole",
    "whom", "whose", "why", "will", "with", "within", "without", "would", "yet", "you", "your",
    "yours", "yourself", "yourselves",
];
