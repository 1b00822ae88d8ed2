//! Title normalization and the all-pairs title similarity index.
//!
//! Syndicated stories reappear under slightly different headlines
//! ("Storm hits coast" / "Storm hits coast Tuesday"). Normalized titles and
//! the similarity index are used to build the groups inside which bodies are
//! compared for near-duplicates.

use crate::dates::month_names;
use crate::similarity::jaccard;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;
use tracing::{debug, instrument};

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9 ]").unwrap());

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Years covered by the default title stop list.
pub const DEFAULT_STOP_YEARS: RangeInclusive<i32> = 1980..=2025;

/// Another title that scored above the index threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleMatch {
    pub title: String,
    pub score: f64,
}

/// Strip a title down to lower-case ASCII words.
///
/// Trims the input, drops every character outside `[A-Za-z0-9 ]`, lower-cases
/// what remains, and, when `stop_words` is given, removes those words and
/// collapses the spacing.
///
/// # Examples
///
/// ```
/// use awful_news_archive::titles::standardize_text;
///
/// assert_eq!(standardize_text("  Storm hits coast! ", None), "storm hits coast");
/// ```
pub fn standardize_text(text: &str, stop_words: Option<&HashSet<String>>) -> String {
    let clean = NON_ALPHANUMERIC
        .replace_all(text.trim(), "")
        .to_lowercase();
    match stop_words {
        Some(stop) => clean
            .split_whitespace()
            .filter(|w| !stop.contains(*w))
            .collect::<Vec<_>>()
            .join(" "),
        None => clean,
    }
}

/// Date words that carry no information about which story a title belongs to.
///
/// Month names, the day ordinals `01st`..`31st` as printed by archive
/// exports, weekday names, and every year in `years`, all lower-case.
pub fn date_components(years: RangeInclusive<i32>) -> HashSet<String> {
    let mut words: HashSet<String> = month_names().iter().map(|m| m.to_string()).collect();

    words.extend(["01st", "02nd", "03rd"].map(String::from));
    words.extend((4..31).map(|d| format!("{d:02}th")));
    words.insert("31st".to_string());

    words.extend(WEEKDAYS.iter().map(|d| d.to_string()));
    words.extend(years.map(|y| y.to_string()));
    words
}

/// Build the title similarity map.
///
/// Every pair of titles is scored with [`jaccard`]; pairs scoring strictly
/// above `threshold` are recorded under both titles. Titles that never clear
/// the threshold do not appear. Repeated titles share one entry.
#[instrument(level = "debug", skip(titles), fields(count = titles.len()))]
pub fn title_similarity_index<S: AsRef<str>>(
    titles: &[S],
    threshold: f64,
) -> BTreeMap<String, Vec<TitleMatch>> {
    let mut index: BTreeMap<String, Vec<TitleMatch>> = BTreeMap::new();
    for (i, a) in titles.iter().enumerate() {
        for b in &titles[i + 1..] {
            let (a, b) = (a.as_ref(), b.as_ref());
            let score = jaccard(a, b);
            if score > threshold {
                index.entry(a.to_string()).or_default().push(TitleMatch {
                    title: b.to_string(),
                    score,
                });
                index.entry(b.to_string()).or_default().push(TitleMatch {
                    title: a.to_string(),
                    score,
                });
            }
        }
    }
    debug!(linked = index.len(), "Built title similarity index");
    index
}

/// Cluster id for every title, joining titles linked in the similarity index.
///
/// Returns, for each input position, the position of the first title in its
/// cluster. Identical titles always share a cluster.
pub fn title_clusters<S: AsRef<str>>(titles: &[S], threshold: f64) -> Vec<usize> {
    let index = title_similarity_index(titles, threshold);

    let mut first_seen: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, t) in titles.iter().enumerate() {
        first_seen.entry(t.as_ref()).or_insert(i);
    }

    let mut parent: Vec<usize> = (0..titles.len()).collect();
    for (i, t) in titles.iter().enumerate() {
        union(&mut parent, i, first_seen[t.as_ref()]);
    }
    for (title, matches) in &index {
        let a = first_seen[title.as_str()];
        for m in matches {
            union(&mut parent, a, first_seen[m.title.as_str()]);
        }
    }

    (0..titles.len()).map(|i| find(&mut parent, i)).collect()
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut cur = i;
    while parent[cur] != root {
        let next = parent[cur];
        parent[cur] = root;
        cur = next;
    }
    root
}

/// Union keeping the smaller position as root, so roots are first members.
fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}
