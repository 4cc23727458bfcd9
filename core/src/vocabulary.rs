use crate::error::{Result, SearchError};
use crate::index::Vocabulary;
use crate::similarity::round_decimals;
use std::collections::{HashMap, HashSet};

/// Decimal digits kept in every IDF weight.
const IDF_DECIMALS: i32 = 8;

/// Smoothed IDF: `ln((N + 1) / (df + 1)) + 1`, rounded to 8 decimals.
/// Equals 1.0 when the token occurs in every document.
pub fn smoothed_idf(num_docs: usize, doc_freq: u32) -> f64 {
    let ratio = (num_docs as f64 + 1.0) / (doc_freq as f64 + 1.0);
    round_decimals(ratio.ln() + 1.0, IDF_DECIMALS)
}

/// Build the vocabulary and the aligned IDF vector from a tokenized corpus.
///
/// Keeps the `max_size` tokens with the highest total term frequency (ties go to the
/// lexicographically smaller token), then numbers them in ascending token order.
pub fn build_vocabulary<S: AsRef<str>>(
    corpus: &[Vec<S>],
    max_size: usize,
) -> Result<(Vocabulary, Vec<f64>)> {
    if corpus.is_empty() {
        return Err(SearchError::config("cannot build a vocabulary from an empty corpus"));
    }
    if max_size == 0 {
        return Err(SearchError::config("vocabulary size must be at least 1"));
    }

    let mut term_freq: HashMap<&str, u64> = HashMap::new();
    let mut doc_freq: HashMap<&str, u32> = HashMap::new();
    for doc in corpus {
        let mut seen_in_doc: HashSet<&str> = HashSet::new();
        for token in doc {
            let token = token.as_ref();
            *term_freq.entry(token).or_insert(0) += 1;
            if seen_in_doc.insert(token) {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }
    }
    if term_freq.is_empty() {
        return Err(SearchError::config(
            "corpus has no tokens left after normalization",
        ));
    }

    let mut ranked: Vec<(&str, u64)> = term_freq.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_size);

    let mut selected: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
    selected.sort_unstable();

    let num_docs = corpus.len();
    let idf = selected
        .iter()
        .map(|t| smoothed_idf(num_docs, doc_freq[t.as_str()]))
        .collect();

    let vocabulary = Vocabulary::from_sorted_tokens(selected)
        .ok_or_else(|| SearchError::config("duplicate tokens selected for vocabulary"))?;
    tracing::debug!(size = vocabulary.len(), num_docs, "built vocabulary and IDF vector");
    Ok((vocabulary, idf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|d| d.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn idf_is_one_for_ubiquitous_tokens() {
        assert_eq!(smoothed_idf(4, 4), 1.0);
        assert!(smoothed_idf(4, 1) > smoothed_idf(4, 2));
        assert!(smoothed_idf(4, 2) > smoothed_idf(4, 3));
    }

    #[test]
    fn document_frequency_counts_documents_not_occurrences() {
        let corpus = docs(&[&["aa", "aa", "aa"], &["bb"]]);
        let (vocab, idf) = build_vocabulary(&corpus, 10).unwrap();
        assert_eq!(vocab.tokens(), &["aa".to_string(), "bb".to_string()]);
        assert_eq!(idf[0], idf[1]);
    }

    #[test]
    fn selection_prefers_frequency_then_token_order() {
        // zz:3, mm:2, bb:2, aa:1 -> top 2 is zz then bb (bb < mm on the tie)
        let corpus = docs(&[&["zz", "zz", "mm", "bb"], &["zz", "mm", "bb", "aa"]]);
        let (vocab, _) = build_vocabulary(&corpus, 2).unwrap();
        assert_eq!(vocab.tokens(), &["bb".to_string(), "zz".to_string()]);
    }

    #[test]
    fn realized_size_is_bounded_by_distinct_tokens() {
        let corpus = docs(&[&["one", "two"], &["two", "three"]]);
        let (vocab, idf) = build_vocabulary(&corpus, 3000).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(idf.len(), 3);
        let ids: Vec<u32> = vocab.iter().map(|(_, id)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn empty_inputs_are_config_errors() {
        let empty: Vec<Vec<String>> = Vec::new();
        assert!(matches!(build_vocabulary(&empty, 10), Err(SearchError::Config(_))));
        let blank = docs(&[&[], &[]]);
        assert!(matches!(build_vocabulary(&blank, 10), Err(SearchError::Config(_))));
        let corpus = docs(&[&["aa"]]);
        assert!(matches!(build_vocabulary(&corpus, 0), Err(SearchError::Config(_))));
    }
}
