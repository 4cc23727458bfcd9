use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = u32;
pub type DocId = u32;

/// One corpus item. Its position in the corpus is its `DocId` and its row in the corpus matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub external_id: String,
    pub text: String,
}

/// Bounded token -> index mapping. Indices are `0..len()` in ascending token order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, TermId>,
}

impl Vocabulary {
    /// Build from tokens already in index order. Returns `None` unless strictly ascending.
    pub fn from_sorted_tokens(tokens: Vec<String>) -> Option<Self> {
        if !tokens.windows(2).all(|w| w[0] < w[1]) {
            return None;
        }
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as TermId))
            .collect();
        Some(Self { tokens, index })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, token: &str) -> Option<TermId> {
        self.index.get(token).copied()
    }

    pub fn token(&self, id: TermId) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// Tokens in index order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TermId)> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i as TermId))
    }
}

/// Row-major dense matrix of `f64`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    pub fn with_cols(cols: usize) -> Self {
        Self { rows: 0, cols, data: Vec::new() }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    /// Returns `None` if `data.len() != rows * cols`.
    pub fn from_raw(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        (rows.checked_mul(cols) == Some(data.len())).then_some(Self { rows, cols, data })
    }

    pub fn push_row(&mut self, row: &[f64]) {
        assert_eq!(row.len(), self.cols, "row width must match matrix width");
        self.data.extend_from_slice(row);
        self.rows += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub(crate) fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.rows.checked_mul(self.cols) == Some(self.data.len())
    }
}

/// Everything produced by one fit: vocabulary, aligned IDF weights and the corpus matrix.
/// Immutable once built; shared between queries behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedIndex {
    pub vocabulary: Vocabulary,
    pub idf: Vec<f64>,
    pub corpus_matrix: DenseMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_requires_ascending_tokens() {
        assert!(Vocabulary::from_sorted_tokens(vec!["b".into(), "a".into()]).is_none());
        assert!(Vocabulary::from_sorted_tokens(vec!["a".into(), "a".into()]).is_none());
        let v = Vocabulary::from_sorted_tokens(vec!["and".into(), "is".into()]).unwrap();
        assert_eq!(v.get("is"), Some(1));
        assert_eq!(v.token(0), Some("and"));
        assert_eq!(v.get("nope"), None);
    }

    #[test]
    fn matrix_rows() {
        let mut m = DenseMatrix::with_cols(2);
        m.push_row(&[1.0, 2.0]);
        m.push_row(&[3.0, 4.0]);
        assert_eq!(m.rows(), 2);
        assert_eq!(m.row(1), &[3.0, 4.0]);
        assert!(DenseMatrix::from_raw(2, 2, vec![0.0; 3]).is_none());
    }
}
