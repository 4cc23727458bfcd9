use crate::index::{DenseMatrix, DocId};
use std::cmp::Ordering;

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Scale `v` to unit length. A zero vector is left untouched.
pub fn l2_normalize(v: &mut [f64]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Round to `decimals` digits, half to even (`0.03125` becomes `0.0312`).
pub fn round_decimals(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Cosine similarity between every query row and every corpus row (`queries · corpusᵀ`).
///
/// Both inputs must already hold L2-normalized (or zero) rows; the dot product is then
/// the cosine. Un-normalized input yields meaningless scores and is not detected.
pub fn cosine_similarity(queries: &DenseMatrix, corpus: &DenseMatrix) -> DenseMatrix {
    debug_assert_eq!(queries.cols(), corpus.cols(), "vector widths differ");
    let mut out = DenseMatrix::zeros(queries.rows(), corpus.rows());
    for (qi, q) in queries.iter_rows().enumerate() {
        let row = out.row_mut(qi);
        for (ci, c) in corpus.iter_rows().enumerate() {
            row[ci] = dot(q, c);
        }
    }
    out
}

/// Order by descending score, then ascending doc id.
fn by_score_then_doc(a: &(DocId, f64), b: &(DocId, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then(a.0.cmp(&b.0))
}

/// Pick the `k` best nonzero scores, best first. Exact ties go to the lower doc id.
pub fn top_k_nonzero(scores: &[f64], k: usize) -> Vec<(DocId, f64)> {
    if k == 0 {
        return Vec::new();
    }
    let mut hits: Vec<(DocId, f64)> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s != 0.0)
        .map(|(i, s)| (i as DocId, *s))
        .collect();
    if hits.len() > k {
        hits.select_nth_unstable_by(k - 1, by_score_then_doc);
        hits.truncate(k);
    }
    hits.sort_by(by_score_then_doc);
    hits
}
