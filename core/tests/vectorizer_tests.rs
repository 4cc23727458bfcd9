use qsearch_core::persist::{self, IndexPaths};
use qsearch_core::similarity::{cosine_similarity, l2_norm};
use qsearch_core::{EngineConfig, TfIdfVectorizer};
use tempfile::tempdir;

const CORPUS: [&str; 4] = [
    "This is the first document.",
    "This document is the second document.",
    "And this is the third one.",
    "Is this the first document?",
];

const QUERY: &str = "Is this first or second document?";

fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!((a - e).abs() < tol, "index {i}: {a} vs {e}");
    }
}

fn fitted(dir: &std::path::Path) -> TfIdfVectorizer {
    let mut vectorizer = TfIdfVectorizer::new(&EngineConfig::new(dir));
    vectorizer.fit(&CORPUS).unwrap();
    vectorizer
}

#[test]
fn fit_builds_alphabetical_vocabulary_and_idf() {
    let dir = tempdir().unwrap();
    let vectorizer = fitted(dir.path());
    let index = vectorizer.fitted().unwrap();

    let expected = ["and", "document", "first", "is", "one", "second", "the", "third", "this"];
    assert_eq!(index.vocabulary.len(), 9);
    for (i, token) in expected.iter().enumerate() {
        assert_eq!(index.vocabulary.get(token), Some(i as u32));
    }

    let idf = [1.91629073, 1.22314355, 1.51082562, 1.0, 1.91629073, 1.91629073, 1.0, 1.91629073, 1.0];
    assert_close(&index.idf, &idf, 1e-12);
    assert!(index.idf.iter().all(|w| *w >= 1.0));
}

#[test]
fn fit_vectorizes_corpus_in_order() {
    let dir = tempdir().unwrap();
    let vectorizer = fitted(dir.path());
    let matrix = &vectorizer.fitted().unwrap().corpus_matrix;

    let expected = [
        [0., 0.46979139, 0.58028582, 0.38408524, 0., 0., 0.38408524, 0., 0.38408524],
        [0., 0.6876236, 0., 0.28108867, 0., 0.53864762, 0.28108867, 0., 0.28108867],
        [0.51184851, 0., 0., 0.26710379, 0.51184851, 0., 0.26710379, 0.51184851, 0.26710379],
        [0., 0.46979139, 0.58028582, 0.38408524, 0., 0., 0.38408524, 0., 0.38408524],
    ];
    assert_eq!(matrix.rows(), 4);
    for (i, row) in expected.iter().enumerate() {
        assert_close(matrix.row(i), row, 1e-8);
        assert!((l2_norm(matrix.row(i)) - 1.0).abs() < 1e-6);
    }
}

#[test]
fn transform_weights_query_terms() {
    let dir = tempdir().unwrap();
    let vectorizer = fitted(dir.path());
    let q = vectorizer.transform(&[QUERY]).unwrap();

    let expected = [0., 0.39787085, 0.49144966, 0.32528549, 0., 0.62334157, 0., 0., 0.32528549];
    assert_eq!(q.rows(), 1);
    assert_close(q.row(0), &expected, 1e-8);
    assert!((q.row(0)[5] - 0.6233).abs() < 1e-4);
}

#[test]
fn transform_without_fit_reloads_persisted_state() {
    let dir = tempdir().unwrap();
    let original = fitted(dir.path());
    let expected = original.transform(&[QUERY]).unwrap();

    let fresh = TfIdfVectorizer::new(&EngineConfig::new(dir.path()));
    assert!(!fresh.is_resident());
    let q = fresh.transform(&[QUERY]).unwrap();
    assert!(fresh.is_resident());
    assert_close(q.row(0), expected.row(0), 1e-12);
}

#[test]
fn persisted_vocabulary_and_idf_match_fitted_state() {
    let dir = tempdir().unwrap();
    let vectorizer = fitted(dir.path());
    let index = vectorizer.fitted().unwrap();

    let paths = IndexPaths::new(dir.path());
    assert_eq!(persist::load_vocabulary(&paths).unwrap(), index.vocabulary);
    assert_close(&persist::load_idf(&paths).unwrap(), &index.idf, 1e-12);
    assert_eq!(persist::load_corpus_matrix(&paths).unwrap(), index.corpus_matrix);
}

#[test]
fn out_of_vocabulary_text_is_zero_vector() {
    let dir = tempdir().unwrap();
    let vectorizer = fitted(dir.path());
    let q = vectorizer.transform(&["zebra quantum 42"]).unwrap();
    assert!(q.row(0).iter().all(|x| *x == 0.0));
}

#[test]
fn identical_documents_score_one() {
    let dir = tempdir().unwrap();
    let vectorizer = fitted(dir.path());
    let matrix = &vectorizer.fitted().unwrap().corpus_matrix;
    let scores = cosine_similarity(matrix, matrix);
    for i in 0..matrix.rows() {
        assert!((scores.row(i)[i] - 1.0).abs() < 1e-9);
    }
    assert!((scores.row(0)[3] - 1.0).abs() < 1e-9);
}

#[test]
fn vocabulary_is_capped_at_configured_size() {
    let dir = tempdir().unwrap();
    let mut vectorizer = TfIdfVectorizer::new(&EngineConfig::new(dir.path()).with_vocabulary_size(3));
    vectorizer.fit(&CORPUS).unwrap();
    let index = vectorizer.fitted().unwrap();
    // document, is, the and this all occur 4 times; the tie keeps the alphabetically first three
    assert_eq!(index.vocabulary.tokens(), &["document".to_string(), "is".to_string(), "the".to_string()]);
    assert_eq!(index.idf.len(), 3);
    assert_eq!(index.corpus_matrix.cols(), 3);
}
