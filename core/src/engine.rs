use crate::config::EngineConfig;
use crate::corpus::Corpus;
use crate::error::{Result, SearchError};
use crate::index::DocId;
use crate::persist::{self, MetaFile, FORMAT_VERSION};
use crate::similarity::{cosine_similarity, round_decimals, top_k_nonzero};
use crate::vectorizer::TfIdfVectorizer;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use tracing::Span;

pub const DEFAULT_TOP_K: usize = 5;

/// Decimal digits kept in reported scores.
const SCORE_DECIMALS: i32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub external_id: String,
    pub score: f64,
    pub text: String,
}

/// Finds the corpus entries most similar to a free-text query.
///
/// Owns the corpus, the vectorizer and the tracing span all of its events are recorded in.
pub struct SearchEngine {
    corpus: Corpus,
    vectorizer: TfIdfVectorizer,
    span: Span,
}

impl SearchEngine {
    pub fn new(corpus: Corpus, vectorizer: TfIdfVectorizer) -> Self {
        let span = tracing::info_span!(
            "search_engine",
            index = %vectorizer.paths().root.display()
        );
        Self { corpus, vectorizer, span }
    }

    /// Record this engine's events under `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Create an engine for `corpus` and fit it, persisting everything under `config.index_dir`.
    pub fn build(corpus: Corpus, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut engine = Self::new(corpus, TfIdfVectorizer::new(config));
        engine.fit()?;
        Ok(engine)
    }

    /// Open a previously built index. Only the corpus is read now; the vectorizer
    /// state is loaded on the first query.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let vectorizer = TfIdfVectorizer::new(config);
        let docs = persist::load_docs(vectorizer.paths())?;
        Ok(Self::new(Corpus::from_entries(docs), vectorizer))
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    /// Fit the vectorizer on the corpus and persist the corpus and index metadata with it.
    ///
    /// Nothing is written if fitting fails. Otherwise the docs go first, then the vectorizer
    /// artifacts, and `meta.json` last, once everything it describes is on disk.
    pub fn fit(&mut self) -> Result<()> {
        let _enter = self.span.clone().entered();
        tracing::info!(corpus_size = self.corpus.len(), "fit started");

        let index = self.vectorizer.fit_index(&self.corpus.texts())?;
        let vocabulary_size = index.vocabulary.len();
        persist::save_docs(self.vectorizer.paths(), self.corpus.entries())?;
        self.vectorizer.install(index)?;

        let paths = self.vectorizer.paths();
        let meta = MetaFile {
            num_docs: self.corpus.len() as u32,
            vocabulary_size: vocabulary_size as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            version: FORMAT_VERSION,
        };
        persist::save_meta(paths, &meta)?;

        tracing::info!(corpus_size = self.corpus.len(), vocabulary_size, "fit finished");
        Ok(())
    }

    /// Load persisted vectorizer state now rather than on the first query.
    pub fn warm_up(&self) -> Result<()> {
        let _enter = self.span.enter();
        self.vectorizer.fitted().map(|_| ())
    }

    /// Up to `top_k` corpus entries sharing vocabulary with `query`, best first.
    ///
    /// Entries with a zero score never appear. Scores are rounded to 4 decimals; equal
    /// scores keep corpus order. No overlap at all is an empty result, not an error.
    pub fn most_similar(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let _enter = self.span.enter();
        tracing::info!(top_k, query, "query started");

        let index = self.vectorizer.fitted()?;
        if index.corpus_matrix.rows() != self.corpus.len() {
            return Err(SearchError::corrupt(
                self.vectorizer.paths().corpus_matrix(),
                format!(
                    "corpus matrix has {} rows but the corpus has {} entries",
                    index.corpus_matrix.rows(),
                    self.corpus.len()
                ),
            ));
        }
        let query_matrix = self.vectorizer.transform_with(&index, &[query]);
        let scores = cosine_similarity(&query_matrix, &index.corpus_matrix);

        let hits: Vec<SearchHit> = top_k_nonzero(scores.row(0), top_k)
            .into_iter()
            .filter_map(|(doc_id, score)| {
                self.corpus.get(doc_id).map(|entry| SearchHit {
                    doc_id,
                    external_id: entry.external_id.clone(),
                    score: round_decimals(score, SCORE_DECIMALS),
                    text: entry.text.clone(),
                })
            })
            .collect();

        tracing::info!(top_k, results = hits.len(), "query finished");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn questions() -> Corpus {
        Corpus::from_texts([
            "How do I use Error handling in Java?",
            "Error Handling in Swift 3",
            "Java BufferedReader error",
            "If block error handling in bash",
            "java ATM program simulation with exception handling - no error neither full output?",
        ])
    }

    #[test]
    fn returns_every_match_when_top_k_exceeds_corpus() {
        let dir = tempdir().unwrap();
        let engine = SearchEngine::build(questions(), &EngineConfig::new(dir.path())).unwrap();
        let hits = engine.most_similar("Error handling in Java?", 10).unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(hits.iter().all(|h| h.score > 0.0));
    }

    #[test]
    fn no_overlap_returns_empty() {
        let dir = tempdir().unwrap();
        let engine = SearchEngine::build(questions(), &EngineConfig::new(dir.path())).unwrap();
        assert!(engine.most_similar("Rukovanje greskama u Javi?", 2).unwrap().is_empty());
    }

    #[test]
    fn top_k_caps_results() {
        let dir = tempdir().unwrap();
        let engine = SearchEngine::build(questions(), &EngineConfig::new(dir.path())).unwrap();
        assert_eq!(engine.most_similar("error", 2).unwrap().len(), 2);
        assert!(engine.most_similar("error", 0).unwrap().is_empty());
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let dir = tempdir().unwrap();
        let err = SearchEngine::build(Corpus::default(), &EngineConfig::new(dir.path()))
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::Config(_)));
    }
}
