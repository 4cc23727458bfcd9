use crate::config::EngineConfig;
use crate::error::Result;
use crate::index::{DenseMatrix, FittedIndex, Vocabulary};
use crate::persist::{self, IndexPaths};
use crate::similarity::l2_normalize;
use crate::tokenizer::Normalizer;
use crate::vocabulary::build_vocabulary;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// TF-IDF vector for one token list: `idf * count / len` per in-vocabulary token,
/// then L2-normalized. Tokens outside the vocabulary are ignored; no overlap gives zeros.
pub fn vectorize<S: AsRef<str>>(tokens: &[S], vocabulary: &Vocabulary, idf: &[f64]) -> Vec<f64> {
    let mut vector = vec![0.0; vocabulary.len()];
    if tokens.is_empty() {
        return vector;
    }
    let mut counts: HashMap<usize, u32> = HashMap::new();
    for token in tokens {
        if let Some(tid) = vocabulary.get(token.as_ref()) {
            *counts.entry(tid as usize).or_insert(0) += 1;
        }
    }
    let n = tokens.len() as f64;
    for (i, count) in counts {
        vector[i] = idf[i] * (count as f64 / n);
    }
    l2_normalize(&mut vector);
    vector
}

/// Vectorize every token list into one matrix row, in order.
pub fn vectorize_all<S: AsRef<str>>(
    tokenized: &[Vec<S>],
    vocabulary: &Vocabulary,
    idf: &[f64],
) -> DenseMatrix {
    let mut matrix = DenseMatrix::with_cols(vocabulary.len());
    for tokens in tokenized {
        matrix.push_row(&vectorize(tokens, vocabulary, idf));
    }
    matrix
}

/// TF-IDF vectorizer with a fit/transform split.
///
/// `fit` needs exclusive access and replaces the resident snapshot. `transform` only
/// reads it; if nothing is resident yet, the persisted artifacts are loaded once and kept.
pub struct TfIdfVectorizer {
    normalizer: Normalizer,
    paths: IndexPaths,
    vocabulary_size: usize,
    state: RwLock<Option<Arc<FittedIndex>>>,
}

impl TfIdfVectorizer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            normalizer: Normalizer::new(),
            paths: IndexPaths::new(&config.index_dir),
            vocabulary_size: config.vocabulary_size,
            state: RwLock::new(None),
        }
    }

    pub fn paths(&self) -> &IndexPaths {
        &self.paths
    }

    /// Whether fitted state is in memory (fit ran or artifacts were loaded).
    pub fn is_resident(&self) -> bool {
        self.state.read().is_some()
    }

    /// Fit on a raw corpus, persist vocabulary, IDF and corpus matrix, and make them resident.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<()> {
        let index = self.fit_index(corpus)?;
        self.install(index)
    }

    /// Compute vocabulary, IDF and corpus matrix without touching disk or the resident state.
    pub fn fit_index<S: AsRef<str>>(&self, corpus: &[S]) -> Result<FittedIndex> {
        let tokenized = self.normalizer.normalize(corpus);
        let (vocabulary, idf) = build_vocabulary(&tokenized, self.vocabulary_size)?;
        let corpus_matrix = vectorize_all(&tokenized, &vocabulary, &idf);
        Ok(FittedIndex { vocabulary, idf, corpus_matrix })
    }

    /// Persist `index` and make it the resident snapshot.
    pub fn install(&mut self, index: FittedIndex) -> Result<()> {
        persist::save_fitted_index(&self.paths, &index)?;
        tracing::info!(
            num_docs = index.corpus_matrix.rows(),
            vocabulary_size = index.vocabulary.len(),
            dir = %self.paths.root.display(),
            "fitted TF-IDF vectorizer"
        );
        *self.state.get_mut() = Some(Arc::new(index));
        Ok(())
    }

    /// The resident snapshot, loading it from disk on first use.
    pub fn fitted(&self) -> Result<Arc<FittedIndex>> {
        {
            let guard = self.state.read();
            if let Some(index) = guard.as_ref() {
                return Ok(Arc::clone(index));
            }
        }
        // single writer performs the load; late arrivals see it on the re-check
        let mut guard = self.state.write();
        if let Some(index) = guard.as_ref() {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(persist::load_fitted_index(&self.paths)?);
        tracing::info!(
            num_docs = index.corpus_matrix.rows(),
            vocabulary_size = index.vocabulary.len(),
            dir = %self.paths.root.display(),
            "loaded fitted artifacts"
        );
        *guard = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Vectorize raw texts against the resident snapshot, one row per text.
    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Result<DenseMatrix> {
        let index = self.fitted()?;
        Ok(self.transform_with(&index, texts))
    }

    /// Vectorize raw texts against a given snapshot.
    pub fn transform_with<S: AsRef<str>>(&self, index: &FittedIndex, texts: &[S]) -> DenseMatrix {
        let tokenized = self.normalizer.normalize(texts);
        vectorize_all(&tokenized, &index.vocabulary, &index.idf)
    }
}
