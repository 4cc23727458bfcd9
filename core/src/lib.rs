pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod similarity;
pub mod tokenizer;
pub mod vectorizer;
pub mod vocabulary;

pub use config::EngineConfig;
pub use corpus::{Corpus, CorpusBuilder};
pub use engine::{SearchEngine, SearchHit, DEFAULT_TOP_K};
pub use error::{Result, SearchError};
pub use index::{CorpusEntry, DenseMatrix, DocId, FittedIndex, TermId, Vocabulary};
pub use tokenizer::Normalizer;
pub use vectorizer::TfIdfVectorizer;
