use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default upper bound on the number of vocabulary tokens.
pub const DEFAULT_VOCABULARY_SIZE: usize = 3000;

/// Default directory holding the fitted artifacts.
pub const DEFAULT_INDEX_DIR: &str = "./index";

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory where vocabulary, IDF, corpus matrix and docs are persisted
    pub index_dir: PathBuf,

    /// Maximum vocabulary size used at fit time
    pub vocabulary_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            vocabulary_size: DEFAULT_VOCABULARY_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn new<P: Into<PathBuf>>(index_dir: P) -> Self {
        Self {
            index_dir: index_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_vocabulary_size(mut self, vocabulary_size: usize) -> Self {
        self.vocabulary_size = vocabulary_size;
        self
    }

    /// Load configuration from `QSEARCH_INDEX_DIR` and `QSEARCH_VOCABULARY_SIZE`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("QSEARCH_INDEX_DIR") {
            config.index_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var("QSEARCH_VOCABULARY_SIZE") {
            config.vocabulary_size = raw.trim().parse().map_err(|_| {
                SearchError::config(format!("QSEARCH_VOCABULARY_SIZE is not a number: {raw}"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of this configuration. `None` keeps the
    /// current value. The result is validated.
    pub fn overridden(
        mut self,
        index_dir: Option<PathBuf>,
        vocabulary_size: Option<usize>,
    ) -> Result<Self> {
        if let Some(dir) = index_dir {
            self.index_dir = dir;
        }
        if let Some(size) = vocabulary_size {
            self.vocabulary_size = size;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vocabulary_size == 0 {
            return Err(SearchError::config("vocabulary size must be at least 1"));
        }
        Ok(())
    }
}
