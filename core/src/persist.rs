//! On-disk artifacts of a fitted index.
//!
//! Every binary artifact uses the same framing so it can be read back by any
//! implementation that speaks bincode 1 (little-endian, fixed-width integers,
//! `u64` length prefixes):
//!
//! ```text
//! [magic "QSRC"][format version: u32 LE][bincode payload][CRC32 of payload: u32 LE]
//! ```
//!
//! Payloads: `vocabulary.bin` holds the tokens in index order, `idf.bin` a
//! `Vec<f64>` aligned to it, `corpus_matrix.bin` a `{rows, cols, data}` row-major
//! matrix and `docs.bin` the corpus entries. `meta.json` is plain JSON.

use crate::error::{Result, SearchError};
use crate::index::{CorpusEntry, DenseMatrix, FittedIndex, Vocabulary};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"QSRC";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;
const FOOTER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub vocabulary_size: u32,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    pub fn idf(&self) -> PathBuf { self.root.join("idf.bin") }
    pub fn corpus_matrix(&self) -> PathBuf { self.root.join("corpus_matrix.bin") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write `value` to `path` in the framed format, creating parent directories.
/// The file is written to a sibling temp file first and renamed into place.
pub fn store<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let payload = bincode::serialize(value)?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + FOOTER_LEN);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, &out)?;
    fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), bytes = out.len(), "stored artifact");
    Ok(())
}

/// Read a framed value from `path`. Fails with `NotFound` if the file is absent.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read(path).map_err(|e| SearchError::from_io(path, e))?;
    if raw.len() < HEADER_LEN + FOOTER_LEN {
        return Err(SearchError::corrupt(path, "file too short"));
    }
    if &raw[..4] != MAGIC {
        return Err(SearchError::corrupt(path, "bad magic"));
    }
    let version = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    if version != FORMAT_VERSION {
        return Err(SearchError::corrupt(
            path,
            format!("unsupported format version {version}, expected {FORMAT_VERSION}"),
        ));
    }
    let (payload, footer) = raw[HEADER_LEN..].split_at(raw.len() - HEADER_LEN - FOOTER_LEN);
    let stored = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(SearchError::corrupt(
            path,
            format!("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}"),
        ));
    }
    Ok(bincode::deserialize(payload)?)
}

pub fn save_vocabulary(paths: &IndexPaths, vocabulary: &Vocabulary) -> Result<()> {
    store(vocabulary.tokens(), &paths.vocabulary())
}

pub fn load_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> {
    let path = paths.vocabulary();
    let tokens: Vec<String> = load(&path)?;
    Vocabulary::from_sorted_tokens(tokens)
        .ok_or_else(|| SearchError::corrupt(&path, "vocabulary tokens are not strictly ascending"))
}

pub fn save_idf(paths: &IndexPaths, idf: &[f64]) -> Result<()> {
    store(idf, &paths.idf())
}

pub fn load_idf(paths: &IndexPaths) -> Result<Vec<f64>> {
    load(&paths.idf())
}

pub fn save_corpus_matrix(paths: &IndexPaths, matrix: &DenseMatrix) -> Result<()> {
    store(matrix, &paths.corpus_matrix())
}

pub fn load_corpus_matrix(paths: &IndexPaths) -> Result<DenseMatrix> {
    let path = paths.corpus_matrix();
    let matrix: DenseMatrix = load(&path)?;
    if !matrix.is_consistent() {
        return Err(SearchError::corrupt(&path, "row data does not match rows x cols"));
    }
    Ok(matrix)
}

pub fn save_docs(paths: &IndexPaths, docs: &[CorpusEntry]) -> Result<()> {
    store(docs, &paths.docs())
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<CorpusEntry>> {
    load(&paths.docs())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(paths.meta(), json)?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let path = paths.meta();
    let buf = fs::read_to_string(&path).map_err(|e| SearchError::from_io(&path, e))?;
    Ok(serde_json::from_str(&buf)?)
}

/// Persist the three fit artifacts.
pub fn save_fitted_index(paths: &IndexPaths, index: &FittedIndex) -> Result<()> {
    save_vocabulary(paths, &index.vocabulary)?;
    save_idf(paths, &index.idf)?;
    save_corpus_matrix(paths, &index.corpus_matrix)?;
    Ok(())
}

/// Load the three fit artifacts and check that their dimensions line up.
pub fn load_fitted_index(paths: &IndexPaths) -> Result<FittedIndex> {
    let vocabulary = load_vocabulary(paths)?;
    let idf = load_idf(paths)?;
    if idf.len() != vocabulary.len() {
        return Err(SearchError::corrupt(
            paths.idf(),
            format!("{} IDF weights for {} vocabulary tokens", idf.len(), vocabulary.len()),
        ));
    }
    let corpus_matrix = load_corpus_matrix(paths)?;
    if corpus_matrix.cols() != vocabulary.len() {
        return Err(SearchError::corrupt(
            paths.corpus_matrix(),
            format!("matrix width {} for {} vocabulary tokens", corpus_matrix.cols(), vocabulary.len()),
        ));
    }
    Ok(FittedIndex { vocabulary, idf, corpus_matrix })
}
