use crate::error::{Result, SearchError};
use crate::index::{CorpusEntry, DocId};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One line of input: `{"id": 17, "question": "..."}`. The id may be a number or a string.
#[derive(Debug, Deserialize)]
struct InputRecord {
    id: serde_json::Value,
    #[serde(alias = "content")]
    question: String,
}

impl InputRecord {
    fn external_id(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            // integral ids read back as floats keep their integer spelling
            serde_json::Value::Number(n) if n.is_f64() => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
                _ => n.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// Strict JSON first, then JSON5. A line neither accepts reports the JSON error.
fn parse_record(line: &str) -> std::result::Result<InputRecord, serde_json::Error> {
    match serde_json::from_str(line) {
        Ok(record) => Ok(record),
        Err(err) => json5::from_str(line).map_err(|_| err),
    }
}

/// Ordered, content-deduplicated corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

/// Accumulates records keyed by content. A repeated content keeps the position of its
/// first occurrence and the id of its latest one.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    by_content: IndexMap<String, String>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, external_id: String, text: String) {
        self.by_content.insert(text, external_id);
    }

    /// Read one record per line. Blank lines are skipped; any other line that does not
    /// parse aborts the read.
    ///
    /// Lines are strict JSON or, failing that, JSON5, which also accepts single-quoted
    /// dict-literal lines such as `{'id': 1, 'question': '...'}`.
    pub fn read_jsonl<R: BufRead>(&mut self, reader: R) -> Result<()> {
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() { continue; }
            let record = parse_record(&line)
                .map_err(|source| SearchError::MalformedRecord { line: i + 1, source })?;
            self.insert(record.external_id(), record.question);
        }
        Ok(())
    }

    pub fn read_jsonl_file(&mut self, path: &Path) -> Result<()> {
        let f = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
        self.read_jsonl(BufReader::new(f))
    }

    pub fn len(&self) -> usize {
        self.by_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_content.is_empty()
    }

    pub fn finish(self) -> Corpus {
        let entries = self
            .by_content
            .into_iter()
            .map(|(text, external_id)| CorpusEntry { external_id, text })
            .collect();
        Corpus { entries }
    }
}

impl Corpus {
    /// Corpus from plain texts; ids are the zero-based positions. Texts are not deduplicated.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| CorpusEntry { external_id: i.to_string(), text: t.into() })
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    pub fn from_jsonl_file(path: &Path) -> Result<Self> {
        let mut builder = CorpusBuilder::new();
        builder.read_jsonl_file(path)?;
        Ok(builder.finish())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, doc_id: DocId) -> Option<&CorpusEntry> {
        self.entries.get(doc_id as usize)
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.text.as_str()).collect()
    }
}
