use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^a-zA-Z ]+").expect("valid regex");
}

/// Single-letter token kept so mentions of the C language survive.
const KEPT_SINGLE_LETTER: &str = "c";

fn keep_token(token: &str) -> bool {
    token.len() > 1 || token == KEPT_SINGLE_LETTER
}

/// Tokenize text: drop everything but ASCII letters and spaces, lowercase, split on spaces.
///
/// Tabs and newlines count as "everything else", so words separated only by them merge.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned = NON_WORD.replace_all(text, "");
    cleaned
        .to_ascii_lowercase()
        .split(' ')
        .filter(|t| keep_token(t))
        .map(str::to_string)
        .collect()
}

/// Stateless text normalizer. Cheap to copy; pass it wherever tokens are needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a batch of raw texts into token lists, one per input, in order.
    pub fn normalize<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<String>> {
        texts.iter().map(|t| tokenize(t.as_ref())).collect()
    }
}
