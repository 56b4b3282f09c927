//! Corpus and wordlist reading.
//!
//! Two input shapes are accepted:
//! - raw corpus text, tokenized on Unicode word boundaries into a token stream;
//! - a wordlist, one `word count [phone ...]` entry per line.
//!
//! Case folding and truncation are applied later, per parameter generation, by
//! [`Corpus::tokens`] and [`Corpus::word_counts`], so one parsed corpus can be
//! rerun under different parameters.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{LexiconError, Result};
use crate::phonology::phones_from_columns;

/// One line of a wordlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordlistEntry {
    pub word: String,
    pub count: u64,
    /// Phone transcription, when the wordlist carries one.
    pub phones: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corpus {
    /// Running text in reading order.
    Text { tokens: Vec<String> },
    Wordlist { entries: Vec<WordlistEntry> },
}

impl Corpus {
    /// Build a wordlist corpus from in-memory counts.
    pub fn from_word_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let entries = counts
            .into_iter()
            .map(|(word, count)| WordlistEntry {
                word: word.into(),
                count,
                phones: None,
            })
            .collect();
        Corpus::Wordlist { entries }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Corpus::Text { tokens } => tokens.is_empty(),
            Corpus::Wordlist { entries } => entries.iter().all(|e| e.count == 0),
        }
    }

    /// Normalized token stream, or `None` for a wordlist (no running text).
    pub fn tokens(&self, keep_case: bool, max_tokens: Option<usize>) -> Option<Vec<String>> {
        let Corpus::Text { tokens } = self else {
            return None;
        };
        let limit = max_tokens.unwrap_or(tokens.len()).min(tokens.len());
        Some(
            tokens[..limit]
                .iter()
                .map(|t| normalize_word(t, keep_case))
                .collect(),
        )
    }

    /// Word frequencies for a wordlist corpus; duplicates (including case
    /// variants when folding) are summed and zero counts dropped.
    pub fn word_counts(&self, keep_case: bool) -> Option<Vec<(String, u64)>> {
        let Corpus::Wordlist { entries } = self else {
            return None;
        };
        Some(
            entries
                .iter()
                .filter(|e| e.count > 0)
                .map(|e| (normalize_word(&e.word, keep_case), e.count))
                .collect(),
        )
    }

    /// Phone sequences paired with the frequency of the word they transcribe.
    pub fn phone_transcriptions(&self) -> Vec<(&[String], u64)> {
        match self {
            Corpus::Text { .. } => Vec::new(),
            Corpus::Wordlist { entries } => entries
                .iter()
                .filter(|e| e.count > 0)
                .filter_map(|e| e.phones.as_deref().map(|p| (p, e.count)))
                .collect(),
        }
    }

    pub fn has_phones(&self) -> bool {
        matches!(self, Corpus::Wordlist { entries } if entries.iter().any(|e| e.phones.is_some()))
    }
}

pub fn normalize_word(word: &str, keep_case: bool) -> String {
    if keep_case {
        word.to_string()
    } else {
        word.to_lowercase()
    }
}

pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let text = read_text(path)?;
    parse_corpus(&path.display().to_string(), &text)
}

pub fn read_wordlist<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let text = read_text(path)?;
    parse_wordlist(&path.display().to_string(), &text)
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| {
        LexiconError::invalid_input(path.display().to_string(), format!("not UTF-8 text: {e}"))
    })
}

/// Tokenize raw text. Fails with [`LexiconError::EmptyCorpus`] when no word
/// survives tokenization.
pub fn parse_corpus(source_name: &str, text: &str) -> Result<Corpus> {
    let tokens: Vec<String> = text.unicode_words().map(str::to_string).collect();
    if tokens.is_empty() {
        return Err(LexiconError::EmptyCorpus);
    }
    info!("read {} tokens from {source_name}", tokens.len());
    Ok(Corpus::Text { tokens })
}

pub fn parse_wordlist(source_name: &str, text: &str) -> Result<Corpus> {
    let mut entries = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut columns = line.split_whitespace();
        let Some(word) = columns.next() else {
            continue;
        };
        let count = match columns.next() {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                LexiconError::invalid_input(
                    source_name,
                    format!("line {}: count {raw:?} is not a non-negative integer", line_no + 1),
                )
            })?,
            None => 1,
        };
        let rest: Vec<&str> = columns.collect();
        let phones = (!rest.is_empty()).then(|| phones_from_columns(&rest));
        entries.push(WordlistEntry {
            word: word.to_string(),
            count,
            phones,
        });
    }

    let corpus = Corpus::Wordlist { entries };
    if corpus.is_empty() {
        return Err(LexiconError::EmptyCorpus);
    }
    if let Corpus::Wordlist { entries } = &corpus {
        info!("read {} wordlist entries from {source_name}", entries.len());
        debug!("phone transcriptions present: {}", corpus.has_phones());
    }
    Ok(corpus)
}
