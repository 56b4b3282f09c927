//! The lexicon: parameters plus lazily computed, memoized analyses of one
//! corpus.
//!
//! Every derived structure lives in a [`OnceLock`] slot of a cache tagged with
//! a parameter generation. The first access computes the structure and its
//! missing prerequisites; concurrent first accesses block on the single
//! initializer. A parameter change installs an empty cache for the next
//! generation.
//!
//! Stage order: word n-grams → tries → signatures → phonology → manifold.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tracing::{debug, info};

use crate::corpus::{self, Corpus};
use crate::error::{LexiconError, Result};
use crate::manifold::{Manifold, ManifoldConfig};
use crate::ngram::{count_ngrams, NgramCounts, NgramTable};
use crate::parameters::{ParameterValue, Parameters};
use crate::phonology::count_phone_ngrams;
use crate::signature::{SignatureConfig, Signatures};
use crate::trie::TrieIndex;
use crate::types::{GraphStats, NodeLinkGraph, Signature};

#[derive(Debug, Default)]
struct Cache {
    generation: u64,
    word_ngrams: OnceLock<NgramCounts<String>>,
    phone_ngrams: OnceLock<NgramCounts<String>>,
    tries: OnceLock<TrieIndex>,
    signatures: OnceLock<Signatures>,
    manifold: OnceLock<Manifold>,
}

impl Cache {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct Lexicon {
    corpus: Option<Arc<Corpus>>,
    parameters: Parameters,
    cache: Cache,
    computations: AtomicUsize,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(Parameters::default())
    }
}

impl Lexicon {
    /// A lexicon with no corpus loaded yet.
    pub fn new(parameters: Parameters) -> Self {
        Self {
            corpus: None,
            parameters,
            cache: Cache::new(0),
            computations: AtomicUsize::new(0),
        }
    }

    pub fn from_corpus(corpus: impl Into<Arc<Corpus>>, parameters: Parameters) -> Self {
        let mut lexicon = Self::new(parameters);
        lexicon.corpus = Some(corpus.into());
        lexicon
    }

    pub fn from_corpus_file<P: AsRef<Path>>(path: P, parameters: Parameters) -> Result<Self> {
        Ok(Self::from_corpus(corpus::read_corpus(path)?, parameters))
    }

    pub fn from_wordlist_file<P: AsRef<Path>>(path: P, parameters: Parameters) -> Result<Self> {
        Ok(Self::from_corpus(corpus::read_wordlist(path)?, parameters))
    }

    pub fn from_corpus_text(text: &str, parameters: Parameters) -> Result<Self> {
        Ok(Self::from_corpus(
            corpus::parse_corpus("<text>", text)?,
            parameters,
        ))
    }

    pub fn from_wordlist_text(text: &str, parameters: Parameters) -> Result<Self> {
        Ok(Self::from_corpus(
            corpus::parse_wordlist("<text>", text)?,
            parameters,
        ))
    }

    /// Wordlist lexicon from in-memory counts. An empty list is accepted here
    /// and reported as [`LexiconError::EmptyCorpus`] when the pipeline runs.
    pub fn from_word_counts<I, S>(counts: I, parameters: Parameters) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self::from_corpus(Corpus::from_word_counts(counts), parameters)
    }

    /// Replace the corpus; every derived structure is invalidated.
    pub fn load_corpus(&mut self, corpus: impl Into<Arc<Corpus>>) {
        self.corpus = Some(corpus.into());
        self.invalidate();
    }

    /// A lexicon over the same corpus and parameters with an empty cache.
    pub fn snapshot(&self) -> Self {
        Self {
            corpus: self.corpus.clone(),
            parameters: self.parameters,
            cache: Cache::new(self.cache.generation),
            computations: AtomicUsize::new(0),
        }
    }

    pub fn has_corpus(&self) -> bool {
        self.corpus.is_some()
    }

    /// Parameter snapshot keyed by name.
    pub fn parameters(&self) -> BTreeMap<String, i64> {
        self.parameters.to_map()
    }

    pub fn params(&self) -> &Parameters {
        &self.parameters
    }

    /// Validate the whole batch, then apply it. On error nothing changes. A
    /// batch that changes no value keeps the cache.
    pub fn change_parameters<I, K, V>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParameterValue>,
    {
        let next = self.parameters.with_overrides(overrides)?;
        if next == self.parameters {
            debug!("parameter batch changes nothing");
            return Ok(());
        }
        for (name, value) in next.to_map() {
            if self.parameters.get(&name) != Some(value) {
                info!("parameter {name} = {value}");
            }
        }
        self.parameters = next;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        let generation = self.cache.generation + 1;
        self.cache = Cache::new(generation);
        debug!("cache invalidated, generation {generation}");
    }

    /// Parameter generation the cache belongs to.
    pub fn generation(&self) -> u64 {
        self.cache.generation
    }

    /// Number of stage computations performed so far.
    pub fn computation_count(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    /// Compute every structure in dependency order. Word and phone n-grams are
    /// independent and run in parallel. Already computed structures are reused.
    pub fn run_all_modules(&self) -> Result<()> {
        let start = Instant::now();
        self.input("lexicon")?;

        let (words, phones) = rayon::join(|| self.word_ngrams(), || self.phone_ngrams());
        words?;
        phones?;
        self.tries()?;
        self.signatures()?;
        self.manifold()?;

        info!(
            "all modules ready (generation {}) in {} ms",
            self.cache.generation,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    fn input(&self, structure: &'static str) -> Result<&Corpus> {
        let corpus = self
            .corpus
            .as_deref()
            .ok_or(LexiconError::PipelineNotRun { structure })?;
        if corpus.is_empty() {
            return Err(LexiconError::EmptyCorpus);
        }
        Ok(corpus)
    }

    fn timed<T>(&self, stage: &str, compute: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let value = compute();
        self.computations.fetch_add(1, Ordering::SeqCst);
        info!("{stage} computed in {} ms", start.elapsed().as_millis());
        value
    }

    // --- word n-grams ------------------------------------------------------

    pub fn word_ngrams(&self) -> Result<&NgramCounts<String>> {
        let corpus = self.input("word n-grams")?;
        let counts = self.cache.word_ngrams.get_or_init(|| {
            self.timed("word n-grams", || {
                let params = &self.parameters;
                if let Some(tokens) = corpus.tokens(params.keep_case(), params.max_word_tokens()) {
                    count_ngrams(&tokens)
                } else {
                    let mut counts = NgramCounts::new();
                    for (word, count) in corpus.word_counts(params.keep_case()).unwrap_or_default() {
                        counts.unigrams.add(word, count);
                    }
                    counts
                }
            })
        });
        if counts.is_empty() {
            return Err(LexiconError::EmptyCorpus);
        }
        Ok(counts)
    }

    pub fn word_unigram_counter(&self) -> Result<&NgramTable<String>> {
        Ok(&self.word_ngrams()?.unigrams)
    }

    pub fn word_bigram_counter(&self) -> Result<&NgramTable<[String; 2]>> {
        Ok(&self.word_ngrams()?.bigrams)
    }

    pub fn word_trigram_counter(&self) -> Result<&NgramTable<[String; 3]>> {
        Ok(&self.word_ngrams()?.trigrams)
    }

    /// Word types by descending count, ties alphabetical.
    pub fn wordlist(&self) -> Result<Vec<(&str, u64)>> {
        Ok(self
            .word_unigram_counter()?
            .sorted()
            .into_iter()
            .map(|(w, c)| (w.as_str(), c))
            .collect())
    }

    /// Total number of word tokens counted.
    pub fn total_tokens(&self) -> Result<u64> {
        Ok(self.word_unigram_counter()?.total())
    }

    // --- tries ---------------------------------------------------------------

    pub fn tries(&self) -> Result<&TrieIndex> {
        let ngrams = self.word_ngrams()?;
        Ok(self.cache.tries.get_or_init(|| {
            self.timed("tries", || {
                let mut words: Vec<String> = ngrams.unigrams.iter().map(|(w, _)| w.clone()).collect();
                words.sort();
                TrieIndex::build(words, self.parameters.min_stem_length())
            })
        }))
    }

    pub fn successors(&self) -> Result<&BTreeMap<String, BTreeSet<String>>> {
        Ok(self.tries()?.successors())
    }

    pub fn predecessors(&self) -> Result<&BTreeMap<String, BTreeSet<String>>> {
        Ok(self.tries()?.predecessors())
    }

    pub fn successors_of(&self, prefix: &str) -> Result<BTreeSet<String>> {
        Ok(self.tries()?.successors_of(prefix))
    }

    pub fn predecessors_of(&self, suffix: &str) -> Result<BTreeSet<String>> {
        Ok(self.tries()?.predecessors_of(suffix))
    }

    pub fn broken_words_left_to_right(&self) -> Result<&BTreeMap<String, Vec<String>>> {
        Ok(self.tries()?.broken_words_left_to_right())
    }

    pub fn broken_words_right_to_left(&self) -> Result<&BTreeMap<String, Vec<String>>> {
        Ok(self.tries()?.broken_words_right_to_left())
    }

    // --- signatures ----------------------------------------------------------

    pub fn signatures(&self) -> Result<&Signatures> {
        let tries = self.tries()?;
        Ok(self.cache.signatures.get_or_init(|| {
            self.timed("signatures", || {
                Signatures::build(tries, SignatureConfig::from(&self.parameters))
            })
        }))
    }

    pub fn signatures_to_stems(&self) -> Result<&BTreeMap<Signature, BTreeSet<String>>> {
        Ok(self.signatures()?.signatures_to_stems())
    }

    pub fn stems_to_signatures(&self) -> Result<&BTreeMap<String, BTreeSet<Signature>>> {
        Ok(self.signatures()?.stems_to_signatures())
    }

    pub fn signatures_to_words(&self) -> Result<&BTreeMap<Signature, BTreeSet<String>>> {
        Ok(self.signatures()?.signatures_to_words())
    }

    pub fn words_to_signatures(&self) -> Result<&BTreeMap<String, BTreeSet<Signature>>> {
        Ok(self.signatures()?.words_to_signatures())
    }

    // --- phonology -----------------------------------------------------------

    /// Phone n-grams; empty tables when the corpus has no transcriptions.
    pub fn phone_ngrams(&self) -> Result<&NgramCounts<String>> {
        let corpus = self.input("phone n-grams")?;
        Ok(self.cache.phone_ngrams.get_or_init(|| {
            self.timed("phone n-grams", || {
                count_phone_ngrams(&corpus.phone_transcriptions())
            })
        }))
    }

    pub fn phone_unigram_counter(&self) -> Result<&NgramTable<String>> {
        Ok(&self.phone_ngrams()?.unigrams)
    }

    pub fn phone_bigram_counter(&self) -> Result<&NgramTable<[String; 2]>> {
        Ok(&self.phone_ngrams()?.bigrams)
    }

    pub fn phone_trigram_counter(&self) -> Result<&NgramTable<[String; 3]>> {
        Ok(&self.phone_ngrams()?.trigrams)
    }

    // --- manifold ------------------------------------------------------------

    pub fn manifold(&self) -> Result<&Manifold> {
        let ngrams = self.word_ngrams()?;
        Ok(self.cache.manifold.get_or_init(|| {
            self.timed("manifold", || {
                Manifold::build(ngrams, ManifoldConfig::from(&self.parameters))
            })
        }))
    }

    pub fn words_to_neighbors(&self) -> Result<&BTreeMap<String, Vec<String>>> {
        Ok(self.manifold()?.words_to_neighbors())
    }

    pub fn neighbor_graph(&self) -> Result<&NodeLinkGraph> {
        Ok(self.manifold()?.node_link())
    }

    pub fn neighbor_graph_json(&self) -> Result<&str> {
        Ok(self.manifold()?.node_link_json())
    }

    pub fn neighbor_graph_stats(&self) -> Result<&GraphStats> {
        Ok(self.manifold()?.stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::from_word_counts(
            [("talks", 5), ("talked", 3), ("talking", 2), ("walks", 4), ("walked", 2)],
            Parameters::default(),
        )
    }

    #[test]
    fn test_lazy_accessor_computes_prerequisites_only() {
        let lex = lexicon();
        lex.tries().unwrap();
        // word n-grams + tries
        assert_eq!(lex.computation_count(), 2);
        lex.signatures().unwrap();
        assert_eq!(lex.computation_count(), 3);
    }

    #[test]
    fn test_run_all_is_idempotent() {
        let lex = lexicon();
        lex.run_all_modules().unwrap();
        let after_first = lex.computation_count();
        assert_eq!(after_first, 5);
        lex.run_all_modules().unwrap();
        assert_eq!(lex.computation_count(), after_first);
    }

    #[test]
    fn test_change_parameters_invalidates() {
        let mut lex = lexicon();
        lex.run_all_modules().unwrap();
        assert!(lex.signatures_to_stems().unwrap().is_empty());

        lex.change_parameters([("min_sig_count", 1i64)]).unwrap();
        assert_eq!(lex.generation(), 1);
        let sigs = lex.signatures_to_stems().unwrap();
        assert!(sigs.contains_key(&Signature::new(["ed", "ing", "s"])));
    }

    #[test]
    fn test_noop_change_keeps_cache() {
        let mut lex = lexicon();
        lex.run_all_modules().unwrap();
        lex.change_parameters([("min_stem_length", 4i64)]).unwrap();
        assert_eq!(lex.generation(), 0);
        let before = lex.computation_count();
        lex.run_all_modules().unwrap();
        assert_eq!(lex.computation_count(), before);
    }

    #[test]
    fn test_failed_change_leaves_state() {
        let mut lex = lexicon();
        let before = lex.parameters();
        let err = lex
            .change_parameters([("min_stem_length", "3"), ("bogus", "1")])
            .unwrap_err();
        assert!(matches!(err, LexiconError::UnknownParameter { .. }));
        assert_eq!(lex.parameters(), before);
        assert_eq!(lex.generation(), 0);
    }

    #[test]
    fn test_derived_views_are_cached() {
        let lex = lexicon();
        let first = lex.broken_words_left_to_right().unwrap();
        let again = lex.broken_words_left_to_right().unwrap();
        assert!(std::ptr::eq(first, again));
        assert!(std::ptr::eq(lex.successors().unwrap(), lex.successors().unwrap()));
        assert!(std::ptr::eq(
            lex.words_to_neighbors().unwrap(),
            lex.words_to_neighbors().unwrap()
        ));
        assert!(std::ptr::eq(
            lex.neighbor_graph().unwrap(),
            lex.neighbor_graph().unwrap()
        ));
    }

    #[test]
    fn test_concurrent_first_access_computes_once() {
        let lex = lexicon();
        let addresses: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| lex.signatures().unwrap() as *const Signatures as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        // word n-grams, tries, signatures
        assert_eq!(lex.computation_count(), 3);
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_no_corpus_is_pipeline_not_run() {
        let lex = Lexicon::default();
        let err = lex.signatures().unwrap_err();
        assert!(matches!(err, LexiconError::PipelineNotRun { .. }));
    }

    #[test]
    fn test_empty_wordlist_fails() {
        let lex = Lexicon::from_word_counts(Vec::<(String, u64)>::new(), Parameters::default());
        assert!(matches!(lex.run_all_modules(), Err(LexiconError::EmptyCorpus)));
    }

    #[test]
    fn test_snapshot_shares_input_not_cache() {
        let lex = lexicon();
        lex.run_all_modules().unwrap();
        let copy = lex.snapshot();
        assert_eq!(copy.computation_count(), 0);
        assert_eq!(copy.parameters(), lex.parameters());
        assert_eq!(copy.wordlist().unwrap(), lex.wordlist().unwrap());
    }
}
