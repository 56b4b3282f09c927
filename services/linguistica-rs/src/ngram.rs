//! Unigram, bigram and trigram counting over token sequences.
//!
//! The same counter serves words (one sequence: the whole token stream) and
//! phones (one sequence per word, weighted by the word's frequency).

use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Occurrence counts keyed by n-gram. Zero counts are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgramTable<K: Eq + Hash> {
    counts: FxHashMap<K, u64>,
}

impl<K: Eq + Hash> Default for NgramTable<K> {
    fn default() -> Self {
        Self {
            counts: FxHashMap::default(),
        }
    }
}

impl<K: Eq + Hash + Ord + Clone> NgramTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K, weight: u64) {
        if weight == 0 {
            return;
        }
        *self.counts.entry(key).or_insert(0) += weight;
    }

    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.counts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Unordered iteration; use [`NgramTable::sorted`] for reproducible output.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, &c)| (k, c))
    }

    /// Entries by descending count, ties by ascending key.
    pub fn sorted(&self) -> Vec<(&K, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// The three tables produced from one family of sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgramCounts<T: Eq + Hash> {
    pub unigrams: NgramTable<T>,
    pub bigrams: NgramTable<[T; 2]>,
    pub trigrams: NgramTable<[T; 3]>,
}

impl<T: Eq + Hash> Default for NgramCounts<T> {
    fn default() -> Self {
        Self {
            unigrams: NgramTable::default(),
            bigrams: NgramTable::default(),
            trigrams: NgramTable::default(),
        }
    }
}

impl<T: Eq + Hash + Ord + Clone> NgramCounts<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every n-gram inside `sequence`, each occurrence weighted by
    /// `weight`. N-grams never span two calls.
    pub fn count_sequence(&mut self, sequence: &[T], weight: u64) {
        for token in sequence {
            self.unigrams.add(token.clone(), weight);
        }
        for pair in sequence.windows(2) {
            self.bigrams.add([pair[0].clone(), pair[1].clone()], weight);
        }
        for triple in sequence.windows(3) {
            self.trigrams
                .add([triple[0].clone(), triple[1].clone(), triple[2].clone()], weight);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unigrams.is_empty()
    }
}

/// Counts over a single token stream.
pub fn count_ngrams<T: Eq + Hash + Ord + Clone>(tokens: &[T]) -> NgramCounts<T> {
    let mut counts = NgramCounts::new();
    counts.count_sequence(tokens, 1);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_word_ngrams() {
        let counts = count_ngrams(&words("the cat saw the cat"));
        assert_eq!(counts.unigrams.get(&"the".to_string()), 2);
        assert_eq!(counts.unigrams.len(), 3);
        assert_eq!(counts.bigrams.get(&["the".into(), "cat".into()]), 2);
        assert_eq!(counts.bigrams.len(), 3);
        assert_eq!(counts.trigrams.get(&["saw".into(), "the".into(), "cat".into()]), 1);
        assert_eq!(counts.trigrams.len(), 3);
        assert_eq!(counts.unigrams.total(), 5);
    }

    #[test]
    fn test_empty_input_yields_empty_tables() {
        let counts = count_ngrams::<String>(&[]);
        assert!(counts.is_empty());
        assert!(counts.bigrams.is_empty());
        assert!(counts.trigrams.is_empty());
    }

    #[test]
    fn test_sequences_do_not_join() {
        let mut counts = NgramCounts::new();
        counts.count_sequence(&['a', 'b'], 3);
        counts.count_sequence(&['c'], 2);
        assert_eq!(counts.bigrams.get(&['a', 'b']), 3);
        assert!(!counts.bigrams.contains(&['b', 'c']));
        assert_eq!(counts.unigrams.get(&'c'), 2);
    }

    #[test]
    fn test_zero_weight_not_materialized() {
        let mut table = NgramTable::new();
        table.add("x", 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_sorted_breaks_ties_by_key() {
        let counts = count_ngrams(&words("b a c a b"));
        let sorted: Vec<_> = counts
            .unigrams
            .sorted()
            .into_iter()
            .map(|(k, c)| (k.as_str(), c))
            .collect();
        assert_eq!(sorted, vec![("a", 2), ("b", 2), ("c", 1)]);
    }
}
