//! Left-to-right and right-to-left tries over the word types of a corpus.
//!
//! A successor set lists the characters seen right after a prefix, plus
//! [`WORD_BOUNDARY`] when the prefix is itself a word. Predecessor sets are the
//! mirror image, read off the reversed trie.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use tracing::{debug, instrument};

/// End-of-word (successors) or start-of-word (predecessors) marker.
pub const WORD_BOUNDARY: &str = "";

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<char, usize>,
    /// Number of words ending exactly here (0 or 1 for a type list).
    terminal: u32,
    /// Number of words passing through or ending at this node.
    words: u32,
}

/// Arena-allocated prefix tree. A reversed trie stores every word spelled
/// backwards; its keys are reversed strings.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    reversed: bool,
}

impl Trie {
    pub fn build<'a, I>(words: I, reversed: bool) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut trie = Self {
            nodes: vec![TrieNode::default()],
            reversed,
        };
        for word in words {
            if reversed {
                trie.insert(word.chars().rev());
            } else {
                trie.insert(word.chars());
            }
        }
        trie
    }

    fn insert(&mut self, symbols: impl Iterator<Item = char>) {
        let mut node = 0;
        self.nodes[0].words += 1;
        for symbol in symbols {
            node = match self.nodes[node].children.get(&symbol) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(symbol, child);
                    child
                }
            };
            self.nodes[node].words += 1;
        }
        self.nodes[node].terminal += 1;
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of words stored.
    pub fn word_count(&self) -> usize {
        self.nodes[0].words as usize
    }

    /// Node reached by following `key` (already spelled in trie order).
    fn find(&self, key: impl Iterator<Item = char>) -> Option<usize> {
        let mut node = 0;
        for symbol in key {
            node = *self.nodes[node].children.get(&symbol)?;
        }
        Some(node)
    }

    fn continuations_at(&self, node: usize) -> BTreeSet<String> {
        let node = &self.nodes[node];
        let mut set: BTreeSet<String> = node.children.keys().map(|c| c.to_string()).collect();
        if node.terminal > 0 {
            set.insert(WORD_BOUNDARY.to_string());
        }
        set
    }

    fn branching_at(&self, node: usize) -> usize {
        let node = &self.nodes[node];
        node.children.len() + usize::from(node.terminal > 0)
    }

    /// Continuations of `key` spelled in natural order; for a reversed trie
    /// this is the set of symbols preceding `key` as a suffix.
    pub fn continuations(&self, key: &str) -> BTreeSet<String> {
        let node = if self.reversed {
            self.find(key.chars().rev())
        } else {
            self.find(key.chars())
        };
        node.map(|n| self.continuations_at(n)).unwrap_or_default()
    }

    /// Every string of length >= `min_len` whose node has two or more
    /// continuations, with its continuation set. Keys are in natural order.
    pub fn branch_points(&self, min_len: usize) -> BTreeMap<String, BTreeSet<String>> {
        let mut out = BTreeMap::new();
        let mut stack: Vec<(usize, String, usize)> = vec![(0, String::new(), 0)];
        while let Some((node, path, depth)) = stack.pop() {
            if depth >= min_len.max(1) && self.branching_at(node) >= 2 {
                out.insert(self.natural(&path), self.continuations_at(node));
            }
            for (&symbol, &child) in &self.nodes[node].children {
                let mut next = path.clone();
                next.push(symbol);
                stack.push((child, next, depth + 1));
            }
        }
        out
    }

    /// Branching nodes at depth >= `min_len` paired with every completion of
    /// length <= `max_completion` below them. Strings are in trie order.
    pub(crate) fn stems_with_completions(
        &self,
        min_len: usize,
        max_completion: usize,
    ) -> Vec<(String, BTreeSet<String>)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, String, usize)> = vec![(0, String::new(), 0)];
        while let Some((node, path, depth)) = stack.pop() {
            if depth >= min_len.max(1) && self.branching_at(node) >= 2 {
                out.push((path.clone(), self.completions(node, max_completion)));
            }
            for (&symbol, &child) in &self.nodes[node].children {
                let mut next = path.clone();
                next.push(symbol);
                stack.push((child, next, depth + 1));
            }
        }
        out
    }

    /// Remainders of all words below `start`, bounded in length.
    fn completions(&self, start: usize, max_len: usize) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut stack: Vec<(usize, String, usize)> = vec![(start, String::new(), 0)];
        while let Some((node, suffix, depth)) = stack.pop() {
            if self.nodes[node].terminal > 0 {
                out.insert(suffix.clone());
            }
            if depth == max_len {
                continue;
            }
            for (&symbol, &child) in &self.nodes[node].children {
                let mut next = suffix.clone();
                next.push(symbol);
                stack.push((child, next, depth + 1));
            }
        }
        out
    }

    fn natural(&self, path: &str) -> String {
        if self.reversed {
            path.chars().rev().collect()
        } else {
            path.to_string()
        }
    }

    /// Character offsets (in natural order) where `word` is cut: after each
    /// branching prefix for a forward trie, before each branching suffix for a
    /// reversed one. The stem left of every cut keeps at least `min_stem` chars.
    fn cut_points(&self, word: &str, min_stem: usize) -> Vec<usize> {
        let chars: Vec<char> = word.chars().collect();
        let n = chars.len();
        let mut cuts = Vec::new();
        let mut node = 0;
        for consumed in 1..n {
            let symbol = if self.reversed {
                chars[n - consumed]
            } else {
                chars[consumed - 1]
            };
            let Some(&child) = self.nodes[node].children.get(&symbol) else {
                break;
            };
            node = child;
            let stem_len = if self.reversed { n - consumed } else { consumed };
            if stem_len >= min_stem && self.branching_at(node) >= 2 {
                cuts.push(stem_len);
            }
        }
        cuts.sort_unstable();
        cuts
    }

    /// `word` split into pieces at its cut points.
    pub fn break_word(&self, word: &str, min_stem: usize) -> Vec<String> {
        let chars: Vec<char> = word.chars().collect();
        let mut pieces = Vec::new();
        let mut start = 0;
        for cut in self.cut_points(word, min_stem) {
            pieces.push(chars[start..cut].iter().collect());
            start = cut;
        }
        pieces.push(chars[start..].iter().collect());
        pieces
    }
}

/// The forward and reversed tries built from one word-type list.
#[derive(Debug, Clone)]
pub struct TrieIndex {
    pub forward: Trie,
    pub backward: Trie,
    min_stem_length: usize,
    words: Vec<String>,
    successors: OnceLock<BTreeMap<String, BTreeSet<String>>>,
    predecessors: OnceLock<BTreeMap<String, BTreeSet<String>>>,
    broken_left_to_right: OnceLock<BTreeMap<String, Vec<String>>>,
    broken_right_to_left: OnceLock<BTreeMap<String, Vec<String>>>,
}

impl TrieIndex {
    /// Build both tries in parallel. `words` should be unique word types.
    #[instrument(skip_all, fields(words = words.len()))]
    pub fn build(words: Vec<String>, min_stem_length: usize) -> Self {
        let (forward, backward) = rayon::join(
            || Trie::build(words.iter().map(String::as_str), false),
            || Trie::build(words.iter().map(String::as_str), true),
        );
        debug!(
            "tries built: {} forward nodes, {} backward nodes",
            forward.node_count(),
            backward.node_count()
        );
        Self {
            forward,
            backward,
            min_stem_length,
            words,
            successors: OnceLock::new(),
            predecessors: OnceLock::new(),
            broken_left_to_right: OnceLock::new(),
            broken_right_to_left: OnceLock::new(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Symbols observed right after `prefix`.
    pub fn successors_of(&self, prefix: &str) -> BTreeSet<String> {
        self.forward.continuations(prefix)
    }

    /// Symbols observed right before `suffix`.
    pub fn predecessors_of(&self, suffix: &str) -> BTreeSet<String> {
        self.backward.continuations(suffix)
    }

    /// Branching prefixes at least `min_stem_length` long. Built on first use.
    pub fn successors(&self) -> &BTreeMap<String, BTreeSet<String>> {
        self.successors
            .get_or_init(|| self.forward.branch_points(self.min_stem_length))
    }

    /// Branching suffixes at least `min_stem_length` long. Built on first use.
    pub fn predecessors(&self) -> &BTreeMap<String, BTreeSet<String>> {
        self.predecessors
            .get_or_init(|| self.backward.branch_points(self.min_stem_length))
    }

    pub fn broken_words_left_to_right(&self) -> &BTreeMap<String, Vec<String>> {
        self.broken_left_to_right
            .get_or_init(|| self.break_all(&self.forward))
    }

    pub fn broken_words_right_to_left(&self) -> &BTreeMap<String, Vec<String>> {
        self.broken_right_to_left
            .get_or_init(|| self.break_all(&self.backward))
    }

    fn break_all(&self, trie: &Trie) -> BTreeMap<String, Vec<String>> {
        self.words
            .iter()
            .map(|w| (w.clone(), trie.break_word(w, self.min_stem_length)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(words: &[&str], min_stem: usize) -> TrieIndex {
        TrieIndex::build(words.iter().map(|w| w.to_string()).collect(), min_stem)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_successors_of_prefix() {
        let idx = index(&["talks", "talked", "talking", "talk"], 1);
        assert_eq!(idx.successors_of("talk"), set(&["", "e", "i", "s"]));
        assert_eq!(idx.successors_of("tal"), set(&["k"]));
        assert!(idx.successors_of("xyz").is_empty());
    }

    #[test]
    fn test_predecessors_of_suffix() {
        let idx = index(&["talks", "walks", "ks"], 1);
        assert_eq!(idx.predecessors_of("ks"), set(&["", "l"]));
        assert_eq!(idx.predecessors_of("alks"), set(&["t", "w"]));
    }

    #[test]
    fn test_successor_consistency() {
        let words = ["talks", "talked", "walking", "wall"];
        let idx = index(&words, 1);
        for word in words {
            let chars: Vec<char> = word.chars().collect();
            for n in 0..=chars.len() {
                let prefix: String = chars[..n].iter().collect();
                let next = chars.get(n).map(|c| c.to_string()).unwrap_or_default();
                assert!(idx.successors_of(&prefix).contains(&next), "{word} at {n}");
            }
        }
    }

    #[test]
    fn test_branch_maps_respect_min_length() {
        let idx = index(&["talks", "talked", "walks", "walked"], 4);
        let successors = idx.successors();
        assert_eq!(successors.get("talk"), Some(&set(&["e", "s"])));
        assert!(!successors.contains_key("t"));
        let predecessors = idx.predecessors();
        assert_eq!(predecessors.get("alks"), Some(&set(&["t", "w"])));
        assert!(!predecessors.contains_key("ks"));
    }

    #[test]
    fn test_broken_words() {
        let idx = index(&["talks", "talked", "walks", "walked"], 3);
        let ltr = idx.broken_words_left_to_right();
        assert_eq!(ltr["talked"], vec!["talk", "ed"]);
        // "alked" is preceded by both t and w, but the stem "w" is too short
        let rtl = idx.broken_words_right_to_left();
        assert_eq!(rtl["walked"], vec!["walked"]);

        let idx = index(&["talks", "talked", "walks", "walked"], 1);
        let rtl = idx.broken_words_right_to_left();
        assert_eq!(rtl["walked"], vec!["w", "alked"]);
    }

    #[test]
    fn test_derived_maps_built_once() {
        let idx = index(&["talks", "talked", "walks", "walked"], 3);
        assert!(std::ptr::eq(
            idx.broken_words_left_to_right(),
            idx.broken_words_left_to_right()
        ));
        assert!(std::ptr::eq(
            idx.broken_words_right_to_left(),
            idx.broken_words_right_to_left()
        ));
        assert!(std::ptr::eq(idx.successors(), idx.successors()));
        assert!(std::ptr::eq(idx.predecessors(), idx.predecessors()));
    }

    #[test]
    fn test_completions_are_bounded() {
        let trie = Trie::build(["talk", "talks", "talkative"], false);
        let stems = trie.stems_with_completions(4, 3);
        let (_, affixes) = stems.iter().find(|(s, _)| s == "talk").unwrap();
        assert_eq!(affixes, &set(&["", "s"]));
    }
}
