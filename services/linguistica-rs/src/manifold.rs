//! Word manifold: context vectors from word n-grams, k-nearest neighbors, and
//! the undirected neighbor graph.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use crate::graph::NeighborGraph;
use crate::ngram::NgramCounts;
use crate::parameters::Parameters;
use crate::sparse::ContextMatrix;
use crate::types::{GraphStats, NeighborEdge, NodeLinkGraph};

/// A slot a word fills in running text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Context {
    /// `a _`: the word follows `a`.
    After(String),
    /// `_ b`: the word precedes `b`.
    Before(String),
    /// `a _ c`
    Between(String, String),
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::After(a) => write!(f, "{a} _"),
            Context::Before(b) => write!(f, "_ {b}"),
            Context::Between(a, c) => write!(f, "{a} _ {c}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifoldConfig {
    pub max_word_types: usize,
    pub min_context_count: u64,
    pub n_neighbors: usize,
}

impl From<&Parameters> for ManifoldConfig {
    fn from(params: &Parameters) -> Self {
        Self {
            max_word_types: params.max_word_types(),
            min_context_count: params.min_context_count(),
            n_neighbors: params.n_neighbors(),
        }
    }
}

/// Every `(word, context, count)` observation in the bigram and trigram tables.
fn context_observations(ngrams: &NgramCounts<String>) -> Vec<(&str, Context, u64)> {
    let mut out = Vec::with_capacity(ngrams.bigrams.len() * 2 + ngrams.trigrams.len());
    for ([a, b], count) in ngrams.bigrams.iter() {
        out.push((a.as_str(), Context::Before(b.clone()), count));
        out.push((b.as_str(), Context::After(a.clone()), count));
    }
    for ([a, b, c], count) in ngrams.trigrams.iter() {
        out.push((b.as_str(), Context::Between(a.clone(), c.clone()), count));
    }
    out
}

/// The `max_word_types` most frequent words (ties alphabetical), returned in
/// alphabetical order.
fn vocabulary(ngrams: &NgramCounts<String>, max_word_types: usize) -> Vec<String> {
    let mut words: Vec<String> = ngrams
        .unigrams
        .sorted()
        .into_iter()
        .take(max_word_types)
        .map(|(w, _)| w.clone())
        .collect();
    words.sort();
    words
}

#[derive(Debug, Clone)]
pub struct Manifold {
    words: Vec<String>,
    contexts: Vec<Context>,
    scored_neighbors: BTreeMap<String, Vec<(String, f64)>>,
    words_to_neighbors: BTreeMap<String, Vec<String>>,
    graph: NeighborGraph,
    node_link: OnceLock<NodeLinkGraph>,
    json: OnceLock<String>,
    stats: OnceLock<GraphStats>,
}

impl Manifold {
    #[instrument(skip_all)]
    pub fn build(ngrams: &NgramCounts<String>, config: ManifoldConfig) -> Self {
        let words = vocabulary(ngrams, config.max_word_types);
        let word_index: FxHashMap<&str, usize> = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.as_str(), i))
            .collect();

        let observations = context_observations(ngrams);
        let mut context_totals: BTreeMap<&Context, u64> = BTreeMap::new();
        for (_, context, count) in &observations {
            *context_totals.entry(context).or_insert(0) += count;
        }
        let contexts: Vec<Context> = context_totals
            .into_iter()
            .filter(|(_, total)| *total >= config.min_context_count)
            .map(|(context, _)| context.clone())
            .collect();
        let context_index: FxHashMap<&Context, usize> =
            contexts.iter().enumerate().map(|(i, c)| (c, i)).collect();

        let triplets = observations.iter().filter_map(|(word, context, count)| {
            let row = *word_index.get(word)?;
            let col = *context_index.get(context)?;
            Some((row, col, *count))
        });
        let matrix = ContextMatrix::from_triplets(words.len(), contexts.len(), triplets);
        debug!(
            "context matrix {:?}, {} non-zero, sparsity {:.4}",
            matrix.shape(),
            matrix.nnz(),
            matrix.sparsity()
        );

        let neighbor_lists = matrix.batch_knn(config.n_neighbors);
        let mut scored_neighbors = BTreeMap::new();
        let mut words_to_neighbors = BTreeMap::new();
        let mut edges = Vec::new();
        for (row, neighbors) in neighbor_lists.into_iter().enumerate() {
            let word = &words[row];
            let named: Vec<(String, f64)> = neighbors
                .into_iter()
                .map(|(other, score)| (words[other].clone(), score))
                .collect();
            for (other, score) in &named {
                edges.push(NeighborEdge::new(word.clone(), other.clone(), *score));
            }
            words_to_neighbors.insert(
                word.clone(),
                named.iter().map(|(other, _)| other.clone()).collect(),
            );
            scored_neighbors.insert(word.clone(), named);
        }

        let graph = NeighborGraph::from_edges(&words, edges);
        info!(
            "manifold: {} words, {} contexts, {} edges",
            words.len(),
            contexts.len(),
            graph.edge_count()
        );

        Self {
            words,
            contexts,
            scored_neighbors,
            words_to_neighbors,
            graph,
            node_link: OnceLock::new(),
            json: OnceLock::new(),
            stats: OnceLock::new(),
        }
    }

    /// Words placed in the manifold, alphabetical.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Contexts that passed the frequency cutoff, sorted.
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    /// Each word's neighbors, best first, with cosine scores.
    pub fn scored_neighbors(&self) -> &BTreeMap<String, Vec<(String, f64)>> {
        &self.scored_neighbors
    }

    /// Each word's neighbors, best first.
    pub fn words_to_neighbors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.words_to_neighbors
    }

    pub fn graph(&self) -> &NeighborGraph {
        &self.graph
    }

    /// Node-link form of the graph, built on first use.
    pub fn node_link(&self) -> &NodeLinkGraph {
        self.node_link.get_or_init(|| self.graph.node_link())
    }

    pub fn node_link_json(&self) -> &str {
        self.json.get_or_init(|| self.graph.to_json())
    }

    pub fn stats(&self) -> &GraphStats {
        self.stats.get_or_init(|| self.graph.stats())
    }

    /// Words that list `word` or are listed by it.
    pub fn related(&self, word: &str) -> BTreeSet<&str> {
        self.graph.neighbors(word).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngram::count_ngrams;

    fn ngrams(text: &str) -> NgramCounts<String> {
        let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        count_ngrams(&tokens)
    }

    fn config(k: usize) -> ManifoldConfig {
        ManifoldConfig {
            max_word_types: 100,
            min_context_count: 1,
            n_neighbors: k,
        }
    }

    const TEXT: &str = "the cat sat . the dog sat . the cat ran . the dog ran . a bird flew .";

    #[test]
    fn test_contexts_from_ngrams() {
        let counts = ngrams("a b c");
        let obs = context_observations(&counts);
        assert!(obs.contains(&("b", Context::After("a".into()), 1)));
        assert!(obs.contains(&("b", Context::Before("c".into()), 1)));
        assert!(obs.contains(&("b", Context::Between("a".into(), "c".into()), 1)));
        assert_eq!(obs.len(), 5);
    }

    #[test]
    fn test_shared_contexts_make_neighbors() {
        let manifold = Manifold::build(&ngrams(TEXT), config(1));
        let neighbors = manifold.words_to_neighbors();
        assert_eq!(neighbors["cat"], vec!["dog"]);
        assert_eq!(neighbors["dog"], vec!["cat"]);
        assert!(manifold.graph().contains_edge("cat", "dog"));
        assert!(manifold.related("cat").contains("dog"));
    }

    #[test]
    fn test_every_listing_is_an_edge() {
        let manifold = Manifold::build(&ngrams(TEXT), config(2));
        for (word, neighbors) in manifold.words_to_neighbors() {
            assert!(neighbors.len() <= 2);
            assert!(!neighbors.contains(word));
            for other in neighbors {
                assert!(manifold.graph().contains_edge(word, other));
            }
        }
    }

    #[test]
    fn test_context_cutoff_and_vocabulary_limit() {
        let cfg = ManifoldConfig {
            max_word_types: 3,
            min_context_count: 2,
            n_neighbors: 3,
        };
        let manifold = Manifold::build(&ngrams(TEXT), cfg);
        // "." (5) and "the" (4), then "cat" wins the four-way tie at 2
        assert_eq!(manifold.words(), [".", "cat", "the"]);
        assert!(manifold
            .contexts()
            .iter()
            .all(|c| !matches!(c, Context::After(a) if a == "bird")));
    }

    #[test]
    fn test_graph_views_built_once() {
        let manifold = Manifold::build(&ngrams(TEXT), config(2));
        assert!(std::ptr::eq(manifold.node_link(), manifold.node_link()));
        assert!(std::ptr::eq(manifold.node_link_json(), manifold.node_link_json()));
        assert_eq!(manifold.node_link().nodes.len(), manifold.words().len());
        assert_eq!(manifold.stats().num_edges, manifold.graph().edge_count());
    }

    #[test]
    fn test_wordlist_only_has_no_edges() {
        let mut counts = NgramCounts::new();
        counts.unigrams.add("talk".to_string(), 3);
        counts.unigrams.add("walk".to_string(), 2);
        let manifold = Manifold::build(&counts, config(3));
        assert_eq!(manifold.graph().node_count(), 2);
        assert_eq!(manifold.graph().edge_count(), 0);
        assert!(manifold.words_to_neighbors()["talk"].is_empty());
    }
}
